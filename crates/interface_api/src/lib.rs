//! HTTP API Layer
//!
//! This crate provides the REST API for the warranty lifecycle using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Thin wrappers that call the domain services
//! - **Middleware**: JWT authentication, tracing, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(store, Arc::new(SystemClock), config)?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::{Clock, TemporalError};
use domain_warranty::{
    ClaimService, FeedbackService, PartRequestService, RecallCampaignService, RecallResponseService,
    WarrantyStore, WorkLogService,
};

use crate::config::ApiConfig;
use crate::handlers::{claims, feedback, health, part_requests, recalls, responses, work_logs};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn WarrantyStore>,
    pub claims: Arc<ClaimService>,
    pub campaigns: Arc<RecallCampaignService>,
    pub responses: Arc<RecallResponseService>,
    pub part_requests: Arc<PartRequestService>,
    pub feedback: Arc<FeedbackService>,
    pub work_logs: Arc<WorkLogService>,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the services over one store
    ///
    /// Fails when the configured business timezone is not a known IANA name.
    pub fn new(store: Arc<dyn WarrantyStore>, clock: Arc<dyn Clock>, config: ApiConfig) -> Result<Self, TemporalError> {
        let timezone = config.timezone()?;
        Ok(Self {
            claims: Arc::new(ClaimService::new(store.clone(), clock.clone(), timezone)),
            campaigns: Arc::new(RecallCampaignService::new(store.clone(), clock.clone())),
            responses: Arc::new(RecallResponseService::new(store.clone(), clock.clone())),
            part_requests: Arc::new(PartRequestService::new(store.clone(), clock.clone())),
            feedback: Arc::new(FeedbackService::new(store.clone(), clock.clone())),
            work_logs: Arc::new(WorkLogService::new(store.clone(), clock)),
            store,
            config,
        })
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let claim_routes = Router::new()
        .route("/", get(claims::list_claims).post(claims::create_claim))
        .route("/:id", get(claims::get_claim).delete(claims::delete_claim))
        .route("/:id/status", patch(claims::update_status))
        .route("/:id/allowed-statuses", get(claims::allowed_statuses))
        .route("/:id/accept", post(claims::accept_claim))
        .route("/:id/reject", post(claims::reject_claim))
        .route("/:id/confirm-payment", post(claims::confirm_payment))
        .route("/:id/start-processing", post(claims::start_processing))
        .route("/:id/complete", post(claims::complete_claim))
        .route("/:id/feedback", get(feedback::claim_feedback))
        .route("/:id/work-logs", get(work_logs::claim_work_logs));

    let campaign_routes = Router::new()
        .route("/", get(recalls::list_campaigns).post(recalls::create_campaign))
        .route("/mine", get(recalls::my_campaigns))
        .route("/:id", get(recalls::get_campaign).delete(recalls::delete_campaign))
        .route("/:id/approve", post(recalls::approve_campaign))
        .route("/:id/reject", post(recalls::reject_campaign))
        .route("/:id/responses", get(recalls::campaign_responses));

    let response_routes = Router::new()
        .route("/", get(responses::list_responses))
        .route("/mine", get(responses::my_responses))
        .route("/:id", get(responses::get_response))
        .route("/:id/confirm", patch(responses::confirm_response))
        .route("/:id/complete", post(responses::complete_response));

    let part_request_routes = Router::new()
        .route("/", get(part_requests::list_part_requests).post(part_requests::create_part_request))
        .route(
            "/:id",
            get(part_requests::get_part_request).delete(part_requests::delete_part_request),
        )
        .route("/:id/approve", post(part_requests::approve_part_request))
        .route("/:id/reject", post(part_requests::reject_part_request))
        .route("/:id/ship", post(part_requests::ship_part_request))
        .route("/:id/deliver", post(part_requests::deliver_part_request))
        .route("/:id/cancel", post(part_requests::cancel_part_request));

    let feedback_routes = Router::new()
        .route("/", get(feedback::list_feedback).post(feedback::create_feedback))
        .route("/mine", get(feedback::my_feedback))
        .route("/summary", get(feedback::feedback_summary))
        .route(
            "/:id",
            get(feedback::get_feedback)
                .put(feedback::update_feedback)
                .delete(feedback::delete_feedback),
        );

    let work_log_routes = Router::new()
        .route("/", get(work_logs::list_work_logs).post(work_logs::create_work_log))
        .route(
            "/:id",
            get(work_logs::get_work_log)
                .put(work_logs::update_work_log)
                .delete(work_logs::delete_work_log),
        );

    // Protected API routes
    let api_routes = Router::new()
        .nest("/warranty-claims", claim_routes)
        .nest("/recall-requests", campaign_routes)
        .nest("/recall-responses", response_routes)
        .nest("/part-requests", part_request_routes)
        .nest("/feedbacks", feedback_routes)
        .nest("/work-logs", work_log_routes)
        .route("/installed-parts/:id/coverage", get(claims::check_coverage))
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}
