//! Feedback handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use core_kernel::Page;
use domain_warranty::{FeedbackFilter, NewFeedback, Rating};

use crate::dto::feedback::*;
use crate::dto::ListQuery;
use crate::handlers::validated;
use crate::middleware::CurrentActor;
use crate::{error::ApiError, AppState};

fn rating(raw: Option<u8>) -> Result<Option<Rating>, ApiError> {
    Ok(raw.map(Rating::new).transpose()?)
}

pub async fn create_feedback(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    body: Json<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackResponse>), ApiError> {
    let request = validated(body)?;
    let created = state
        .feedback
        .create(
            &actor,
            NewFeedback {
                warranty_claim_id: request.warranty_claim_id.into(),
                rating: Rating::new(request.rating)?,
                comment: request.comment,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Staff listing, filtered by `customerId`, `rating`, or `minRating`
pub async fn list_feedback(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<FeedbackResponse>>, ApiError> {
    let filter = FeedbackFilter {
        customer_id: query.customer_id.map(Into::into),
        rating: rating(query.rating)?,
        min_rating: rating(query.min_rating)?,
    };
    let page = state.feedback.list(&actor, &filter, &query.page_request()?).await?;
    Ok(Json(page.map(FeedbackResponse::from)))
}

pub async fn my_feedback(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<FeedbackResponse>>, ApiError> {
    let page = state.feedback.mine(&actor, &query.page_request()?).await?;
    Ok(Json(page.map(FeedbackResponse::from)))
}

pub async fn feedback_summary(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<FeedbackSummaryResponse>, ApiError> {
    Ok(Json(state.feedback.summary(&actor).await?.into()))
}

pub async fn get_feedback(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    Ok(Json(state.feedback.get(&actor, id.into()).await?.into()))
}

pub async fn claim_feedback(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(claim_id): Path<Uuid>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    Ok(Json(state.feedback.for_claim(&actor, claim_id.into()).await?.into()))
}

pub async fn update_feedback(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    body: Json<UpdateFeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let request = validated(body)?;
    let updated = state
        .feedback
        .update(&actor, id.into(), Rating::new(request.rating)?, request.comment)
        .await?;
    Ok(Json(updated.into()))
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.feedback.delete(&actor, id.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}
