//! Warranty claim handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use core_kernel::Page;
use domain_warranty::{ClaimFilter, NewClaim, WarrantyClaimStatus};

use crate::dto::claims::*;
use crate::dto::{ListQuery, NoteRequest};
use crate::handlers::{require_staff, validated};
use crate::middleware::CurrentActor;
use crate::{error::ApiError, AppState};

/// Opens a claim after the coverage check
pub async fn create_claim(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    body: Json<CreateClaimRequest>,
) -> Result<(StatusCode, Json<ClaimResponse>), ApiError> {
    let request = validated(body)?;
    let claim = state
        .claims
        .submit_claim(
            &actor,
            NewClaim {
                vehicle_id: request.vehicle_id.into(),
                installed_part_id: request.installed_part_id.into(),
                description: request.description,
                is_paid_warranty: request.is_paid_warranty,
                warranty_fee: request.warranty_fee,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(claim.into())))
}

pub async fn list_claims(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<ClaimResponse>>, ApiError> {
    require_staff(&actor)?;
    let filter = ClaimFilter {
        status: query.status::<WarrantyClaimStatus>()?,
        vehicle_id: query.vehicle_id.map(Into::into),
        assigned_to: None,
    };
    let page = state.claims.list_claims(&filter, &query.page_request()?).await?;
    Ok(Json(page.map(ClaimResponse::from)))
}

pub async fn get_claim(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    require_staff(&actor)?;
    Ok(Json(state.claims.get_claim(id.into()).await?.into()))
}

pub async fn delete_claim(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.claims.delete_claim(&actor, id.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Generic table-validated status change
pub async fn update_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    body: Json<UpdateStatusRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let request = validated(body)?;
    let to: WarrantyClaimStatus = request
        .status
        .parse()
        .map_err(|e: domain_warranty::UnknownStatus| ApiError::validation(e.to_string()))?;
    let claim = state.claims.update_status(&actor, id.into(), to, request.note).await?;
    Ok(Json(claim.into()))
}

pub async fn allowed_statuses(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<AllowedStatusesResponse>, ApiError> {
    require_staff(&actor)?;
    let claim = state.claims.get_claim(id.into()).await?;
    let allowed = state.claims.allowed_next_statuses(id.into()).await?;
    Ok(Json(AllowedStatusesResponse {
        current: claim.status,
        allowed,
    }))
}

pub async fn accept_claim(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    body: Option<Json<NoteRequest>>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let note = body.and_then(|Json(b)| b.note);
    Ok(Json(state.claims.accept_claim(&actor, id.into(), note).await?.into()))
}

pub async fn reject_claim(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    body: Json<RejectClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let request = validated(body)?;
    Ok(Json(state.claims.reject_claim(&actor, id.into(), request.reason).await?.into()))
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    Ok(Json(state.claims.confirm_payment(&actor, id.into()).await?.into()))
}

pub async fn start_processing(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    body: Option<Json<StartProcessingRequest>>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let technician = body.and_then(|Json(b)| b.technician_id).map(Into::into);
    Ok(Json(state.claims.start_processing(&actor, id.into(), technician).await?.into()))
}

pub async fn complete_claim(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    body: Option<Json<NoteRequest>>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let note = body.and_then(|Json(b)| b.note);
    Ok(Json(state.claims.complete_claim(&actor, id.into(), note).await?.into()))
}

/// Warranty coverage of an installed part as of today
pub async fn check_coverage(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Query(query): Query<CoverageQuery>,
) -> Result<Json<CoverageResponse>, ApiError> {
    require_staff(&actor)?;
    let check = state.claims.check_coverage(id.into(), query.estimated_repair_cost).await?;
    Ok(Json(check.into()))
}
