//! Part request handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use core_kernel::Page;
use domain_warranty::{NewPartRequest, PartRequestFilter, PartRequestStatus};

use crate::dto::part_requests::*;
use crate::dto::ListQuery;
use crate::handlers::{require_staff, validated};
use crate::middleware::CurrentActor;
use crate::{error::ApiError, AppState};

pub async fn create_part_request(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    body: Json<CreatePartRequestRequest>,
) -> Result<(StatusCode, Json<PartRequestResponse>), ApiError> {
    let request = validated(body)?;
    let created = state
        .part_requests
        .create(
            &actor,
            NewPartRequest {
                warranty_claim_id: request.warranty_claim_id.into(),
                faulty_part_id: request.faulty_part_id.into(),
                quantity: request.quantity,
                issue_description: request.issue_description,
                notes: request.notes,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn list_part_requests(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<PartRequestResponse>>, ApiError> {
    require_staff(&actor)?;
    let filter = PartRequestFilter {
        status: query.status::<PartRequestStatus>()?,
        requested_by: None,
        warranty_claim_id: query.warranty_claim_id.map(Into::into),
    };
    let page = state.part_requests.list(&filter, &query.page_request()?).await?;
    Ok(Json(page.map(PartRequestResponse::from)))
}

pub async fn get_part_request(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<PartRequestResponse>, ApiError> {
    require_staff(&actor)?;
    Ok(Json(state.part_requests.get(id.into()).await?.into()))
}

pub async fn delete_part_request(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.part_requests.delete(&actor, id.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn approve_part_request(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    body: Option<Json<ApprovePartRequest>>,
) -> Result<Json<PartRequestResponse>, ApiError> {
    let notes = body.and_then(|Json(b)| b.notes);
    Ok(Json(state.part_requests.approve(&actor, id.into(), notes).await?.into()))
}

pub async fn reject_part_request(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    body: Json<RejectPartRequest>,
) -> Result<Json<PartRequestResponse>, ApiError> {
    let request = validated(body)?;
    Ok(Json(state.part_requests.reject(&actor, id.into(), request.reason).await?.into()))
}

pub async fn ship_part_request(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    body: Json<ShipPartRequest>,
) -> Result<Json<PartRequestResponse>, ApiError> {
    let request = validated(body)?;
    let shipped = state
        .part_requests
        .mark_shipped(&actor, id.into(), request.tracking_number)
        .await?;
    Ok(Json(shipped.into()))
}

pub async fn deliver_part_request(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<PartRequestResponse>, ApiError> {
    Ok(Json(state.part_requests.mark_delivered(&actor, id.into()).await?.into()))
}

pub async fn cancel_part_request(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<PartRequestResponse>, ApiError> {
    Ok(Json(state.part_requests.cancel(&actor, id.into()).await?.into()))
}
