//! Work log handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use core_kernel::Page;
use domain_warranty::{NewWorkLog, WorkLogFilter};

use crate::dto::work_logs::*;
use crate::dto::ListQuery;
use crate::handlers::validated;
use crate::middleware::CurrentActor;
use crate::{error::ApiError, AppState};

pub async fn create_work_log(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    body: Json<CreateWorkLogRequest>,
) -> Result<(StatusCode, Json<WorkLogResponse>), ApiError> {
    let request = validated(body)?;
    let created = state
        .work_logs
        .create(
            &actor,
            NewWorkLog {
                warranty_claim_id: request.warranty_claim_id.into(),
                technician: request.technician_id.map(Into::into),
                start_time: request.start_time,
                end_time: request.end_time,
                description: request.description,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Filtered by `warrantyClaimId` or `technicianId`
pub async fn list_work_logs(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<WorkLogResponse>>, ApiError> {
    let filter = WorkLogFilter {
        warranty_claim_id: query.warranty_claim_id.map(Into::into),
        technician: query.technician_id.map(Into::into),
    };
    let page = state.work_logs.list(&actor, &filter, &query.page_request()?).await?;
    Ok(Json(page.map(WorkLogResponse::from)))
}

pub async fn claim_work_logs(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(claim_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<WorkLogResponse>>, ApiError> {
    let page = state
        .work_logs
        .for_claim(&actor, claim_id.into(), &query.page_request()?)
        .await?;
    Ok(Json(page.map(WorkLogResponse::from)))
}

pub async fn get_work_log(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkLogResponse>, ApiError> {
    Ok(Json(state.work_logs.get(&actor, id.into()).await?.into()))
}

pub async fn update_work_log(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    body: Json<UpdateWorkLogRequest>,
) -> Result<Json<WorkLogResponse>, ApiError> {
    let request = validated(body)?;
    let updated = state
        .work_logs
        .update(&actor, id.into(), request.start_time, request.end_time, request.description)
        .await?;
    Ok(Json(updated.into()))
}

pub async fn delete_work_log(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.work_logs.delete(&actor, id.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}
