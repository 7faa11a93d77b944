//! Recall response handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use core_kernel::Page;
use domain_warranty::RecallResponseStatus;

use crate::dto::recalls::*;
use crate::dto::ListQuery;
use crate::handlers::validated;
use crate::middleware::CurrentActor;
use crate::{error::ApiError, AppState};

pub async fn list_responses(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<RecallResponseDto>>, ApiError> {
    let status = query.status::<RecallResponseStatus>()?;
    let page = state.responses.list_responses(&actor, status, &query.page_request()?).await?;
    Ok(Json(page.map(RecallResponseDto::from)))
}

pub async fn my_responses(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<RecallResponseDto>>, ApiError> {
    let page = state.responses.responses_for_customer(&actor, &query.page_request()?).await?;
    Ok(Json(page.map(RecallResponseDto::from)))
}

pub async fn get_response(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<RecallResponseDto>, ApiError> {
    Ok(Json(state.responses.get_response(&actor, id.into()).await?.into()))
}

/// The vehicle owner accepts or declines the recall
pub async fn confirm_response(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    body: Json<ConfirmRecallRequest>,
) -> Result<Json<RecallResponseDto>, ApiError> {
    let request = validated(body)?;
    let response = state
        .responses
        .customer_confirm(&actor, id.into(), request.accepted, request.note)
        .await?;
    Ok(Json(response.into()))
}

pub async fn complete_response(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<RecallResponseDto>, ApiError> {
    Ok(Json(state.responses.complete_response(&actor, id.into()).await?.into()))
}
