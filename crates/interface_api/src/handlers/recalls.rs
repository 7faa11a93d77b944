//! Recall campaign handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use core_kernel::Page;
use domain_warranty::{NewCampaign, RecallRequestStatus};

use crate::dto::recalls::*;
use crate::dto::{ListQuery, NoteRequest};
use crate::handlers::{require_staff, validated};
use crate::middleware::CurrentActor;
use crate::{error::ApiError, AppState};

pub async fn create_campaign(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    body: Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<CampaignResponse>), ApiError> {
    let request = validated(body)?;
    let campaign = state
        .campaigns
        .create_campaign(
            &actor,
            NewCampaign {
                part_id: request.part_id.into(),
                reason: request.reason,
                customer_note: request.customer_note,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(campaign.into())))
}

pub async fn list_campaigns(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<CampaignResponse>>, ApiError> {
    require_staff(&actor)?;
    let status = query.status::<RecallRequestStatus>()?;
    let page = state.campaigns.list_campaigns(status, &query.page_request()?).await?;
    Ok(Json(page.map(CampaignResponse::from)))
}

/// Campaigns affecting the calling customer's vehicles
pub async fn my_campaigns(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<CampaignResponse>>, ApiError> {
    let page = state.campaigns.campaigns_for_customer(&actor, &query.page_request()?).await?;
    Ok(Json(page.map(CampaignResponse::from)))
}

pub async fn get_campaign(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, ApiError> {
    require_staff(&actor)?;
    Ok(Json(state.campaigns.get_campaign(id.into()).await?.into()))
}

pub async fn delete_campaign(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.campaigns.delete_campaign(&actor, id.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Approves the campaign and fans out one response per affected vehicle
pub async fn approve_campaign(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    body: Option<Json<NoteRequest>>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    let note = body.and_then(|Json(b)| b.note);
    let outcome = state.campaigns.approve_campaign(&actor, id.into(), note).await?;
    Ok(Json(outcome.into()))
}

pub async fn reject_campaign(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    body: Json<RejectCampaignRequest>,
) -> Result<Json<CampaignResponse>, ApiError> {
    let request = validated(body)?;
    let campaign = state.campaigns.reject_campaign(&actor, id.into(), request.admin_note).await?;
    Ok(Json(campaign.into()))
}

pub async fn campaign_responses(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RecallResponseDto>>, ApiError> {
    let responses = state.responses.responses_for_campaign(&actor, id.into()).await?;
    Ok(Json(responses.into_iter().map(RecallResponseDto::from).collect()))
}
