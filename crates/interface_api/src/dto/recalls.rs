//! Recall campaign and recall response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_warranty::{
    ApprovalOutcome, RecallRequest, RecallRequestStatus, RecallResponse, RecallResponseStatus,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub part_id: Uuid,
    #[validate(length(min = 1, max = 2000, message = "reason is required"))]
    pub reason: String,
    #[validate(length(max = 2000))]
    pub customer_note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RejectCampaignRequest {
    #[validate(length(min = 1, max = 2000, message = "admin note is required"))]
    pub admin_note: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRecallRequest {
    pub accepted: bool,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignResponse {
    pub id: Uuid,
    pub part_id: Uuid,
    pub status: RecallRequestStatus,
    pub reason: String,
    pub admin_note: Option<String>,
    pub customer_note: Option<String>,
    pub created_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl From<RecallRequest> for CampaignResponse {
    fn from(campaign: RecallRequest) -> Self {
        Self {
            id: campaign.id.into(),
            part_id: campaign.part_id.into(),
            status: campaign.status,
            reason: campaign.reason,
            admin_note: campaign.admin_note,
            customer_note: campaign.customer_note,
            created_by: campaign.created_by.into(),
            approved_by: campaign.approved_by.map(Uuid::from),
            created_at: campaign.created_at,
            updated_at: campaign.updated_at,
            version: campaign.version,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
    pub campaign: CampaignResponse,
    pub responses_created: usize,
}

impl From<ApprovalOutcome> for ApprovalResponse {
    fn from(outcome: ApprovalOutcome) -> Self {
        Self {
            campaign: outcome.campaign.into(),
            responses_created: outcome.responses_created,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecallResponseDto {
    pub id: Uuid,
    pub recall_request_id: Uuid,
    pub vehicle_id: Uuid,
    pub status: RecallResponseStatus,
    pub customer_note: Option<String>,
    pub warranty_claim_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl From<RecallResponse> for RecallResponseDto {
    fn from(response: RecallResponse) -> Self {
        Self {
            id: response.id.into(),
            recall_request_id: response.recall_request_id.into(),
            vehicle_id: response.vehicle_id.into(),
            status: response.status,
            customer_note: response.customer_note,
            warranty_claim_id: response.warranty_claim_id.map(Uuid::from),
            created_at: response.created_at,
            responded_at: response.responded_at,
            completed_at: response.completed_at,
            version: response.version,
        }
    }
}
