//! Part request DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_warranty::{PartRequest, PartRequestStatus};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePartRequestRequest {
    pub warranty_claim_id: Uuid,
    pub faulty_part_id: Uuid,
    #[validate(range(min = 1, max = 1000, message = "quantity must be between 1 and 1000"))]
    pub quantity: u32,
    #[validate(length(min = 1, max = 2000, message = "issue description is required"))]
    pub issue_description: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovePartRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RejectPartRequest {
    #[validate(length(min = 1, max = 2000, message = "rejection reason is required"))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShipPartRequest {
    #[validate(length(min = 1, max = 100, message = "tracking number is required"))]
    pub tracking_number: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartRequestResponse {
    pub id: Uuid,
    pub warranty_claim_id: Uuid,
    pub faulty_part_id: Uuid,
    pub quantity: u32,
    pub issue_description: String,
    pub status: PartRequestStatus,
    pub requested_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub request_date: DateTime<Utc>,
    pub approved_date: Option<DateTime<Utc>>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub version: i64,
}

impl From<PartRequest> for PartRequestResponse {
    fn from(request: PartRequest) -> Self {
        Self {
            id: request.id.into(),
            warranty_claim_id: request.warranty_claim_id.into(),
            faulty_part_id: request.faulty_part_id.into(),
            quantity: request.quantity,
            issue_description: request.issue_description,
            status: request.status,
            requested_by: request.requested_by.into(),
            approved_by: request.approved_by.map(Uuid::from),
            request_date: request.request_date,
            approved_date: request.approved_date,
            shipped_date: request.shipped_date,
            delivered_date: request.delivered_date,
            rejection_reason: request.rejection_reason,
            tracking_number: request.tracking_number,
            notes: request.notes,
            version: request.version,
        }
    }
}
