//! Warranty claim DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_warranty::{ClaimOption, CoverageCheck, WarrantyClaim, WarrantyClaimStatus, WarrantyStatus};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClaimRequest {
    pub vehicle_id: Uuid,
    pub installed_part_id: Uuid,
    #[validate(length(min = 1, max = 4000, message = "description is required"))]
    pub description: String,
    #[serde(default)]
    pub is_paid_warranty: bool,
    pub warranty_fee: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RejectClaimRequest {
    #[validate(length(min = 1, max = 2000, message = "reason is required"))]
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartProcessingRequest {
    /// Defaults to the caller
    pub technician_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageQuery {
    pub estimated_repair_cost: Option<Decimal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub id: Uuid,
    pub status: WarrantyClaimStatus,
    pub description: String,
    pub claim_date: DateTime<Utc>,
    pub resolution_date: Option<DateTime<Utc>>,
    pub vehicle_id: Uuid,
    pub installed_part_id: Uuid,
    pub recall_response_id: Option<Uuid>,
    pub is_paid_warranty: bool,
    pub warranty_fee: Option<Decimal>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub version: i64,
}

impl From<WarrantyClaim> for ClaimResponse {
    fn from(claim: WarrantyClaim) -> Self {
        Self {
            id: claim.id.into(),
            status: claim.status,
            description: claim.description,
            claim_date: claim.claim_date,
            resolution_date: claim.resolution_date,
            vehicle_id: claim.vehicle_id.into(),
            installed_part_id: claim.installed_part_id.into(),
            recall_response_id: claim.recall_response_id.map(Uuid::from),
            is_paid_warranty: claim.is_paid_warranty,
            warranty_fee: claim.warranty_fee,
            assigned_to: claim.assigned_to.map(Uuid::from),
            created_by: claim.created_by.map(Uuid::from),
            version: claim.version,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedStatusesResponse {
    pub current: WarrantyClaimStatus,
    pub allowed: Vec<WarrantyClaimStatus>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageResponse {
    pub warranty_status: WarrantyStatus,
    pub claim_option: ClaimOption,
    pub warranty_end_date: NaiveDate,
    pub days_remaining: i64,
    pub days_expired: i64,
    pub mileage_limit_km: i64,
    pub mileage_remaining_km: i64,
    pub grace_period_days: i64,
    pub estimated_fee: Option<Decimal>,
}

impl From<CoverageCheck> for CoverageResponse {
    fn from(check: CoverageCheck) -> Self {
        Self {
            days_expired: check.assessment.days_expired(),
            warranty_status: check.assessment.status,
            claim_option: check.option,
            warranty_end_date: check.assessment.warranty_end_date,
            days_remaining: check.assessment.days_remaining,
            mileage_limit_km: check.assessment.mileage_limit_km,
            mileage_remaining_km: check.assessment.mileage_remaining_km,
            grace_period_days: check.assessment.grace_period_days,
            estimated_fee: check.estimated_fee,
        }
    }
}
