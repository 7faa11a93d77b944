//! Warranty Store Port
//!
//! The `WarrantyStore` trait is everything the lifecycle services need from
//! persistence. Two adapters implement it:
//!
//! - **Postgres Adapter**: `infra_db::PostgresWarrantyStore`
//! - **In-memory Adapter**: [`crate::memory::InMemoryWarrantyStore`] for tests and demos
//!
//! # Concurrency
//!
//! Every update takes the version the caller read. The store writes
//! `expected_version + 1` only when the stored version still equals
//! `expected_version`; otherwise it fails with `PortError::Conflict` and
//! writes nothing. Two staff members acting on the same claim therefore
//! cannot both succeed.
//!
//! # Multi-entity writes
//!
//! Operations that touch more than one aggregate are single `commit_*`
//! calls which apply every change or none:
//!
//! ```rust,ignore
//! let accepted = store.commit_acceptance(&response, read_version, &claim).await?;
//! ```

use async_trait::async_trait;

use core_kernel::{
    ClaimId, CustomerId, DomainPort, FeedbackId, HealthCheckable, InstalledPartId, Page, PageRequest,
    PartId, PartRequestId, PortError, RecallRequestId, RecallResponseId, UserId, VehicleId, WorkLogId,
};

use crate::claim::{WarrantyClaim, WarrantyClaimStatus};
use crate::feedback::{Feedback, FeedbackSummary, Rating};
use crate::fleet::{InstalledPart, Part, Vehicle};
use crate::part_request::{PartRequest, PartRequestStatus};
use crate::recall::{RecallRequest, RecallRequestStatus};
use crate::response::{RecallResponse, RecallResponseStatus};
use crate::work_log::WorkLog;

/// Query parameters for listing claims
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimFilter {
    pub status: Option<WarrantyClaimStatus>,
    pub vehicle_id: Option<VehicleId>,
    pub assigned_to: Option<UserId>,
}

impl ClaimFilter {
    pub fn by_status(status: WarrantyClaimStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn matches(&self, claim: &WarrantyClaim) -> bool {
        self.status.map_or(true, |s| claim.status == s)
            && self.vehicle_id.map_or(true, |v| claim.vehicle_id == v)
            && self.assigned_to.map_or(true, |u| claim.assigned_to == Some(u))
    }
}

/// Query parameters for listing part requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartRequestFilter {
    pub status: Option<PartRequestStatus>,
    pub requested_by: Option<UserId>,
    pub warranty_claim_id: Option<ClaimId>,
}

impl PartRequestFilter {
    pub fn matches(&self, request: &PartRequest) -> bool {
        self.status.map_or(true, |s| request.status == s)
            && self.requested_by.map_or(true, |u| request.requested_by == u)
            && self.warranty_claim_id.map_or(true, |c| request.warranty_claim_id == c)
    }
}

/// Query parameters for listing feedback
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackFilter {
    pub customer_id: Option<CustomerId>,
    pub rating: Option<Rating>,
    pub min_rating: Option<Rating>,
}

impl FeedbackFilter {
    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, feedback: &Feedback) -> bool {
        self.customer_id.map_or(true, |c| feedback.customer_id == c)
            && self.rating.map_or(true, |r| feedback.rating == r)
            && self.min_rating.map_or(true, |r| feedback.rating >= r)
    }
}

/// Query parameters for listing work logs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkLogFilter {
    pub warranty_claim_id: Option<ClaimId>,
    pub technician: Option<UserId>,
}

impl WorkLogFilter {
    pub fn matches(&self, log: &WorkLog) -> bool {
        self.warranty_claim_id.map_or(true, |c| log.warranty_claim_id == c)
            && self.technician.map_or(true, |u| log.technician == u)
    }
}

/// Declares a whitelist of sortable fields.
///
/// Each field maps to a SQL column and accepts its camelCase and snake_case names.
macro_rules! sort_fields {
    ($name:ident, default = $default:ident, { $($variant:ident => $column:literal [$($alias:literal),+]),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Parses the `sortBy` query value; `None` selects the default field
            pub fn parse(sort_by: Option<&str>) -> Result<Self, PortError> {
                match sort_by.map(str::trim) {
                    None | Some("") => Ok($name::$default),
                    $( Some($($alias)|+) => Ok($name::$variant), )+
                    Some(other) => Err(PortError::validation_field(
                        format!("Cannot sort by '{}'", other),
                        "sortBy",
                    )),
                }
            }

            pub fn column(&self) -> &'static str {
                match self {
                    $( $name::$variant => $column ),+
                }
            }
        }
    };
}

sort_fields!(ClaimSort, default = ClaimDate, {
    ClaimDate => "claim_date" ["claimDate", "claim_date"],
    Status => "status" ["status"],
    ResolutionDate => "resolution_date" ["resolutionDate", "resolution_date"],
});

sort_fields!(CampaignSort, default = CreatedAt, {
    CreatedAt => "created_at" ["createdAt", "created_at", "createdDate"],
    UpdatedAt => "updated_at" ["updatedAt", "updated_at"],
    Status => "status" ["status"],
});

sort_fields!(ResponseSort, default = CreatedAt, {
    CreatedAt => "created_at" ["createdAt", "created_at"],
    RespondedAt => "responded_at" ["respondedAt", "responded_at"],
    Status => "status" ["status"],
});

sort_fields!(PartRequestSort, default = RequestDate, {
    RequestDate => "request_date" ["requestDate", "request_date"],
    Status => "status" ["status"],
    Quantity => "quantity" ["quantity"],
});

sort_fields!(FeedbackSort, default = CreatedAt, {
    CreatedAt => "created_at" ["createdAt", "created_at"],
    Rating => "rating" ["rating"],
});

sort_fields!(WorkLogSort, default = StartTime, {
    StartTime => "start_time" ["startTime", "start_time"],
    EndTime => "end_time" ["endTime", "end_time"],
});

/// The persistence port for the warranty lifecycle
#[async_trait]
pub trait WarrantyStore: DomainPort + HealthCheckable {
    // ========================================================================
    // Fleet
    // ========================================================================

    async fn get_vehicle(&self, id: VehicleId) -> Result<Vehicle, PortError>;

    /// Inserts or replaces a vehicle
    async fn save_vehicle(&self, vehicle: &Vehicle) -> Result<(), PortError>;

    async fn get_part(&self, id: PartId) -> Result<Part, PortError>;

    async fn save_part(&self, part: &Part) -> Result<(), PortError>;

    async fn get_installed_part(&self, id: InstalledPartId) -> Result<InstalledPart, PortError>;

    async fn save_installed_part(&self, installed: &InstalledPart) -> Result<(), PortError>;

    /// Every installation of a part type, across all vehicles
    async fn find_installations_of_part(&self, part_id: PartId) -> Result<Vec<InstalledPart>, PortError>;

    /// The installation of a part type on one vehicle, if any
    async fn find_installation_on_vehicle(
        &self,
        part_id: PartId,
        vehicle_id: VehicleId,
    ) -> Result<Option<InstalledPart>, PortError>;

    // ========================================================================
    // Warranty claims
    // ========================================================================

    async fn get_claim(&self, id: ClaimId) -> Result<WarrantyClaim, PortError>;

    async fn list_claims(
        &self,
        filter: &ClaimFilter,
        page: &PageRequest,
    ) -> Result<Page<WarrantyClaim>, PortError>;

    async fn insert_claim(&self, claim: &WarrantyClaim) -> Result<(), PortError>;

    /// Returns the stored claim carrying its new version
    async fn update_claim(
        &self,
        claim: &WarrantyClaim,
        expected_version: i64,
    ) -> Result<WarrantyClaim, PortError>;

    /// Fails with a conflict while part requests, feedback, work logs, or a
    /// recall response still reference the claim
    async fn delete_claim(&self, id: ClaimId, expected_version: i64) -> Result<(), PortError>;

    /// Updates the claim and, when given, its recall response in one unit
    async fn commit_claim_completion(
        &self,
        claim: &WarrantyClaim,
        expected_version: i64,
        response: Option<(&RecallResponse, i64)>,
    ) -> Result<WarrantyClaim, PortError>;

    // ========================================================================
    // Recall campaigns
    // ========================================================================

    async fn get_campaign(&self, id: RecallRequestId) -> Result<RecallRequest, PortError>;

    async fn list_campaigns(
        &self,
        status: Option<RecallRequestStatus>,
        page: &PageRequest,
    ) -> Result<Page<RecallRequest>, PortError>;

    /// Campaigns with at least one response for a vehicle the customer owns
    async fn list_campaigns_for_customer(
        &self,
        customer_id: CustomerId,
        page: &PageRequest,
    ) -> Result<Page<RecallRequest>, PortError>;

    async fn insert_campaign(&self, campaign: &RecallRequest) -> Result<(), PortError>;

    async fn update_campaign(
        &self,
        campaign: &RecallRequest,
        expected_version: i64,
    ) -> Result<RecallRequest, PortError>;

    async fn delete_campaign(&self, id: RecallRequestId, expected_version: i64) -> Result<(), PortError>;

    /// Updates the campaign and inserts its responses in one unit
    ///
    /// A response for a (campaign, vehicle) pair that already exists is a conflict.
    async fn commit_fan_out(
        &self,
        campaign: &RecallRequest,
        expected_version: i64,
        responses: &[RecallResponse],
    ) -> Result<RecallRequest, PortError>;

    // ========================================================================
    // Recall responses
    // ========================================================================

    async fn get_response(&self, id: RecallResponseId) -> Result<RecallResponse, PortError>;

    async fn responses_for_campaign(&self, campaign_id: RecallRequestId) -> Result<Vec<RecallResponse>, PortError>;

    async fn responses_for_customer(
        &self,
        customer_id: CustomerId,
        page: &PageRequest,
    ) -> Result<Page<RecallResponse>, PortError>;

    async fn response_for_claim(&self, claim_id: ClaimId) -> Result<Option<RecallResponse>, PortError>;

    async fn list_responses(
        &self,
        status: Option<RecallResponseStatus>,
        page: &PageRequest,
    ) -> Result<Page<RecallResponse>, PortError>;

    async fn update_response(
        &self,
        response: &RecallResponse,
        expected_version: i64,
    ) -> Result<RecallResponse, PortError>;

    /// Inserts the recall claim, updates the response, and moves the campaign
    /// from WAITING_CUSTOMER_CONFIRM to CLAIM_CREATED, in one unit
    async fn commit_acceptance(
        &self,
        response: &RecallResponse,
        expected_version: i64,
        claim: &WarrantyClaim,
    ) -> Result<RecallResponse, PortError>;

    // ========================================================================
    // Part requests
    // ========================================================================

    async fn get_part_request(&self, id: PartRequestId) -> Result<PartRequest, PortError>;

    async fn list_part_requests(
        &self,
        filter: &PartRequestFilter,
        page: &PageRequest,
    ) -> Result<Page<PartRequest>, PortError>;

    async fn insert_part_request(&self, request: &PartRequest) -> Result<(), PortError>;

    async fn update_part_request(
        &self,
        request: &PartRequest,
        expected_version: i64,
    ) -> Result<PartRequest, PortError>;

    async fn delete_part_request(&self, id: PartRequestId, expected_version: i64) -> Result<(), PortError>;

    // ========================================================================
    // Feedback
    // ========================================================================

    async fn get_feedback(&self, id: FeedbackId) -> Result<Feedback, PortError>;

    async fn feedback_for_claim(&self, claim_id: ClaimId) -> Result<Option<Feedback>, PortError>;

    async fn list_feedback(
        &self,
        filter: &FeedbackFilter,
        page: &PageRequest,
    ) -> Result<Page<Feedback>, PortError>;

    /// A second feedback for the same claim is a conflict
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), PortError>;

    async fn update_feedback(&self, feedback: &Feedback, expected_version: i64) -> Result<Feedback, PortError>;

    async fn delete_feedback(&self, id: FeedbackId, expected_version: i64) -> Result<(), PortError>;

    async fn feedback_summary(&self) -> Result<FeedbackSummary, PortError>;

    // ========================================================================
    // Work logs
    // ========================================================================

    async fn get_work_log(&self, id: WorkLogId) -> Result<WorkLog, PortError>;

    async fn list_work_logs(
        &self,
        filter: &WorkLogFilter,
        page: &PageRequest,
    ) -> Result<Page<WorkLog>, PortError>;

    async fn insert_work_log(&self, log: &WorkLog) -> Result<(), PortError>;

    async fn update_work_log(&self, log: &WorkLog, expected_version: i64) -> Result<WorkLog, PortError>;

    async fn delete_work_log(&self, id: WorkLogId, expected_version: i64) -> Result<(), PortError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_field_aliases() {
        assert_eq!(ClaimSort::parse(None).unwrap(), ClaimSort::ClaimDate);
        assert_eq!(ClaimSort::parse(Some("claimDate")).unwrap(), ClaimSort::ClaimDate);
        assert_eq!(ClaimSort::parse(Some("resolution_date")).unwrap().column(), "resolution_date");
        assert_eq!(PartRequestSort::parse(Some("")).unwrap(), PartRequestSort::RequestDate);
        assert_eq!(WorkLogSort::parse(Some("endTime")).unwrap().column(), "end_time");
        assert_eq!(FeedbackSort::parse(None).unwrap(), FeedbackSort::CreatedAt);
    }

    #[test]
    fn test_unknown_sort_field_is_validation_error() {
        let err = CampaignSort::parse(Some("reason; DROP TABLE recall_requests")).unwrap_err();
        assert!(matches!(err, PortError::Validation { field: Some(ref f), .. } if f == "sortBy"));
    }
}
