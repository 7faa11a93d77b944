//! Warranty claim service

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{ClaimId, Clock, InstalledPartId, Page, PageRequest, Timezone, UserId, VehicleId};

use crate::actor::{Actor, Role};
use crate::claim::{WarrantyClaim, WarrantyClaimStatus};
use crate::coverage::{assess_coverage, ClaimOption, CoverageAssessment};
use crate::error::WarrantyError;
use crate::ports::{ClaimFilter, WarrantyStore};
use crate::response::RecallResponseStatus;
use crate::transition::Lifecycle;

const SUBMITTERS: &[Role] = &[Role::ScStaff, Role::ScTechnician, Role::Admin];
const STATUS_EDITORS: &[Role] = &[Role::Admin, Role::EvmStaff, Role::ScStaff];
const REVIEWERS: &[Role] = &[Role::Admin, Role::EvmStaff];
const CASHIERS: &[Role] = &[Role::ScStaff, Role::Admin];
const TECHNICIANS: &[Role] = &[Role::ScTechnician, Role::Admin];

/// Input for opening a claim at a service center
#[derive(Debug, Clone)]
pub struct NewClaim {
    pub vehicle_id: VehicleId,
    pub installed_part_id: InstalledPartId,
    pub description: String,
    pub is_paid_warranty: bool,
    pub warranty_fee: Option<Decimal>,
}

/// Coverage of an installed part together with a suggested paid fee
#[derive(Debug, Clone)]
pub struct CoverageCheck {
    pub assessment: CoverageAssessment,
    pub option: ClaimOption,
    pub estimated_fee: Option<Decimal>,
}

/// Drives warranty claims through their lifecycle
pub struct ClaimService {
    store: Arc<dyn WarrantyStore>,
    clock: Arc<dyn Clock>,
    timezone: Timezone,
}

impl ClaimService {
    pub fn new(store: Arc<dyn WarrantyStore>, clock: Arc<dyn Clock>, timezone: Timezone) -> Self {
        Self { store, clock, timezone }
    }

    /// Checks the warranty of an installed part as of today in the business timezone
    pub async fn check_coverage(
        &self,
        installed_part_id: InstalledPartId,
        estimated_repair_cost: Option<Decimal>,
    ) -> Result<CoverageCheck, WarrantyError> {
        let installed = self.store.get_installed_part(installed_part_id).await?;
        let vehicle = self.store.get_vehicle(installed.vehicle_id).await?;
        let part = self.store.get_part(installed.part_id).await?;

        let today = self.timezone.today(self.clock.now());
        let assessment = assess_coverage(&vehicle, &installed, &part, today);
        let estimated_fee = assessment.estimate_paid_fee(&part, estimated_repair_cost)?;
        Ok(CoverageCheck {
            option: assessment.claim_option(),
            estimated_fee,
            assessment,
        })
    }

    /// Opens a claim after checking the part's warranty coverage
    ///
    /// A covered part opens a free claim in SUBMITTED. An expired part within
    /// its grace period needs the paid option and a positive fee, and opens in
    /// PENDING_PAYMENT. Beyond the grace period no claim can be opened.
    #[instrument(skip(self, actor, request), fields(vehicle_id = %request.vehicle_id))]
    pub async fn submit_claim(&self, actor: &Actor, request: NewClaim) -> Result<WarrantyClaim, WarrantyError> {
        actor.require_any(SUBMITTERS)?;
        if request.description.trim().is_empty() {
            return Err(WarrantyError::validation("description is required"));
        }

        let vehicle = self.store.get_vehicle(request.vehicle_id).await?;
        let installed = self.store.get_installed_part(request.installed_part_id).await?;
        if !installed.is_on(vehicle.id) {
            return Err(WarrantyError::validation(format!(
                "Installed part {} is not installed on vehicle {}",
                installed.id, vehicle.id
            )));
        }
        let part = self.store.get_part(installed.part_id).await?;

        let now = self.clock.now();
        let coverage = assess_coverage(&vehicle, &installed, &part, self.timezone.today(now));

        let claim = match (coverage.claim_option(), request.is_paid_warranty) {
            (ClaimOption::Ineligible, _) => {
                warn!(days_expired = coverage.days_expired(), "Claim refused beyond grace period");
                return Err(WarrantyError::validation(format!(
                    "Warranty expired on {} ({} days ago), beyond the {}-day grace period",
                    coverage.warranty_end_date,
                    coverage.days_expired(),
                    coverage.grace_period_days
                )));
            }
            (ClaimOption::PaidOnly, false) => {
                return Err(WarrantyError::validation(format!(
                    "Warranty expired ({:?}). To create a claim, use the paid warranty option",
                    coverage.status
                )));
            }
            (_, true) => WarrantyClaim::paid(
                vehicle.id,
                installed.id,
                request.description,
                request.warranty_fee.unwrap_or(Decimal::ZERO),
                Some(actor.user_id),
                now,
            )?,
            (ClaimOption::Free, false) => WarrantyClaim::submitted(
                vehicle.id,
                installed.id,
                request.description,
                Some(actor.user_id),
                now,
            ),
        };

        self.store.insert_claim(&claim).await?;
        info!(claim_id = %claim.id, status = %claim.status, paid = claim.is_paid_warranty, "Warranty claim submitted");
        Ok(claim)
    }

    pub async fn get_claim(&self, id: ClaimId) -> Result<WarrantyClaim, WarrantyError> {
        Ok(self.store.get_claim(id).await?)
    }

    pub async fn list_claims(
        &self,
        filter: &ClaimFilter,
        page: &PageRequest,
    ) -> Result<Page<WarrantyClaim>, WarrantyError> {
        Ok(self.store.list_claims(filter, page).await?)
    }

    pub async fn allowed_next_statuses(&self, id: ClaimId) -> Result<Vec<WarrantyClaimStatus>, WarrantyError> {
        let claim = self.store.get_claim(id).await?;
        Ok(claim.status.allowed_next().to_vec())
    }

    /// Moves a claim to any status the transition table allows
    #[instrument(skip(self, actor, note), fields(claim_id = %id, to = %to))]
    pub async fn update_status(
        &self,
        actor: &Actor,
        id: ClaimId,
        to: WarrantyClaimStatus,
        note: Option<String>,
    ) -> Result<WarrantyClaim, WarrantyError> {
        actor.require_any(STATUS_EDITORS)?;
        let mut claim = self.store.get_claim(id).await?;
        let read_version = claim.version;
        let from = claim.status;

        claim.transition_to(to, self.clock.now())?;
        if from == to {
            return Ok(claim);
        }
        if let Some(note) = note {
            claim.append_note("Status note", &note);
        }

        let stored = if to == WarrantyClaimStatus::Completed {
            self.persist_completion(claim, read_version).await?
        } else {
            self.store.update_claim(&claim, read_version).await?
        };
        info!(claim_id = %id, from = %from, to = %to, "Claim status changed");
        Ok(stored)
    }

    /// Manufacturer accepts the claim for review
    #[instrument(skip(self, actor, note), fields(claim_id = %id))]
    pub async fn accept_claim(
        &self,
        actor: &Actor,
        id: ClaimId,
        note: Option<String>,
    ) -> Result<WarrantyClaim, WarrantyError> {
        actor.require_any(REVIEWERS)?;
        let mut claim = self.store.get_claim(id).await?;
        require_status(
            &claim,
            &[WarrantyClaimStatus::Submitted, WarrantyClaimStatus::PaymentConfirmed],
            "accept",
        )?;
        let read_version = claim.version;

        claim.transition_to(WarrantyClaimStatus::ManagerReview, self.clock.now())?;
        if let Some(note) = note {
            claim.append_note("EVM note", &note);
        }

        let stored = self.store.update_claim(&claim, read_version).await?;
        info!(claim_id = %id, "Claim accepted for review");
        Ok(stored)
    }

    /// Rejects a claim from any non-final status
    #[instrument(skip(self, actor, reason), fields(claim_id = %id))]
    pub async fn reject_claim(&self, actor: &Actor, id: ClaimId, reason: String) -> Result<WarrantyClaim, WarrantyError> {
        actor.require_any(REVIEWERS)?;
        if reason.trim().is_empty() {
            return Err(WarrantyError::validation("rejection reason is required"));
        }

        let mut claim = self.store.get_claim(id).await?;
        if claim.is_final() {
            return Err(WarrantyError::conflict(format!(
                "Cannot reject claim {} in final status {}",
                id, claim.status
            )));
        }
        let read_version = claim.version;

        claim.transition_to(WarrantyClaimStatus::Rejected, self.clock.now())?;
        claim.append_note("Rejection reason", &reason);

        let stored = self.store.update_claim(&claim, read_version).await?;
        warn!(claim_id = %id, "Claim rejected");
        Ok(stored)
    }

    /// Records the customer's payment for a paid warranty claim
    #[instrument(skip(self, actor), fields(claim_id = %id))]
    pub async fn confirm_payment(&self, actor: &Actor, id: ClaimId) -> Result<WarrantyClaim, WarrantyError> {
        actor.require_any(CASHIERS)?;
        let mut claim = self.store.get_claim(id).await?;
        require_status(&claim, &[WarrantyClaimStatus::PendingPayment], "confirm payment for")?;
        let read_version = claim.version;

        claim.transition_to(WarrantyClaimStatus::PaymentConfirmed, self.clock.now())?;

        let stored = self.store.update_claim(&claim, read_version).await?;
        info!(claim_id = %id, fee = ?stored.warranty_fee, "Warranty payment confirmed");
        Ok(stored)
    }

    /// A technician picks up a reviewed claim
    #[instrument(skip(self, actor), fields(claim_id = %id))]
    pub async fn start_processing(
        &self,
        actor: &Actor,
        id: ClaimId,
        technician: Option<UserId>,
    ) -> Result<WarrantyClaim, WarrantyError> {
        actor.require_any(TECHNICIANS)?;
        let mut claim = self.store.get_claim(id).await?;
        require_status(&claim, &[WarrantyClaimStatus::ManagerReview], "start processing")?;
        let read_version = claim.version;

        claim.transition_to(WarrantyClaimStatus::Processing, self.clock.now())?;
        claim.assigned_to = Some(technician.unwrap_or(actor.user_id));

        let stored = self.store.update_claim(&claim, read_version).await?;
        info!(claim_id = %id, assigned_to = ?stored.assigned_to, "Claim processing started");
        Ok(stored)
    }

    /// Finishes the repair. A linked recall response is completed in the same unit.
    #[instrument(skip(self, actor, note), fields(claim_id = %id))]
    pub async fn complete_claim(
        &self,
        actor: &Actor,
        id: ClaimId,
        note: Option<String>,
    ) -> Result<WarrantyClaim, WarrantyError> {
        actor.require_any(TECHNICIANS)?;
        let mut claim = self.store.get_claim(id).await?;
        require_status(&claim, &[WarrantyClaimStatus::Processing], "complete")?;
        let read_version = claim.version;

        claim.transition_to(WarrantyClaimStatus::Completed, self.clock.now())?;
        if let Some(note) = note {
            claim.append_note("Completion note", &note);
        }

        let stored = self.persist_completion(claim, read_version).await?;
        info!(claim_id = %id, "Claim completed");
        Ok(stored)
    }

    /// Deletes a claim. Service center staff may only delete claims that
    /// nobody has reviewed yet; admins may delete any claim.
    #[instrument(skip(self, actor), fields(claim_id = %id))]
    pub async fn delete_claim(&self, actor: &Actor, id: ClaimId) -> Result<(), WarrantyError> {
        let claim = self.store.get_claim(id).await?;

        actor.require_any(&[Role::Admin, Role::ScStaff])?;
        if !actor.has_role(Role::Admin) {
            require_status(
                &claim,
                &[WarrantyClaimStatus::Submitted, WarrantyClaimStatus::PendingPayment],
                "delete",
            )?;
        }

        if claim.is_from_recall() {
            return Err(WarrantyError::conflict(format!(
                "Claim {} was opened by a recall response and cannot be deleted",
                id
            )));
        }

        self.store.delete_claim(id, claim.version).await?;
        warn!(claim_id = %id, deleted_by = %actor.user_id, "Claim deleted");
        Ok(())
    }

    async fn persist_completion(&self, claim: WarrantyClaim, read_version: i64) -> Result<WarrantyClaim, WarrantyError> {
        let mut linked = None;
        if let Some(mut response) = self.store.response_for_claim(claim.id).await? {
            if response.status == RecallResponseStatus::InProgress {
                let response_version = response.version;
                response.complete(self.clock.now())?;
                linked = Some((response, response_version));
            }
        }

        let stored = self
            .store
            .commit_claim_completion(&claim, read_version, linked.as_ref().map(|(r, v)| (r, *v)))
            .await?;
        if let Some((response, _)) = linked {
            info!(response_id = %response.id, "Recall response completed with its claim");
        }
        Ok(stored)
    }
}

fn require_status(claim: &WarrantyClaim, expected: &[WarrantyClaimStatus], action: &str) -> Result<(), WarrantyError> {
    if expected.contains(&claim.status) {
        Ok(())
    } else {
        let names: Vec<&str> = expected.iter().map(|s| s.as_str()).collect();
        Err(WarrantyError::conflict(format!(
            "Cannot {} claim {} in status {} (requires {})",
            action,
            claim.id,
            claim.status,
            names.join(" or ")
        )))
    }
}
