//! Warranty claim aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, InstalledPartId, RecallResponseId, UserId, VehicleId};
use crate::error::WarrantyError;
use crate::transition::{status_enum, InvalidTransition, Lifecycle};

status_enum! {
    /// Claim status
    ///
    /// `SC_REVIEW` is accepted as an alias of `MANAGER_REVIEW` when parsing.
    pub enum WarrantyClaimStatus {
        /// Opened by a service center or a recall acceptance
        Submitted => "SUBMITTED",
        /// Paid warranty waiting for the customer's payment
        PendingPayment => "PENDING_PAYMENT",
        PaymentConfirmed => "PAYMENT_CONFIRMED",
        /// Accepted by the manufacturer, waiting for a technician
        ManagerReview => "MANAGER_REVIEW" | "SC_REVIEW",
        Processing => "PROCESSING",
        Completed => "COMPLETED",
        Rejected => "REJECTED",
    }
}

impl Lifecycle for WarrantyClaimStatus {
    const ENTITY: &'static str = "WarrantyClaim";

    fn all() -> &'static [Self] {
        Self::ALL
    }

    fn allowed_next(self) -> &'static [Self] {
        use WarrantyClaimStatus::*;
        match self {
            Submitted => &[ManagerReview, Rejected],
            PendingPayment => &[PaymentConfirmed, Rejected],
            PaymentConfirmed => &[ManagerReview, Rejected],
            ManagerReview => &[Processing, Rejected],
            Processing => &[Completed, Rejected],
            Completed | Rejected => &[],
        }
    }

    fn as_wire(&self) -> &'static str {
        self.as_str()
    }
}

/// A request to repair or replace a part under warranty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarrantyClaim {
    pub id: ClaimId,
    pub status: WarrantyClaimStatus,
    pub description: String,
    pub claim_date: DateTime<Utc>,
    /// Set when the claim reaches COMPLETED or REJECTED
    pub resolution_date: Option<DateTime<Utc>>,
    pub installed_part_id: InstalledPartId,
    pub vehicle_id: VehicleId,
    /// The recall response this claim was opened for
    pub recall_response_id: Option<RecallResponseId>,
    pub is_paid_warranty: bool,
    pub warranty_fee: Option<Decimal>,
    /// Technician handling the repair
    pub assigned_to: Option<UserId>,
    pub created_by: Option<UserId>,
    pub version: i64,
}

impl WarrantyClaim {
    /// Opens a free warranty claim
    pub fn submitted(
        vehicle_id: VehicleId,
        installed_part_id: InstalledPartId,
        description: impl Into<String>,
        created_by: Option<UserId>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ClaimId::new_v7(),
            status: WarrantyClaimStatus::Submitted,
            description: description.into(),
            claim_date: at,
            resolution_date: None,
            installed_part_id,
            vehicle_id,
            recall_response_id: None,
            is_paid_warranty: false,
            warranty_fee: None,
            assigned_to: None,
            created_by,
            version: 0,
        }
    }

    /// Opens a paid warranty claim, which waits for payment before review
    pub fn paid(
        vehicle_id: VehicleId,
        installed_part_id: InstalledPartId,
        description: impl Into<String>,
        fee: Decimal,
        created_by: Option<UserId>,
        at: DateTime<Utc>,
    ) -> Result<Self, WarrantyError> {
        if fee <= Decimal::ZERO {
            return Err(WarrantyError::validation(
                "Paid warranty claim must have warranty fee > 0",
            ));
        }

        let mut claim = Self::submitted(vehicle_id, installed_part_id, description, created_by, at);
        claim.status = WarrantyClaimStatus::PendingPayment;
        claim.is_paid_warranty = true;
        claim.warranty_fee = Some(fee);
        Ok(claim)
    }

    /// Opens the claim created when a customer accepts a recall
    pub fn for_recall(
        recall_response_id: RecallResponseId,
        vehicle_id: VehicleId,
        installed_part_id: InstalledPartId,
        recall_reason: &str,
        at: DateTime<Utc>,
    ) -> Self {
        let mut claim = Self::submitted(
            vehicle_id,
            installed_part_id,
            format!("RECALL: {}", recall_reason),
            None,
            at,
        );
        claim.recall_response_id = Some(recall_response_id);
        claim
    }

    /// Moves the claim through the transition table
    ///
    /// A self-transition changes nothing. Reaching a final status stamps the
    /// resolution date.
    pub fn transition_to(
        &mut self,
        to: WarrantyClaimStatus,
        at: DateTime<Utc>,
    ) -> Result<(), InvalidTransition<WarrantyClaimStatus>> {
        WarrantyClaimStatus::validate_transition(self.status, to)?;
        if self.status == to {
            return Ok(());
        }

        self.status = to;
        if to.is_final() {
            self.resolution_date = Some(at);
        }
        Ok(())
    }

    /// Appends a labelled line to the description
    pub fn append_note(&mut self, label: &str, note: &str) {
        let note = note.trim();
        if !note.is_empty() {
            self.description.push_str(&format!("\n[{}]: {}", label, note));
        }
    }

    pub fn is_final(&self) -> bool {
        self.status.is_final()
    }

    pub fn is_from_recall(&self) -> bool {
        self.recall_response_id.is_some()
    }
}
