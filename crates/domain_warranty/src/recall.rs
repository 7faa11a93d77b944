//! Recall campaign aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use core_kernel::{PartId, RecallRequestId, UserId, VehicleId};
use crate::error::WarrantyError;
use crate::response::RecallResponse;
use crate::transition::{status_enum, InvalidTransition, Lifecycle};

status_enum! {
    /// Recall campaign status
    pub enum RecallRequestStatus {
        PendingAdminApproval => "PENDING_ADMIN_APPROVAL",
        ApprovedByAdmin => "APPROVED_BY_ADMIN",
        RejectedByAdmin => "REJECTED_BY_ADMIN",
        /// Responses exist and customers are being asked
        WaitingCustomerConfirm => "WAITING_CUSTOMER_CONFIRM",
        /// At least one customer accepted and a claim was opened
        ClaimCreated => "CLAIM_CREATED",
    }
}

impl Lifecycle for RecallRequestStatus {
    const ENTITY: &'static str = "RecallRequest";

    fn all() -> &'static [Self] {
        Self::ALL
    }

    fn allowed_next(self) -> &'static [Self] {
        use RecallRequestStatus::*;
        match self {
            PendingAdminApproval => &[ApprovedByAdmin, RejectedByAdmin],
            ApprovedByAdmin => &[WaitingCustomerConfirm],
            WaitingCustomerConfirm => &[ClaimCreated],
            ClaimCreated | RejectedByAdmin => &[],
        }
    }

    fn as_wire(&self) -> &'static str {
        self.as_str()
    }
}

/// A manufacturer-initiated recall of one part type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecallRequest {
    pub id: RecallRequestId,
    /// The affected part type
    pub part_id: PartId,
    pub status: RecallRequestStatus,
    pub reason: String,
    pub admin_note: Option<String>,
    pub customer_note: Option<String>,
    pub created_by: UserId,
    pub approved_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl RecallRequest {
    pub fn new(part_id: PartId, reason: impl Into<String>, created_by: UserId, at: DateTime<Utc>) -> Self {
        Self {
            id: RecallRequestId::new_v7(),
            part_id,
            status: RecallRequestStatus::PendingAdminApproval,
            reason: reason.into(),
            admin_note: None,
            customer_note: None,
            created_by,
            approved_by: None,
            created_at: at,
            updated_at: at,
            version: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RecallRequestStatus::PendingAdminApproval
    }

    fn ensure_pending(&self) -> Result<(), WarrantyError> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(WarrantyError::conflict(format!(
                "Recall request {} was already processed (status {})",
                self.id, self.status
            )))
        }
    }

    /// Admin approval. A second decision on the same campaign is a conflict.
    pub fn approve(&mut self, admin: UserId, note: Option<String>, at: DateTime<Utc>) -> Result<(), WarrantyError> {
        self.ensure_pending()?;
        self.apply(RecallRequestStatus::ApprovedByAdmin, at)?;
        self.approved_by = Some(admin);
        self.admin_note = note;
        Ok(())
    }

    pub fn reject(&mut self, admin: UserId, note: String, at: DateTime<Utc>) -> Result<(), WarrantyError> {
        self.ensure_pending()?;
        self.apply(RecallRequestStatus::RejectedByAdmin, at)?;
        self.approved_by = Some(admin);
        self.admin_note = Some(note);
        Ok(())
    }

    /// Called once the per-vehicle responses exist
    pub fn begin_customer_confirmation(&mut self, at: DateTime<Utc>) -> Result<(), InvalidTransition<RecallRequestStatus>> {
        self.apply(RecallRequestStatus::WaitingCustomerConfirm, at)
    }

    /// Records the first accepted response. Returns false when already recorded.
    pub fn mark_claim_created(&mut self, at: DateTime<Utc>) -> bool {
        if self.status != RecallRequestStatus::WaitingCustomerConfirm {
            return false;
        }
        self.status = RecallRequestStatus::ClaimCreated;
        self.updated_at = at;
        true
    }

    /// Builds one PENDING response per distinct affected vehicle, ordered by vehicle id
    pub fn fan_out<I>(&self, vehicles: I, at: DateTime<Utc>) -> Vec<RecallResponse>
    where
        I: IntoIterator<Item = VehicleId>,
    {
        let distinct: BTreeSet<VehicleId> = vehicles.into_iter().collect();
        distinct
            .into_iter()
            .map(|vehicle_id| RecallResponse::pending(self.id, vehicle_id, at))
            .collect()
    }

    fn apply(&mut self, to: RecallRequestStatus, at: DateTime<Utc>) -> Result<(), InvalidTransition<RecallRequestStatus>> {
        RecallRequestStatus::validate_transition(self.status, to)?;
        self.status = to;
        self.updated_at = at;
        Ok(())
    }
}
