//! Per-vehicle recall response

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, RecallRequestId, RecallResponseId, VehicleId};
use crate::error::WarrantyError;
use crate::transition::{status_enum, Lifecycle};

status_enum! {
    /// Recall response status
    pub enum RecallResponseStatus {
        Pending => "PENDING",
        Accepted => "ACCEPTED",
        Declined => "DECLINED",
        /// A warranty claim is open for the vehicle
        InProgress => "IN_PROGRESS",
        Completed => "COMPLETED",
    }
}

impl Lifecycle for RecallResponseStatus {
    const ENTITY: &'static str = "RecallResponse";

    fn all() -> &'static [Self] {
        Self::ALL
    }

    fn allowed_next(self) -> &'static [Self] {
        use RecallResponseStatus::*;
        match self {
            Pending => &[Accepted, Declined],
            Accepted => &[InProgress],
            InProgress => &[Completed],
            Declined | Completed => &[],
        }
    }

    fn as_wire(&self) -> &'static str {
        self.as_str()
    }
}

/// Tracks one vehicle's outcome for a recall campaign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecallResponse {
    pub id: RecallResponseId,
    pub recall_request_id: RecallRequestId,
    pub vehicle_id: VehicleId,
    pub status: RecallResponseStatus,
    pub customer_note: Option<String>,
    /// Present exactly when the status is IN_PROGRESS or COMPLETED
    pub warranty_claim_id: Option<ClaimId>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl RecallResponse {
    pub fn pending(recall_request_id: RecallRequestId, vehicle_id: VehicleId, at: DateTime<Utc>) -> Self {
        Self {
            id: RecallResponseId::new_v7(),
            recall_request_id,
            vehicle_id,
            status: RecallResponseStatus::Pending,
            customer_note: None,
            warranty_claim_id: None,
            created_at: at,
            responded_at: None,
            completed_at: None,
            version: 0,
        }
    }

    /// Fails with a conflict unless the customer has not answered yet
    pub fn ensure_pending(&self) -> Result<(), WarrantyError> {
        if self.status == RecallResponseStatus::Pending {
            Ok(())
        } else {
            Err(WarrantyError::conflict(format!(
                "Recall response {} was already answered (status {})",
                self.id, self.status
            )))
        }
    }

    /// Customer accepts: ACCEPTED, then IN_PROGRESS linked to the new claim
    pub fn accept(&mut self, note: Option<String>, claim_id: ClaimId, at: DateTime<Utc>) -> Result<(), WarrantyError> {
        self.ensure_pending()?;
        self.move_to(RecallResponseStatus::Accepted)?;
        self.customer_note = note;
        self.responded_at = Some(at);

        self.move_to(RecallResponseStatus::InProgress)?;
        self.warranty_claim_id = Some(claim_id);
        Ok(())
    }

    /// Customer declines. The response never changes again.
    pub fn decline(&mut self, note: Option<String>, at: DateTime<Utc>) -> Result<(), WarrantyError> {
        self.ensure_pending()?;
        self.move_to(RecallResponseStatus::Declined)?;
        self.customer_note = note;
        self.responded_at = Some(at);
        Ok(())
    }

    /// Closes the response after its claim completed
    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<(), WarrantyError> {
        if self.status != RecallResponseStatus::InProgress {
            return Err(WarrantyError::conflict(format!(
                "Recall response {} is {} and cannot be completed",
                self.id, self.status
            )));
        }
        self.move_to(RecallResponseStatus::Completed)?;
        self.completed_at = Some(at);
        Ok(())
    }

    /// A claim link exists if and only if the status is IN_PROGRESS or COMPLETED
    pub fn has_consistent_claim_link(&self) -> bool {
        let linked_status = matches!(
            self.status,
            RecallResponseStatus::InProgress | RecallResponseStatus::Completed
        );
        linked_status == self.warranty_claim_id.is_some()
    }

    fn move_to(&mut self, to: RecallResponseStatus) -> Result<(), WarrantyError> {
        RecallResponseStatus::validate_transition(self.status, to)?;
        self.status = to;
        Ok(())
    }
}
