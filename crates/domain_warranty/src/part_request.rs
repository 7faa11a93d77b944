//! Replacement part requests from service centers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, PartId, PartRequestId, UserId};
use crate::error::WarrantyError;
use crate::transition::{status_enum, Lifecycle};

status_enum! {
    /// Part request status
    pub enum PartRequestStatus {
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
        Shipped => "SHIPPED",
        Delivered => "DELIVERED",
        Cancelled => "CANCELLED",
    }
}

impl Lifecycle for PartRequestStatus {
    const ENTITY: &'static str = "PartRequest";

    fn all() -> &'static [Self] {
        Self::ALL
    }

    fn allowed_next(self) -> &'static [Self] {
        use PartRequestStatus::*;
        match self {
            Pending => &[Approved, Rejected, Cancelled],
            Approved => &[Shipped],
            Shipped => &[Delivered],
            Delivered | Rejected | Cancelled => &[],
        }
    }

    fn as_wire(&self) -> &'static str {
        self.as_str()
    }
}

/// A technician's request for a replacement part to repair a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRequest {
    pub id: PartRequestId,
    pub warranty_claim_id: ClaimId,
    pub faulty_part_id: PartId,
    pub quantity: u32,
    pub issue_description: String,
    pub status: PartRequestStatus,
    pub requested_by: UserId,
    pub approved_by: Option<UserId>,
    pub request_date: DateTime<Utc>,
    pub approved_date: Option<DateTime<Utc>>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub version: i64,
}

impl PartRequest {
    pub fn new(
        warranty_claim_id: ClaimId,
        faulty_part_id: PartId,
        quantity: u32,
        issue_description: impl Into<String>,
        requested_by: UserId,
        at: DateTime<Utc>,
    ) -> Result<Self, WarrantyError> {
        if quantity == 0 {
            return Err(WarrantyError::validation("quantity must be at least 1"));
        }

        Ok(Self {
            id: PartRequestId::new_v7(),
            warranty_claim_id,
            faulty_part_id,
            quantity,
            issue_description: issue_description.into(),
            status: PartRequestStatus::Pending,
            requested_by,
            approved_by: None,
            request_date: at,
            approved_date: None,
            shipped_date: None,
            delivered_date: None,
            rejection_reason: None,
            tracking_number: None,
            notes: None,
            version: 0,
        })
    }

    /// Requires the request to currently be in `expected`
    fn advance(&mut self, expected: PartRequestStatus, to: PartRequestStatus) -> Result<(), WarrantyError> {
        if self.status != expected {
            return Err(WarrantyError::conflict(format!(
                "Part request {} must be {} to become {} (status {})",
                self.id, expected, to, self.status
            )));
        }
        PartRequestStatus::validate_transition(self.status, to)?;
        self.status = to;
        Ok(())
    }

    pub fn approve(&mut self, approver: UserId, notes: Option<String>, at: DateTime<Utc>) -> Result<(), WarrantyError> {
        self.advance(PartRequestStatus::Pending, PartRequestStatus::Approved)?;
        self.approved_by = Some(approver);
        self.approved_date = Some(at);
        if notes.is_some() {
            self.notes = notes;
        }
        Ok(())
    }

    pub fn reject(&mut self, approver: UserId, reason: String) -> Result<(), WarrantyError> {
        if reason.trim().is_empty() {
            return Err(WarrantyError::validation("rejection reason is required"));
        }
        self.advance(PartRequestStatus::Pending, PartRequestStatus::Rejected)?;
        self.approved_by = Some(approver);
        self.rejection_reason = Some(reason);
        Ok(())
    }

    pub fn ship(&mut self, tracking_number: String, at: DateTime<Utc>) -> Result<(), WarrantyError> {
        if tracking_number.trim().is_empty() {
            return Err(WarrantyError::validation("tracking number is required"));
        }
        self.advance(PartRequestStatus::Approved, PartRequestStatus::Shipped)?;
        self.tracking_number = Some(tracking_number);
        self.shipped_date = Some(at);
        Ok(())
    }

    pub fn deliver(&mut self, at: DateTime<Utc>) -> Result<(), WarrantyError> {
        self.advance(PartRequestStatus::Shipped, PartRequestStatus::Delivered)?;
        self.delivered_date = Some(at);
        Ok(())
    }

    /// Withdrawal by the requester while still pending
    pub fn cancel(&mut self, by: UserId) -> Result<(), WarrantyError> {
        self.ensure_owner(by, "cancel")?;
        self.advance(PartRequestStatus::Pending, PartRequestStatus::Cancelled)
    }

    pub fn ensure_owner(&self, user: UserId, action: &str) -> Result<(), WarrantyError> {
        if self.requested_by == user {
            Ok(())
        } else {
            Err(WarrantyError::forbidden(format!(
                "You can only {} your own part requests",
                action
            )))
        }
    }
}
