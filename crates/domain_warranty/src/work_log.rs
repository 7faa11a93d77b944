//! Technician time records against a claim

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, UserId, WorkLogId};
use crate::error::WarrantyError;

pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// One stretch of work a technician spent on a claim
///
/// `end_time` stays empty while the work is still going on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkLog {
    pub id: WorkLogId,
    pub warranty_claim_id: ClaimId,
    pub technician: UserId,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

fn check_times(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Result<(), WarrantyError> {
    match end {
        Some(end) if end < start => Err(WarrantyError::validation("end time must be after start time")),
        _ => Ok(()),
    }
}

fn check_description(description: &Option<String>) -> Result<(), WarrantyError> {
    match description {
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LEN => Err(WarrantyError::validation(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        ))),
        _ => Ok(()),
    }
}

impl WorkLog {
    pub fn new(
        warranty_claim_id: ClaimId,
        technician: UserId,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        description: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Self, WarrantyError> {
        check_times(start_time, end_time)?;
        check_description(&description)?;

        Ok(Self {
            id: WorkLogId::new_v7(),
            warranty_claim_id,
            technician,
            start_time,
            end_time,
            description,
            created_at: at,
            version: 0,
        })
    }

    pub fn reschedule(
        &mut self,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        description: Option<String>,
    ) -> Result<(), WarrantyError> {
        check_times(start_time, end_time)?;
        check_description(&description)?;
        self.start_time = start_time;
        self.end_time = end_time;
        self.description = description;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Time spent, once the work has ended
    pub fn duration(&self) -> Option<Duration> {
        self.end_time.map(|end| end - self.start_time)
    }

    pub fn ensure_owner(&self, user: UserId, action: &str) -> Result<(), WarrantyError> {
        if self.technician == user {
            Ok(())
        } else {
            Err(WarrantyError::forbidden(format!(
                "You can only {} your own work logs",
                action
            )))
        }
    }
}
