//! Customer feedback on completed warranty work
//!
//! Each completed claim can receive at most one feedback, written by the
//! customer who owns the repaired vehicle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, CustomerId, FeedbackId};
use crate::claim::{WarrantyClaim, WarrantyClaimStatus};
use crate::error::WarrantyError;

pub const MAX_COMMENT_LEN: usize = 1000;

/// A satisfaction score from 1 to 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, WarrantyError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(WarrantyError::validation(format!(
                "rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Every valid rating, lowest first
    pub fn all() -> impl Iterator<Item = Rating> {
        (Self::MIN..=Self::MAX).map(Rating)
    }
}

impl TryFrom<u8> for Rating {
    type Error = WarrantyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn check_comment(comment: &Option<String>) -> Result<(), WarrantyError> {
    match comment {
        Some(text) if text.chars().count() > MAX_COMMENT_LEN => Err(WarrantyError::validation(format!(
            "comment must be at most {} characters",
            MAX_COMMENT_LEN
        ))),
        _ => Ok(()),
    }
}

/// A customer's rating of the repair done under a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: FeedbackId,
    pub warranty_claim_id: ClaimId,
    pub customer_id: CustomerId,
    pub rating: Rating,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl Feedback {
    /// Feedback is only taken once the claim's work is COMPLETED
    pub fn new(
        claim: &WarrantyClaim,
        customer_id: CustomerId,
        rating: Rating,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Self, WarrantyError> {
        if claim.status != WarrantyClaimStatus::Completed {
            return Err(WarrantyError::conflict(format!(
                "Feedback can only be given for COMPLETED claims; claim {} is {}",
                claim.id, claim.status
            )));
        }
        check_comment(&comment)?;

        Ok(Self {
            id: FeedbackId::new_v7(),
            warranty_claim_id: claim.id,
            customer_id,
            rating,
            comment,
            created_at: at,
            updated_at: None,
            version: 0,
        })
    }

    pub fn revise(
        &mut self,
        rating: Rating,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), WarrantyError> {
        check_comment(&comment)?;
        self.rating = rating;
        self.comment = comment;
        self.updated_at = Some(at);
        Ok(())
    }

    pub fn ensure_owner(&self, customer_id: CustomerId, action: &str) -> Result<(), WarrantyError> {
        if self.customer_id == customer_id {
            Ok(())
        } else {
            Err(WarrantyError::forbidden(format!(
                "You can only {} your own feedback",
                action
            )))
        }
    }
}

/// Rating statistics over all feedback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    pub total: u64,
    /// Mean rating to two decimals; absent when there is no feedback
    pub average_rating: Option<Decimal>,
    /// Count per rating, index 0 holding rating 1
    pub counts_by_rating: [u64; 5],
}

impl FeedbackSummary {
    pub fn from_counts(counts_by_rating: [u64; 5]) -> Self {
        let total: u64 = counts_by_rating.iter().sum();
        let average_rating = if total == 0 {
            None
        } else {
            let weighted: u64 = counts_by_rating
                .iter()
                .zip(1u64..)
                .map(|(count, rating)| count * rating)
                .sum();
            Some((Decimal::from(weighted) / Decimal::from(total)).round_dp(2))
        };

        Self {
            total,
            average_rating,
            counts_by_rating,
        }
    }

    pub fn count_for(&self, rating: Rating) -> u64 {
        self.counts_by_rating[usize::from(rating.value() - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{InstalledPartId, VehicleId};
    use rust_decimal_macros::dec;

    fn claim(status: WarrantyClaimStatus) -> WarrantyClaim {
        let mut claim = WarrantyClaim::submitted(
            VehicleId::new(),
            InstalledPartId::new(),
            "Charging port loose",
            None,
            Utc::now(),
        );
        claim.status = status;
        claim
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(6).is_err());
        assert_eq!(Rating::new(5).unwrap().value(), 5);
        assert_eq!(Rating::all().count(), 5);
    }

    #[test]
    fn test_rating_deserialization_is_checked() {
        assert!(serde_json::from_str::<Rating>("4").is_ok());
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }

    #[test]
    fn test_feedback_needs_completed_claim() {
        let rating = Rating::new(4).unwrap();
        let processing = claim(WarrantyClaimStatus::Processing);
        let err = Feedback::new(&processing, CustomerId::new(), rating, None, Utc::now()).unwrap_err();
        assert!(err.is_conflict());

        let completed = claim(WarrantyClaimStatus::Completed);
        let feedback = Feedback::new(&completed, CustomerId::new(), rating, None, Utc::now()).unwrap();
        assert_eq!(feedback.warranty_claim_id, completed.id);
        assert_eq!(feedback.version, 0);
    }

    #[test]
    fn test_long_comment_rejected() {
        let completed = claim(WarrantyClaimStatus::Completed);
        let comment = Some("x".repeat(MAX_COMMENT_LEN + 1));
        let result = Feedback::new(&completed, CustomerId::new(), Rating::new(3).unwrap(), comment, Utc::now());
        assert!(matches!(result, Err(WarrantyError::Validation(_))));
    }

    #[test]
    fn test_summary_average() {
        let summary = FeedbackSummary::from_counts([0, 0, 1, 0, 2]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.average_rating, Some(dec!(4.33)));
        assert_eq!(summary.count_for(Rating::new(5).unwrap()), 2);

        assert_eq!(FeedbackSummary::from_counts([0; 5]).average_rating, None);
    }
}
