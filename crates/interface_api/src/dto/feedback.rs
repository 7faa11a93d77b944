//! Feedback DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_warranty::{Feedback, FeedbackSummary};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackRequest {
    pub warranty_claim_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: u8,
    #[validate(length(max = 1000, message = "comment must be at most 1000 characters"))]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeedbackRequest {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: u8,
    #[validate(length(max = 1000, message = "comment must be at most 1000 characters"))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub id: Uuid,
    pub warranty_claim_id: Uuid,
    pub customer_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl From<Feedback> for FeedbackResponse {
    fn from(feedback: Feedback) -> Self {
        Self {
            id: feedback.id.into(),
            warranty_claim_id: feedback.warranty_claim_id.into(),
            customer_id: feedback.customer_id.into(),
            rating: feedback.rating.value(),
            comment: feedback.comment,
            created_at: feedback.created_at,
            updated_at: feedback.updated_at,
            version: feedback.version,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingCount {
    pub rating: u8,
    pub count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummaryResponse {
    pub total_feedbacks: u64,
    pub average_rating: Option<Decimal>,
    pub rating_counts: Vec<RatingCount>,
}

impl From<FeedbackSummary> for FeedbackSummaryResponse {
    fn from(summary: FeedbackSummary) -> Self {
        let rating_counts = summary
            .counts_by_rating
            .iter()
            .zip(1u8..)
            .map(|(&count, rating)| RatingCount { rating, count })
            .collect();
        Self {
            total_feedbacks: summary.total,
            average_rating: summary.average_rating,
            rating_counts,
        }
    }
}
