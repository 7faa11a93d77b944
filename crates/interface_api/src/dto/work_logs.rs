//! Work log DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_warranty::WorkLog;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkLogRequest {
    pub warranty_claim_id: Uuid,
    /// Logs time for another technician; managers only
    pub technician_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkLogRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLogResponse {
    pub id: Uuid,
    pub warranty_claim_id: Uuid,
    pub technician_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

impl From<WorkLog> for WorkLogResponse {
    fn from(log: WorkLog) -> Self {
        Self {
            duration_minutes: log.duration().map(|d| d.num_minutes()),
            id: log.id.into(),
            warranty_claim_id: log.warranty_claim_id.into(),
            technician_id: log.technician.into(),
            start_time: log.start_time,
            end_time: log.end_time,
            description: log.description,
            created_at: log.created_at,
            version: log.version,
        }
    }
}
