//! Recall campaign and recall response repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{PageRequest, UserId};
use domain_warranty::{
    CampaignSort, RecallRequest, RecallRequestStatus, RecallResponse, RecallResponseStatus, ResponseSort,
};

use crate::error::DatabaseError;

const CAMPAIGN_COLUMNS: &str = "rq.id, rq.part_id, rq.status, rq.reason, rq.admin_note, rq.customer_note, \
     rq.created_by, rq.approved_by, rq.created_at, rq.updated_at, rq.version";

const RESPONSE_COLUMNS: &str = "rs.id, rs.recall_request_id, rs.vehicle_id, rs.status, rs.customer_note, \
     rs.warranty_claim_id, rs.created_at, rs.responded_at, rs.completed_at, rs.version";

/// Campaigns with a response for one of the customer's vehicles
const CUSTOMER_CAMPAIGNS: &str = "EXISTS (SELECT 1 FROM recall_responses rs \
     JOIN vehicles v ON v.id = rs.vehicle_id \
     WHERE rs.recall_request_id = rq.id AND v.customer_id = $1)";

/// Database row for a recall campaign
#[derive(Debug, Clone, FromRow)]
pub struct CampaignRow {
    pub id: Uuid,
    pub part_id: Uuid,
    pub status: String,
    pub reason: String,
    pub admin_note: Option<String>,
    pub customer_note: Option<String>,
    pub created_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl CampaignRow {
    pub fn into_domain(self) -> Result<RecallRequest, DatabaseError> {
        let status: RecallRequestStatus = self
            .status
            .parse()
            .map_err(|e| DatabaseError::decode("recall_requests.status", e))?;

        Ok(RecallRequest {
            id: self.id.into(),
            part_id: self.part_id.into(),
            status,
            reason: self.reason,
            admin_note: self.admin_note,
            customer_note: self.customer_note,
            created_by: self.created_by.into(),
            approved_by: self.approved_by.map(UserId::from),
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
        })
    }
}

/// Database row for a per-vehicle recall response
#[derive(Debug, Clone, FromRow)]
pub struct ResponseRow {
    pub id: Uuid,
    pub recall_request_id: Uuid,
    pub vehicle_id: Uuid,
    pub status: String,
    pub customer_note: Option<String>,
    pub warranty_claim_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl ResponseRow {
    pub fn into_domain(self) -> Result<RecallResponse, DatabaseError> {
        let status: RecallResponseStatus = self
            .status
            .parse()
            .map_err(|e| DatabaseError::decode("recall_responses.status", e))?;

        Ok(RecallResponse {
            id: self.id.into(),
            recall_request_id: self.recall_request_id.into(),
            vehicle_id: self.vehicle_id.into(),
            status,
            customer_note: self.customer_note,
            warranty_claim_id: self.warranty_claim_id.map(Into::into),
            created_at: self.created_at,
            responded_at: self.responded_at,
            completed_at: self.completed_at,
            version: self.version,
        })
    }
}

/// Repository for recall campaigns and their responses
#[derive(Debug, Clone)]
pub struct RecallRepository {
    pool: PgPool,
}

impl RecallRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ------------------------------------------------------------------
    // Campaigns
    // ------------------------------------------------------------------

    pub async fn find_campaign(&self, id: Uuid) -> Result<Option<CampaignRow>, DatabaseError> {
        let sql = format!("SELECT {CAMPAIGN_COLUMNS} FROM recall_requests rq WHERE rq.id = $1");
        Ok(sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_campaigns(
        &self,
        status: Option<RecallRequestStatus>,
        sort: CampaignSort,
        page: &PageRequest,
    ) -> Result<(Vec<CampaignRow>, u64), DatabaseError> {
        let filter = "($1::text IS NULL OR rq.status = $1)";
        let status = status.map(|s| s.as_str());
        let dir = page.sort_dir.as_sql();

        let sql = format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM recall_requests rq WHERE {filter} \
             ORDER BY rq.{} {dir}, rq.id {dir} LIMIT $2 OFFSET $3",
            sort.column()
        );
        let rows = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(status)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM recall_requests rq WHERE {filter}"))
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total.max(0) as u64))
    }

    pub async fn list_campaigns_for_customer(
        &self,
        customer_id: Uuid,
        sort: CampaignSort,
        page: &PageRequest,
    ) -> Result<(Vec<CampaignRow>, u64), DatabaseError> {
        let dir = page.sort_dir.as_sql();
        let sql = format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM recall_requests rq WHERE {CUSTOMER_CAMPAIGNS} \
             ORDER BY rq.{} {dir}, rq.id {dir} LIMIT $2 OFFSET $3",
            sort.column()
        );
        let rows = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(customer_id)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM recall_requests rq WHERE {CUSTOMER_CAMPAIGNS}"
        ))
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total.max(0) as u64))
    }

    pub async fn insert_campaign(conn: &mut PgConnection, campaign: &RecallRequest) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO recall_requests (
                id, part_id, status, reason, admin_note, customer_note,
                created_by, approved_by, created_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0)
            "#,
        )
        .bind(Uuid::from(campaign.id))
        .bind(Uuid::from(campaign.part_id))
        .bind(campaign.status.as_str())
        .bind(&campaign.reason)
        .bind(&campaign.admin_note)
        .bind(&campaign.customer_note)
        .bind(Uuid::from(campaign.created_by))
        .bind(campaign.approved_by.map(Uuid::from))
        .bind(campaign.created_at)
        .bind(campaign.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Version-checked write; `None` means no row matched
    pub async fn update_campaign(
        conn: &mut PgConnection,
        campaign: &RecallRequest,
        expected_version: i64,
    ) -> Result<Option<CampaignRow>, DatabaseError> {
        let sql = format!(
            "UPDATE recall_requests rq SET status = $3, admin_note = $4, customer_note = $5, \
             approved_by = $6, updated_at = $7, version = rq.version + 1 \
             WHERE rq.id = $1 AND rq.version = $2 RETURNING {CAMPAIGN_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(Uuid::from(campaign.id))
            .bind(expected_version)
            .bind(campaign.status.as_str())
            .bind(&campaign.admin_note)
            .bind(&campaign.customer_note)
            .bind(campaign.approved_by.map(Uuid::from))
            .bind(campaign.updated_at)
            .fetch_optional(conn)
            .await?)
    }

    /// Moves a campaign waiting for customers to CLAIM_CREATED; a no-op otherwise
    pub async fn mark_claim_created(
        conn: &mut PgConnection,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE recall_requests SET status = $2, updated_at = $3, version = version + 1 \
             WHERE id = $1 AND status = $4",
        )
        .bind(id)
        .bind(RecallRequestStatus::ClaimCreated.as_str())
        .bind(at)
        .bind(RecallRequestStatus::WaitingCustomerConfirm.as_str())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn lock_campaign_version(conn: &mut PgConnection, id: Uuid) -> Result<Option<i64>, DatabaseError> {
        Ok(sqlx::query_scalar("SELECT version FROM recall_requests WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?)
    }

    pub async fn count_responses(conn: &mut PgConnection, campaign_id: Uuid) -> Result<i64, DatabaseError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM recall_responses WHERE recall_request_id = $1")
            .bind(campaign_id)
            .fetch_one(conn)
            .await?)
    }

    pub async fn delete_campaign(conn: &mut PgConnection, id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM recall_requests WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Responses
    // ------------------------------------------------------------------

    pub async fn find_response(&self, id: Uuid) -> Result<Option<ResponseRow>, DatabaseError> {
        let sql = format!("SELECT {RESPONSE_COLUMNS} FROM recall_responses rs WHERE rs.id = $1");
        Ok(sqlx::query_as::<_, ResponseRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_response_for_claim(&self, claim_id: Uuid) -> Result<Option<ResponseRow>, DatabaseError> {
        let sql = format!("SELECT {RESPONSE_COLUMNS} FROM recall_responses rs WHERE rs.warranty_claim_id = $1");
        Ok(sqlx::query_as::<_, ResponseRow>(&sql)
            .bind(claim_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn responses_for_campaign(&self, campaign_id: Uuid) -> Result<Vec<ResponseRow>, DatabaseError> {
        let sql = format!(
            "SELECT {RESPONSE_COLUMNS} FROM recall_responses rs \
             WHERE rs.recall_request_id = $1 ORDER BY rs.vehicle_id"
        );
        Ok(sqlx::query_as::<_, ResponseRow>(&sql)
            .bind(campaign_id)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn list_responses(
        &self,
        status: Option<RecallResponseStatus>,
        sort: ResponseSort,
        page: &PageRequest,
    ) -> Result<(Vec<ResponseRow>, u64), DatabaseError> {
        let filter = "($1::text IS NULL OR rs.status = $1)";
        let status = status.map(|s| s.as_str());
        let dir = page.sort_dir.as_sql();

        let sql = format!(
            "SELECT {RESPONSE_COLUMNS} FROM recall_responses rs WHERE {filter} \
             ORDER BY rs.{} {dir}, rs.id {dir} LIMIT $2 OFFSET $3",
            sort.column()
        );
        let rows = sqlx::query_as::<_, ResponseRow>(&sql)
            .bind(status)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM recall_responses rs WHERE {filter}"))
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total.max(0) as u64))
    }

    pub async fn responses_for_customer(
        &self,
        customer_id: Uuid,
        sort: ResponseSort,
        page: &PageRequest,
    ) -> Result<(Vec<ResponseRow>, u64), DatabaseError> {
        let dir = page.sort_dir.as_sql();
        let sql = format!(
            "SELECT {RESPONSE_COLUMNS} FROM recall_responses rs \
             JOIN vehicles v ON v.id = rs.vehicle_id WHERE v.customer_id = $1 \
             ORDER BY rs.{} {dir}, rs.id {dir} LIMIT $2 OFFSET $3",
            sort.column()
        );
        let rows = sqlx::query_as::<_, ResponseRow>(&sql)
            .bind(customer_id)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM recall_responses rs JOIN vehicles v ON v.id = rs.vehicle_id \
             WHERE v.customer_id = $1",
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total.max(0) as u64))
    }

    pub async fn insert_response(conn: &mut PgConnection, response: &RecallResponse) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO recall_responses (
                id, recall_request_id, vehicle_id, status, customer_note,
                warranty_claim_id, created_at, responded_at, completed_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0)
            "#,
        )
        .bind(Uuid::from(response.id))
        .bind(Uuid::from(response.recall_request_id))
        .bind(Uuid::from(response.vehicle_id))
        .bind(response.status.as_str())
        .bind(&response.customer_note)
        .bind(response.warranty_claim_id.map(Uuid::from))
        .bind(response.created_at)
        .bind(response.responded_at)
        .bind(response.completed_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Version-checked write; `None` means no row matched
    pub async fn update_response(
        conn: &mut PgConnection,
        response: &RecallResponse,
        expected_version: i64,
    ) -> Result<Option<ResponseRow>, DatabaseError> {
        let sql = format!(
            "UPDATE recall_responses rs SET status = $3, customer_note = $4, warranty_claim_id = $5, \
             responded_at = $6, completed_at = $7, version = rs.version + 1 \
             WHERE rs.id = $1 AND rs.version = $2 RETURNING {RESPONSE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, ResponseRow>(&sql)
            .bind(Uuid::from(response.id))
            .bind(expected_version)
            .bind(response.status.as_str())
            .bind(&response.customer_note)
            .bind(response.warranty_claim_id.map(Uuid::from))
            .bind(response.responded_at)
            .bind(response.completed_at)
            .fetch_optional(conn)
            .await?)
    }
}
