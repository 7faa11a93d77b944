//! Part request repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{PageRequest, UserId};
use domain_warranty::{PartRequest, PartRequestFilter, PartRequestSort, PartRequestStatus};

use crate::error::DatabaseError;

const COLUMNS: &str = "pr.id, pr.warranty_claim_id, pr.faulty_part_id, pr.quantity, pr.issue_description, \
     pr.status, pr.requested_by, pr.approved_by, pr.request_date, pr.approved_date, pr.shipped_date, \
     pr.delivered_date, pr.rejection_reason, pr.tracking_number, pr.notes, pr.version";

const FILTER: &str = "($1::text IS NULL OR pr.status = $1) \
     AND ($2::uuid IS NULL OR pr.requested_by = $2) \
     AND ($3::uuid IS NULL OR pr.warranty_claim_id = $3)";

#[derive(Debug, Clone, FromRow)]
pub struct PartRequestRow {
    pub id: Uuid,
    pub warranty_claim_id: Uuid,
    pub faulty_part_id: Uuid,
    pub quantity: i32,
    pub issue_description: String,
    pub status: String,
    pub requested_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub request_date: DateTime<Utc>,
    pub approved_date: Option<DateTime<Utc>>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub version: i64,
}

impl PartRequestRow {
    pub fn into_domain(self) -> Result<PartRequest, DatabaseError> {
        let status: PartRequestStatus = self
            .status
            .parse()
            .map_err(|e| DatabaseError::decode("part_requests.status", e))?;
        let quantity =
            u32::try_from(self.quantity).map_err(|e| DatabaseError::decode("part_requests.quantity", e))?;

        Ok(PartRequest {
            id: self.id.into(),
            warranty_claim_id: self.warranty_claim_id.into(),
            faulty_part_id: self.faulty_part_id.into(),
            quantity,
            issue_description: self.issue_description,
            status,
            requested_by: self.requested_by.into(),
            approved_by: self.approved_by.map(UserId::from),
            request_date: self.request_date,
            approved_date: self.approved_date,
            shipped_date: self.shipped_date,
            delivered_date: self.delivered_date,
            rejection_reason: self.rejection_reason,
            tracking_number: self.tracking_number,
            notes: self.notes,
            version: self.version,
        })
    }
}

fn quantity(request: &PartRequest) -> Result<i32, DatabaseError> {
    i32::try_from(request.quantity).map_err(|e| DatabaseError::ConstraintViolation(format!("quantity: {}", e)))
}

#[derive(Debug, Clone)]
pub struct PartRequestRepository {
    pool: PgPool,
}

impl PartRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<PartRequestRow>, DatabaseError> {
        let sql = format!("SELECT {COLUMNS} FROM part_requests pr WHERE pr.id = $1");
        Ok(sqlx::query_as::<_, PartRequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list(
        &self,
        filter: &PartRequestFilter,
        sort: PartRequestSort,
        page: &PageRequest,
    ) -> Result<(Vec<PartRequestRow>, u64), DatabaseError> {
        let status = filter.status.map(|s| s.as_str());
        let requested_by = filter.requested_by.map(Uuid::from);
        let claim = filter.warranty_claim_id.map(Uuid::from);
        let dir = page.sort_dir.as_sql();

        let sql = format!(
            "SELECT {COLUMNS} FROM part_requests pr WHERE {FILTER} \
             ORDER BY pr.{} {dir}, pr.id {dir} LIMIT $4 OFFSET $5",
            sort.column()
        );
        let rows = sqlx::query_as::<_, PartRequestRow>(&sql)
            .bind(status)
            .bind(requested_by)
            .bind(claim)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM part_requests pr WHERE {FILTER}"))
            .bind(status)
            .bind(requested_by)
            .bind(claim)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total.max(0) as u64))
    }

    pub async fn insert(&self, request: &PartRequest) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO part_requests (
                id, warranty_claim_id, faulty_part_id, quantity, issue_description, status,
                requested_by, approved_by, request_date, approved_date, shipped_date,
                delivered_date, rejection_reason, tracking_number, notes, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, 0)
            "#,
        )
        .bind(Uuid::from(request.id))
        .bind(Uuid::from(request.warranty_claim_id))
        .bind(Uuid::from(request.faulty_part_id))
        .bind(quantity(request)?)
        .bind(&request.issue_description)
        .bind(request.status.as_str())
        .bind(Uuid::from(request.requested_by))
        .bind(request.approved_by.map(Uuid::from))
        .bind(request.request_date)
        .bind(request.approved_date)
        .bind(request.shipped_date)
        .bind(request.delivered_date)
        .bind(&request.rejection_reason)
        .bind(&request.tracking_number)
        .bind(&request.notes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Version-checked write; `None` means no row matched
    pub async fn update(
        &self,
        request: &PartRequest,
        expected_version: i64,
    ) -> Result<Option<PartRequestRow>, DatabaseError> {
        let sql = format!(
            "UPDATE part_requests pr SET status = $3, approved_by = $4, approved_date = $5, \
             shipped_date = $6, delivered_date = $7, rejection_reason = $8, tracking_number = $9, \
             notes = $10, version = pr.version + 1 \
             WHERE pr.id = $1 AND pr.version = $2 RETURNING {COLUMNS}"
        );
        Ok(sqlx::query_as::<_, PartRequestRow>(&sql)
            .bind(Uuid::from(request.id))
            .bind(expected_version)
            .bind(request.status.as_str())
            .bind(request.approved_by.map(Uuid::from))
            .bind(request.approved_date)
            .bind(request.shipped_date)
            .bind(request.delivered_date)
            .bind(&request.rejection_reason)
            .bind(&request.tracking_number)
            .bind(&request.notes)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Deletes the row when its version matches; returns whether a row went away
    pub async fn delete(&self, id: Uuid, expected_version: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM part_requests WHERE id = $1 AND version = $2")
            .bind(id)
            .bind(expected_version)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
