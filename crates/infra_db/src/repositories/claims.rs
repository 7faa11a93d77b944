//! Warranty claim repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{PageRequest, UserId};
use domain_warranty::{ClaimFilter, ClaimSort, WarrantyClaim, WarrantyClaimStatus};

use crate::error::DatabaseError;

const COLUMNS: &str = "wc.id, wc.status, wc.description, wc.claim_date, wc.resolution_date, \
     wc.installed_part_id, wc.vehicle_id, wc.recall_response_id, wc.is_paid_warranty, \
     wc.warranty_fee, wc.assigned_to, wc.created_by, wc.version";

const FILTER: &str = "($1::text IS NULL OR wc.status = $1) \
     AND ($2::uuid IS NULL OR wc.vehicle_id = $2) \
     AND ($3::uuid IS NULL OR wc.assigned_to = $3)";

/// Database row for a warranty claim
#[derive(Debug, Clone, FromRow)]
pub struct ClaimRow {
    pub id: Uuid,
    pub status: String,
    pub description: String,
    pub claim_date: DateTime<Utc>,
    pub resolution_date: Option<DateTime<Utc>>,
    pub installed_part_id: Uuid,
    pub vehicle_id: Uuid,
    pub recall_response_id: Option<Uuid>,
    pub is_paid_warranty: bool,
    pub warranty_fee: Option<Decimal>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub version: i64,
}

impl ClaimRow {
    pub fn into_domain(self) -> Result<WarrantyClaim, DatabaseError> {
        let status: WarrantyClaimStatus = self
            .status
            .parse()
            .map_err(|e| DatabaseError::decode("warranty_claims.status", e))?;

        Ok(WarrantyClaim {
            id: self.id.into(),
            status,
            description: self.description,
            claim_date: self.claim_date,
            resolution_date: self.resolution_date,
            installed_part_id: self.installed_part_id.into(),
            vehicle_id: self.vehicle_id.into(),
            recall_response_id: self.recall_response_id.map(Into::into),
            is_paid_warranty: self.is_paid_warranty,
            warranty_fee: self.warranty_fee,
            assigned_to: self.assigned_to.map(UserId::from),
            created_by: self.created_by.map(UserId::from),
            version: self.version,
        })
    }
}

/// Repository for warranty claims
///
/// Reads go through the pool. Writes take a connection so the adapter can
/// group them in one transaction.
#[derive(Debug, Clone)]
pub struct ClaimRepository {
    pool: PgPool,
}

impl ClaimRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<ClaimRow>, DatabaseError> {
        let sql = format!("SELECT {COLUMNS} FROM warranty_claims wc WHERE wc.id = $1");
        Ok(sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list(
        &self,
        filter: &ClaimFilter,
        sort: ClaimSort,
        page: &PageRequest,
    ) -> Result<(Vec<ClaimRow>, u64), DatabaseError> {
        let status = filter.status.map(|s| s.as_str());
        let vehicle = filter.vehicle_id.map(Uuid::from);
        let assigned = filter.assigned_to.map(Uuid::from);
        let dir = page.sort_dir.as_sql();

        let sql = format!(
            "SELECT {COLUMNS} FROM warranty_claims wc WHERE {FILTER} \
             ORDER BY wc.{} {dir}, wc.id {dir} LIMIT $4 OFFSET $5",
            sort.column()
        );
        let rows = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(status)
            .bind(vehicle)
            .bind(assigned)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM warranty_claims wc WHERE {FILTER}"))
            .bind(status)
            .bind(vehicle)
            .bind(assigned)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total.max(0) as u64))
    }

    pub async fn insert(conn: &mut PgConnection, claim: &WarrantyClaim) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO warranty_claims (
                id, status, description, claim_date, resolution_date,
                installed_part_id, vehicle_id, recall_response_id, is_paid_warranty,
                warranty_fee, assigned_to, created_by, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 0)
            "#,
        )
        .bind(Uuid::from(claim.id))
        .bind(claim.status.as_str())
        .bind(&claim.description)
        .bind(claim.claim_date)
        .bind(claim.resolution_date)
        .bind(Uuid::from(claim.installed_part_id))
        .bind(Uuid::from(claim.vehicle_id))
        .bind(claim.recall_response_id.map(Uuid::from))
        .bind(claim.is_paid_warranty)
        .bind(claim.warranty_fee)
        .bind(claim.assigned_to.map(Uuid::from))
        .bind(claim.created_by.map(Uuid::from))
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Writes the claim if the stored version still equals `expected_version`.
    /// `None` means no row matched.
    pub async fn update(
        conn: &mut PgConnection,
        claim: &WarrantyClaim,
        expected_version: i64,
    ) -> Result<Option<ClaimRow>, DatabaseError> {
        let sql = format!(
            "UPDATE warranty_claims wc SET status = $3, description = $4, resolution_date = $5, \
             is_paid_warranty = $6, warranty_fee = $7, assigned_to = $8, version = wc.version + 1 \
             WHERE wc.id = $1 AND wc.version = $2 RETURNING {COLUMNS}"
        );
        Ok(sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(Uuid::from(claim.id))
            .bind(expected_version)
            .bind(claim.status.as_str())
            .bind(&claim.description)
            .bind(claim.resolution_date)
            .bind(claim.is_paid_warranty)
            .bind(claim.warranty_fee)
            .bind(claim.assigned_to.map(Uuid::from))
            .fetch_optional(conn)
            .await?)
    }

    /// Locks the row and returns its version
    pub async fn lock_version(conn: &mut PgConnection, id: Uuid) -> Result<Option<i64>, DatabaseError> {
        Ok(sqlx::query_scalar("SELECT version FROM warranty_claims WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?)
    }

    pub async fn count_part_requests(conn: &mut PgConnection, id: Uuid) -> Result<i64, DatabaseError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM part_requests WHERE warranty_claim_id = $1")
            .bind(id)
            .fetch_one(conn)
            .await?)
    }

    pub async fn count_recall_links(conn: &mut PgConnection, id: Uuid) -> Result<i64, DatabaseError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM recall_responses WHERE warranty_claim_id = $1")
            .bind(id)
            .fetch_one(conn)
            .await?)
    }

    /// Feedback and work log rows that hang off the claim
    pub async fn count_history(conn: &mut PgConnection, id: Uuid) -> Result<i64, DatabaseError> {
        Ok(sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM feedbacks WHERE warranty_claim_id = $1) \
                  + (SELECT COUNT(*) FROM work_logs WHERE warranty_claim_id = $1)",
        )
        .bind(id)
        .fetch_one(conn)
        .await?)
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM warranty_claims WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
