//! Work log repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::PageRequest;
use domain_warranty::{WorkLog, WorkLogFilter, WorkLogSort};

use crate::error::DatabaseError;

const COLUMNS: &str = "w.id, w.warranty_claim_id, w.technician_id, w.start_time, w.end_time, \
     w.description, w.created_at, w.version";

const FILTER: &str = "($1::uuid IS NULL OR w.warranty_claim_id = $1) \
     AND ($2::uuid IS NULL OR w.technician_id = $2)";

#[derive(Debug, Clone, FromRow)]
pub struct WorkLogRow {
    pub id: Uuid,
    pub warranty_claim_id: Uuid,
    pub technician_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

impl WorkLogRow {
    pub fn into_domain(self) -> WorkLog {
        WorkLog {
            id: self.id.into(),
            warranty_claim_id: self.warranty_claim_id.into(),
            technician: self.technician_id.into(),
            start_time: self.start_time,
            end_time: self.end_time,
            description: self.description,
            created_at: self.created_at,
            version: self.version,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkLogRepository {
    pool: PgPool,
}

impl WorkLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<WorkLogRow>, DatabaseError> {
        let sql = format!("SELECT {COLUMNS} FROM work_logs w WHERE w.id = $1");
        Ok(sqlx::query_as::<_, WorkLogRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list(
        &self,
        filter: &WorkLogFilter,
        sort: WorkLogSort,
        page: &PageRequest,
    ) -> Result<(Vec<WorkLogRow>, u64), DatabaseError> {
        let claim = filter.warranty_claim_id.map(Uuid::from);
        let technician = filter.technician.map(Uuid::from);
        let dir = page.sort_dir.as_sql();

        let sql = format!(
            "SELECT {COLUMNS} FROM work_logs w WHERE {FILTER} \
             ORDER BY w.{} {dir}, w.id {dir} LIMIT $3 OFFSET $4",
            sort.column()
        );
        let rows = sqlx::query_as::<_, WorkLogRow>(&sql)
            .bind(claim)
            .bind(technician)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM work_logs w WHERE {FILTER}"))
            .bind(claim)
            .bind(technician)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total.max(0) as u64))
    }

    pub async fn insert(&self, log: &WorkLog) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO work_logs (
                id, warranty_claim_id, technician_id, start_time, end_time, description, created_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, 0)
            "#,
        )
        .bind(Uuid::from(log.id))
        .bind(Uuid::from(log.warranty_claim_id))
        .bind(Uuid::from(log.technician))
        .bind(log.start_time)
        .bind(log.end_time)
        .bind(&log.description)
        .bind(log.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Version-checked write; `None` means no row matched
    pub async fn update(&self, log: &WorkLog, expected_version: i64) -> Result<Option<WorkLogRow>, DatabaseError> {
        let sql = format!(
            "UPDATE work_logs w SET start_time = $3, end_time = $4, description = $5, \
             version = w.version + 1 \
             WHERE w.id = $1 AND w.version = $2 RETURNING {COLUMNS}"
        );
        Ok(sqlx::query_as::<_, WorkLogRow>(&sql)
            .bind(Uuid::from(log.id))
            .bind(expected_version)
            .bind(log.start_time)
            .bind(log.end_time)
            .bind(&log.description)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn delete(&self, id: Uuid, expected_version: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM work_logs WHERE id = $1 AND version = $2")
            .bind(id)
            .bind(expected_version)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
