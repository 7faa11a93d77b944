//! Feedback repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::PageRequest;
use domain_warranty::{Feedback, FeedbackFilter, FeedbackSort, FeedbackSummary, Rating};

use crate::error::DatabaseError;

const COLUMNS: &str = "f.id, f.warranty_claim_id, f.customer_id, f.rating, f.comment, \
     f.created_at, f.updated_at, f.version";

const FILTER: &str = "($1::uuid IS NULL OR f.customer_id = $1) \
     AND ($2::smallint IS NULL OR f.rating = $2) \
     AND ($3::smallint IS NULL OR f.rating >= $3)";

#[derive(Debug, Clone, FromRow)]
pub struct FeedbackRow {
    pub id: Uuid,
    pub warranty_claim_id: Uuid,
    pub customer_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i64,
}

fn decode_rating(value: i16) -> Result<Rating, DatabaseError> {
    let raw = u8::try_from(value).map_err(|e| DatabaseError::decode("feedbacks.rating", e))?;
    Rating::new(raw).map_err(|e| DatabaseError::decode("feedbacks.rating", e))
}

impl FeedbackRow {
    pub fn into_domain(self) -> Result<Feedback, DatabaseError> {
        Ok(Feedback {
            id: self.id.into(),
            warranty_claim_id: self.warranty_claim_id.into(),
            customer_id: self.customer_id.into(),
            rating: decode_rating(self.rating)?,
            comment: self.comment,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FeedbackRepository {
    pool: PgPool,
}

impl FeedbackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<FeedbackRow>, DatabaseError> {
        let sql = format!("SELECT {COLUMNS} FROM feedbacks f WHERE f.id = $1");
        Ok(sqlx::query_as::<_, FeedbackRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_by_claim(&self, claim_id: Uuid) -> Result<Option<FeedbackRow>, DatabaseError> {
        let sql = format!("SELECT {COLUMNS} FROM feedbacks f WHERE f.warranty_claim_id = $1");
        Ok(sqlx::query_as::<_, FeedbackRow>(&sql)
            .bind(claim_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list(
        &self,
        filter: &FeedbackFilter,
        sort: FeedbackSort,
        page: &PageRequest,
    ) -> Result<(Vec<FeedbackRow>, u64), DatabaseError> {
        let customer = filter.customer_id.map(Uuid::from);
        let rating = filter.rating.map(|r| i16::from(r.value()));
        let min_rating = filter.min_rating.map(|r| i16::from(r.value()));
        let dir = page.sort_dir.as_sql();

        let sql = format!(
            "SELECT {COLUMNS} FROM feedbacks f WHERE {FILTER} \
             ORDER BY f.{} {dir}, f.id {dir} LIMIT $4 OFFSET $5",
            sort.column()
        );
        let rows = sqlx::query_as::<_, FeedbackRow>(&sql)
            .bind(customer)
            .bind(rating)
            .bind(min_rating)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM feedbacks f WHERE {FILTER}"))
            .bind(customer)
            .bind(rating)
            .bind(min_rating)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total.max(0) as u64))
    }

    /// Unique on `warranty_claim_id`; a second feedback surfaces as a duplicate entry
    pub async fn insert(&self, feedback: &Feedback) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO feedbacks (
                id, warranty_claim_id, customer_id, rating, comment, created_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, 0)
            "#,
        )
        .bind(Uuid::from(feedback.id))
        .bind(Uuid::from(feedback.warranty_claim_id))
        .bind(Uuid::from(feedback.customer_id))
        .bind(i16::from(feedback.rating.value()))
        .bind(&feedback.comment)
        .bind(feedback.created_at)
        .bind(feedback.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Version-checked write; `None` means no row matched
    pub async fn update(&self, feedback: &Feedback, expected_version: i64) -> Result<Option<FeedbackRow>, DatabaseError> {
        let sql = format!(
            "UPDATE feedbacks f SET rating = $3, comment = $4, updated_at = $5, version = f.version + 1 \
             WHERE f.id = $1 AND f.version = $2 RETURNING {COLUMNS}"
        );
        Ok(sqlx::query_as::<_, FeedbackRow>(&sql)
            .bind(Uuid::from(feedback.id))
            .bind(expected_version)
            .bind(i16::from(feedback.rating.value()))
            .bind(&feedback.comment)
            .bind(feedback.updated_at)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn delete(&self, id: Uuid, expected_version: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM feedbacks WHERE id = $1 AND version = $2")
            .bind(id)
            .bind(expected_version)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn summary(&self) -> Result<FeedbackSummary, DatabaseError> {
        let grouped: Vec<(i16, i64)> =
            sqlx::query_as("SELECT rating, COUNT(*) FROM feedbacks GROUP BY rating")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = [0u64; 5];
        for (rating, count) in grouped {
            let rating = decode_rating(rating)?;
            counts[usize::from(rating.value() - 1)] = count.max(0) as u64;
        }
        Ok(FeedbackSummary::from_counts(counts))
    }
}
