//! PostgreSQL Warranty Store Adapter
//!
//! Implements the `WarrantyStore` port on top of the repositories.
//!
//! Every update is a single `UPDATE ... WHERE id = $1 AND version = $2`.
//! When it matches no row the adapter looks again to tell a stale version
//! (conflict) from a missing row (not found). The `commit_*` operations run
//! in one transaction that is rolled back when any step fails.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use core_kernel::{
    AdapterHealth, AdapterType, ClaimId, CustomerId, DomainPort, FeedbackId, HealthCheckResult,
    HealthCheckable, InstalledPartId, Page, PageRequest, PartId, PartRequestId, PortError,
    RecallRequestId, RecallResponseId, VehicleId, WorkLogId,
};
use domain_warranty::{
    CampaignSort, ClaimFilter, ClaimSort, Feedback, FeedbackFilter, FeedbackSort, FeedbackSummary,
    InstalledPart, Part, PartRequest, PartRequestFilter, PartRequestSort, RecallRequest,
    RecallRequestStatus, RecallResponse, RecallResponseStatus, ResponseSort, Vehicle, WarrantyClaim,
    WarrantyStore, WorkLog, WorkLogFilter, WorkLogSort,
};

use crate::error::DatabaseError;
use crate::repositories::{
    ClaimRepository, FeedbackRepository, FleetRepository, PartRequestRepository, RecallRepository,
    WorkLogRepository,
};

/// PostgreSQL-backed implementation of `WarrantyStore`
#[derive(Debug, Clone)]
pub struct PostgresWarrantyStore {
    pool: PgPool,
    fleet: FleetRepository,
    claims: ClaimRepository,
    recalls: RecallRepository,
    part_requests: PartRequestRepository,
    feedback: FeedbackRepository,
    work_logs: WorkLogRepository,
}

impl PostgresWarrantyStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            fleet: FleetRepository::new(pool.clone()),
            claims: ClaimRepository::new(pool.clone()),
            recalls: RecallRepository::new(pool.clone()),
            part_requests: PartRequestRepository::new(pool.clone()),
            feedback: FeedbackRepository::new(pool.clone()),
            work_logs: WorkLogRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn update_claim_row(&self, claim: &WarrantyClaim, expected: i64) -> Result<WarrantyClaim, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        match ClaimRepository::update(&mut conn, claim, expected).await? {
            Some(row) => row.into_domain(),
            None => Err(explain_miss(&mut conn, "warranty_claims", "WarrantyClaim", claim.id, expected).await),
        }
    }

    async fn delete_claim_row(&self, id: ClaimId, expected: i64) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let key = Uuid::from(id);
        match ClaimRepository::lock_version(&mut tx, key).await? {
            None => return Err(DatabaseError::not_found("WarrantyClaim", id)),
            Some(version) if version != expected => return Err(DatabaseError::stale("WarrantyClaim", id, expected)),
            Some(_) => {}
        }
        if ClaimRepository::count_part_requests(&mut tx, key).await? > 0 {
            return Err(DatabaseError::ForeignKeyViolation(format!(
                "WarrantyClaim {} is referenced by part requests",
                id
            )));
        }
        if ClaimRepository::count_recall_links(&mut tx, key).await? > 0 {
            return Err(DatabaseError::ForeignKeyViolation(format!(
                "WarrantyClaim {} is linked to a recall response",
                id
            )));
        }
        if ClaimRepository::count_history(&mut tx, key).await? > 0 {
            return Err(DatabaseError::ForeignKeyViolation(format!(
                "WarrantyClaim {} has feedback or work logs",
                id
            )));
        }

        ClaimRepository::delete(&mut tx, key).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn complete_claim_rows(
        &self,
        claim: &WarrantyClaim,
        expected: i64,
        response: Option<(&RecallResponse, i64)>,
    ) -> Result<WarrantyClaim, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let stored = match ClaimRepository::update(&mut tx, claim, expected).await? {
            Some(row) => row.into_domain()?,
            None => return Err(explain_miss(&mut tx, "warranty_claims", "WarrantyClaim", claim.id, expected).await),
        };
        if let Some((response, response_version)) = response {
            if RecallRepository::update_response(&mut tx, response, response_version).await?.is_none() {
                return Err(
                    explain_miss(&mut tx, "recall_responses", "RecallResponse", response.id, response_version).await,
                );
            }
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn update_campaign_row(&self, campaign: &RecallRequest, expected: i64) -> Result<RecallRequest, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        match RecallRepository::update_campaign(&mut conn, campaign, expected).await? {
            Some(row) => row.into_domain(),
            None => Err(explain_miss(&mut conn, "recall_requests", "RecallRequest", campaign.id, expected).await),
        }
    }

    async fn delete_campaign_row(&self, id: RecallRequestId, expected: i64) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let key = Uuid::from(id);
        match RecallRepository::lock_campaign_version(&mut tx, key).await? {
            None => return Err(DatabaseError::not_found("RecallRequest", id)),
            Some(version) if version != expected => return Err(DatabaseError::stale("RecallRequest", id, expected)),
            Some(_) => {}
        }
        if RecallRepository::count_responses(&mut tx, key).await? > 0 {
            return Err(DatabaseError::ForeignKeyViolation(format!("RecallRequest {} has responses", id)));
        }

        RecallRepository::delete_campaign(&mut tx, key).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn fan_out_rows(
        &self,
        campaign: &RecallRequest,
        expected: i64,
        responses: &[RecallResponse],
    ) -> Result<RecallRequest, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let stored = match RecallRepository::update_campaign(&mut tx, campaign, expected).await? {
            Some(row) => row.into_domain()?,
            None => return Err(explain_miss(&mut tx, "recall_requests", "RecallRequest", campaign.id, expected).await),
        };
        for response in responses {
            RecallRepository::insert_response(&mut tx, response).await?;
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn update_response_row(&self, response: &RecallResponse, expected: i64) -> Result<RecallResponse, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        match RecallRepository::update_response(&mut conn, response, expected).await? {
            Some(row) => row.into_domain(),
            None => Err(explain_miss(&mut conn, "recall_responses", "RecallResponse", response.id, expected).await),
        }
    }

    async fn acceptance_rows(
        &self,
        response: &RecallResponse,
        expected: i64,
        claim: &WarrantyClaim,
    ) -> Result<RecallResponse, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        ClaimRepository::insert(&mut tx, claim).await?;
        let stored = match RecallRepository::update_response(&mut tx, response, expected).await? {
            Some(row) => row.into_domain()?,
            None => return Err(explain_miss(&mut tx, "recall_responses", "RecallResponse", response.id, expected).await),
        };
        let at = response.responded_at.unwrap_or(claim.claim_date);
        let promoted = RecallRepository::mark_claim_created(&mut tx, response.recall_request_id.into(), at).await?;

        tx.commit().await?;
        if promoted {
            info!(campaign_id = %response.recall_request_id, "Recall campaign moved to CLAIM_CREATED");
        }
        Ok(stored)
    }

    async fn update_part_request_row(&self, request: &PartRequest, expected: i64) -> Result<PartRequest, DatabaseError> {
        match self.part_requests.update(request, expected).await? {
            Some(row) => row.into_domain(),
            None => {
                let mut conn = self.pool.acquire().await?;
                Err(explain_miss(&mut conn, "part_requests", "PartRequest", request.id, expected).await)
            }
        }
    }

    async fn delete_part_request_row(&self, id: PartRequestId, expected: i64) -> Result<(), DatabaseError> {
        if self.part_requests.delete(id.into(), expected).await? {
            return Ok(());
        }
        let mut conn = self.pool.acquire().await?;
        Err(explain_miss(&mut conn, "part_requests", "PartRequest", id, expected).await)
    }

    async fn update_feedback_row(&self, feedback: &Feedback, expected: i64) -> Result<Feedback, DatabaseError> {
        match self.feedback.update(feedback, expected).await? {
            Some(row) => row.into_domain(),
            None => {
                let mut conn = self.pool.acquire().await?;
                Err(explain_miss(&mut conn, "feedbacks", "Feedback", feedback.id, expected).await)
            }
        }
    }

    async fn delete_feedback_row(&self, id: FeedbackId, expected: i64) -> Result<(), DatabaseError> {
        if self.feedback.delete(id.into(), expected).await? {
            return Ok(());
        }
        let mut conn = self.pool.acquire().await?;
        Err(explain_miss(&mut conn, "feedbacks", "Feedback", id, expected).await)
    }

    async fn update_work_log_row(&self, log: &WorkLog, expected: i64) -> Result<WorkLog, DatabaseError> {
        match self.work_logs.update(log, expected).await? {
            Some(row) => Ok(row.into_domain()),
            None => {
                let mut conn = self.pool.acquire().await?;
                Err(explain_miss(&mut conn, "work_logs", "WorkLog", log.id, expected).await)
            }
        }
    }

    async fn delete_work_log_row(&self, id: WorkLogId, expected: i64) -> Result<(), DatabaseError> {
        if self.work_logs.delete(id.into(), expected).await? {
            return Ok(());
        }
        let mut conn = self.pool.acquire().await?;
        Err(explain_miss(&mut conn, "work_logs", "WorkLog", id, expected).await)
    }
}

/// Tells a stale version from a missing row after a versioned write matched nothing
async fn explain_miss<I>(
    conn: &mut PgConnection,
    table: &'static str,
    entity: &'static str,
    id: I,
    expected: i64,
) -> DatabaseError
where
    I: Into<Uuid> + fmt::Display + Copy,
{
    let key: Uuid = id.into();
    let sql = format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE id = $1)");
    match sqlx::query_scalar::<_, bool>(&sql).bind(key).fetch_one(conn).await {
        Ok(true) => DatabaseError::stale(entity, id, expected),
        Ok(false) => DatabaseError::not_found(entity, id),
        Err(e) => e.into(),
    }
}

fn to_page<R, T>(
    (rows, total): (Vec<R>, u64),
    page: &PageRequest,
    convert: impl Fn(R) -> Result<T, DatabaseError>,
) -> Result<Page<T>, DatabaseError> {
    let content = rows.into_iter().map(convert).collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(content, page, total))
}

/// Store failures other than domain outcomes are logged here
fn db_to_port_error(e: DatabaseError) -> PortError {
    let expected_outcome = e.is_not_found()
        || e.is_constraint_violation()
        || matches!(e, DatabaseError::StaleVersion { .. } | DatabaseError::SerializationFailure(_));
    if !expected_outcome {
        error!(error = %e, "Warranty store operation failed");
    }
    e.into()
}

impl DomainPort for PostgresWarrantyStore {}

#[async_trait]
impl HealthCheckable for PostgresWarrantyStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };
        HealthCheckResult {
            adapter_id: "postgres-warranty-store".to_string(),
            adapter_type: AdapterType::Internal,
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl WarrantyStore for PostgresWarrantyStore {
    // ========================================================================
    // Fleet
    // ========================================================================

    #[instrument(skip(self), fields(vehicle_id = %id))]
    async fn get_vehicle(&self, id: VehicleId) -> Result<Vehicle, PortError> {
        debug!("Fetching vehicle");
        self.fleet
            .find_vehicle(id.into())
            .await
            .map_err(db_to_port_error)?
            .map(Vehicle::from)
            .ok_or_else(|| PortError::not_found("Vehicle", id))
    }

    #[instrument(skip(self, vehicle), fields(vehicle_id = %vehicle.id))]
    async fn save_vehicle(&self, vehicle: &Vehicle) -> Result<(), PortError> {
        self.fleet.upsert_vehicle(vehicle).await.map_err(db_to_port_error)
    }

    async fn get_part(&self, id: PartId) -> Result<Part, PortError> {
        self.fleet
            .find_part(id.into())
            .await
            .map_err(db_to_port_error)?
            .map(Part::from)
            .ok_or_else(|| PortError::not_found("Part", id))
    }

    #[instrument(skip(self, part), fields(part_id = %part.id))]
    async fn save_part(&self, part: &Part) -> Result<(), PortError> {
        self.fleet.upsert_part(part).await.map_err(db_to_port_error)
    }

    async fn get_installed_part(&self, id: InstalledPartId) -> Result<InstalledPart, PortError> {
        self.fleet
            .find_installed_part(id.into())
            .await
            .map_err(db_to_port_error)?
            .map(InstalledPart::from)
            .ok_or_else(|| PortError::not_found("InstalledPart", id))
    }

    #[instrument(skip(self, installed), fields(installed_part_id = %installed.id))]
    async fn save_installed_part(&self, installed: &InstalledPart) -> Result<(), PortError> {
        self.get_vehicle(installed.vehicle_id).await?;
        self.get_part(installed.part_id).await?;
        self.fleet
            .upsert_installed_part(installed)
            .await
            .map_err(db_to_port_error)
    }

    async fn find_installations_of_part(&self, part_id: PartId) -> Result<Vec<InstalledPart>, PortError> {
        let rows = self
            .fleet
            .installations_of_part(part_id.into())
            .await
            .map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(InstalledPart::from).collect())
    }

    async fn find_installation_on_vehicle(
        &self,
        part_id: PartId,
        vehicle_id: VehicleId,
    ) -> Result<Option<InstalledPart>, PortError> {
        let row = self
            .fleet
            .installation_on_vehicle(part_id.into(), vehicle_id.into())
            .await
            .map_err(db_to_port_error)?;
        Ok(row.map(InstalledPart::from))
    }

    // ========================================================================
    // Warranty claims
    // ========================================================================

    #[instrument(skip(self), fields(claim_id = %id))]
    async fn get_claim(&self, id: ClaimId) -> Result<WarrantyClaim, PortError> {
        debug!("Fetching warranty claim");
        let row = self
            .claims
            .find(id.into())
            .await
            .map_err(db_to_port_error)?
            .ok_or_else(|| PortError::not_found("WarrantyClaim", id))?;
        row.into_domain().map_err(db_to_port_error)
    }

    #[instrument(skip(self, filter, page))]
    async fn list_claims(&self, filter: &ClaimFilter, page: &PageRequest) -> Result<Page<WarrantyClaim>, PortError> {
        let sort = ClaimSort::parse(page.sort_by.as_deref())?;
        let rows = self.claims.list(filter, sort, page).await.map_err(db_to_port_error)?;
        to_page(rows, page, |row| row.into_domain()).map_err(db_to_port_error)
    }

    #[instrument(skip(self, claim), fields(claim_id = %claim.id))]
    async fn insert_claim(&self, claim: &WarrantyClaim) -> Result<(), PortError> {
        let mut conn = self.pool.acquire().await.map_err(|e| db_to_port_error(e.into()))?;
        ClaimRepository::insert(&mut conn, claim)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, claim), fields(claim_id = %claim.id))]
    async fn update_claim(&self, claim: &WarrantyClaim, expected_version: i64) -> Result<WarrantyClaim, PortError> {
        self.update_claim_row(claim, expected_version)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self), fields(claim_id = %id))]
    async fn delete_claim(&self, id: ClaimId, expected_version: i64) -> Result<(), PortError> {
        self.delete_claim_row(id, expected_version)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, claim, response), fields(claim_id = %claim.id))]
    async fn commit_claim_completion(
        &self,
        claim: &WarrantyClaim,
        expected_version: i64,
        response: Option<(&RecallResponse, i64)>,
    ) -> Result<WarrantyClaim, PortError> {
        self.complete_claim_rows(claim, expected_version, response)
            .await
            .map_err(db_to_port_error)
    }

    // ========================================================================
    // Recall campaigns
    // ========================================================================

    #[instrument(skip(self), fields(campaign_id = %id))]
    async fn get_campaign(&self, id: RecallRequestId) -> Result<RecallRequest, PortError> {
        let row = self
            .recalls
            .find_campaign(id.into())
            .await
            .map_err(db_to_port_error)?
            .ok_or_else(|| PortError::not_found("RecallRequest", id))?;
        row.into_domain().map_err(db_to_port_error)
    }

    async fn list_campaigns(
        &self,
        status: Option<RecallRequestStatus>,
        page: &PageRequest,
    ) -> Result<Page<RecallRequest>, PortError> {
        let sort = CampaignSort::parse(page.sort_by.as_deref())?;
        let rows = self
            .recalls
            .list_campaigns(status, sort, page)
            .await
            .map_err(db_to_port_error)?;
        to_page(rows, page, |row| row.into_domain()).map_err(db_to_port_error)
    }

    async fn list_campaigns_for_customer(
        &self,
        customer_id: CustomerId,
        page: &PageRequest,
    ) -> Result<Page<RecallRequest>, PortError> {
        let sort = CampaignSort::parse(page.sort_by.as_deref())?;
        let rows = self
            .recalls
            .list_campaigns_for_customer(customer_id.into(), sort, page)
            .await
            .map_err(db_to_port_error)?;
        to_page(rows, page, |row| row.into_domain()).map_err(db_to_port_error)
    }

    #[instrument(skip(self, campaign), fields(campaign_id = %campaign.id))]
    async fn insert_campaign(&self, campaign: &RecallRequest) -> Result<(), PortError> {
        self.get_part(campaign.part_id).await?;
        let mut conn = self.pool.acquire().await.map_err(|e| db_to_port_error(e.into()))?;
        RecallRepository::insert_campaign(&mut conn, campaign)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, campaign), fields(campaign_id = %campaign.id))]
    async fn update_campaign(&self, campaign: &RecallRequest, expected_version: i64) -> Result<RecallRequest, PortError> {
        self.update_campaign_row(campaign, expected_version)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self), fields(campaign_id = %id))]
    async fn delete_campaign(&self, id: RecallRequestId, expected_version: i64) -> Result<(), PortError> {
        self.delete_campaign_row(id, expected_version)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, campaign, responses), fields(campaign_id = %campaign.id, responses = responses.len()))]
    async fn commit_fan_out(
        &self,
        campaign: &RecallRequest,
        expected_version: i64,
        responses: &[RecallResponse],
    ) -> Result<RecallRequest, PortError> {
        self.fan_out_rows(campaign, expected_version, responses)
            .await
            .map_err(db_to_port_error)
    }

    // ========================================================================
    // Recall responses
    // ========================================================================

    #[instrument(skip(self), fields(response_id = %id))]
    async fn get_response(&self, id: RecallResponseId) -> Result<RecallResponse, PortError> {
        let row = self
            .recalls
            .find_response(id.into())
            .await
            .map_err(db_to_port_error)?
            .ok_or_else(|| PortError::not_found("RecallResponse", id))?;
        row.into_domain().map_err(db_to_port_error)
    }

    async fn responses_for_campaign(&self, campaign_id: RecallRequestId) -> Result<Vec<RecallResponse>, PortError> {
        self.recalls
            .responses_for_campaign(campaign_id.into())
            .await
            .map_err(db_to_port_error)?
            .into_iter()
            .map(|row| row.into_domain().map_err(db_to_port_error))
            .collect()
    }

    async fn responses_for_customer(
        &self,
        customer_id: CustomerId,
        page: &PageRequest,
    ) -> Result<Page<RecallResponse>, PortError> {
        let sort = ResponseSort::parse(page.sort_by.as_deref())?;
        let rows = self
            .recalls
            .responses_for_customer(customer_id.into(), sort, page)
            .await
            .map_err(db_to_port_error)?;
        to_page(rows, page, |row| row.into_domain()).map_err(db_to_port_error)
    }

    async fn response_for_claim(&self, claim_id: ClaimId) -> Result<Option<RecallResponse>, PortError> {
        self.recalls
            .find_response_for_claim(claim_id.into())
            .await
            .map_err(db_to_port_error)?
            .map(|row| row.into_domain().map_err(db_to_port_error))
            .transpose()
    }

    async fn list_responses(
        &self,
        status: Option<RecallResponseStatus>,
        page: &PageRequest,
    ) -> Result<Page<RecallResponse>, PortError> {
        let sort = ResponseSort::parse(page.sort_by.as_deref())?;
        let rows = self
            .recalls
            .list_responses(status, sort, page)
            .await
            .map_err(db_to_port_error)?;
        to_page(rows, page, |row| row.into_domain()).map_err(db_to_port_error)
    }

    #[instrument(skip(self, response), fields(response_id = %response.id))]
    async fn update_response(&self, response: &RecallResponse, expected_version: i64) -> Result<RecallResponse, PortError> {
        self.update_response_row(response, expected_version)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, response, claim), fields(response_id = %response.id, claim_id = %claim.id))]
    async fn commit_acceptance(
        &self,
        response: &RecallResponse,
        expected_version: i64,
        claim: &WarrantyClaim,
    ) -> Result<RecallResponse, PortError> {
        self.acceptance_rows(response, expected_version, claim)
            .await
            .map_err(db_to_port_error)
    }

    // ========================================================================
    // Part requests
    // ========================================================================

    #[instrument(skip(self), fields(part_request_id = %id))]
    async fn get_part_request(&self, id: PartRequestId) -> Result<PartRequest, PortError> {
        let row = self
            .part_requests
            .find(id.into())
            .await
            .map_err(db_to_port_error)?
            .ok_or_else(|| PortError::not_found("PartRequest", id))?;
        row.into_domain().map_err(db_to_port_error)
    }

    async fn list_part_requests(
        &self,
        filter: &PartRequestFilter,
        page: &PageRequest,
    ) -> Result<Page<PartRequest>, PortError> {
        let sort = PartRequestSort::parse(page.sort_by.as_deref())?;
        let rows = self
            .part_requests
            .list(filter, sort, page)
            .await
            .map_err(db_to_port_error)?;
        to_page(rows, page, |row| row.into_domain()).map_err(db_to_port_error)
    }

    #[instrument(skip(self, request), fields(part_request_id = %request.id))]
    async fn insert_part_request(&self, request: &PartRequest) -> Result<(), PortError> {
        self.get_claim(request.warranty_claim_id).await?;
        self.get_part(request.faulty_part_id).await?;
        self.part_requests.insert(request).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self, request), fields(part_request_id = %request.id))]
    async fn update_part_request(&self, request: &PartRequest, expected_version: i64) -> Result<PartRequest, PortError> {
        self.update_part_request_row(request, expected_version)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self), fields(part_request_id = %id))]
    async fn delete_part_request(&self, id: PartRequestId, expected_version: i64) -> Result<(), PortError> {
        self.delete_part_request_row(id, expected_version)
            .await
            .map_err(db_to_port_error)
    }

    // ========================================================================
    // Feedback
    // ========================================================================

    #[instrument(skip(self), fields(feedback_id = %id))]
    async fn get_feedback(&self, id: FeedbackId) -> Result<Feedback, PortError> {
        let row = self
            .feedback
            .find(id.into())
            .await
            .map_err(db_to_port_error)?
            .ok_or_else(|| PortError::not_found("Feedback", id))?;
        row.into_domain().map_err(db_to_port_error)
    }

    async fn feedback_for_claim(&self, claim_id: ClaimId) -> Result<Option<Feedback>, PortError> {
        self.feedback
            .find_by_claim(claim_id.into())
            .await
            .map_err(db_to_port_error)?
            .map(|row| row.into_domain())
            .transpose()
            .map_err(db_to_port_error)
    }

    async fn list_feedback(&self, filter: &FeedbackFilter, page: &PageRequest) -> Result<Page<Feedback>, PortError> {
        let sort = FeedbackSort::parse(page.sort_by.as_deref())?;
        let rows = self
            .feedback
            .list(filter, sort, page)
            .await
            .map_err(db_to_port_error)?;
        to_page(rows, page, |row| row.into_domain()).map_err(db_to_port_error)
    }

    #[instrument(skip(self, feedback), fields(feedback_id = %feedback.id))]
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), PortError> {
        self.get_claim(feedback.warranty_claim_id).await?;
        self.feedback.insert(feedback).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self, feedback), fields(feedback_id = %feedback.id))]
    async fn update_feedback(&self, feedback: &Feedback, expected_version: i64) -> Result<Feedback, PortError> {
        self.update_feedback_row(feedback, expected_version)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self), fields(feedback_id = %id))]
    async fn delete_feedback(&self, id: FeedbackId, expected_version: i64) -> Result<(), PortError> {
        self.delete_feedback_row(id, expected_version)
            .await
            .map_err(db_to_port_error)
    }

    async fn feedback_summary(&self) -> Result<FeedbackSummary, PortError> {
        self.feedback.summary().await.map_err(db_to_port_error)
    }

    // ========================================================================
    // Work logs
    // ========================================================================

    #[instrument(skip(self), fields(work_log_id = %id))]
    async fn get_work_log(&self, id: WorkLogId) -> Result<WorkLog, PortError> {
        self.work_logs
            .find(id.into())
            .await
            .map_err(db_to_port_error)?
            .map(|row| row.into_domain())
            .ok_or_else(|| PortError::not_found("WorkLog", id))
    }

    async fn list_work_logs(&self, filter: &WorkLogFilter, page: &PageRequest) -> Result<Page<WorkLog>, PortError> {
        let sort = WorkLogSort::parse(page.sort_by.as_deref())?;
        let rows = self
            .work_logs
            .list(filter, sort, page)
            .await
            .map_err(db_to_port_error)?;
        to_page(rows, page, |row| Ok(row.into_domain())).map_err(db_to_port_error)
    }

    #[instrument(skip(self, log), fields(work_log_id = %log.id))]
    async fn insert_work_log(&self, log: &WorkLog) -> Result<(), PortError> {
        self.get_claim(log.warranty_claim_id).await?;
        self.work_logs.insert(log).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self, log), fields(work_log_id = %log.id))]
    async fn update_work_log(&self, log: &WorkLog, expected_version: i64) -> Result<WorkLog, PortError> {
        self.update_work_log_row(log, expected_version)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self), fields(work_log_id = %id))]
    async fn delete_work_log(&self, id: WorkLogId, expected_version: i64) -> Result<(), PortError> {
        self.delete_work_log_row(id, expected_version)
            .await
            .map_err(db_to_port_error)
    }
}
