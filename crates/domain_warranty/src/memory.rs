//! In-memory Warranty Store
//!
//! A `WarrantyStore` held entirely in process memory behind a single
//! `tokio::sync::RwLock`. Every write takes the lock for its whole duration,
//! so mutations are serialized. Multi-entity commits are staged on a copy of
//! the state and swapped in only when every step succeeded.
//!
//! Used by the service tests, the HTTP tests, and local demos.

use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::Instant;
use tokio::sync::RwLock;

use core_kernel::{
    AdapterHealth, AdapterType, ClaimId, CustomerId, DomainPort, FeedbackId, HealthCheckResult,
    HealthCheckable, InstalledPartId, Page, PageRequest, PartId, PartRequestId, PortError,
    RecallRequestId, RecallResponseId, SortDirection, VehicleId, WorkLogId,
};

use crate::claim::WarrantyClaim;
use crate::feedback::{Feedback, FeedbackSummary};
use crate::fleet::{InstalledPart, Part, Vehicle};
use crate::part_request::PartRequest;
use crate::ports::{
    CampaignSort, ClaimFilter, ClaimSort, FeedbackFilter, FeedbackSort, PartRequestFilter,
    PartRequestSort, ResponseSort, WarrantyStore, WorkLogFilter, WorkLogSort,
};
use crate::recall::{RecallRequest, RecallRequestStatus};
use crate::response::{RecallResponse, RecallResponseStatus};
use crate::work_log::WorkLog;

#[derive(Debug, Clone, Default)]
struct State {
    vehicles: HashMap<VehicleId, Vehicle>,
    parts: HashMap<PartId, Part>,
    installed_parts: HashMap<InstalledPartId, InstalledPart>,
    claims: HashMap<ClaimId, WarrantyClaim>,
    campaigns: HashMap<RecallRequestId, RecallRequest>,
    responses: HashMap<RecallResponseId, RecallResponse>,
    part_requests: HashMap<PartRequestId, PartRequest>,
    feedback: HashMap<FeedbackId, Feedback>,
    work_logs: HashMap<WorkLogId, WorkLog>,
}

/// Process-local `WarrantyStore`
#[derive(Debug, Default)]
pub struct InMemoryWarrantyStore {
    state: RwLock<State>,
    fail_next_commit: AtomicBool,
}

fn check_version(entity: &str, id: impl Display, stored: i64, expected: i64) -> Result<(), PortError> {
    if stored == expected {
        Ok(())
    } else {
        Err(PortError::stale_version(entity, id, expected))
    }
}

fn ordered(ordering: Ordering, dir: SortDirection) -> Ordering {
    match dir {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn paginate<T>(mut rows: Vec<T>, page: &PageRequest, cmp: impl Fn(&T, &T) -> Ordering) -> Page<T> {
    rows.sort_by(|a, b| ordered(cmp(a, b), page.sort_dir));
    Page::from_sorted(rows, page)
}

impl State {
    fn claim_mut(&mut self, id: ClaimId) -> Result<&mut WarrantyClaim, PortError> {
        self.claims
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("WarrantyClaim", id))
    }

    fn campaign_mut(&mut self, id: RecallRequestId) -> Result<&mut RecallRequest, PortError> {
        self.campaigns
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("RecallRequest", id))
    }

    fn response_mut(&mut self, id: RecallResponseId) -> Result<&mut RecallResponse, PortError> {
        self.responses
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("RecallResponse", id))
    }

    fn write_claim(&mut self, claim: &WarrantyClaim, expected: i64) -> Result<WarrantyClaim, PortError> {
        let stored = self.claim_mut(claim.id)?;
        check_version("WarrantyClaim", claim.id, stored.version, expected)?;
        *stored = WarrantyClaim {
            version: expected + 1,
            ..claim.clone()
        };
        Ok(stored.clone())
    }

    fn write_campaign(&mut self, campaign: &RecallRequest, expected: i64) -> Result<RecallRequest, PortError> {
        let stored = self.campaign_mut(campaign.id)?;
        check_version("RecallRequest", campaign.id, stored.version, expected)?;
        *stored = RecallRequest {
            version: expected + 1,
            ..campaign.clone()
        };
        Ok(stored.clone())
    }

    fn write_response(&mut self, response: &RecallResponse, expected: i64) -> Result<RecallResponse, PortError> {
        let stored = self.response_mut(response.id)?;
        check_version("RecallResponse", response.id, stored.version, expected)?;
        *stored = RecallResponse {
            version: expected + 1,
            ..response.clone()
        };
        Ok(stored.clone())
    }

    fn insert_claim(&mut self, claim: &WarrantyClaim) -> Result<(), PortError> {
        if self.claims.contains_key(&claim.id) {
            return Err(PortError::conflict(format!("WarrantyClaim {} already exists", claim.id)));
        }
        if let Some(response_id) = claim.recall_response_id {
            let linked = self
                .claims
                .values()
                .any(|c| c.recall_response_id == Some(response_id));
            if linked {
                return Err(PortError::conflict(format!(
                    "Recall response {} already has a warranty claim",
                    response_id
                )));
            }
        }
        self.claims.insert(claim.id, claim.clone());
        Ok(())
    }

    fn customer_vehicles(&self, customer_id: CustomerId) -> Vec<VehicleId> {
        self.vehicles
            .values()
            .filter(|v| v.customer_id == customer_id)
            .map(|v| v.id)
            .collect()
    }
}

impl InMemoryWarrantyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `commit_*` call fail after staging its changes
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, AtomicOrdering::SeqCst);
    }

    fn take_injected_failure(&self) -> Result<(), PortError> {
        if self.fail_next_commit.swap(false, AtomicOrdering::SeqCst) {
            Err(PortError::internal("injected commit failure"))
        } else {
            Ok(())
        }
    }

    /// Number of responses stored for a campaign
    pub async fn response_count(&self, campaign_id: RecallRequestId) -> usize {
        let state = self.state.read().await;
        state
            .responses
            .values()
            .filter(|r| r.recall_request_id == campaign_id)
            .count()
    }

    pub async fn claim_count(&self) -> usize {
        self.state.read().await.claims.len()
    }
}

impl DomainPort for InMemoryWarrantyStore {}

#[async_trait]
impl HealthCheckable for InMemoryWarrantyStore {
    async fn health_check(&self) -> HealthCheckResult {
        let started = Instant::now();
        let claims = self.state.read().await.claims.len();

        HealthCheckResult {
            adapter_id: "in-memory-warranty-store".to_string(),
            adapter_type: AdapterType::Mock,
            status: AdapterHealth::Healthy,
            latency_ms: started.elapsed().as_millis() as u64,
            message: Some(format!("{} claims held", claims)),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl WarrantyStore for InMemoryWarrantyStore {
    async fn get_vehicle(&self, id: VehicleId) -> Result<Vehicle, PortError> {
        self.state
            .read()
            .await
            .vehicles
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Vehicle", id))
    }

    async fn save_vehicle(&self, vehicle: &Vehicle) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let vin_taken = state
            .vehicles
            .values()
            .any(|v| v.vin == vehicle.vin && v.id != vehicle.id);
        if vin_taken {
            return Err(PortError::conflict(format!("VIN {} is already registered", vehicle.vin)));
        }
        state.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(())
    }

    async fn get_part(&self, id: PartId) -> Result<Part, PortError> {
        self.state
            .read()
            .await
            .parts
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Part", id))
    }

    async fn save_part(&self, part: &Part) -> Result<(), PortError> {
        self.state.write().await.parts.insert(part.id, part.clone());
        Ok(())
    }

    async fn get_installed_part(&self, id: InstalledPartId) -> Result<InstalledPart, PortError> {
        self.state
            .read()
            .await
            .installed_parts
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("InstalledPart", id))
    }

    async fn save_installed_part(&self, installed: &InstalledPart) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        if !state.vehicles.contains_key(&installed.vehicle_id) {
            return Err(PortError::not_found("Vehicle", installed.vehicle_id));
        }
        if !state.parts.contains_key(&installed.part_id) {
            return Err(PortError::not_found("Part", installed.part_id));
        }
        state.installed_parts.insert(installed.id, installed.clone());
        Ok(())
    }

    async fn find_installations_of_part(&self, part_id: PartId) -> Result<Vec<InstalledPart>, PortError> {
        let state = self.state.read().await;
        let mut found: Vec<InstalledPart> = state
            .installed_parts
            .values()
            .filter(|ip| ip.part_id == part_id)
            .cloned()
            .collect();
        found.sort_by_key(|ip| ip.id);
        Ok(found)
    }

    async fn find_installation_on_vehicle(
        &self,
        part_id: PartId,
        vehicle_id: VehicleId,
    ) -> Result<Option<InstalledPart>, PortError> {
        let state = self.state.read().await;
        Ok(state
            .installed_parts
            .values()
            .filter(|ip| ip.part_id == part_id && ip.vehicle_id == vehicle_id)
            .max_by_key(|ip| ip.installation_date)
            .cloned())
    }

    async fn get_claim(&self, id: ClaimId) -> Result<WarrantyClaim, PortError> {
        self.state
            .read()
            .await
            .claims
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("WarrantyClaim", id))
    }

    async fn list_claims(&self, filter: &ClaimFilter, page: &PageRequest) -> Result<Page<WarrantyClaim>, PortError> {
        let sort = ClaimSort::parse(page.sort_by.as_deref())?;
        let state = self.state.read().await;
        let rows: Vec<WarrantyClaim> = state.claims.values().filter(|c| filter.matches(c)).cloned().collect();

        Ok(paginate(rows, page, |a, b| {
            let primary = match sort {
                ClaimSort::ClaimDate => a.claim_date.cmp(&b.claim_date),
                ClaimSort::Status => a.status.as_str().cmp(b.status.as_str()),
                ClaimSort::ResolutionDate => a.resolution_date.cmp(&b.resolution_date),
            };
            primary.then(a.id.cmp(&b.id))
        }))
    }

    async fn insert_claim(&self, claim: &WarrantyClaim) -> Result<(), PortError> {
        self.state.write().await.insert_claim(claim)
    }

    async fn update_claim(&self, claim: &WarrantyClaim, expected_version: i64) -> Result<WarrantyClaim, PortError> {
        self.state.write().await.write_claim(claim, expected_version)
    }

    async fn delete_claim(&self, id: ClaimId, expected_version: i64) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let stored = state.claim_mut(id)?;
        check_version("WarrantyClaim", id, stored.version, expected_version)?;

        if state.part_requests.values().any(|pr| pr.warranty_claim_id == id) {
            return Err(PortError::conflict(format!(
                "WarrantyClaim {} is referenced by part requests",
                id
            )));
        }
        if state.responses.values().any(|r| r.warranty_claim_id == Some(id)) {
            return Err(PortError::conflict(format!(
                "WarrantyClaim {} is linked to a recall response",
                id
            )));
        }
        let has_history = state.feedback.values().any(|f| f.warranty_claim_id == id)
            || state.work_logs.values().any(|w| w.warranty_claim_id == id);
        if has_history {
            return Err(PortError::conflict(format!(
                "WarrantyClaim {} has feedback or work logs",
                id
            )));
        }
        state.claims.remove(&id);
        Ok(())
    }

    async fn commit_claim_completion(
        &self,
        claim: &WarrantyClaim,
        expected_version: i64,
        response: Option<(&RecallResponse, i64)>,
    ) -> Result<WarrantyClaim, PortError> {
        let mut state = self.state.write().await;
        let mut staged = state.clone();

        let stored = staged.write_claim(claim, expected_version)?;
        if let Some((response, response_version)) = response {
            staged.write_response(response, response_version)?;
        }

        self.take_injected_failure()?;
        *state = staged;
        Ok(stored)
    }

    async fn get_campaign(&self, id: RecallRequestId) -> Result<RecallRequest, PortError> {
        self.state
            .read()
            .await
            .campaigns
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("RecallRequest", id))
    }

    async fn list_campaigns(
        &self,
        status: Option<RecallRequestStatus>,
        page: &PageRequest,
    ) -> Result<Page<RecallRequest>, PortError> {
        let sort = CampaignSort::parse(page.sort_by.as_deref())?;
        let state = self.state.read().await;
        let rows: Vec<RecallRequest> = state
            .campaigns
            .values()
            .filter(|c| status.map_or(true, |s| c.status == s))
            .cloned()
            .collect();

        Ok(paginate(rows, page, |a, b| compare_campaigns(sort, a, b)))
    }

    async fn list_campaigns_for_customer(
        &self,
        customer_id: CustomerId,
        page: &PageRequest,
    ) -> Result<Page<RecallRequest>, PortError> {
        let sort = CampaignSort::parse(page.sort_by.as_deref())?;
        let state = self.state.read().await;
        let vehicles = state.customer_vehicles(customer_id);
        let rows: Vec<RecallRequest> = state
            .campaigns
            .values()
            .filter(|c| {
                state
                    .responses
                    .values()
                    .any(|r| r.recall_request_id == c.id && vehicles.contains(&r.vehicle_id))
            })
            .cloned()
            .collect();

        Ok(paginate(rows, page, |a, b| compare_campaigns(sort, a, b)))
    }

    async fn insert_campaign(&self, campaign: &RecallRequest) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        if !state.parts.contains_key(&campaign.part_id) {
            return Err(PortError::not_found("Part", campaign.part_id));
        }
        state.campaigns.insert(campaign.id, campaign.clone());
        Ok(())
    }

    async fn update_campaign(&self, campaign: &RecallRequest, expected_version: i64) -> Result<RecallRequest, PortError> {
        self.state.write().await.write_campaign(campaign, expected_version)
    }

    async fn delete_campaign(&self, id: RecallRequestId, expected_version: i64) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let stored = state.campaign_mut(id)?;
        check_version("RecallRequest", id, stored.version, expected_version)?;

        if state.responses.values().any(|r| r.recall_request_id == id) {
            return Err(PortError::conflict(format!("RecallRequest {} has responses", id)));
        }
        state.campaigns.remove(&id);
        Ok(())
    }

    async fn commit_fan_out(
        &self,
        campaign: &RecallRequest,
        expected_version: i64,
        responses: &[RecallResponse],
    ) -> Result<RecallRequest, PortError> {
        let mut state = self.state.write().await;
        let mut staged = state.clone();

        let stored = staged.write_campaign(campaign, expected_version)?;
        for response in responses {
            let duplicate = staged.responses.values().any(|r| {
                r.recall_request_id == response.recall_request_id && r.vehicle_id == response.vehicle_id
            });
            if duplicate {
                return Err(PortError::conflict(format!(
                    "Recall {} already has a response for vehicle {}",
                    response.recall_request_id, response.vehicle_id
                )));
            }
            staged.responses.insert(response.id, response.clone());
        }

        self.take_injected_failure()?;
        *state = staged;
        Ok(stored)
    }

    async fn get_response(&self, id: RecallResponseId) -> Result<RecallResponse, PortError> {
        self.state
            .read()
            .await
            .responses
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("RecallResponse", id))
    }

    async fn responses_for_campaign(&self, campaign_id: RecallRequestId) -> Result<Vec<RecallResponse>, PortError> {
        let state = self.state.read().await;
        let mut found: Vec<RecallResponse> = state
            .responses
            .values()
            .filter(|r| r.recall_request_id == campaign_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.vehicle_id);
        Ok(found)
    }

    async fn responses_for_customer(
        &self,
        customer_id: CustomerId,
        page: &PageRequest,
    ) -> Result<Page<RecallResponse>, PortError> {
        let sort = ResponseSort::parse(page.sort_by.as_deref())?;
        let state = self.state.read().await;
        let vehicles = state.customer_vehicles(customer_id);
        let rows: Vec<RecallResponse> = state
            .responses
            .values()
            .filter(|r| vehicles.contains(&r.vehicle_id))
            .cloned()
            .collect();

        Ok(paginate(rows, page, |a, b| compare_responses(sort, a, b)))
    }

    async fn response_for_claim(&self, claim_id: ClaimId) -> Result<Option<RecallResponse>, PortError> {
        let state = self.state.read().await;
        Ok(state
            .responses
            .values()
            .find(|r| r.warranty_claim_id == Some(claim_id))
            .cloned())
    }

    async fn list_responses(
        &self,
        status: Option<RecallResponseStatus>,
        page: &PageRequest,
    ) -> Result<Page<RecallResponse>, PortError> {
        let sort = ResponseSort::parse(page.sort_by.as_deref())?;
        let state = self.state.read().await;
        let rows: Vec<RecallResponse> = state
            .responses
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();

        Ok(paginate(rows, page, |a, b| compare_responses(sort, a, b)))
    }

    async fn update_response(&self, response: &RecallResponse, expected_version: i64) -> Result<RecallResponse, PortError> {
        self.state.write().await.write_response(response, expected_version)
    }

    async fn commit_acceptance(
        &self,
        response: &RecallResponse,
        expected_version: i64,
        claim: &WarrantyClaim,
    ) -> Result<RecallResponse, PortError> {
        let mut state = self.state.write().await;
        let mut staged = state.clone();

        staged.insert_claim(claim)?;
        let stored = staged.write_response(response, expected_version)?;

        let at = response.responded_at.unwrap_or(claim.claim_date);
        let campaign = staged.campaign_mut(response.recall_request_id)?;
        if campaign.mark_claim_created(at) {
            campaign.version += 1;
        }

        self.take_injected_failure()?;
        *state = staged;
        Ok(stored)
    }

    async fn get_part_request(&self, id: PartRequestId) -> Result<PartRequest, PortError> {
        self.state
            .read()
            .await
            .part_requests
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("PartRequest", id))
    }

    async fn list_part_requests(
        &self,
        filter: &PartRequestFilter,
        page: &PageRequest,
    ) -> Result<Page<PartRequest>, PortError> {
        let sort = PartRequestSort::parse(page.sort_by.as_deref())?;
        let state = self.state.read().await;
        let rows: Vec<PartRequest> = state
            .part_requests
            .values()
            .filter(|pr| filter.matches(pr))
            .cloned()
            .collect();

        Ok(paginate(rows, page, |a, b| {
            let primary = match sort {
                PartRequestSort::RequestDate => a.request_date.cmp(&b.request_date),
                PartRequestSort::Status => a.status.as_str().cmp(b.status.as_str()),
                PartRequestSort::Quantity => a.quantity.cmp(&b.quantity),
            };
            primary.then(a.id.cmp(&b.id))
        }))
    }

    async fn insert_part_request(&self, request: &PartRequest) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        if !state.claims.contains_key(&request.warranty_claim_id) {
            return Err(PortError::not_found("WarrantyClaim", request.warranty_claim_id));
        }
        if !state.parts.contains_key(&request.faulty_part_id) {
            return Err(PortError::not_found("Part", request.faulty_part_id));
        }
        state.part_requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn update_part_request(&self, request: &PartRequest, expected_version: i64) -> Result<PartRequest, PortError> {
        let mut state = self.state.write().await;
        let stored = state
            .part_requests
            .get_mut(&request.id)
            .ok_or_else(|| PortError::not_found("PartRequest", request.id))?;
        check_version("PartRequest", request.id, stored.version, expected_version)?;
        *stored = PartRequest {
            version: expected_version + 1,
            ..request.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_part_request(&self, id: PartRequestId, expected_version: i64) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let stored = state
            .part_requests
            .get(&id)
            .ok_or_else(|| PortError::not_found("PartRequest", id))?;
        check_version("PartRequest", id, stored.version, expected_version)?;
        state.part_requests.remove(&id);
        Ok(())
    }

    async fn get_feedback(&self, id: FeedbackId) -> Result<Feedback, PortError> {
        self.state
            .read()
            .await
            .feedback
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Feedback", id))
    }

    async fn feedback_for_claim(&self, claim_id: ClaimId) -> Result<Option<Feedback>, PortError> {
        let state = self.state.read().await;
        Ok(state
            .feedback
            .values()
            .find(|f| f.warranty_claim_id == claim_id)
            .cloned())
    }

    async fn list_feedback(&self, filter: &FeedbackFilter, page: &PageRequest) -> Result<Page<Feedback>, PortError> {
        let sort = FeedbackSort::parse(page.sort_by.as_deref())?;
        let state = self.state.read().await;
        let rows: Vec<Feedback> = state.feedback.values().filter(|f| filter.matches(f)).cloned().collect();

        Ok(paginate(rows, page, |a, b| {
            let primary = match sort {
                FeedbackSort::CreatedAt => a.created_at.cmp(&b.created_at),
                FeedbackSort::Rating => a.rating.cmp(&b.rating),
            };
            primary.then(a.id.cmp(&b.id))
        }))
    }

    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        if !state.claims.contains_key(&feedback.warranty_claim_id) {
            return Err(PortError::not_found("WarrantyClaim", feedback.warranty_claim_id));
        }
        if state
            .feedback
            .values()
            .any(|f| f.warranty_claim_id == feedback.warranty_claim_id)
        {
            return Err(PortError::conflict(format!(
                "WarrantyClaim {} already has feedback",
                feedback.warranty_claim_id
            )));
        }
        state.feedback.insert(feedback.id, feedback.clone());
        Ok(())
    }

    async fn update_feedback(&self, feedback: &Feedback, expected_version: i64) -> Result<Feedback, PortError> {
        let mut state = self.state.write().await;
        let stored = state
            .feedback
            .get_mut(&feedback.id)
            .ok_or_else(|| PortError::not_found("Feedback", feedback.id))?;
        check_version("Feedback", feedback.id, stored.version, expected_version)?;
        *stored = Feedback {
            version: expected_version + 1,
            ..feedback.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_feedback(&self, id: FeedbackId, expected_version: i64) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let stored = state
            .feedback
            .get(&id)
            .ok_or_else(|| PortError::not_found("Feedback", id))?;
        check_version("Feedback", id, stored.version, expected_version)?;
        state.feedback.remove(&id);
        Ok(())
    }

    async fn feedback_summary(&self) -> Result<FeedbackSummary, PortError> {
        let state = self.state.read().await;
        let mut counts = [0u64; 5];
        for feedback in state.feedback.values() {
            counts[usize::from(feedback.rating.value() - 1)] += 1;
        }
        Ok(FeedbackSummary::from_counts(counts))
    }

    async fn get_work_log(&self, id: WorkLogId) -> Result<WorkLog, PortError> {
        self.state
            .read()
            .await
            .work_logs
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("WorkLog", id))
    }

    async fn list_work_logs(&self, filter: &WorkLogFilter, page: &PageRequest) -> Result<Page<WorkLog>, PortError> {
        let sort = WorkLogSort::parse(page.sort_by.as_deref())?;
        let state = self.state.read().await;
        let rows: Vec<WorkLog> = state.work_logs.values().filter(|w| filter.matches(w)).cloned().collect();

        Ok(paginate(rows, page, |a, b| {
            let primary = match sort {
                WorkLogSort::StartTime => a.start_time.cmp(&b.start_time),
                WorkLogSort::EndTime => a.end_time.cmp(&b.end_time),
            };
            primary.then(a.id.cmp(&b.id))
        }))
    }

    async fn insert_work_log(&self, log: &WorkLog) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        if !state.claims.contains_key(&log.warranty_claim_id) {
            return Err(PortError::not_found("WarrantyClaim", log.warranty_claim_id));
        }
        state.work_logs.insert(log.id, log.clone());
        Ok(())
    }

    async fn update_work_log(&self, log: &WorkLog, expected_version: i64) -> Result<WorkLog, PortError> {
        let mut state = self.state.write().await;
        let stored = state
            .work_logs
            .get_mut(&log.id)
            .ok_or_else(|| PortError::not_found("WorkLog", log.id))?;
        check_version("WorkLog", log.id, stored.version, expected_version)?;
        *stored = WorkLog {
            version: expected_version + 1,
            ..log.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_work_log(&self, id: WorkLogId, expected_version: i64) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let stored = state
            .work_logs
            .get(&id)
            .ok_or_else(|| PortError::not_found("WorkLog", id))?;
        check_version("WorkLog", id, stored.version, expected_version)?;
        state.work_logs.remove(&id);
        Ok(())
    }
}

fn compare_campaigns(sort: CampaignSort, a: &RecallRequest, b: &RecallRequest) -> Ordering {
    let primary = match sort {
        CampaignSort::CreatedAt => a.created_at.cmp(&b.created_at),
        CampaignSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        CampaignSort::Status => a.status.as_str().cmp(b.status.as_str()),
    };
    primary.then(a.id.cmp(&b.id))
}

fn compare_responses(sort: ResponseSort, a: &RecallResponse, b: &RecallResponse) -> Ordering {
    let primary = match sort {
        ResponseSort::CreatedAt => a.created_at.cmp(&b.created_at),
        ResponseSort::RespondedAt => a.responded_at.cmp(&b.responded_at),
        ResponseSort::Status => a.status.as_str().cmp(b.status.as_str()),
    };
    primary.then(a.id.cmp(&b.id))
}
