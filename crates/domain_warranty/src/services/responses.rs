//! Recall response service

use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{Clock, Page, PageRequest, RecallRequestId, RecallResponseId};

use crate::actor::{Actor, Role};
use crate::claim::{WarrantyClaim, WarrantyClaimStatus};
use crate::error::WarrantyError;
use crate::ports::WarrantyStore;
use crate::response::{RecallResponse, RecallResponseStatus};

const STAFF: &[Role] = &[Role::Admin, Role::EvmStaff, Role::ScStaff, Role::ScTechnician];

/// Tracks customers' answers to recall campaigns
pub struct RecallResponseService {
    store: Arc<dyn WarrantyStore>,
    clock: Arc<dyn Clock>,
}

impl RecallResponseService {
    pub fn new(store: Arc<dyn WarrantyStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The vehicle owner accepts or declines a recall
    ///
    /// Accepting opens a SUBMITTED warranty claim for the recalled part on the
    /// vehicle and leaves the response IN_PROGRESS, linked to that claim. The
    /// claim insert, the response update, and the campaign's move to
    /// CLAIM_CREATED are committed together or not at all.
    #[instrument(skip(self, actor, note), fields(response_id = %id))]
    pub async fn customer_confirm(
        &self,
        actor: &Actor,
        id: RecallResponseId,
        accepted: bool,
        note: Option<String>,
    ) -> Result<RecallResponse, WarrantyError> {
        let customer_id = actor.require_customer()?;
        let mut response = self.store.get_response(id).await?;
        let vehicle = self.store.get_vehicle(response.vehicle_id).await?;
        if vehicle.customer_id != customer_id {
            return Err(WarrantyError::forbidden("This recall concerns another customer's vehicle"));
        }
        response.ensure_pending()?;
        let read_version = response.version;
        let now = self.clock.now();

        if !accepted {
            response.decline(note, now)?;
            let stored = self.store.update_response(&response, read_version).await?;
            warn!(response_id = %id, vehicle_id = %vehicle.id, "Recall declined by customer");
            return Ok(stored);
        }

        let campaign = self.store.get_campaign(response.recall_request_id).await?;
        let installed = self
            .store
            .find_installation_on_vehicle(campaign.part_id, vehicle.id)
            .await?
            .ok_or_else(|| {
                WarrantyError::not_found(
                    "InstalledPart",
                    format!("{} on vehicle {}", campaign.part_id, vehicle.id),
                )
            })?;

        let claim = WarrantyClaim::for_recall(response.id, vehicle.id, installed.id, &campaign.reason, now);
        response.accept(note, claim.id, now)?;

        let stored = self.store.commit_acceptance(&response, read_version, &claim).await?;
        info!(
            response_id = %id,
            claim_id = %claim.id,
            campaign_id = %campaign.id,
            "Recall accepted, warranty claim created"
        );
        Ok(stored)
    }

    /// Closes an IN_PROGRESS response whose claim has been completed
    #[instrument(skip(self, actor), fields(response_id = %id))]
    pub async fn complete_response(&self, actor: &Actor, id: RecallResponseId) -> Result<RecallResponse, WarrantyError> {
        actor.require_any(STAFF)?;
        let mut response = self.store.get_response(id).await?;
        if response.status != RecallResponseStatus::InProgress {
            return Err(WarrantyError::conflict(format!(
                "Recall response {} is {} and cannot be completed",
                id, response.status
            )));
        }

        let claim_id = response
            .warranty_claim_id
            .ok_or_else(|| WarrantyError::conflict(format!("Recall response {} has no linked claim", id)))?;
        let claim = self.store.get_claim(claim_id).await?;
        if claim.status != WarrantyClaimStatus::Completed {
            return Err(WarrantyError::conflict(format!(
                "Linked claim {} is {}, not COMPLETED",
                claim_id, claim.status
            )));
        }

        let read_version = response.version;
        response.complete(self.clock.now())?;
        let stored = self.store.update_response(&response, read_version).await?;
        info!(response_id = %id, "Recall response completed");
        Ok(stored)
    }

    /// Staff see every response; customers only those for their own vehicles
    pub async fn get_response(&self, actor: &Actor, id: RecallResponseId) -> Result<RecallResponse, WarrantyError> {
        let response = self.store.get_response(id).await?;
        if actor.has_any(STAFF) {
            return Ok(response);
        }

        let customer_id = actor.require_customer()?;
        let vehicle = self.store.get_vehicle(response.vehicle_id).await?;
        if vehicle.customer_id != customer_id {
            return Err(WarrantyError::forbidden("This recall concerns another customer's vehicle"));
        }
        Ok(response)
    }

    pub async fn responses_for_campaign(
        &self,
        actor: &Actor,
        campaign_id: RecallRequestId,
    ) -> Result<Vec<RecallResponse>, WarrantyError> {
        actor.require_any(STAFF)?;
        self.store.get_campaign(campaign_id).await?;
        Ok(self.store.responses_for_campaign(campaign_id).await?)
    }

    pub async fn responses_for_customer(
        &self,
        actor: &Actor,
        page: &PageRequest,
    ) -> Result<Page<RecallResponse>, WarrantyError> {
        let customer_id = actor.require_customer()?;
        Ok(self.store.responses_for_customer(customer_id, page).await?)
    }

    pub async fn list_responses(
        &self,
        actor: &Actor,
        status: Option<RecallResponseStatus>,
        page: &PageRequest,
    ) -> Result<Page<RecallResponse>, WarrantyError> {
        actor.require_any(STAFF)?;
        Ok(self.store.list_responses(status, page).await?)
    }
}
