//! Recall campaign service

use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{Clock, Page, PageRequest, PartId, RecallRequestId};

use crate::actor::{Actor, Role};
use crate::error::WarrantyError;
use crate::ports::WarrantyStore;
use crate::recall::{RecallRequest, RecallRequestStatus};

/// Input for opening a recall campaign
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub part_id: PartId,
    pub reason: String,
    /// Shown to customers alongside the reason
    pub customer_note: Option<String>,
}

/// Result of an approval
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub campaign: RecallRequest,
    /// Number of per-vehicle responses created
    pub responses_created: usize,
}

/// Manages recall campaigns and their fan-out
pub struct RecallCampaignService {
    store: Arc<dyn WarrantyStore>,
    clock: Arc<dyn Clock>,
}

impl RecallCampaignService {
    pub fn new(store: Arc<dyn WarrantyStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    #[instrument(skip(self, actor, request), fields(part_id = %request.part_id))]
    pub async fn create_campaign(&self, actor: &Actor, request: NewCampaign) -> Result<RecallRequest, WarrantyError> {
        actor.require_any(&[Role::EvmStaff, Role::Admin])?;
        if request.reason.trim().is_empty() {
            return Err(WarrantyError::validation("reason is required"));
        }
        self.store.get_part(request.part_id).await?;

        let mut campaign = RecallRequest::new(request.part_id, request.reason, actor.user_id, self.clock.now());
        campaign.customer_note = request.customer_note;

        self.store.insert_campaign(&campaign).await?;
        info!(campaign_id = %campaign.id, "Recall campaign created");
        Ok(campaign)
    }

    pub async fn get_campaign(&self, id: RecallRequestId) -> Result<RecallRequest, WarrantyError> {
        Ok(self.store.get_campaign(id).await?)
    }

    pub async fn list_campaigns(
        &self,
        status: Option<RecallRequestStatus>,
        page: &PageRequest,
    ) -> Result<Page<RecallRequest>, WarrantyError> {
        Ok(self.store.list_campaigns(status, page).await?)
    }

    /// Campaigns that concern at least one of the calling customer's vehicles
    pub async fn campaigns_for_customer(
        &self,
        actor: &Actor,
        page: &PageRequest,
    ) -> Result<Page<RecallRequest>, WarrantyError> {
        let customer_id = actor.require_customer()?;
        Ok(self.store.list_campaigns_for_customer(customer_id, page).await?)
    }

    /// Approves a pending campaign and creates one PENDING response for every
    /// vehicle carrying the recalled part.
    ///
    /// Fan-out happens exactly once: approving a campaign that is no longer
    /// pending is a conflict, and so is losing a race against a concurrent
    /// approval, since the campaign update is version-checked.
    #[instrument(skip(self, actor, note), fields(campaign_id = %id))]
    pub async fn approve_campaign(
        &self,
        actor: &Actor,
        id: RecallRequestId,
        note: Option<String>,
    ) -> Result<ApprovalOutcome, WarrantyError> {
        actor.require_any(&[Role::Admin])?;
        let mut campaign = self.store.get_campaign(id).await?;
        let read_version = campaign.version;
        let now = self.clock.now();

        campaign.approve(actor.user_id, note, now)?;

        let installations = self.store.find_installations_of_part(campaign.part_id).await?;
        let responses = campaign.fan_out(installations.into_iter().map(|ip| ip.vehicle_id), now);
        if !responses.is_empty() {
            campaign.begin_customer_confirmation(now)?;
        }

        let stored = self.store.commit_fan_out(&campaign, read_version, &responses).await?;
        info!(
            campaign_id = %id,
            responses = responses.len(),
            status = %stored.status,
            "Recall campaign approved"
        );
        Ok(ApprovalOutcome {
            campaign: stored,
            responses_created: responses.len(),
        })
    }

    #[instrument(skip(self, actor, note), fields(campaign_id = %id))]
    pub async fn reject_campaign(
        &self,
        actor: &Actor,
        id: RecallRequestId,
        note: String,
    ) -> Result<RecallRequest, WarrantyError> {
        actor.require_any(&[Role::Admin])?;
        if note.trim().is_empty() {
            return Err(WarrantyError::validation("admin note is required when rejecting"));
        }

        let mut campaign = self.store.get_campaign(id).await?;
        let read_version = campaign.version;
        campaign.reject(actor.user_id, note, self.clock.now())?;

        let stored = self.store.update_campaign(&campaign, read_version).await?;
        warn!(campaign_id = %id, "Recall campaign rejected");
        Ok(stored)
    }

    /// Only the creator may delete, and only before an admin decided
    #[instrument(skip(self, actor), fields(campaign_id = %id))]
    pub async fn delete_campaign(&self, actor: &Actor, id: RecallRequestId) -> Result<(), WarrantyError> {
        let campaign = self.store.get_campaign(id).await?;
        if campaign.created_by != actor.user_id {
            return Err(WarrantyError::forbidden("You can only delete your own recall requests"));
        }
        if !campaign.is_pending() {
            return Err(WarrantyError::conflict(format!(
                "Recall request {} is {} and can no longer be deleted",
                id, campaign.status
            )));
        }

        self.store.delete_campaign(id, campaign.version).await?;
        info!(campaign_id = %id, "Recall campaign deleted");
        Ok(())
    }
}
