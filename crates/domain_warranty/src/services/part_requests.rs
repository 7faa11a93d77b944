//! Part request service

use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{ClaimId, Clock, Page, PageRequest, PartId, PartRequestId};

use crate::actor::{Actor, Role};
use crate::error::WarrantyError;
use crate::part_request::{PartRequest, PartRequestStatus};
use crate::ports::{PartRequestFilter, WarrantyStore};

/// Input for requesting a replacement part
#[derive(Debug, Clone)]
pub struct NewPartRequest {
    pub warranty_claim_id: ClaimId,
    pub faulty_part_id: PartId,
    pub quantity: u32,
    pub issue_description: String,
    pub notes: Option<String>,
}

/// Replacement part ordering between service centers and the manufacturer
pub struct PartRequestService {
    store: Arc<dyn WarrantyStore>,
    clock: Arc<dyn Clock>,
}

impl PartRequestService {
    pub fn new(store: Arc<dyn WarrantyStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    #[instrument(skip(self, actor, request), fields(claim_id = %request.warranty_claim_id))]
    pub async fn create(&self, actor: &Actor, request: NewPartRequest) -> Result<PartRequest, WarrantyError> {
        actor.require_any(&[Role::ScTechnician])?;
        if request.issue_description.trim().is_empty() {
            return Err(WarrantyError::validation("issue description is required"));
        }
        self.store.get_claim(request.warranty_claim_id).await?;
        self.store.get_part(request.faulty_part_id).await?;

        let mut part_request = PartRequest::new(
            request.warranty_claim_id,
            request.faulty_part_id,
            request.quantity,
            request.issue_description,
            actor.user_id,
            self.clock.now(),
        )?;
        part_request.notes = request.notes;

        self.store.insert_part_request(&part_request).await?;
        info!(part_request_id = %part_request.id, quantity = part_request.quantity, "Part request created");
        Ok(part_request)
    }

    pub async fn get(&self, id: PartRequestId) -> Result<PartRequest, WarrantyError> {
        Ok(self.store.get_part_request(id).await?)
    }

    pub async fn list(&self, filter: &PartRequestFilter, page: &PageRequest) -> Result<Page<PartRequest>, WarrantyError> {
        Ok(self.store.list_part_requests(filter, page).await?)
    }

    pub async fn approve(&self, actor: &Actor, id: PartRequestId, notes: Option<String>) -> Result<PartRequest, WarrantyError> {
        actor.require_any(&[Role::EvmStaff])?;
        let now = self.clock.now();
        self.apply(id, |pr| pr.approve(actor.user_id, notes, now)).await
    }

    pub async fn reject(&self, actor: &Actor, id: PartRequestId, reason: String) -> Result<PartRequest, WarrantyError> {
        actor.require_any(&[Role::EvmStaff])?;
        let stored = self.apply(id, |pr| pr.reject(actor.user_id, reason)).await?;
        warn!(part_request_id = %id, "Part request rejected");
        Ok(stored)
    }

    pub async fn mark_shipped(
        &self,
        actor: &Actor,
        id: PartRequestId,
        tracking_number: String,
    ) -> Result<PartRequest, WarrantyError> {
        actor.require_any(&[Role::EvmStaff])?;
        let now = self.clock.now();
        self.apply(id, |pr| pr.ship(tracking_number, now)).await
    }

    pub async fn mark_delivered(&self, actor: &Actor, id: PartRequestId) -> Result<PartRequest, WarrantyError> {
        actor.require_any(&[Role::ScStaff, Role::ScTechnician])?;
        let now = self.clock.now();
        self.apply(id, |pr| pr.deliver(now)).await
    }

    pub async fn cancel(&self, actor: &Actor, id: PartRequestId) -> Result<PartRequest, WarrantyError> {
        self.apply(id, |pr| pr.cancel(actor.user_id)).await
    }

    /// Removes one of the caller's own cancelled requests
    #[instrument(skip(self, actor), fields(part_request_id = %id))]
    pub async fn delete(&self, actor: &Actor, id: PartRequestId) -> Result<(), WarrantyError> {
        let request = self.store.get_part_request(id).await?;
        request.ensure_owner(actor.user_id, "delete")?;
        if request.status != PartRequestStatus::Cancelled {
            return Err(WarrantyError::conflict(format!(
                "Part request {} is {}; only CANCELLED requests can be deleted",
                id, request.status
            )));
        }

        self.store.delete_part_request(id, request.version).await?;
        info!(part_request_id = %id, "Part request deleted");
        Ok(())
    }

    /// Loads, mutates, and writes back with the version that was read
    async fn apply<F>(&self, id: PartRequestId, step: F) -> Result<PartRequest, WarrantyError>
    where
        F: FnOnce(&mut PartRequest) -> Result<(), WarrantyError>,
    {
        let mut request = self.store.get_part_request(id).await?;
        let read_version = request.version;
        let from = request.status;

        step(&mut request)?;

        let stored = self.store.update_part_request(&request, read_version).await?;
        info!(part_request_id = %id, from = %from, to = %stored.status, "Part request status changed");
        Ok(stored)
    }
}
