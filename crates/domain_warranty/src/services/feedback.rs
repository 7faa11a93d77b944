//! Feedback service

use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{ClaimId, Clock, FeedbackId, Page, PageRequest};

use crate::actor::{Actor, Role};
use crate::error::WarrantyError;
use crate::feedback::{Feedback, FeedbackSummary, Rating};
use crate::ports::{FeedbackFilter, WarrantyStore};

const STAFF: &[Role] = &[Role::Admin, Role::EvmStaff, Role::ScStaff];

/// Input for rating a completed claim
#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub warranty_claim_id: ClaimId,
    pub rating: Rating,
    pub comment: Option<String>,
}

/// Customer satisfaction ratings on completed warranty work
pub struct FeedbackService {
    store: Arc<dyn WarrantyStore>,
    clock: Arc<dyn Clock>,
}

impl FeedbackService {
    pub fn new(store: Arc<dyn WarrantyStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    #[instrument(skip(self, actor, request), fields(claim_id = %request.warranty_claim_id))]
    pub async fn create(&self, actor: &Actor, request: NewFeedback) -> Result<Feedback, WarrantyError> {
        let customer_id = actor.require_customer()?;
        let claim = self.store.get_claim(request.warranty_claim_id).await?;
        let vehicle = self.store.get_vehicle(claim.vehicle_id).await?;
        if vehicle.customer_id != customer_id {
            warn!(vehicle_id = %vehicle.id, "Feedback attempted on another customer's claim");
            return Err(WarrantyError::forbidden(
                "You can only leave feedback on claims for your own vehicles",
            ));
        }

        let feedback = Feedback::new(&claim, customer_id, request.rating, request.comment, self.clock.now())?;
        if self.store.feedback_for_claim(claim.id).await?.is_some() {
            return Err(WarrantyError::conflict(format!(
                "Feedback already exists for claim {}",
                claim.id
            )));
        }

        self.store.insert_feedback(&feedback).await?;
        info!(feedback_id = %feedback.id, rating = %feedback.rating, "Feedback recorded");
        Ok(feedback)
    }

    pub async fn get(&self, actor: &Actor, id: FeedbackId) -> Result<Feedback, WarrantyError> {
        let feedback = self.store.get_feedback(id).await?;
        self.ensure_visible(actor, &feedback)?;
        Ok(feedback)
    }

    pub async fn for_claim(&self, actor: &Actor, claim_id: ClaimId) -> Result<Feedback, WarrantyError> {
        let feedback = self
            .store
            .feedback_for_claim(claim_id)
            .await?
            .ok_or_else(|| WarrantyError::not_found("Feedback", format!("claim {}", claim_id)))?;
        self.ensure_visible(actor, &feedback)?;
        Ok(feedback)
    }

    /// The calling customer's own feedback
    pub async fn mine(&self, actor: &Actor, page: &PageRequest) -> Result<Page<Feedback>, WarrantyError> {
        let customer_id = actor.require_customer()?;
        Ok(self
            .store
            .list_feedback(&FeedbackFilter::for_customer(customer_id), page)
            .await?)
    }

    pub async fn list(
        &self,
        actor: &Actor,
        filter: &FeedbackFilter,
        page: &PageRequest,
    ) -> Result<Page<Feedback>, WarrantyError> {
        actor.require_any(STAFF)?;
        Ok(self.store.list_feedback(filter, page).await?)
    }

    /// Average rating and count per rating
    pub async fn summary(&self, actor: &Actor) -> Result<FeedbackSummary, WarrantyError> {
        actor.require_any(STAFF)?;
        Ok(self.store.feedback_summary().await?)
    }

    #[instrument(skip(self, actor, comment), fields(feedback_id = %id))]
    pub async fn update(
        &self,
        actor: &Actor,
        id: FeedbackId,
        rating: Rating,
        comment: Option<String>,
    ) -> Result<Feedback, WarrantyError> {
        let customer_id = actor.require_customer()?;
        let mut feedback = self.store.get_feedback(id).await?;
        feedback.ensure_owner(customer_id, "update")?;
        let read_version = feedback.version;

        feedback.revise(rating, comment, self.clock.now())?;

        let stored = self.store.update_feedback(&feedback, read_version).await?;
        info!(rating = %stored.rating, "Feedback updated");
        Ok(stored)
    }

    /// The owning customer or an admin may delete
    #[instrument(skip(self, actor), fields(feedback_id = %id))]
    pub async fn delete(&self, actor: &Actor, id: FeedbackId) -> Result<(), WarrantyError> {
        let feedback = self.store.get_feedback(id).await?;
        if !actor.has_role(Role::Admin) {
            feedback.ensure_owner(actor.require_customer()?, "delete")?;
        }

        self.store.delete_feedback(id, feedback.version).await?;
        info!("Feedback deleted");
        Ok(())
    }

    fn ensure_visible(&self, actor: &Actor, feedback: &Feedback) -> Result<(), WarrantyError> {
        if actor.has_any(STAFF) {
            return Ok(());
        }
        feedback.ensure_owner(actor.require_customer()?, "view")
    }
}
