//! Work log service

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument};

use core_kernel::{ClaimId, Clock, Page, PageRequest, UserId, WorkLogId};

use crate::actor::{Actor, Role};
use crate::error::WarrantyError;
use crate::ports::{WarrantyStore, WorkLogFilter};
use crate::work_log::WorkLog;

const MANAGERS: &[Role] = &[Role::Admin, Role::EvmStaff];
const WRITERS: &[Role] = &[Role::Admin, Role::EvmStaff, Role::ScTechnician];
const CLAIM_VIEWERS: &[Role] = &[Role::Admin, Role::EvmStaff, Role::ScStaff, Role::ScTechnician];

/// Input for recording time spent on a claim
#[derive(Debug, Clone)]
pub struct NewWorkLog {
    pub warranty_claim_id: ClaimId,
    /// Defaults to the caller; only managers may log time for someone else
    pub technician: Option<UserId>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

/// Technician time tracking on warranty claims
pub struct WorkLogService {
    store: Arc<dyn WarrantyStore>,
    clock: Arc<dyn Clock>,
}

impl WorkLogService {
    pub fn new(store: Arc<dyn WarrantyStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    #[instrument(skip(self, actor, request), fields(claim_id = %request.warranty_claim_id))]
    pub async fn create(&self, actor: &Actor, request: NewWorkLog) -> Result<WorkLog, WarrantyError> {
        actor.require_any(WRITERS)?;
        let technician = request.technician.unwrap_or(actor.user_id);
        if technician != actor.user_id {
            actor.require_any(MANAGERS)?;
        }
        self.store.get_claim(request.warranty_claim_id).await?;

        let log = WorkLog::new(
            request.warranty_claim_id,
            technician,
            request.start_time,
            request.end_time,
            request.description,
            self.clock.now(),
        )?;

        self.store.insert_work_log(&log).await?;
        info!(work_log_id = %log.id, technician = %technician, "Work log recorded");
        Ok(log)
    }

    pub async fn get(&self, actor: &Actor, id: WorkLogId) -> Result<WorkLog, WarrantyError> {
        actor.require_any(CLAIM_VIEWERS)?;
        Ok(self.store.get_work_log(id).await?)
    }

    pub async fn for_claim(
        &self,
        actor: &Actor,
        claim_id: ClaimId,
        page: &PageRequest,
    ) -> Result<Page<WorkLog>, WarrantyError> {
        actor.require_any(CLAIM_VIEWERS)?;
        let filter = WorkLogFilter {
            warranty_claim_id: Some(claim_id),
            ..Default::default()
        };
        Ok(self.store.list_work_logs(&filter, page).await?)
    }

    /// Managers list everything; a technician may list only their own logs
    pub async fn list(
        &self,
        actor: &Actor,
        filter: &WorkLogFilter,
        page: &PageRequest,
    ) -> Result<Page<WorkLog>, WarrantyError> {
        let own = actor.has_role(Role::ScTechnician) && filter.technician == Some(actor.user_id);
        if !own {
            actor.require_any(MANAGERS)?;
        }
        Ok(self.store.list_work_logs(filter, page).await?)
    }

    #[instrument(skip(self, actor, description), fields(work_log_id = %id))]
    pub async fn update(
        &self,
        actor: &Actor,
        id: WorkLogId,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        description: Option<String>,
    ) -> Result<WorkLog, WarrantyError> {
        actor.require_any(WRITERS)?;
        let mut log = self.store.get_work_log(id).await?;
        if !actor.has_any(MANAGERS) {
            log.ensure_owner(actor.user_id, "update")?;
        }
        let read_version = log.version;

        log.reschedule(start_time, end_time, description)?;

        let stored = self.store.update_work_log(&log, read_version).await?;
        info!(open = stored.is_open(), "Work log updated");
        Ok(stored)
    }

    #[instrument(skip(self, actor), fields(work_log_id = %id))]
    pub async fn delete(&self, actor: &Actor, id: WorkLogId) -> Result<(), WarrantyError> {
        actor.require_any(&[Role::Admin])?;
        let log = self.store.get_work_log(id).await?;
        self.store.delete_work_log(id, log.version).await?;
        info!("Work log deleted");
        Ok(())
    }
}
