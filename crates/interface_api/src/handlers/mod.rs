//! Request handlers

pub mod health;
pub mod claims;
pub mod recalls;
pub mod responses;
pub mod part_requests;
pub mod feedback;
pub mod work_logs;

use axum::Json;
use validator::Validate;

use domain_warranty::{Actor, Role};

use crate::error::ApiError;

/// Everyone except customers
pub(crate) const STAFF: &[Role] = &[Role::Admin, Role::EvmStaff, Role::ScStaff, Role::ScTechnician];

/// Validates a JSON body with its `validator` rules
pub(crate) fn validated<T: Validate>(Json(body): Json<T>) -> Result<T, ApiError> {
    body.validate()?;
    Ok(body)
}

pub(crate) fn require_staff(actor: &Actor) -> Result<(), ApiError> {
    actor.require_any(STAFF)?;
    Ok(())
}
