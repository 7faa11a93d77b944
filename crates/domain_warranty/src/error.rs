//! Warranty domain errors

use thiserror::Error;

use core_kernel::PortError;
use crate::transition::{InvalidTransition, Lifecycle, UnknownStatus};

/// Errors that can occur in the warranty domain
///
/// Every variant is recoverable at the request boundary.
#[derive(Debug, Error)]
pub enum WarrantyError {
    /// The transition table does not permit the requested status change
    #[error("Invalid {entity} status transition from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
        allowed: Vec<String>,
    },

    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// The entity is in the wrong lifecycle position, or was modified concurrently
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Unexpected store failure
    #[error("Store error: {0}")]
    Store(PortError),
}

impl WarrantyError {
    pub fn not_found(entity_type: impl Into<String>, id: impl std::fmt::Display) -> Self {
        WarrantyError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        WarrantyError::Conflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        WarrantyError::Forbidden(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        WarrantyError::Validation(message.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, WarrantyError::Conflict(_))
    }
}

impl<S: Lifecycle> From<InvalidTransition<S>> for WarrantyError {
    fn from(err: InvalidTransition<S>) -> Self {
        WarrantyError::InvalidTransition {
            entity: S::ENTITY,
            from: err.from.as_wire().to_string(),
            to: err.to.as_wire().to_string(),
            allowed: err.allowed.iter().map(|s| s.as_wire().to_string()).collect(),
        }
    }
}

impl From<UnknownStatus> for WarrantyError {
    fn from(err: UnknownStatus) -> Self {
        WarrantyError::Validation(err.to_string())
    }
}

impl From<PortError> for WarrantyError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => WarrantyError::NotFound { entity_type, id },
            PortError::Conflict { message } => WarrantyError::Conflict(message),
            PortError::Validation { message, .. } => WarrantyError::Validation(message),
            PortError::Unauthorized { message } => WarrantyError::Forbidden(message),
            other => WarrantyError::Store(other),
        }
    }
}
