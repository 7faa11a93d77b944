//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_warranty::WarrantyError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A rejected status change, with the statuses that were allowed instead
    #[error("{message}")]
    InvalidTransition { message: String, allowed: Vec<String> },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {message}")]
    Validation { message: String, details: Vec<String> },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::InvalidTransition { message, allowed } => {
                (StatusCode::BAD_REQUEST, "invalid_transition", message, Some(allowed))
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authentication required".to_string(),
                None,
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg, None),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg, None),
            ApiError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                (!details.is_empty()).then_some(details),
            ),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<WarrantyError> for ApiError {
    fn from(err: WarrantyError) -> Self {
        match err {
            WarrantyError::InvalidTransition { ref allowed, .. } => ApiError::InvalidTransition {
                allowed: allowed.clone(),
                message: err.to_string(),
            },
            WarrantyError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            WarrantyError::Conflict(msg) => ApiError::Conflict(msg),
            WarrantyError::AuthenticationRequired => ApiError::Unauthorized,
            WarrantyError::Forbidden(msg) => ApiError::Forbidden(msg),
            WarrantyError::Validation(msg) => ApiError::validation(msg),
            WarrantyError::Store(port) if port.is_transient() => ApiError::Unavailable(port.to_string()),
            WarrantyError::Store(port) => {
                error!(error = %port, "Store failure");
                ApiError::Internal("Unexpected store failure".to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        details.sort();

        ApiError::Validation {
            message: "Request validation failed".to_string(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::PortError;

    fn status_of(err: WarrantyError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        assert_eq!(status_of(WarrantyError::conflict("taken")), StatusCode::CONFLICT);
        assert_eq!(status_of(WarrantyError::forbidden("no")), StatusCode::FORBIDDEN);
        assert_eq!(status_of(WarrantyError::AuthenticationRequired), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(WarrantyError::validation("bad")), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(WarrantyError::not_found("Vehicle", "x")), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(WarrantyError::Store(PortError::internal("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(WarrantyError::Store(PortError::connection("down"))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_invalid_transition_keeps_allowed_list() {
        let err = ApiError::from(WarrantyError::InvalidTransition {
            entity: "WarrantyClaim",
            from: "SUBMITTED".into(),
            to: "COMPLETED".into(),
            allowed: vec!["MANAGER_REVIEW".into(), "REJECTED".into()],
        });
        match err {
            ApiError::InvalidTransition { allowed, message } => {
                assert_eq!(allowed, vec!["MANAGER_REVIEW", "REJECTED"]);
                assert!(message.contains("from SUBMITTED to COMPLETED"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
