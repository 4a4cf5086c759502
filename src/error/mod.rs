//! Unified error handling for RoleGate Core

use crate::domain::{Action, ResourceKey, Role};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Catalog lookup for a key that is not declared. Programmer error:
    /// fail fast and loudly, never silently default to allowed or denied.
    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("authentication required")]
    Unauthenticated,

    /// Identity present, permission absent. The pair is carried for the
    /// caller; the HTTP body never echoes it.
    #[error("access denied: {action} on {resource}")]
    Forbidden { resource: ResourceKey, action: Action },

    #[error("access denied: role {0} is not permitted")]
    ForbiddenRole(Role),

    #[error("validation error: {0}")]
    Validation(String),

    /// Durable storage unreachable. Propagates; callers fail closed.
    #[error("assignment store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    /// The desired state changed between plan computation and apply.
    /// Re-run reconciliation instead of applying a stale plan.
    #[error("reconciliation conflict: {0}")]
    ReconciliationConflict(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "Authentication required".to_string(),
            ),
            // Denials never leak the resource identifier to the client;
            // the typed error carries it for the call site only.
            AppError::Forbidden { .. } | AppError::ForbiddenRole(_) => {
                (StatusCode::FORBIDDEN, "forbidden", "Access denied".to_string())
            }
            AppError::UnknownResource(key) => {
                tracing::error!("guard consulted for undeclared resource: {}", key);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation", msg.clone())
            }
            AppError::StoreUnavailable(e) => {
                tracing::error!("assignment store error: {:?}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_unavailable",
                    "Authorization data is temporarily unavailable".to_string(),
                )
            }
            AppError::ReconciliationConflict(msg) => {
                (StatusCode::CONFLICT, "reconciliation_conflict", msg.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

// Conversion from validation errors
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}
