//! Event domain error types

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type for event operations
pub type Result<T> = std::result::Result<T, EventError>;

/// Event domain errors
#[derive(Debug, Clone, Error)]
pub enum EventError {
    /// Lookup, update or delete target is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// One or more structural or temporal rules were violated
    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    /// Document or blob store could not serve the request; retryable by the caller
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A sequential media batch stopped at `failed_at`; `completed` holds the
    /// URLs already processed, in order
    #[error(
        "{operation} stopped at item {failed_at} of {total} ({} completed{}): {reason}",
        .completed.len(),
        rollback_note(.rolled_back)
    )]
    PartialBatchFailure {
        operation: String,
        completed: Vec<String>,
        failed_at: usize,
        total: usize,
        rolled_back: bool,
        reason: String,
    },

    /// No authenticated principal
    #[error("No authenticated user")]
    Unauthenticated,

    /// Malformed request data
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

fn rollback_note(rolled_back: &bool) -> &'static str {
    if *rolled_back { ", rolled back" } else { "" }
}

impl EventError {
    pub fn not_found(id: impl AsRef<str>) -> Self {
        Self::NotFound(format!("event {}", id.as_ref()))
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::ValidationFailed(vec![reason.into()])
    }

    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::PartialBatchFailure { .. }
        )
    }

    fn status_and_code(&self) -> (StatusCode, &'static str, i32) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", 2004),
            Self::ValidationFailed(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED", 2001),
            Self::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", 2002),
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", 2003),
            Self::PartialBatchFailure { .. } => (StatusCode::BAD_GATEWAY, "PARTIAL_BATCH_FAILURE", 2008),
            Self::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE", 2009)
            }
        }
    }
}

impl From<mongodb::error::Error> for EventError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for EventError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        Self::StoreUnavailable(format!("BSON serialization error: {}", err))
    }
}

impl From<reqwest::Error> for EventError {
    fn from(err: reqwest::Error) -> Self {
        Self::StoreUnavailable(format!("blob store request failed: {}", err))
    }
}

impl From<validator::ValidationErrors> for EventError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// JSON body returned for every failed request
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for EventError {
    fn into_response(self) -> Response {
        let (status, error, code) = self.status_and_code();

        let details = match &self {
            Self::ValidationFailed(reasons) => Some(serde_json::json!({ "reasons": reasons })),
            Self::PartialBatchFailure {
                completed,
                failed_at,
                total,
                rolled_back,
                ..
            } => Some(serde_json::json!({
                "completed": completed,
                "failedAt": failed_at,
                "total": total,
                "rolledBack": rolled_back,
            })),
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!(error_code = code, error = %self, "Request failed");
        } else {
            tracing::info!(error_code = code, error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            code,
            error: error.to_string(),
            message: self.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
