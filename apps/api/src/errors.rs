use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Service and schema failures carry the user-facing message for the operation
/// that failed; the underlying diagnostic travels in `detail` and is only logged.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Analysis not ready: {0}")]
    AnalysisNotReady(String),

    #[error("Analysis superseded by cycle {current}")]
    Superseded { current: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service error: {detail}")]
    Service { message: String, detail: String },

    #[error("Schema parse error: {detail}")]
    SchemaParse { message: String, detail: String },

    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Generic message used when no operation-specific text applies.
pub const GENERIC_SERVICE_MESSAGE: &str =
    "The advice service is unavailable right now. Please try again.";

/// Shown whenever a stored snapshot cannot be restored.
pub const CORRUPT_SNAPSHOT_MESSAGE: &str = "Failed to load analysis. The data may be corrupt.";

impl AppError {
    /// Converts a model-call failure into the matching app error, attaching the
    /// user-facing message for the operation that was attempted.
    pub fn from_llm(err: LlmError, message: impl Into<String>) -> Self {
        let message = message.into();
        let detail = err.to_string();
        if err.is_schema_failure() {
            AppError::SchemaParse { message, detail }
        } else {
            AppError::Service { message, detail }
        }
    }

    /// Replaces the user-facing message of a service or schema error.
    /// Other variants are returned untouched.
    pub fn with_user_message(self, new_message: impl Into<String>) -> Self {
        match self {
            AppError::Service { detail, .. } => AppError::Service {
                message: new_message.into(),
                detail,
            },
            AppError::SchemaParse { detail, .. } => AppError::SchemaParse {
                message: new_message.into(),
                detail,
            },
            other => other,
        }
    }

    /// The message a student should see for this error.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::AnalysisNotReady(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::Superseded { .. } => "A newer analysis has replaced this one.".to_string(),
            AppError::Service { message, .. } | AppError::SchemaParse { message, .. } => {
                message.clone()
            }
            AppError::CorruptSnapshot(_) => CORRUPT_SNAPSHOT_MESSAGE.to_string(),
            AppError::Storage(_) => "A storage error occurred".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::AnalysisNotReady(_) => (StatusCode::CONFLICT, "ANALYSIS_NOT_READY"),
            AppError::Superseded { .. } => (StatusCode::CONFLICT, "SUPERSEDED"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Service { detail, .. } => {
                tracing::error!("Service error: {detail}");
                (StatusCode::BAD_GATEWAY, "SERVICE_ERROR")
            }
            AppError::SchemaParse { detail, .. } => {
                tracing::error!("Schema parse error: {detail}");
                (StatusCode::BAD_GATEWAY, "SCHEMA_PARSE_ERROR")
            }
            AppError::CorruptSnapshot(detail) => {
                tracing::warn!("Corrupt snapshot discarded: {detail}");
                (StatusCode::UNPROCESSABLE_ENTITY, "CORRUPT_SNAPSHOT")
            }
            AppError::Storage(detail) => {
                tracing::error!("Storage error: {detail}");
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.user_message()
            }
        }));

        (status, body).into_response()
    }
}
