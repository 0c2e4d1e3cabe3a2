//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from trt-core and trt-compliance to HTTP status
//! codes and returns the same `{ success: false, error: { code, message } }`
//! envelope for every failure. Internal error details are never exposed
//! to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// Mirrors the success envelope: `success` is always `false` here, and the
/// `error` object carries a machine-readable code plus a human message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed or contains invalid values (422).
    ///
    /// Normalized with `Validation` to 422 Unprocessable Entity: the client
    /// sent syntactically valid HTTP but semantically invalid content. Both
    /// JSON deserialization failures and business-rule violations are 422.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Authentication failure, missing or invalid token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authorization failure, insufficient permissions (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),

    /// Service dependency not configured or unreachable (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        // Log server-side errors for operator visibility.
        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Convert trt-core validation errors to API errors.
impl From<trt_core::ValidationError> for AppError {
    fn from(err: trt_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Database failures surface as opaque 500s.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(format!("database error: {err}"))
    }
}
