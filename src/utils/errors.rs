//! Error handling
//!
//! This module defines the application error taxonomy and its conversion into
//! HTTP responses.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::clients::directions::GatewayError;
use crate::services::itinerary_planner::PlanningError;

/// Main application errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Upstream routing failure: {0}")]
    UpstreamRouting(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: {0}")]
    InvalidInput(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Coarse error class reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    UpstreamRoutingFailure,
    ValidationFailure,
    NotFound,
    InvariantViolation,
    InvalidTransition,
    Internal,
}

/// Error body returned by the API
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    category: ErrorCategory,
    retryable: bool,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::UpstreamRouting(_) => ErrorCategory::UpstreamRoutingFailure,
            AppError::Validation(_) | AppError::InvalidInput(_) => ErrorCategory::ValidationFailure,
            AppError::NotFound(_) => ErrorCategory::NotFound,
            AppError::InvariantViolation(_) => ErrorCategory::InvariantViolation,
            AppError::InvalidTransition(_) => ErrorCategory::InvalidTransition,
            AppError::Database(_) | AppError::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Only dependency failures are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::UpstreamRouting(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::UpstreamRoutingFailure => StatusCode::BAD_GATEWAY,
            ErrorCategory::ValidationFailure => StatusCode::BAD_REQUEST,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::InvariantViolation | ErrorCategory::InvalidTransition => {
                StatusCode::CONFLICT
            }
            ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self.category() {
            ErrorCategory::UpstreamRoutingFailure => "UPSTREAM_ROUTING_FAILURE",
            ErrorCategory::ValidationFailure => "VALIDATION_ERROR",
            ErrorCategory::NotFound => "NOT_FOUND",
            ErrorCategory::InvariantViolation => "INVARIANT_VIOLATION",
            ErrorCategory::InvalidTransition => "INVALID_TRANSITION",
            ErrorCategory::Internal => "INTERNAL_ERROR",
        }
    }

    fn title(&self) -> &'static str {
        match self.category() {
            ErrorCategory::UpstreamRoutingFailure => "Upstream Routing Failure",
            ErrorCategory::ValidationFailure => "Validation Error",
            ErrorCategory::NotFound => "Not Found",
            ErrorCategory::InvariantViolation => "Invariant Violation",
            ErrorCategory::InvalidTransition => "Invalid Transition",
            ErrorCategory::Internal => "Internal Server Error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, details) = match &self {
            AppError::InvalidInput(errors) => (
                "The provided data is invalid".to_string(),
                Some(json!(errors)),
            ),
            AppError::Database(e) => {
                log::error!("❌ Database error: {}", e);
                (
                    "An error occurred while accessing the database".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                log::error!("❌ Internal error: {}", msg);
                ("An unexpected error occurred".to_string(), None)
            }
            AppError::UpstreamRouting(msg) => {
                log::warn!("⚠️ Upstream routing failure: {}", msg);
                (msg.clone(), None)
            }
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::InvariantViolation(msg)
            | AppError::InvalidTransition(msg) => (msg.clone(), None),
        };

        let body = ErrorResponse {
            error: self.title().to_string(),
            message,
            category: self.category(),
            retryable: self.is_retryable(),
            code: self.code(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::UpstreamRouting(err.to_string())
    }
}

impl From<PlanningError> for AppError {
    fn from(err: PlanningError) -> Self {
        AppError::UpstreamRouting(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Typed result for fallible operations
pub type AppResult<T> = Result<T, AppError>;

/// Helper for missing resources
pub fn not_found_error(resource: &str, id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Helper for plain validation failures
pub fn validation_error(message: impl Into<String>) -> AppError {
    AppError::Validation(message.into())
}
