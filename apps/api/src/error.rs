//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow                                           │
//! │                                                                         │
//! │  CoreError / DbError                                                    │
//! │       │ From impls                                                      │
//! │       ▼                                                                 │
//! │  ApiError { code, message } ──► IntoResponse                            │
//! │       │                              │                                  │
//! │       │                              ▼                                  │
//! │       │                 status code + envelope                          │
//! │       │                 { success: false, message }                     │
//! │       │                                                                 │
//! │  Internal failures: detail is always logged; the response carries       │
//! │  the detail in development and a generic message in production.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use restyle_core::CoreError;
use restyle_db::DbError;

use crate::config::Environment;
use crate::response::Envelope;

/// API error returned from handlers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Actor lacks rights over the entity (403)
    Forbidden,

    /// Missing or unresolvable identity (401)
    Unauthenticated,

    /// Input validation failed (400)
    ValidationError,

    /// Operation not valid for the entity's current status (409)
    InvalidState,

    /// Not enough points, or reward out of stock (400)
    InsufficientBalance,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidState => StatusCode::CONFLICT,
            ErrorCode::InsufficientBalance => StatusCode::BAD_REQUEST,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{resource} not found: {id}"))
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    /// Creates an unauthenticated error.
    pub fn unauthenticated() -> Self {
        ApiError::new(ErrorCode::Unauthenticated, "Authentication required")
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error, logging the detail and degrading the
    /// client-visible message outside development.
    pub fn internal(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        tracing::error!(detail = %detail, "Internal error");

        let message = if Environment::current().is_development() {
            detail
        } else {
            "Internal server error".to_string()
        };
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts domain errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::Forbidden { .. } => ErrorCode::Forbidden,
            CoreError::InvalidState { .. } => ErrorCode::InvalidState,
            CoreError::InvalidArgument(_) => ErrorCode::ValidationError,
            CoreError::InsufficientBalance { .. } | CoreError::OutOfStock { .. } => {
                ErrorCode::InsufficientBalance
            }
            CoreError::Unauthenticated => ErrorCode::Unauthenticated,
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Core(core) => core.into(),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{field} already exists"),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!(detail = %message, "Foreign key violation");
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(detail)
            | DbError::MigrationFailed(detail)
            | DbError::QueryFailed(detail)
            | DbError::Internal(detail) => {
                tracing::error!(detail = %detail, "Database error");
                let message = if Environment::current().is_development() {
                    detail
                } else {
                    "Database operation failed".to_string()
                };
                ApiError::new(ErrorCode::DatabaseError, message)
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let body = Envelope::<()>::failure(self.message);
        (status, axum::Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Convenience type alias for handler results.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Unit Tests
// =============================================================================
