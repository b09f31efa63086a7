//! # Error Types
//!
//! Domain-specific error types for restyle-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  restyle-core errors (this file)                                       │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  restyle-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures, wraps CoreError   │
//! │                                                                         │
//! │  HTTP API errors (in app)                                              │
//! │  └── ApiError         - What clients see (serialized envelope)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (entity, id, balances)
//! 3. Errors are enum variants, never String
//! 4. All validation happens before any mutation; the first failed
//!    precondition aborts the operation with zero side effects

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// One variant per failure class: every lifecycle operation in the system
/// fails with exactly one of these, and the HTTP layer maps each to a
/// stable status code.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An entity id did not resolve.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The actor lacks rights over the entity (wrong owner/buyer/seller,
    /// missing admin role).
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    /// The operation is not valid for the entity's current status.
    ///
    /// ## When This Occurs
    /// - Cancelling a shipped order
    /// - Responding to a non-pending exchange
    /// - Buying an item that is no longer `approved`
    #[error("{entity} {id} is {status}, cannot {operation}")]
    InvalidState {
        entity: &'static str,
        id: String,
        status: String,
        operation: &'static str,
    },

    /// Malformed or out-of-range input that survived deserialization.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Not enough points to cover a gated spend.
    #[error("Insufficient points: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },

    /// A reward has no remaining stock.
    #[error("Reward is out of stock: {id}")]
    OutOfStock { id: String },

    /// No identity, or an identity that does not resolve to a user.
    #[error("Authentication required")]
    Unauthenticated,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates a Forbidden error.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        CoreError::Forbidden {
            reason: reason.into(),
        }
    }

    /// Creates an InvalidState error.
    pub fn invalid_state(
        entity: &'static str,
        id: impl Into<String>,
        status: impl Into<String>,
        operation: &'static str,
    ) -> Self {
        CoreError::InvalidState {
            entity,
            id: id.into(),
            status: status.into(),
            operation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::not_found("Item", "abc-123");
        assert_eq!(err.to_string(), "Item not found: abc-123");

        let err = CoreError::InsufficientBalance {
            required: 600,
            available: 150,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient points: required 600, available 150"
        );
    }

    #[test]
    fn test_invalid_state_message() {
        let err = CoreError::invalid_state("Order", "ord-1", "shipped", "cancel");
        assert_eq!(err.to_string(), "Order ord-1 is shipped, cannot cancel");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "title".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
