//! # Validation Module
//!
//! Input validation for listing, exchange, and redemption payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  ├── Enum variants, field types                                        │
//! │  └── Unknown statuses never reach business code                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - field-level rules                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / FK constraints                                │
//! │  └── CHECK(price_cents >= 0), CHECK(stock_quantity >= 0)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All validation runs before any mutation; the first failure aborts the
//! operation with zero side effects.

use crate::error::ValidationError;
use crate::MAX_ENTRY_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a listing title: non-empty, at most 120 characters.
pub fn validate_title(title: &str) -> ValidationResult<()> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.len() > 120 {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: 120,
        });
    }

    Ok(())
}

/// Validates a listing description: non-empty, at most 2000 characters.
pub fn validate_description(description: &str) -> ValidationResult<()> {
    let description = description.trim();

    if description.is_empty() {
        return Err(ValidationError::Required {
            field: "description".to_string(),
        });
    }

    if description.len() > 2000 {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: 2000,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in cents: must not be negative.
pub fn validate_price(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a line/cart quantity: 1..=MAX_ENTRY_QUANTITY.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 1 || quantity > MAX_ENTRY_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ENTRY_QUANTITY,
        });
    }
    Ok(())
}

/// Validates an exchange rating: 1..=5 stars.
pub fn validate_rating(rating: i64) -> ValidationResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: 1,
            max: 5,
        });
    }
    Ok(())
}

/// Validates a reward's points price: must not be negative.
pub fn validate_points_required(points: i64) -> ValidationResult<()> {
    if points < 0 {
        return Err(ValidationError::Negative {
            field: "pointsRequired".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Set Validators
// =============================================================================

/// Validates that a selected size is one the listing actually offers.
pub fn validate_size_selection(size: &str, available: &[String]) -> ValidationResult<()> {
    if size.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "size".to_string(),
        });
    }

    if !available.iter().any(|s| s == size) {
        return Err(ValidationError::NotAllowed {
            field: "size".to_string(),
            allowed: available.to_vec(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
