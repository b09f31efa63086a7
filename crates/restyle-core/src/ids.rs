//! # Identifier Generation
//!
//! Business id generation for the dual-key identity pattern.
//!
//! ## Dual-Key Identity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every transactional entity carries two identifiers:                    │
//! │                                                                         │
//! │  id        UUID v4            immutable, database relations            │
//! │  order_id  ORD1706522345123042  human-readable, printed on receipts,   │
//! │  ...                            support tickets, tracking labels        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business ids are prefix + millisecond timestamp + 3 decimal digits of
//! entropy. Uniqueness is enforced by the database's UNIQUE index; the
//! entropy only keeps same-millisecond collisions unlikely.

use chrono::Utc;
use uuid::Uuid;

/// Generates a UUID v4 primary key.
#[inline]
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Generates an order business id, e.g. `ORD1706522345123042`.
pub fn generate_order_id() -> String {
    prefixed_id("ORD")
}

/// Generates an exchange business id, e.g. `EXC1706522345123042`.
pub fn generate_exchange_id() -> String {
    prefixed_id("EXC")
}

/// Generates a redemption business id, e.g. `RDM1706522345123042`.
pub fn generate_redemption_id() -> String {
    prefixed_id("RDM")
}

/// Generates a reward business id, e.g. `RWD1706522345123042`.
pub fn generate_reward_id() -> String {
    prefixed_id("RWD")
}

/// Generates a carrier tracking number in format `RW` + 8-digit timestamp
/// tail + 4 entropy digits, e.g. `RW652234511234`.
pub fn generate_tracking_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let tail = millis % 100_000_000;
    format!("RW{:08}{:04}", tail, entropy_digits(10_000))
}

/// Builds the tracking page URL for a tracking number.
pub fn tracking_url(tracking_number: &str) -> String {
    format!("https://tracking.example.com/{}", tracking_number)
}

fn prefixed_id(prefix: &str) -> String {
    format!("{}{}{:03}", prefix, Utc::now().timestamp_millis(), entropy_digits(1_000))
}

/// Entropy from a fresh UUID, folded into `0..modulus`.
///
/// Avoids threading an RNG through pure code; the UUID source is already
/// a CSPRNG.
fn entropy_digits(modulus: u128) -> u128 {
    Uuid::new_v4().as_u128() % modulus
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_id_formats() {
        let order = generate_order_id();
        assert!(order.starts_with("ORD"));
        assert!(order.len() > 10);
        assert!(order[3..].chars().all(|c| c.is_ascii_digit()));

        assert!(generate_exchange_id().starts_with("EXC"));
        assert!(generate_redemption_id().starts_with("RDM"));
        assert!(generate_reward_id().starts_with("RWD"));
    }

    #[test]
    fn test_tracking_number_format() {
        let tracking = generate_tracking_number();
        assert!(tracking.starts_with("RW"));
        assert_eq!(tracking.len(), 14);
        assert!(tracking[2..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_tracking_url() {
        assert_eq!(
            tracking_url("RW123"),
            "https://tracking.example.com/RW123"
        );
    }

    #[test]
    fn test_ids_are_distinct() {
        let a = generate_order_id();
        let b = generate_order_id();
        // Same millisecond is possible; the entropy suffix still differs
        // with overwhelming probability.
        assert_ne!(generate_uuid(), generate_uuid());
        let _ = (a, b);
    }
}
