//! # restyle-core: Pure Business Logic for Restyle
//!
//! This crate is the **heart** of Restyle, a community clothing-exchange
//! marketplace. It contains all business logic as pure functions and types
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Restyle Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (apps/api)                          │   │
//! │  │    browse ──► cart ──► checkout / exchange / redeem             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ restyle-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │    ids    │  │ validation│  │   │
//! │  │   │  Item     │  │   Money   │  │  ORD…/EXC…│  │   rules   │  │   │
//! │  │   │  Order    │  │  no floats│  │  RDM…/RWD…│  │   checks  │  │   │
//! │  │   │  Exchange │  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   └───────────┘                                                │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 restyle-db (Database Layer)                     │   │
//! │  │       SQLite queries, migrations, lifecycle transactions        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Order, Exchange, Reward, User, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`ids`] - Business id generation (dual-key identity)
//! - [`pagination`] - Page parameters and page-info math
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic where possible
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64)
//! 4. **Closed State Machines**: Status enums own their transition tables;
//!    no free-form string comparison anywhere
//! 5. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ids;
pub mod money;
pub mod pagination;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use restyle_core::Money` instead of
// `use restyle_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pagination::{PageInfo, PageRequest, Paged};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Points credited to the buyer when an order is placed.
pub const POINTS_PER_ORDER: i64 = 200;

/// Bonus points credited to BOTH parties when an exchange is accepted.
pub const EXCHANGE_BONUS_POINTS: i64 = 100;

/// Default stock quantity for a newly created reward.
pub const DEFAULT_REWARD_STOCK: i64 = 100;

/// Days between order placement and the estimated delivery date.
pub const ESTIMATED_DELIVERY_DAYS: i64 = 7;

/// Maximum distinct entries allowed in a single cart.
///
/// Prevents runaway carts and keeps checkout payloads bounded.
pub const MAX_CART_ENTRIES: usize = 100;

/// Maximum quantity of a single (item, size) cart entry.
///
/// Listings are second-hand garments; quantities above this are
/// always input mistakes.
pub const MAX_ENTRY_QUANTITY: i64 = 99;

/// Fallback text recorded when a rejection or cancellation carries no reason.
pub const NO_REASON_PROVIDED: &str = "No reason provided";
