//! # restyle-db: Database Layer for Restyle
//!
//! SQLite persistence and the transactional lifecycle engines.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         restyle-db                                      │
//! │                                                                         │
//! │  Database (pool.rs)                                                    │
//! │     │                                                                   │
//! │     ├── users()      UserRepository       accounts, points wallet      │
//! │     ├── items()      ItemRepository       catalog store + moderation   │
//! │     ├── carts()      CartRepository       staging view, derived totals │
//! │     ├── orders()     OrderRepository      order lifecycle engine       │
//! │     ├── exchanges()  ExchangeRepository   exchange lifecycle engine    │
//! │     ├── rewards()    RewardRepository     rewards ledger               │
//! │     └── stats()      StatsRepository      admin dashboard counters     │
//! │                                                                         │
//! │  Every multi-entity mutation (order placement, exchange accept/cancel, │
//! │  reward redemption, cancellations) runs inside ONE transaction with    │
//! │  status-guarded UPDATEs; the loser of a race gets InvalidState, never  │
//! │  a double-sale or negative stock.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::cart::CartRepository;
pub use repository::exchange::ExchangeRepository;
pub use repository::item::ItemRepository;
pub use repository::order::OrderRepository;
pub use repository::reward::RewardRepository;
pub use repository::stats::StatsRepository;
pub use repository::user::UserRepository;
