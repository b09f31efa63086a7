//! # Restyle HTTP API
//!
//! The REST surface of the Restyle marketplace.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Client ──► Router ──► extractor (CurrentUser / AdminUser)             │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │             handler  ──► repository (restyle-db) ──► SQLite            │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │             envelope {success, message, data?, errors?, pagination?}   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identity verification happens in an external provider that fronts this
//! server and forwards the verified subject in a trusted header.

pub mod auth;
pub mod config;
pub mod error;
pub mod response;
pub mod routes;
pub mod state;
pub mod storage;

pub use config::{ApiConfig, Environment};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;
