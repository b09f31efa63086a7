//! # API Routes
//!
//! One module per resource, each exposing a `router()` nested under its
//! `/api/...` prefix.
//!
//! - [`health`] - liveness and database reachability
//! - [`auth`] - identity registration, profile, account
//! - [`items`] - catalog browse/search and listing management
//! - [`cart`] - the staging cart
//! - [`orders`] - order lifecycle
//! - [`exchanges`] - exchange lifecycle
//! - [`rewards`] - reward catalog and redemptions
//! - [`users`] - dashboard and history
//! - [`admin`] - moderation and fulfilment

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod exchanges;
pub mod health;
pub mod items;
pub mod orders;
pub mod rewards;
pub mod users;

/// Builds the complete application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(items::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(exchanges::router())
        .merge(rewards::router())
        .merge(users::router())
        .merge(admin::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Router Tests
// =============================================================================
