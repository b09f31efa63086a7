//! Health check endpoint.

use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::response::success;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    status: &'static str,
    database: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

async fn health(State(state): State<AppState>) -> Response {
    let database = state.db.health_check().await;
    success(
        "Service healthy",
        Health {
            status: if database { "ok" } else { "degraded" },
            database,
        },
    )
}
