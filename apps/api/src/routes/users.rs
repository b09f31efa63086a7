//! User dashboard and history endpoints.

use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use restyle_core::{ItemStatus, PageRequest};
use restyle_db::repository::exchange::ExchangeRole;
use restyle_db::repository::order::OrderRole;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::response::{paginated, success};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users/dashboard", get(dashboard))
        .route("/api/users/uploaded-items", get(uploaded_items))
        .route("/api/users/purchases", get(purchases))
        .route("/api/users/exchanges", get(exchanges))
}

async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Response> {
    let stats = state.db.users().dashboard(&user.id).await?;
    Ok(success("Dashboard stats retrieved successfully", stats))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UploadedQuery {
    status: Option<ItemStatus>,
}

async fn uploaded_items(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<UploadedQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Response> {
    let items = state
        .db
        .items()
        .list_by_owner(&user.id, query.status, page)
        .await?;
    Ok(paginated("Uploaded items retrieved successfully", items))
}

async fn purchases(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<PageRequest>,
) -> ApiResult<Response> {
    let orders = state
        .db
        .orders()
        .list_for_user(&user.id, OrderRole::Purchases, page)
        .await?;
    Ok(paginated("Purchase history retrieved successfully", orders))
}

async fn exchanges(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<PageRequest>,
) -> ApiResult<Response> {
    let exchanges = state
        .db
        .exchanges()
        .list_for_user(&user.id, ExchangeRole::All, None, page)
        .await?;
    Ok(paginated("Exchange history retrieved successfully", exchanges))
}
