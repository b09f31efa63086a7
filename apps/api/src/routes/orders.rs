//! Order lifecycle endpoints.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use restyle_core::{OrderStatus, PageRequest};
use restyle_db::repository::order::{NewOrder, OrderRole};

use crate::auth::{AdminUser, CurrentUser};
use crate::error::ApiResult;
use crate::response::{created, paginated, success, success_empty};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", post(create).get(list))
        .route("/api/orders/{id}", get(get_by_id))
        .route("/api/orders/{id}/status", put(update_status))
        .route("/api/orders/{id}/cancel", put(cancel))
        .route("/api/orders/stats/overview", get(stats_overview))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<NewOrder>,
) -> ApiResult<Response> {
    let order = state.db.orders().create(&user.id, &input).await?;
    Ok(created("Order created successfully", order))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListQuery {
    #[serde(rename = "type")]
    role: Option<OrderRole>,
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Response> {
    let orders = state
        .db
        .orders()
        .list_for_user(&user.id, query.role.unwrap_or_default(), page)
        .await?;
    Ok(paginated("Orders retrieved successfully", orders))
}

async fn get_by_id(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let order = state.db.orders().get(&id, &user.id).await?;
    Ok(success("Order retrieved successfully", order))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusUpdate {
    status: OrderStatus,
    tracking_number: Option<String>,
    carrier: Option<String>,
}

async fn update_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<StatusUpdate>,
) -> ApiResult<Response> {
    let order = state
        .db
        .orders()
        .update_status(
            &id,
            &user.id,
            input.status,
            input.tracking_number.as_deref(),
            input.carrier.as_deref(),
        )
        .await?;
    Ok(success("Order status updated successfully", order))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CancelBody {
    reason: Option<String>,
}

async fn cancel(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    body: Option<Json<CancelBody>>,
) -> ApiResult<Response> {
    let reason = body.and_then(|Json(input)| input.reason);
    state
        .db
        .orders()
        .cancel(&id, &user.id, reason.as_deref())
        .await?;
    Ok(success_empty("Order cancelled successfully"))
}

async fn stats_overview(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> ApiResult<Response> {
    let stats = state.db.orders().stats_overview().await?;
    Ok(success("Order statistics retrieved successfully", stats))
}
