//! Exchange lifecycle endpoints.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use restyle_core::{ExchangeSide, ExchangeStatus, PageRequest, ShipmentStatus};
use restyle_db::repository::exchange::{ExchangeDecision, ExchangeRole, NewExchange};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::response::{created, paginated, success, success_empty};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/exchanges", post(create).get(list))
        .route("/api/exchanges/{id}", get(get_by_id))
        .route("/api/exchanges/{id}/respond", put(respond))
        .route("/api/exchanges/{id}/cancel", put(cancel))
        .route("/api/exchanges/{id}/shipping", put(update_shipping))
        .route("/api/exchanges/{id}/rate", put(rate))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<NewExchange>,
) -> ApiResult<Response> {
    let exchange = state.db.exchanges().create(&user.id, &input).await?;
    Ok(created("Exchange request created successfully", exchange))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListQuery {
    #[serde(rename = "type")]
    role: Option<ExchangeRole>,
    status: Option<ExchangeStatus>,
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Response> {
    let exchanges = state
        .db
        .exchanges()
        .list_for_user(&user.id, query.role.unwrap_or_default(), query.status, page)
        .await?;
    Ok(paginated(
        "Exchange requests retrieved successfully",
        exchanges,
    ))
}

async fn get_by_id(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let exchange = state.db.exchanges().get(&id, &user.id).await?;
    Ok(success("Exchange retrieved successfully", exchange))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RespondBody {
    status: ExchangeDecision,
    #[serde(default)]
    response_message: String,
}

async fn respond(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<RespondBody>,
) -> ApiResult<Response> {
    let exchange = state
        .db
        .exchanges()
        .respond(&id, &user.id, input.status, &input.response_message)
        .await?;
    let verdict = match input.status {
        ExchangeDecision::Accepted => "accepted",
        ExchangeDecision::Rejected => "rejected",
    };
    Ok(success(&format!("Exchange {verdict} successfully"), exchange))
}

async fn cancel(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    state.db.exchanges().cancel(&id, &user.id).await?;
    Ok(success_empty("Exchange cancelled successfully"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShippingBody {
    #[serde(rename = "type")]
    side: ExchangeSide,
    tracking_number: Option<String>,
    carrier: Option<String>,
    status: ShipmentStatus,
}

async fn update_shipping(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<ShippingBody>,
) -> ApiResult<Response> {
    let exchange = state
        .db
        .exchanges()
        .update_shipping(
            &id,
            &user.id,
            input.side,
            input.tracking_number.as_deref(),
            input.carrier.as_deref(),
            input.status,
        )
        .await?;
    Ok(success("Shipping details updated successfully", exchange))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateBody {
    rating: i64,
    #[serde(default)]
    review: String,
}

async fn rate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<RateBody>,
) -> ApiResult<Response> {
    state
        .db
        .exchanges()
        .rate(&id, &user.id, input.rating, &input.review)
        .await?;
    Ok(success_empty("Rating submitted successfully"))
}
