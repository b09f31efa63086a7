//! Cart endpoints.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::response::{success, success_empty};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cart", get(get_cart))
        .route("/api/cart/add", post(add))
        .route("/api/cart/update/{item_id}", put(update))
        .route("/api/cart/remove/{item_id}", delete(remove))
        .route("/api/cart/clear", delete(clear))
        .route("/api/cart/count", get(count))
}

async fn get_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Response> {
    let cart = state.db.carts().get(&user.id).await?;
    Ok(success("Cart retrieved successfully", cart))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddToCart {
    item_id: String,
    size: String,
    quantity: Option<i64>,
}

async fn add(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<AddToCart>,
) -> ApiResult<Response> {
    let cart = state
        .db
        .carts()
        .add(&user.id, &input.item_id, &input.size, input.quantity.unwrap_or(1))
        .await?;
    Ok(success("Item added to cart successfully", cart))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCartEntry {
    size: String,
    quantity: i64,
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<String>,
    Json(input): Json<UpdateCartEntry>,
) -> ApiResult<Response> {
    let cart = state
        .db
        .carts()
        .update(&user.id, &item_id, &input.size, input.quantity)
        .await?;
    Ok(success("Cart updated successfully", cart))
}

#[derive(Debug, Deserialize)]
struct RemoveQuery {
    size: Option<String>,
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<String>,
    Query(query): Query<RemoveQuery>,
) -> ApiResult<Response> {
    let cart = state
        .db
        .carts()
        .remove(&user.id, &item_id, query.size.as_deref())
        .await?;
    Ok(success("Item removed from cart successfully", cart))
}

async fn clear(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Response> {
    state.db.carts().clear(&user.id).await?;
    Ok(success_empty("Cart cleared successfully"))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CartCount {
    item_count: i64,
}

async fn count(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Response> {
    let item_count = state.db.carts().count(&user.id).await?;
    Ok(success(
        "Cart count retrieved successfully",
        CartCount { item_count },
    ))
}
