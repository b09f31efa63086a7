//! Catalog browse/search and listing management endpoints.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use restyle_db::repository::item::{ItemFilter, ItemUpdate, NewItem};
use restyle_core::PageRequest;

use crate::auth::{CurrentUser, MaybeUser};
use crate::error::ApiResult;
use crate::response::{created, paginated, success, success_empty};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/items", get(list).post(create))
        .route(
            "/api/items/{id}",
            get(get_by_id).put(update).delete(remove),
        )
        .route("/api/items/featured/list", get(featured))
        .route("/api/items/{id}/similar", get(similar))
}

/// Catalog search. Authenticated readers bump the view counters of the
/// listings they were shown (batched).
async fn list(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(filter): Query<ItemFilter>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Response> {
    let items = state.db.items().search(&filter, page).await?;

    if user.is_some() && !items.rows.is_empty() {
        let ids: Vec<String> = items.rows.iter().map(|item| item.id.clone()).collect();
        state.db.items().record_views(&ids).await?;
    }

    Ok(paginated("Items retrieved successfully", items))
}

async fn get_by_id(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let item = state.db.items().require(&id).await?;
    state.db.items().record_view(&id).await?;
    Ok(success("Item retrieved successfully", item))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<NewItem>,
) -> ApiResult<Response> {
    let item = state.db.items().create(&user.id, &input).await?;
    Ok(created("Item created successfully", item))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(update): Json<ItemUpdate>,
) -> ApiResult<Response> {
    // Replacing the image set orphans the old uploads; collect them first
    let replaced_images = if update.images.is_some() {
        state
            .db
            .items()
            .require(&id)
            .await?
            .images
            .iter()
            .map(|image| image.storage_id.clone())
            .collect()
    } else {
        Vec::new()
    };

    let item = state.db.items().update(&id, &user.id, &update).await?;

    state.storage.delete_images(&replaced_images);

    Ok(success("Item updated successfully", item))
}

/// Owner removal is a soft delete; the listing drops out of the catalog
/// but history stays intact.
async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    state.db.items().soft_remove(&id, &user.id).await?;
    Ok(success_empty("Item removed successfully"))
}

#[derive(Debug, Deserialize)]
struct FeaturedQuery {
    limit: Option<i64>,
}

async fn featured(
    State(state): State<AppState>,
    Query(query): Query<FeaturedQuery>,
) -> ApiResult<Response> {
    let items = state.db.items().featured(query.limit.unwrap_or(10)).await?;
    Ok(success("Featured items retrieved successfully", items))
}

async fn similar(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let items = state.db.items().similar(&id, 8).await?;
    Ok(success("Similar items retrieved successfully", items))
}
