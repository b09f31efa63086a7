//! Admin moderation and fulfilment endpoints.
//!
//! Every route except `/verify` requires the caller's role to be `admin`
//! (the identity provider's role claim, mirrored on the user row). The
//! `/verify` endpoint is the legacy credential check, compared against an
//! externally-configured Argon2 hash.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use restyle_core::{
    ExchangeStatus, ItemCategory, ItemCondition, OrderStatus, PageRequest, RedemptionStatus,
    RewardCategory,
};
use restyle_db::repository::item::ReviewAction;
use restyle_db::repository::reward::{NewReward, RewardUpdate};
use restyle_db::repository::user::UserFilter;

use crate::auth::{verify_admin_credentials, AdminUser};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::response::{created, paginated, success, success_empty};
use crate::routes::rewards::RewardResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/verify", post(verify))
        .route("/api/admin/dashboard", get(dashboard))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}/ban", put(ban_user))
        .route("/api/admin/items/pending", get(pending_items))
        .route("/api/admin/items/{id}/review", put(review_item))
        .route("/api/admin/items/{id}", delete(delete_item))
        .route("/api/admin/orders", get(list_orders))
        .route("/api/admin/exchanges", get(list_exchanges))
        .route("/api/admin/rewards", get(list_rewards).post(create_reward))
        .route("/api/admin/rewards/{id}", put(update_reward))
        .route("/api/admin/redemptions", get(list_redemptions))
        .route("/api/admin/redemptions/{id}/status", put(update_redemption))
}

// =============================================================================
// Credential check
// =============================================================================

#[derive(Debug, Deserialize)]
struct VerifyBody {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    is_admin: bool,
}

async fn verify(
    State(state): State<AppState>,
    Json(input): Json<VerifyBody>,
) -> ApiResult<Response> {
    let ok = verify_admin_credentials(
        &state.config.admin_username,
        state.config.admin_password_hash.as_deref(),
        &input.username,
        &input.password,
    );

    if ok {
        Ok(success(
            "Admin verified successfully",
            VerifyResponse { is_admin: true },
        ))
    } else {
        Err(ApiError::new(
            ErrorCode::Unauthenticated,
            "Invalid admin credentials",
        ))
    }
}

// =============================================================================
// Dashboard & users
// =============================================================================

async fn dashboard(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> ApiResult<Response> {
    let stats = state.db.stats().admin_dashboard().await?;
    Ok(success("Dashboard statistics retrieved successfully", stats))
}

async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(filter): Query<UserFilter>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Response> {
    let users = state.db.users().list(&filter, page).await?;
    Ok(paginated("Users retrieved successfully", users))
}

#[derive(Debug, Deserialize)]
struct BanBody {
    ban: bool,
    reason: Option<String>,
}

async fn ban_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(input): Json<BanBody>,
) -> ApiResult<Response> {
    let user = state
        .db
        .users()
        .set_ban(&id, input.ban, input.reason.as_deref())
        .await?;
    let verb = if input.ban { "banned" } else { "unbanned" };
    Ok(success(&format!("User {verb} successfully"), user))
}

// =============================================================================
// Item moderation
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PendingQuery {
    category: Option<ItemCategory>,
    condition: Option<ItemCondition>,
}

async fn pending_items(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<PendingQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Response> {
    let items = state
        .db
        .items()
        .pending(query.category, query.condition, page)
        .await?;
    Ok(paginated("Pending items retrieved successfully", items))
}

#[derive(Debug, Deserialize)]
struct ReviewBody {
    action: ReviewAction,
    reason: Option<String>,
    featured: Option<bool>,
}

async fn review_item(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(input): Json<ReviewBody>,
) -> ApiResult<Response> {
    let item = state
        .db
        .items()
        .review(&id, input.action, input.reason.as_deref(), input.featured)
        .await?;
    let verb = match input.action {
        ReviewAction::Approve => "approved",
        ReviewAction::Reject => "rejected",
    };
    Ok(success(&format!("Item {verb} successfully"), item))
}

/// The one true deletion: removes the row and its stored images.
async fn delete_item(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let item = state.db.items().hard_delete(&id).await?;

    let storage_ids: Vec<String> = item
        .images
        .iter()
        .map(|image| image.storage_id.clone())
        .collect();
    state.storage.delete_images(&storage_ids);

    Ok(success_empty("Item deleted successfully"))
}

// =============================================================================
// Orders & exchanges
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OrderQuery {
    status: Option<OrderStatus>,
}

async fn list_orders(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<OrderQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Response> {
    let orders = state.db.orders().admin_list(query.status, page).await?;
    Ok(paginated("Orders retrieved successfully", orders))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExchangeQuery {
    status: Option<ExchangeStatus>,
}

async fn list_exchanges(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<ExchangeQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Response> {
    let exchanges = state.db.exchanges().admin_list(query.status, page).await?;
    Ok(paginated("Exchanges retrieved successfully", exchanges))
}

// =============================================================================
// Rewards & redemptions
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RewardQuery {
    category: Option<RewardCategory>,
    is_active: Option<bool>,
}

async fn list_rewards(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<RewardQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Response> {
    let rewards = state
        .db
        .rewards()
        .admin_list(query.category, query.is_active, page)
        .await?;
    Ok(paginated("Rewards retrieved successfully", rewards))
}

async fn create_reward(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(input): Json<NewReward>,
) -> ApiResult<Response> {
    let reward = state.db.rewards().create(&input).await?;
    Ok(created(
        "Reward created successfully",
        RewardResponse::from(reward),
    ))
}

async fn update_reward(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(input): Json<RewardUpdate>,
) -> ApiResult<Response> {
    // Replacing the image orphans the old upload
    let replaced_image = if input.image.is_some() {
        state
            .db
            .rewards()
            .require(&id)
            .await?
            .image
            .map(|image| image.storage_id)
    } else {
        None
    };

    let reward = state.db.rewards().update(&id, &input).await?;

    if let Some(storage_id) = replaced_image {
        state.storage.delete_images(&[storage_id]);
    }

    Ok(success(
        "Reward updated successfully",
        RewardResponse::from(reward),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RedemptionQuery {
    status: Option<RedemptionStatus>,
}

async fn list_redemptions(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<RedemptionQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Response> {
    let redemptions = state
        .db
        .rewards()
        .admin_redemptions(query.status, page)
        .await?;
    Ok(paginated("Redemptions retrieved successfully", redemptions))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RedemptionStatusBody {
    status: RedemptionStatus,
    tracking_number: Option<String>,
    carrier: Option<String>,
    notes: Option<String>,
}

async fn update_redemption(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(input): Json<RedemptionStatusBody>,
) -> ApiResult<Response> {
    let redemption = state
        .db
        .rewards()
        .update_redemption_status(
            &id,
            input.status,
            input.tracking_number.as_deref(),
            input.carrier.as_deref(),
            input.notes.as_deref(),
        )
        .await?;
    Ok(success("Redemption status updated successfully", redemption))
}
