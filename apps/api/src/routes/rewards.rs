//! Reward catalog and redemption endpoints.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use restyle_core::{PageRequest, RedemptionStatus, Reward, RewardCategory, ShippingAddress};
use restyle_db::repository::reward::RewardFilter;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::response::{created, paginated, success};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/rewards", get(list))
        .route("/api/rewards/{id}", get(get_by_id))
        .route("/api/rewards/{id}/redeem", post(redeem))
        .route("/api/rewards/user/redemptions", get(my_redemptions))
        .route("/api/rewards/redemptions/{id}", get(get_redemption))
        .route("/api/rewards/categories/list", get(categories))
        .route("/api/rewards/user/points", get(my_points))
}

/// Reward as clients see it: the entity plus the derived stock flag.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardResponse {
    #[serde(flatten)]
    reward: Reward,
    in_stock: bool,
}

impl From<Reward> for RewardResponse {
    fn from(reward: Reward) -> Self {
        let in_stock = reward.in_stock();
        RewardResponse { reward, in_stock }
    }
}

async fn list(
    State(state): State<AppState>,
    Query(filter): Query<RewardFilter>,
) -> ApiResult<Response> {
    let rewards: Vec<RewardResponse> = state
        .db
        .rewards()
        .catalog(&filter)
        .await?
        .into_iter()
        .map(RewardResponse::from)
        .collect();
    Ok(success("Rewards retrieved successfully", rewards))
}

async fn get_by_id(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let reward = state.db.rewards().require(&id).await?;

    if !reward.is_active {
        return Err(ApiError::new(
            ErrorCode::InvalidState,
            "Reward is not available",
        ));
    }

    Ok(success(
        "Reward retrieved successfully",
        RewardResponse::from(reward),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RedeemBody {
    shipping_address: Option<ShippingAddress>,
}

async fn redeem(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<RedeemBody>,
) -> ApiResult<Response> {
    let redemption = state
        .db
        .rewards()
        .redeem(&user.id, &id, input.shipping_address)
        .await?;
    Ok(created("Reward redeemed successfully", redemption))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RedemptionQuery {
    status: Option<RedemptionStatus>,
}

async fn my_redemptions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<RedemptionQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Response> {
    let redemptions = state
        .db
        .rewards()
        .redemptions_for_user(&user.id, query.status, page)
        .await?;
    Ok(paginated(
        "Redemption history retrieved successfully",
        redemptions,
    ))
}

async fn get_redemption(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let redemption = state.db.rewards().get_redemption(&id, &user.id).await?;
    Ok(success("Redemption retrieved successfully", redemption))
}

async fn categories(State(state): State<AppState>) -> ApiResult<Response> {
    let categories: Vec<RewardCategory> = state.db.rewards().categories().await?;
    Ok(success("Reward categories retrieved successfully", categories))
}

async fn my_points(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Response> {
    let summary = state.db.users().points_summary(&user.id).await?;
    Ok(success("Points balance retrieved successfully", summary))
}
