//! Identity registration, profile, and account endpoints.

use axum::extract::State;
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;

use restyle_db::repository::user::{ProfileUpdate, UpsertUser};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::response::{created, success, success_empty};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/profile", get(profile).put(update_profile))
        .route("/api/auth/account", delete(deactivate_account))
        .route("/api/auth/status", get(status))
}

/// Called after the identity provider signs a user in: creates or
/// refreshes the local row.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<UpsertUser>,
) -> ApiResult<Response> {
    let (user, was_created) = state.db.users().upsert_from_identity(&input).await?;

    Ok(if was_created {
        created("User registered successfully", user)
    } else {
        success("User updated successfully", user)
    })
}

async fn profile(CurrentUser(user): CurrentUser) -> Response {
    success("Profile retrieved successfully", user)
}

async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Response> {
    let user = state.db.users().update_profile(&user.id, &update).await?;
    Ok(success("Profile updated successfully", user))
}

/// Deactivates instead of deleting: history keeps its references.
async fn deactivate_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Response> {
    state.db.users().deactivate(&user.id).await?;
    Ok(success_empty("Account deactivated successfully"))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthStatus {
    is_authenticated: bool,
    user: UserSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserSummary {
    id: String,
    email: String,
    first_name: String,
    last_name: String,
    role: restyle_core::UserRole,
    points_balance: i64,
}

async fn status(CurrentUser(user): CurrentUser) -> Response {
    success(
        "Authentication status",
        AuthStatus {
            is_authenticated: true,
            user: UserSummary {
                id: user.id,
                email: user.email,
                first_name: user.first_name,
                last_name: user.last_name,
                role: user.role,
                points_balance: user.points_balance,
            },
        },
    )
}
