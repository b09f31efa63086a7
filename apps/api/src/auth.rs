//! # Authentication Extractors
//!
//! Identity verification is an external collaborator: a fronting proxy
//! validates the caller's token and forwards the provider subject in a
//! trusted header. These extractors resolve that subject to a user row.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  header absent / unknown subject  → 401 Unauthenticated                 │
//! │  banned or deactivated account    → 403 Forbidden                       │
//! │  role != admin on admin surface   → 403 Forbidden                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use argon2::password_hash::PasswordHash;
use argon2::{Argon2, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use restyle_core::User;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller. Rejects with 401/403.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// The caller if authenticated, None otherwise. Never rejects.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

/// An authenticated caller with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

async fn resolve_user(parts: &Parts, state: &AppState) -> Result<User, ApiError> {
    let subject = parts
        .headers
        .get(state.config.identity_header.as_str())
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(ApiError::unauthenticated)?;

    let user = state
        .db
        .users()
        .get_by_external_id(subject)
        .await?
        .ok_or_else(ApiError::unauthenticated)?;

    if user.is_banned {
        return Err(ApiError::forbidden("User account is banned"));
    }
    if !user.is_active {
        return Err(ApiError::forbidden("User account is inactive"));
    }

    Ok(user)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(resolve_user(parts, state).await?))
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve_user(parts, state).await.ok()))
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_user(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::forbidden("Admin access required"));
        }
        Ok(AdminUser(user))
    }
}

/// Verifies the legacy admin credential against the externally-configured
/// Argon2 hash. Returns false when no hash is configured.
///
/// Argon2 verification is constant-time by construction; no credential
/// material lives in the code.
pub fn verify_admin_credentials(
    configured_username: &str,
    configured_hash: Option<&str>,
    username: &str,
    password: &str,
) -> bool {
    let Some(hash) = configured_hash else {
        return false;
    };
    if username != configured_username {
        return false;
    }
    let Ok(parsed) = PasswordHash::new(hash) else {
        tracing::error!("ADMIN_PASSWORD_HASH is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{rand_core::OsRng, SaltString};
    use argon2::PasswordHasher;

    #[test]
    fn test_verify_admin_credentials() {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(b"opensesame", &salt)
            .unwrap()
            .to_string();

        assert!(verify_admin_credentials(
            "admin",
            Some(&hash),
            "admin",
            "opensesame"
        ));
        assert!(!verify_admin_credentials(
            "admin",
            Some(&hash),
            "admin",
            "wrong"
        ));
        assert!(!verify_admin_credentials(
            "admin",
            Some(&hash),
            "root",
            "opensesame"
        ));
        assert!(!verify_admin_credentials("admin", None, "admin", "opensesame"));
    }
}
