//! # User Repository
//!
//! Accounts, the points wallet, and profile management.
//!
//! Identity verification happens in an external provider; this repository
//! only maps the provider subject (`external_id`) to a local row.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use restyle_core::{PageInfo, PageRequest, Paged, User, UserRole};

// =============================================================================
// Input / Output Types
// =============================================================================

/// Identity payload used to create or refresh the local user row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUser {
    pub external_id: String,
    pub email: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub profile_image: String,
}

/// Allow-listed profile fields a user may edit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
}

/// Admin user-list filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatusFilter>,
}

/// Account status facet for the admin user list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatusFilter {
    Active,
    Inactive,
    Banned,
}

/// Points wallet summary.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsSummary {
    pub current_balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
}

/// Dashboard stats computed from live tables, not the stored counters.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDashboard {
    pub total_uploads: i64,
    pub total_purchases: i64,
    pub total_exchanges: i64,
    pub total_spent_cents: i64,
    pub points_balance: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates or refreshes the local row for an identity-provider subject.
    ///
    /// ## Returns
    /// The user row and whether it was newly created.
    pub async fn upsert_from_identity(&self, input: &UpsertUser) -> DbResult<(User, bool)> {
        debug!(external_id = %input.external_id, "Upserting user from identity");

        let existing = self.get_by_external_id(&input.external_id).await?;
        let created = existing.is_none();
        let now = Utc::now();

        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO users (
                id, external_id, email, first_name, last_name, profile_image,
                role, points_balance, location, phone,
                total_uploads, total_purchases, total_exchanges,
                total_points_earned, total_points_spent,
                is_active, is_banned, ban_reason, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'user', 0, '', '', 0, 0, 0, 0, 0, 1, 0, '', ?7, ?7)
            ON CONFLICT(external_id) DO UPDATE SET
                email = excluded.email,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                profile_image = excluded.profile_image,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(&input.external_id)
        .bind(&input.email)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.profile_image)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let user = self
            .get_by_external_id(&input.external_id)
            .await?
            .ok_or_else(|| DbError::not_found("User", &input.external_id))?;

        Ok((user, created))
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets a user by the identity-provider subject.
    pub async fn get_by_external_id(&self, external_id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE external_id = ?1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Updates the allow-listed profile fields.
    pub async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> DbResult<User> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE users SET
                first_name = COALESCE(?2, first_name),
                last_name = COALESCE(?3, last_name),
                location = COALESCE(?4, location),
                phone = COALESCE(?5, phone),
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(user_id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.location)
        .bind(&update.phone)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
        }

        self.get_by_id(user_id)
            .await?
            .ok_or_else(|| DbError::not_found("User", user_id))
    }

    /// Deactivates an account (soft delete).
    pub async fn deactivate(&self, user_id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result =
            sqlx::query("UPDATE users SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(user_id)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
        }

        Ok(())
    }

    /// Bans or unbans a user (admin).
    pub async fn set_ban(&self, user_id: &str, banned: bool, reason: Option<&str>) -> DbResult<User> {
        let now = Utc::now();
        let reason = if banned {
            reason.unwrap_or(restyle_core::NO_REASON_PROVIDED)
        } else {
            ""
        };

        let result = sqlx::query(
            "UPDATE users SET is_banned = ?2, ban_reason = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(user_id)
        .bind(banned)
        .bind(reason)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
        }

        self.get_by_id(user_id)
            .await?
            .ok_or_else(|| DbError::not_found("User", user_id))
    }

    /// Pages users with admin filters (admin).
    pub async fn list(&self, filter: &UserFilter, page: PageRequest) -> DbResult<Paged<User>> {
        let page = page.clamped();

        let mut count_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1=1");
        let mut list_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM users WHERE 1=1");

        for query in [&mut count_query, &mut list_query] {
            Self::apply_user_filter(query, filter);
        }

        list_query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let total_count: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;
        let rows: Vec<User> = list_query.build_query_as().fetch_all(&self.pool).await?;

        Ok(Paged {
            rows,
            pagination: PageInfo::compute(total_count, page),
        })
    }

    fn apply_user_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &UserFilter) {
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim().to_lowercase());
            query.push(
                " AND (LOWER(first_name) LIKE ",
            );
            query.push_bind(pattern.clone());
            query.push(" OR LOWER(last_name) LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR LOWER(email) LIKE ");
            query.push_bind(pattern);
            query.push(")");
        }

        if let Some(role) = filter.role {
            query.push(" AND role = ").push_bind(role);
        }

        match filter.status {
            Some(UserStatusFilter::Active) => {
                query.push(" AND is_active = 1");
            }
            Some(UserStatusFilter::Inactive) => {
                query.push(" AND is_active = 0");
            }
            Some(UserStatusFilter::Banned) => {
                query.push(" AND is_banned = 1");
            }
            None => {}
        }
    }

    /// Points wallet summary for the rewards surface.
    pub async fn points_summary(&self, user_id: &str) -> DbResult<PointsSummary> {
        let user = self
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| DbError::not_found("User", user_id))?;

        Ok(PointsSummary {
            current_balance: user.points_balance,
            total_earned: user.statistics.total_points_earned,
            total_spent: user.statistics.total_points_spent,
        })
    }

    /// Dashboard stats computed from the live tables.
    pub async fn dashboard(&self, user_id: &str) -> DbResult<UserDashboard> {
        let user = self
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| DbError::not_found("User", user_id))?;

        let total_uploads: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE owner_id = ?1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let total_purchases: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE buyer_id = ?1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let total_exchanges: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM exchanges WHERE requester_id = ?1 OR owner_id = ?1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let total_spent_cents: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(total_cents) FROM orders
            WHERE buyer_id = ?1
              AND json_extract(payment, '$.status') = 'completed'
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserDashboard {
            total_uploads,
            total_purchases,
            total_exchanges,
            total_spent_cents: total_spent_cents.unwrap_or(0),
            points_balance: user.points_balance,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{create_user, test_db};

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let db = test_db().await;

        let input = UpsertUser {
            external_id: "ext-alma".to_string(),
            email: "alma@example.com".to_string(),
            first_name: "Alma".to_string(),
            last_name: "K".to_string(),
            profile_image: String::new(),
        };

        let (user, created) = db.users().upsert_from_identity(&input).await.unwrap();
        assert!(created);
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.points_balance, 0);

        let refreshed = UpsertUser {
            email: "alma@new.example.com".to_string(),
            ..input
        };
        let (user2, created2) = db.users().upsert_from_identity(&refreshed).await.unwrap();
        assert!(!created2);
        assert_eq!(user2.id, user.id);
        assert_eq!(user2.email, "alma@new.example.com");
    }

    #[tokio::test]
    async fn test_profile_update_is_partial() {
        let db = test_db().await;
        let user = create_user(&db, "bea").await;

        let updated = db
            .users()
            .update_profile(
                &user.id,
                &ProfileUpdate {
                    location: Some("Pune".to_string()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.location, "Pune");
        assert_eq!(updated.first_name, user.first_name);
    }

    #[tokio::test]
    async fn test_ban_and_unban() {
        let db = test_db().await;
        let user = create_user(&db, "cato").await;

        let banned = db
            .users()
            .set_ban(&user.id, true, Some("spam listings"))
            .await
            .unwrap();
        assert!(banned.is_banned);
        assert_eq!(banned.ban_reason, "spam listings");

        let unbanned = db.users().set_ban(&user.id, false, None).await.unwrap();
        assert!(!unbanned.is_banned);
        assert_eq!(unbanned.ban_reason, "");
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = test_db().await;
        let dora = create_user(&db, "dora").await;
        create_user(&db, "ella").await;
        db.users().set_ban(&dora.id, true, None).await.unwrap();

        let banned = db
            .users()
            .list(
                &UserFilter {
                    status: Some(UserStatusFilter::Banned),
                    ..UserFilter::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(banned.rows.len(), 1);
        assert_eq!(banned.rows[0].id, dora.id);

        let by_email = db
            .users()
            .list(
                &UserFilter {
                    search: Some("ella@".to_string()),
                    ..UserFilter::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_email.rows.len(), 1);
    }
}
