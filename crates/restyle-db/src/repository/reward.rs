//! # Reward Repository
//!
//! The rewards ledger: a points-for-merchandise catalog and its
//! redemption records.
//!
//! ## Redemption
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  redeem() preconditions, checked in order:                              │
//! │    1. reward exists                                                     │
//! │    2. reward is active and in stock                                     │
//! │    3. stock_quantity > 0                                                │
//! │    4. user balance ≥ points_required                                    │
//! │    5. not expired                                                       │
//! │                                                                         │
//! │  Then ONE transaction:                                                  │
//! │    insert redemption (points_spent snapshot, shipping defaulted         │
//! │    from the profile) · debit balance · stock-1 (guarded > 0) ·          │
//! │    redeemed_count+1                                                     │
//! │                                                                         │
//! │  Stock can never go negative; availability is derived from              │
//! │  stock_quantity, so it flips to out-of-stock exactly at zero.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use restyle_core::{
    ids, validation, CoreError, PageInfo, PageRequest, Paged, RedemptionStatus, Reward,
    RewardCategory, RewardRedemption, ShippingAddress, StoredImage, TrackingInfo, User,
    DEFAULT_REWARD_STOCK,
};

// =============================================================================
// Input Types
// =============================================================================

/// Payload for a new reward (admin).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReward {
    pub title: String,
    pub description: String,
    pub category: RewardCategory,
    pub points_required: i64,
    /// Defaults to [`DEFAULT_REWARD_STOCK`].
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub image: Option<StoredImage>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub terms: String,
}

/// Partial reward update (admin). `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RewardUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<RewardCategory>,
    pub points_required: Option<i64>,
    pub stock_quantity: Option<i64>,
    pub image: Option<StoredImage>,
    pub is_active: Option<bool>,
    pub valid_until: Option<DateTime<Utc>>,
    pub terms: Option<String>,
}

/// Public catalog filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RewardFilter {
    pub category: Option<RewardCategory>,
    pub min_points: Option<i64>,
    pub max_points: Option<i64>,
    pub in_stock: Option<bool>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for reward database operations.
#[derive(Debug, Clone)]
pub struct RewardRepository {
    pool: SqlitePool,
}

impl RewardRepository {
    /// Creates a new RewardRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RewardRepository { pool }
    }

    /// Active rewards for the public catalog, cheapest points first.
    pub async fn catalog(&self, filter: &RewardFilter) -> DbResult<Vec<Reward>> {
        let mut query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM rewards WHERE is_active = 1");

        if let Some(category) = filter.category {
            query.push(" AND category = ").push_bind(category);
        }
        if let Some(min) = filter.min_points {
            query.push(" AND points_required >= ").push_bind(min);
        }
        if let Some(max) = filter.max_points {
            query.push(" AND points_required <= ").push_bind(max);
        }
        match filter.in_stock {
            Some(true) => {
                query.push(" AND stock_quantity > 0");
            }
            Some(false) => {
                query.push(" AND stock_quantity = 0");
            }
            None => {}
        }
        query.push(" ORDER BY points_required ASC");

        let rewards: Vec<Reward> = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(rewards)
    }

    /// Gets a reward by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Reward>> {
        let reward = sqlx::query_as::<_, Reward>("SELECT * FROM rewards WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(reward)
    }

    /// Gets a reward or fails with NotFound.
    pub async fn require(&self, id: &str) -> DbResult<Reward> {
        self.get(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Reward", id).into())
    }

    /// Distinct categories with at least one active reward.
    pub async fn categories(&self) -> DbResult<Vec<RewardCategory>> {
        let categories: Vec<RewardCategory> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM rewards WHERE is_active = 1 ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Creates a reward (admin).
    pub async fn create(&self, input: &NewReward) -> DbResult<Reward> {
        validation::validate_title(&input.title).map_err(CoreError::from)?;
        validation::validate_points_required(input.points_required).map_err(CoreError::from)?;

        let stock = input.stock_quantity.unwrap_or(DEFAULT_REWARD_STOCK);
        if stock < 0 {
            return Err(
                CoreError::InvalidArgument("stock quantity must not be negative".to_string())
                    .into(),
            );
        }

        let id = Uuid::new_v4().to_string();
        let reward_id = ids::generate_reward_id();
        let now = Utc::now();

        debug!(reward = %reward_id, title = %input.title, "Creating reward");

        sqlx::query(
            r#"
            INSERT INTO rewards (
                id, reward_id, title, description, category, points_required,
                image, stock_quantity, redeemed_count, is_active, valid_until,
                terms, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, 1, ?9, ?10, ?11, ?11)
            "#,
        )
        .bind(&id)
        .bind(&reward_id)
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.category)
        .bind(input.points_required)
        .bind(input.image.as_ref().map(Json))
        .bind(stock)
        .bind(input.valid_until)
        .bind(&input.terms)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.require(&id).await
    }

    /// Updates a reward (admin).
    pub async fn update(&self, id: &str, update: &RewardUpdate) -> DbResult<Reward> {
        if let Some(points) = update.points_required {
            validation::validate_points_required(points).map_err(CoreError::from)?;
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE rewards SET
                title = COALESCE(?2, title),
                description = COALESCE(?3, description),
                category = COALESCE(?4, category),
                points_required = COALESCE(?5, points_required),
                stock_quantity = COALESCE(?6, stock_quantity),
                image = COALESCE(?7, image),
                is_active = COALESCE(?8, is_active),
                valid_until = COALESCE(?9, valid_until),
                terms = COALESCE(?10, terms),
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.category)
        .bind(update.points_required)
        .bind(update.stock_quantity)
        .bind(update.image.as_ref().map(Json))
        .bind(update.is_active)
        .bind(update.valid_until)
        .bind(&update.terms)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Reward", id).into());
        }

        self.require(id).await
    }

    /// Pages rewards for the admin surface.
    pub async fn admin_list(
        &self,
        category: Option<RewardCategory>,
        is_active: Option<bool>,
        page: PageRequest,
    ) -> DbResult<Paged<Reward>> {
        let page = page.clamped();

        let mut count_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM rewards WHERE 1=1");
        let mut list_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM rewards WHERE 1=1");

        for query in [&mut count_query, &mut list_query] {
            if let Some(category) = category {
                query.push(" AND category = ").push_bind(category);
            }
            if let Some(is_active) = is_active {
                query.push(" AND is_active = ").push_bind(is_active);
            }
        }

        list_query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let total_count: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;
        let rows: Vec<Reward> = list_query.build_query_as().fetch_all(&self.pool).await?;

        Ok(Paged {
            rows,
            pagination: PageInfo::compute(total_count, page),
        })
    }

    /// Redeems a reward for points.
    ///
    /// Preconditions run in a fixed order (see module docs); the side
    /// effects are one transaction and the stock decrement is guarded, so
    /// two racing redemptions of the last unit cannot both succeed.
    pub async fn redeem(
        &self,
        user_id: &str,
        reward_id: &str,
        shipping: Option<ShippingAddress>,
    ) -> DbResult<RewardRedemption> {
        let mut tx = self.pool.begin().await?;

        let reward = sqlx::query_as::<_, Reward>("SELECT * FROM rewards WHERE id = ?1")
            .bind(reward_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::not_found("Reward", reward_id))?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::not_found("User", user_id))?;

        if !reward.is_active || !reward.in_stock() {
            return Err(CoreError::invalid_state(
                "Reward",
                reward_id,
                if reward.is_active { "out-of-stock" } else { "inactive" },
                "redeem",
            )
            .into());
        }

        if reward.stock_quantity <= 0 {
            return Err(CoreError::OutOfStock {
                id: reward_id.to_string(),
            }
            .into());
        }

        if user.points_balance < reward.points_required {
            return Err(CoreError::InsufficientBalance {
                required: reward.points_required,
                available: user.points_balance,
            }
            .into());
        }

        let now = Utc::now();
        if reward.is_expired(now) {
            return Err(
                CoreError::invalid_state("Reward", reward_id, "expired", "redeem").into(),
            );
        }

        let id = Uuid::new_v4().to_string();
        let redemption_id = ids::generate_redemption_id();
        let shipping = shipping.unwrap_or_else(|| user.default_shipping_address());

        debug!(redemption = %redemption_id, user = %user_id, reward = %reward.reward_id, "Redeeming reward");

        sqlx::query(
            r#"
            INSERT INTO reward_redemptions (
                id, redemption_id, user_id, reward_id, points_spent, status,
                shipping_address, tracking, delivery_date, notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, NULL, NULL, '', ?7, ?7)
            "#,
        )
        .bind(&id)
        .bind(&redemption_id)
        .bind(user_id)
        .bind(reward_id)
        .bind(reward.points_required)
        .bind(Json(&shipping))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE users SET
                points_balance = points_balance - ?2,
                total_points_spent = total_points_spent + ?2
            WHERE id = ?1
            "#,
        )
        .bind(user_id)
        .bind(reward.points_required)
        .execute(&mut *tx)
        .await?;

        // The stock guard is the race arbiter: the second redemption of
        // the last unit affects zero rows and rolls back
        let decremented = sqlx::query(
            r#"
            UPDATE rewards SET
                stock_quantity = stock_quantity - 1,
                redeemed_count = redeemed_count + 1,
                updated_at = ?2
            WHERE id = ?1 AND stock_quantity > 0
            "#,
        )
        .bind(reward_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        if decremented.rows_affected() == 0 {
            return Err(CoreError::OutOfStock {
                id: reward_id.to_string(),
            }
            .into());
        }

        tx.commit().await?;

        info!(redemption = %redemption_id, user = %user_id, points = reward.points_required, "Reward redeemed");

        self.require_redemption(&id).await
    }

    /// Pages a user's redemption history, newest first.
    pub async fn redemptions_for_user(
        &self,
        user_id: &str,
        status: Option<RedemptionStatus>,
        page: PageRequest,
    ) -> DbResult<Paged<RewardRedemption>> {
        let page = page.clamped();

        let mut count_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM reward_redemptions WHERE user_id = ");
        let mut list_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM reward_redemptions WHERE user_id = ");

        for query in [&mut count_query, &mut list_query] {
            query.push_bind(user_id.to_string());
            if let Some(status) = status {
                query.push(" AND status = ").push_bind(status);
            }
        }

        list_query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let total_count: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;
        let rows: Vec<RewardRedemption> =
            list_query.build_query_as().fetch_all(&self.pool).await?;

        Ok(Paged {
            rows,
            pagination: PageInfo::compute(total_count, page),
        })
    }

    /// Gets a redemption; only its owner may read it.
    pub async fn get_redemption(&self, id: &str, actor_id: &str) -> DbResult<RewardRedemption> {
        let redemption = self.require_redemption(id).await?;

        if redemption.user_id != actor_id {
            return Err(CoreError::forbidden("not your redemption").into());
        }

        Ok(redemption)
    }

    /// Pages all redemptions, optionally by status (admin).
    pub async fn admin_redemptions(
        &self,
        status: Option<RedemptionStatus>,
        page: PageRequest,
    ) -> DbResult<Paged<RewardRedemption>> {
        let page = page.clamped();

        let mut count_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM reward_redemptions WHERE 1=1");
        let mut list_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM reward_redemptions WHERE 1=1");

        for query in [&mut count_query, &mut list_query] {
            if let Some(status) = status {
                query.push(" AND status = ").push_bind(status);
            }
        }

        list_query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let total_count: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;
        let rows: Vec<RewardRedemption> =
            list_query.build_query_as().fetch_all(&self.pool).await?;

        Ok(Paged {
            rows,
            pagination: PageInfo::compute(total_count, page),
        })
    }

    /// Advances a redemption's fulfilment status (admin).
    ///
    /// `shipped` records tracking; `delivered` stamps the delivery date;
    /// `cancelled` refunds the points snapshot and restores one unit of
    /// stock in the same transaction. Cancelled redemptions are terminal,
    /// and a delivered redemption can no longer be cancelled.
    pub async fn update_redemption_status(
        &self,
        id: &str,
        new_status: RedemptionStatus,
        tracking_number: Option<&str>,
        carrier: Option<&str>,
        notes: Option<&str>,
    ) -> DbResult<RewardRedemption> {
        let mut tx = self.pool.begin().await?;

        let redemption =
            sqlx::query_as::<_, RewardRedemption>("SELECT * FROM reward_redemptions WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| CoreError::not_found("Redemption", id))?;

        if redemption.status == RedemptionStatus::Cancelled {
            return Err(CoreError::invalid_state(
                "Redemption",
                id,
                redemption.status.as_str(),
                "update status",
            )
            .into());
        }
        if new_status == RedemptionStatus::Cancelled
            && redemption.status == RedemptionStatus::Delivered
        {
            return Err(CoreError::invalid_state(
                "Redemption",
                id,
                redemption.status.as_str(),
                "cancel",
            )
            .into());
        }

        let now = Utc::now();
        let tracking = if new_status == RedemptionStatus::Shipped {
            let number = tracking_number
                .map(str::to_string)
                .unwrap_or_else(ids::generate_tracking_number);
            Some(TrackingInfo {
                tracking_url: ids::tracking_url(&number),
                tracking_number: number,
                carrier: carrier.map(str::to_string),
            })
        } else {
            redemption.tracking.clone()
        };
        let delivery_date = if new_status == RedemptionStatus::Delivered {
            Some(now)
        } else {
            redemption.delivery_date
        };

        let result = sqlx::query(
            r#"
            UPDATE reward_redemptions SET
                status = ?3,
                tracking = ?4,
                delivery_date = ?5,
                notes = COALESCE(?6, notes),
                updated_at = ?7
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(id)
        .bind(redemption.status)
        .bind(new_status)
        .bind(tracking.as_ref().map(Json))
        .bind(delivery_date)
        .bind(notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::invalid_state(
                "Redemption",
                id,
                redemption.status.as_str(),
                "update status",
            )
            .into());
        }

        if new_status == RedemptionStatus::Cancelled {
            // Undo the redemption: points back to the user, unit back to
            // the shelf
            sqlx::query(
                r#"
                UPDATE users SET
                    points_balance = points_balance + ?2,
                    total_points_spent = total_points_spent - ?2
                WHERE id = ?1
                "#,
            )
            .bind(&redemption.user_id)
            .bind(redemption.points_spent)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                UPDATE rewards SET
                    stock_quantity = stock_quantity + 1,
                    redeemed_count = redeemed_count - 1,
                    updated_at = ?2
                WHERE id = ?1
                "#,
            )
            .bind(&redemption.reward_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(redemption = %redemption.redemption_id, status = ?new_status, "Redemption status updated");

        self.require_redemption(id).await
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    async fn require_redemption(&self, id: &str) -> DbResult<RewardRedemption> {
        sqlx::query_as::<_, RewardRedemption>("SELECT * FROM reward_redemptions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::not_found("Redemption", id).into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::test_support::{
        create_reward, create_user, reload_user, set_points, test_db,
    };
    use chrono::Duration;

    #[tokio::test]
    async fn test_redeem_last_unit_and_sell_out() {
        let db = test_db().await;
        let dina = create_user(&db, "dina").await;
        let evan = create_user(&db, "evan").await;
        set_points(&db, &dina.id, 600).await;
        set_points(&db, &evan.id, 600).await;
        let reward = create_reward(&db, 600, 1).await;

        let redemption = db.rewards().redeem(&dina.id, &reward.id, None).await.unwrap();
        assert!(redemption.redemption_id.starts_with("RDM"));
        assert_eq!(redemption.points_spent, 600);
        assert_eq!(redemption.status, RedemptionStatus::Pending);

        let dina = reload_user(&db, &dina.id).await;
        assert_eq!(dina.points_balance, 0);
        assert_eq!(dina.statistics.total_points_spent, 600);

        let reward = db.rewards().require(&reward.id).await.unwrap();
        assert_eq!(reward.stock_quantity, 0);
        assert_eq!(reward.redeemed_count, 1);
        assert!(!reward.in_stock());

        // The shelf is empty for everyone now
        let err = db.rewards().redeem(&evan.id, &reward.id, None).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));
        let evan = reload_user(&db, &evan.id).await;
        assert_eq!(evan.points_balance, 600);
    }

    #[tokio::test]
    async fn test_redeem_preconditions() {
        let db = test_db().await;
        let user = create_user(&db, "fern").await;
        set_points(&db, &user.id, 100).await;
        let reward = create_reward(&db, 600, 5).await;

        // Not enough points
        let err = db.rewards().redeem(&user.id, &reward.id, None).await.unwrap_err();
        match err {
            DbError::Core(CoreError::InsufficientBalance { required, available }) => {
                assert_eq!(required, 600);
                assert_eq!(available, 100);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Inactive reward
        set_points(&db, &user.id, 1000).await;
        db.rewards()
            .update(
                &reward.id,
                &RewardUpdate {
                    is_active: Some(false),
                    ..RewardUpdate::default()
                },
            )
            .await
            .unwrap();
        let err = db.rewards().redeem(&user.id, &reward.id, None).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));

        // Expired reward
        db.rewards()
            .update(
                &reward.id,
                &RewardUpdate {
                    is_active: Some(true),
                    valid_until: Some(Utc::now() - Duration::days(1)),
                    ..RewardUpdate::default()
                },
            )
            .await
            .unwrap();
        let err = db.rewards().redeem(&user.id, &reward.id, None).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));

        // No side effects from the failed attempts
        let user = reload_user(&db, &user.id).await;
        assert_eq!(user.points_balance, 1000);
        let reward = db.rewards().require(&reward.id).await.unwrap();
        assert_eq!(reward.stock_quantity, 5);
    }

    #[tokio::test]
    async fn test_shipping_defaults_from_profile() {
        let db = test_db().await;
        let user = create_user(&db, "gale").await;
        set_points(&db, &user.id, 600).await;
        db.users()
            .update_profile(
                &user.id,
                &crate::repository::user::ProfileUpdate {
                    location: Some("12 Hill Road, Bandra".to_string()),
                    phone: Some("98200 00000".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let reward = create_reward(&db, 600, 3).await;

        let redemption = db.rewards().redeem(&user.id, &reward.id, None).await.unwrap();
        assert_eq!(redemption.shipping_address.name, "gale");
        assert_eq!(redemption.shipping_address.address, "12 Hill Road, Bandra");
        assert_eq!(redemption.shipping_address.phone, "98200 00000");
    }

    #[tokio::test]
    async fn test_redemption_fulfilment_and_cancellation() {
        let db = test_db().await;
        let user = create_user(&db, "hope").await;
        set_points(&db, &user.id, 600).await;
        let reward = create_reward(&db, 600, 2).await;
        let redemption = db.rewards().redeem(&user.id, &reward.id, None).await.unwrap();

        let shipped = db
            .rewards()
            .update_redemption_status(
                &redemption.id,
                RedemptionStatus::Shipped,
                Some("RW555"),
                Some("IndiaPost"),
                None,
            )
            .await
            .unwrap();
        let tracking = shipped.tracking.expect("tracking recorded");
        assert_eq!(tracking.tracking_number, "RW555");

        // Cancellation refunds the snapshot and restores the shelf
        let cancelled = db
            .rewards()
            .update_redemption_status(&redemption.id, RedemptionStatus::Cancelled, None, None, None)
            .await
            .unwrap();
        assert_eq!(cancelled.status, RedemptionStatus::Cancelled);

        let user = reload_user(&db, &user.id).await;
        assert_eq!(user.points_balance, 600);
        assert_eq!(user.statistics.total_points_spent, 0);
        let reward = db.rewards().require(&reward.id).await.unwrap();
        assert_eq!(reward.stock_quantity, 2);
        assert_eq!(reward.redeemed_count, 0);

        // Cancelled is terminal
        let err = db
            .rewards()
            .update_redemption_status(&redemption.id, RedemptionStatus::Processed, None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_delivery_stamps_date() {
        let db = test_db().await;
        let user = create_user(&db, "ines").await;
        set_points(&db, &user.id, 600).await;
        let reward = create_reward(&db, 600, 2).await;
        let redemption = db.rewards().redeem(&user.id, &reward.id, None).await.unwrap();

        let delivered = db
            .rewards()
            .update_redemption_status(&redemption.id, RedemptionStatus::Delivered, None, None, None)
            .await
            .unwrap();
        assert!(delivered.delivery_date.is_some());

        // A delivered redemption can no longer be cancelled
        let err = db
            .rewards()
            .update_redemption_status(&redemption.id, RedemptionStatus::Cancelled, None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_catalog_filters_and_ordering() {
        let db = test_db().await;
        let cheap = create_reward(&db, 200, 5).await;
        let costly = create_reward(&db, 900, 0).await;

        let all = db.rewards().catalog(&RewardFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, cheap.id);

        let in_stock = db
            .rewards()
            .catalog(&RewardFilter {
                in_stock: Some(true),
                ..RewardFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(in_stock.len(), 1);
        assert_eq!(in_stock[0].id, cheap.id);

        let pricey = db
            .rewards()
            .catalog(&RewardFilter {
                min_points: Some(500),
                ..RewardFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(pricey.len(), 1);
        assert_eq!(pricey[0].id, costly.id);

        let categories = db.rewards().categories().await.unwrap();
        assert_eq!(categories, vec![RewardCategory::Accessories]);
    }

    #[tokio::test]
    async fn test_redemption_history_and_ownership() {
        let db = test_db().await;
        let user = create_user(&db, "jill").await;
        let other = create_user(&db, "kent").await;
        set_points(&db, &user.id, 1200).await;
        let reward = create_reward(&db, 600, 5).await;

        db.rewards().redeem(&user.id, &reward.id, None).await.unwrap();
        let second = db.rewards().redeem(&user.id, &reward.id, None).await.unwrap();

        let history = db
            .rewards()
            .redemptions_for_user(&user.id, None, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(history.rows.len(), 2);
        assert_eq!(history.pagination.total_count, 2);

        let err = db
            .rewards()
            .get_redemption(&second.id, &other.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));
    }
}
