//! # Item Repository
//!
//! The catalog store: listings, filtered search, engagement counters,
//! and the moderation lifecycle.
//!
//! ## Item Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Item Lifecycle                                    │
//! │                                                                         │
//! │  owner create() ──► pending ──► review(approve) ──► approved           │
//! │                        │  ▲                            │                │
//! │                        ▼  │ owner update()             ├─► sold        │
//! │                    rejected                            ├─► exchanged   │
//! │                                                        └─► removed     │
//! │                                                                         │
//! │  sold/exchanged revert to approved ONLY through order/exchange         │
//! │  cancellation; admin hard_delete() is the single true deletion.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use restyle_core::{
    validation, CoreError, ExchangePreferences, Item, ItemCategory, ItemCondition, ItemStatus,
    PageInfo, PageRequest, Paged, SortKey, StoredImage, NO_REASON_PROVIDED,
};

// =============================================================================
// Input Types
// =============================================================================

/// Payload for a new listing. Always enters the catalog as `pending`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub title: String,
    pub description: String,
    pub category: ItemCategory,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub material: String,
    pub size: String,
    #[serde(default)]
    pub sizes: Vec<String>,
    pub condition: ItemCondition,
    #[serde(default)]
    pub images: Vec<StoredImage>,
    #[serde(default)]
    pub main_image: Option<StoredImage>,
    pub price_cents: i64,
    #[serde(default)]
    pub original_price_cents: i64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub exchange_preferences: Option<ExchangePreferences>,
}

/// Partial update from the owner. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<ItemCategory>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub material: Option<String>,
    pub size: Option<String>,
    pub sizes: Option<Vec<String>>,
    pub condition: Option<ItemCondition>,
    pub images: Option<Vec<StoredImage>>,
    pub price_cents: Option<i64>,
    pub original_price_cents: Option<i64>,
    pub location: Option<String>,
    pub exchange_preferences: Option<ExchangePreferences>,
}

/// Catalog search filters. Unset filters match everything.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemFilter {
    /// Case-insensitive substring match over title/description/brand.
    pub search: Option<String>,
    pub category: Option<ItemCategory>,
    pub condition: Option<ItemCondition>,
    pub size: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// Defaults to `approved` unless explicitly overridden.
    pub status: Option<ItemStatus>,
    pub sort: Option<SortKey>,
}

/// Moderation verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Creates a new listing in `pending` and counts the upload against
    /// the owner, in one transaction.
    pub async fn create(&self, owner_id: &str, input: &NewItem) -> DbResult<Item> {
        validation::validate_title(&input.title).map_err(CoreError::from)?;
        validation::validate_description(&input.description).map_err(CoreError::from)?;
        validation::validate_price("price", input.price_cents).map_err(CoreError::from)?;
        validation::validate_price("originalPrice", input.original_price_cents)
            .map_err(CoreError::from)?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let prefs = input.exchange_preferences.unwrap_or_default();
        // A listing with no explicit size list offers just its primary size
        let sizes = if input.sizes.is_empty() {
            vec![input.size.clone()]
        } else {
            input.sizes.clone()
        };
        let main_image = input
            .main_image
            .clone()
            .or_else(|| input.images.first().cloned());

        debug!(id = %id, owner = %owner_id, title = %input.title, "Creating item");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO items (
                id, title, description, category, brand, color, material,
                size, sizes, condition, images, main_image,
                price_cents, original_price_cents, location, owner_id,
                status, rejection_reason, accepts_exchange, min_exchange_value_cents,
                views, favorites, exchange_requests, cart_additions,
                featured, points_on_purchase, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16,
                'pending', '', ?17, ?18,
                0, 0, 0, 0,
                0, ?19, ?20, ?20
            )
            "#,
        )
        .bind(&id)
        .bind(input.title.trim())
        .bind(input.description.trim())
        .bind(input.category)
        .bind(&input.brand)
        .bind(&input.color)
        .bind(&input.material)
        .bind(&input.size)
        .bind(Json(&sizes))
        .bind(input.condition)
        .bind(Json(&input.images))
        .bind(main_image.as_ref().map(Json))
        .bind(input.price_cents)
        .bind(input.original_price_cents)
        .bind(&input.location)
        .bind(owner_id)
        .bind(prefs.accepts_exchange)
        .bind(prefs.min_exchange_value_cents)
        .bind(restyle_core::POINTS_PER_ORDER)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET total_uploads = total_uploads + 1 WHERE id = ?1")
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.require(&id).await
    }

    /// Gets an item by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Gets an item or fails with NotFound.
    pub async fn require(&self, id: &str) -> DbResult<Item> {
        self.get(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Item", id).into())
    }

    /// Increments the view counter for a single item read.
    pub async fn record_view(&self, id: &str) -> DbResult<()> {
        sqlx::query("UPDATE items SET views = views + 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Batched view-counter increment for authenticated list reads.
    pub async fn record_views(&self, ids: &[String]) -> DbResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("UPDATE items SET views = views + 1 WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        query.push(")");
        query.build().execute(&self.pool).await?;

        Ok(())
    }

    /// Searches the catalog with filters, sorting, and pagination.
    ///
    /// The status filter defaults to `approved`: browsers never see
    /// pending/rejected/removed listings unless they ask for them.
    pub async fn search(&self, filter: &ItemFilter, page: PageRequest) -> DbResult<Paged<Item>> {
        let page = page.clamped();

        let mut count_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM items WHERE 1=1");
        let mut list_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM items WHERE 1=1");

        for query in [&mut count_query, &mut list_query] {
            Self::apply_filter(query, filter);
        }

        let order_by = match filter.sort.unwrap_or_default() {
            SortKey::Newest => " ORDER BY created_at DESC",
            SortKey::Oldest => " ORDER BY created_at ASC",
            SortKey::PriceLow => " ORDER BY price_cents ASC",
            SortKey::PriceHigh => " ORDER BY price_cents DESC",
            SortKey::Title => " ORDER BY title COLLATE NOCASE ASC",
        };
        list_query
            .push(order_by)
            .push(" LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let total_count: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;
        let rows: Vec<Item> = list_query.build_query_as().fetch_all(&self.pool).await?;

        debug!(count = rows.len(), total = total_count, "Catalog search");

        Ok(Paged {
            rows,
            pagination: PageInfo::compute(total_count, page),
        })
    }

    fn apply_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &ItemFilter) {
        query
            .push(" AND status = ")
            .push_bind(filter.status.unwrap_or(ItemStatus::Approved));

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim().to_lowercase());
            query.push(" AND (LOWER(title) LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR LOWER(description) LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR LOWER(brand) LIKE ");
            query.push_bind(pattern);
            query.push(")");
        }

        if let Some(category) = filter.category {
            query.push(" AND category = ").push_bind(category);
        }

        if let Some(condition) = filter.condition {
            query.push(" AND condition = ").push_bind(condition);
        }

        if let Some(size) = filter.size.as_deref().filter(|s| !s.is_empty()) {
            // sizes is a JSON array of strings
            query.push(" AND EXISTS (SELECT 1 FROM json_each(items.sizes) WHERE json_each.value = ");
            query.push_bind(size.to_string());
            query.push(")");
        }

        if let Some(min) = filter.min_price {
            query.push(" AND price_cents >= ").push_bind(min);
        }

        if let Some(max) = filter.max_price {
            query.push(" AND price_cents <= ").push_bind(max);
        }
    }

    /// Featured approved listings, newest first.
    pub async fn featured(&self, limit: i64) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT * FROM items
            WHERE status = 'approved' AND featured = 1
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Approved listings similar to the given one: same category, same
    /// condition, or within ±30% of its price.
    pub async fn similar(&self, id: &str, limit: i64) -> DbResult<Vec<Item>> {
        let item = self.require(id).await?;

        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT * FROM items
            WHERE id != ?1
              AND status = 'approved'
              AND (category = ?2
                   OR condition = ?3
                   OR (price_cents >= ?4 AND price_cents <= ?5))
            ORDER BY created_at DESC
            LIMIT ?6
            "#,
        )
        .bind(&item.id)
        .bind(item.category)
        .bind(item.condition)
        .bind(item.price_cents * 7 / 10)
        .bind(item.price_cents * 13 / 10)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Pages a user's own listings, optionally by status.
    pub async fn list_by_owner(
        &self,
        owner_id: &str,
        status: Option<ItemStatus>,
        page: PageRequest,
    ) -> DbResult<Paged<Item>> {
        let page = page.clamped();

        let mut count_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM items WHERE owner_id = ");
        let mut list_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM items WHERE owner_id = ");

        for query in [&mut count_query, &mut list_query] {
            query.push_bind(owner_id.to_string());
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
        let rows: Vec<Item> = list_query.build_query_as().fetch_all(&self.pool).await?;

        Ok(Paged {
            rows,
            pagination: PageInfo::compute(total_count, page),
        })
    }

    /// Updates a listing (owner only, never once sold/exchanged).
    ///
    /// A rejected listing re-enters moderation: status flips back to
    /// `pending` and the rejection reason is cleared.
    pub async fn update(&self, id: &str, actor_id: &str, update: &ItemUpdate) -> DbResult<Item> {
        let item = self.require(id).await?;

        if item.owner_id != actor_id {
            return Err(CoreError::forbidden("only the owner may update this item").into());
        }

        if item.status.is_locked() {
            return Err(CoreError::invalid_state(
                "Item",
                id,
                item.status.as_str(),
                "update",
            )
            .into());
        }

        if let Some(title) = update.title.as_deref() {
            validation::validate_title(title).map_err(CoreError::from)?;
        }
        if let Some(description) = update.description.as_deref() {
            validation::validate_description(description).map_err(CoreError::from)?;
        }
        if let Some(price) = update.price_cents {
            validation::validate_price("price", price).map_err(CoreError::from)?;
        }
        if let Some(price) = update.original_price_cents {
            validation::validate_price("originalPrice", price).map_err(CoreError::from)?;
        }

        let now = Utc::now();
        let reenters_moderation = item.status == ItemStatus::Rejected;
        let next_status = if reenters_moderation {
            ItemStatus::Pending
        } else {
            item.status
        };
        let new_main_image: Option<StoredImage> = update
            .images
            .as_ref()
            .and_then(|images| images.first().cloned());

        let result = sqlx::query(
            r#"
            UPDATE items SET
                title = COALESCE(?3, title),
                description = COALESCE(?4, description),
                category = COALESCE(?5, category),
                brand = COALESCE(?6, brand),
                color = COALESCE(?7, color),
                material = COALESCE(?8, material),
                size = COALESCE(?9, size),
                sizes = COALESCE(?10, sizes),
                condition = COALESCE(?11, condition),
                images = COALESCE(?12, images),
                main_image = CASE WHEN ?13 THEN ?14 ELSE main_image END,
                price_cents = COALESCE(?15, price_cents),
                original_price_cents = COALESCE(?16, original_price_cents),
                location = COALESCE(?17, location),
                accepts_exchange = COALESCE(?18, accepts_exchange),
                min_exchange_value_cents = COALESCE(?19, min_exchange_value_cents),
                status = ?20,
                rejection_reason = CASE WHEN ?21 THEN '' ELSE rejection_reason END,
                updated_at = ?22
            WHERE id = ?1 AND status NOT IN ('sold', 'exchanged')
              AND owner_id = ?2
            "#,
        )
        .bind(id)
        .bind(actor_id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.category)
        .bind(&update.brand)
        .bind(&update.color)
        .bind(&update.material)
        .bind(&update.size)
        .bind(update.sizes.as_ref().map(Json))
        .bind(update.condition)
        .bind(update.images.as_ref().map(Json))
        .bind(update.images.is_some())
        .bind(new_main_image.as_ref().map(Json))
        .bind(update.price_cents)
        .bind(update.original_price_cents)
        .bind(&update.location)
        .bind(update.exchange_preferences.map(|p| p.accepts_exchange))
        .bind(update.exchange_preferences.map(|p| p.min_exchange_value_cents))
        .bind(next_status)
        .bind(reenters_moderation)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Lost a race with a purchase/exchange between read and write
            return Err(CoreError::invalid_state("Item", id, "sold", "update").into());
        }

        self.require(id).await
    }

    /// Soft-removes a listing (owner only, never once sold/exchanged).
    pub async fn soft_remove(&self, id: &str, actor_id: &str) -> DbResult<()> {
        let item = self.require(id).await?;

        if item.owner_id != actor_id {
            return Err(CoreError::forbidden("only the owner may remove this item").into());
        }

        if item.status.is_locked() {
            return Err(CoreError::invalid_state(
                "Item",
                id,
                item.status.as_str(),
                "remove",
            )
            .into());
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE items SET status = 'removed', updated_at = ?2
            WHERE id = ?1 AND status IN ('pending', 'approved', 'rejected')
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::invalid_state("Item", id, item.status.as_str(), "remove").into());
        }

        Ok(())
    }

    /// Pages pending listings for moderation (admin).
    pub async fn pending(
        &self,
        category: Option<ItemCategory>,
        condition: Option<ItemCondition>,
        page: PageRequest,
    ) -> DbResult<Paged<Item>> {
        let filter = ItemFilter {
            status: Some(ItemStatus::Pending),
            category,
            condition,
            ..ItemFilter::default()
        };
        self.search(&filter, page).await
    }

    /// Moderates a pending listing (admin).
    ///
    /// Approve clears any rejection reason and may feature the listing;
    /// reject records a reason (default "No reason provided").
    pub async fn review(
        &self,
        id: &str,
        action: ReviewAction,
        reason: Option<&str>,
        featured: Option<bool>,
    ) -> DbResult<Item> {
        let item = self.require(id).await?;
        let now = Utc::now();

        let (next_status, rejection_reason, featured) = match action {
            ReviewAction::Approve => (
                ItemStatus::Approved,
                String::new(),
                featured.unwrap_or(item.featured),
            ),
            ReviewAction::Reject => (
                ItemStatus::Rejected,
                reason.unwrap_or(NO_REASON_PROVIDED).to_string(),
                item.featured,
            ),
        };

        debug!(id = %id, action = ?action, "Reviewing item");

        let result = sqlx::query(
            r#"
            UPDATE items SET
                status = ?2,
                rejection_reason = ?3,
                featured = ?4,
                updated_at = ?5
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(next_status)
        .bind(&rejection_reason)
        .bind(featured)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(
                CoreError::invalid_state("Item", id, item.status.as_str(), "review").into(),
            );
        }

        self.require(id).await
    }

    /// Deletes a listing outright (admin). Returns the deleted row so the
    /// caller can clean up stored images.
    pub async fn hard_delete(&self, id: &str) -> DbResult<Item> {
        let item = self.require(id).await?;

        sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(id = %id, "Item hard-deleted");

        Ok(item)
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
        create_approved_item, create_user, new_item, reload_user, test_db,
    };

    #[tokio::test]
    async fn test_create_enters_pending_and_counts_upload() {
        let db = test_db().await;
        let owner = create_user(&db, "ana").await;

        let item = db
            .items()
            .create(&owner.id, &new_item("Denim jacket", 30000))
            .await
            .unwrap();

        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.points_on_purchase, restyle_core::POINTS_PER_ORDER);
        assert_eq!(item.sizes, vec!["M".to_string()]);

        let owner = reload_user(&db, &owner.id).await;
        assert_eq!(owner.statistics.total_uploads, 1);
    }

    #[tokio::test]
    async fn test_review_approve_and_reject() {
        let db = test_db().await;
        let owner = create_user(&db, "ben").await;
        let item = db
            .items()
            .create(&owner.id, &new_item("Wool coat", 50000))
            .await
            .unwrap();

        let rejected = db
            .items()
            .review(&item.id, ReviewAction::Reject, None, None)
            .await
            .unwrap();
        assert_eq!(rejected.status, ItemStatus::Rejected);
        assert_eq!(rejected.rejection_reason, NO_REASON_PROVIDED);

        // Re-reviewing a non-pending item is illegal
        let err = db
            .items()
            .review(&item.id, ReviewAction::Approve, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_owner_edit_of_rejected_reenters_moderation() {
        let db = test_db().await;
        let owner = create_user(&db, "cleo").await;
        let item = db
            .items()
            .create(&owner.id, &new_item("Linen shirt", 12000))
            .await
            .unwrap();
        db.items()
            .review(&item.id, ReviewAction::Reject, Some("photos too dark"), None)
            .await
            .unwrap();

        let updated = db
            .items()
            .update(
                &item.id,
                &owner.id,
                &ItemUpdate {
                    description: Some("Linen shirt, new photos attached".to_string()),
                    ..ItemUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, ItemStatus::Pending);
        assert_eq!(updated.rejection_reason, "");
    }

    #[tokio::test]
    async fn test_update_requires_owner() {
        let db = test_db().await;
        let owner = create_user(&db, "dina").await;
        let other = create_user(&db, "edgar").await;
        let item = create_approved_item(&db, &owner.id, "Silk scarf", 8000).await;

        let err = db
            .items()
            .update(
                &item.id,
                &other.id,
                &ItemUpdate {
                    title: Some("Stolen scarf".to_string()),
                    ..ItemUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_search_filters_and_sort() {
        let db = test_db().await;
        let owner = create_user(&db, "fran").await;
        create_approved_item(&db, &owner.id, "Blue denim jacket", 30000).await;
        create_approved_item(&db, &owner.id, "Red raincoat", 45000).await;
        // Pending item must not appear in default search
        db.items()
            .create(&owner.id, &new_item("Hidden pending", 100))
            .await
            .unwrap();

        let all = db
            .items()
            .search(&ItemFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(all.rows.len(), 2);

        let denim = db
            .items()
            .search(
                &ItemFilter {
                    search: Some("denim".to_string()),
                    ..ItemFilter::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(denim.rows.len(), 1);
        assert_eq!(denim.rows[0].title, "Blue denim jacket");

        let cheap_first = db
            .items()
            .search(
                &ItemFilter {
                    sort: Some(SortKey::PriceLow),
                    ..ItemFilter::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(cheap_first.rows[0].price_cents, 30000);

        let in_band = db
            .items()
            .search(
                &ItemFilter {
                    min_price: Some(40000),
                    max_price: Some(50000),
                    ..ItemFilter::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(in_band.rows.len(), 1);
        assert_eq!(in_band.rows[0].title, "Red raincoat");
    }

    #[tokio::test]
    async fn test_view_counters() {
        let db = test_db().await;
        let owner = create_user(&db, "gus").await;
        let a = create_approved_item(&db, &owner.id, "Item A", 1000).await;
        let b = create_approved_item(&db, &owner.id, "Item B", 2000).await;

        db.items().record_view(&a.id).await.unwrap();
        db.items()
            .record_views(&[a.id.clone(), b.id.clone()])
            .await
            .unwrap();

        let a = db.items().require(&a.id).await.unwrap();
        let b = db.items().require(&b.id).await.unwrap();
        assert_eq!(a.statistics.views, 2);
        assert_eq!(b.statistics.views, 1);
    }

    #[tokio::test]
    async fn test_soft_remove() {
        let db = test_db().await;
        let owner = create_user(&db, "hana").await;
        let item = create_approved_item(&db, &owner.id, "Cardigan", 15000).await;

        db.items().soft_remove(&item.id, &owner.id).await.unwrap();
        let item = db.items().require(&item.id).await.unwrap();
        assert_eq!(item.status, ItemStatus::Removed);
    }

    #[tokio::test]
    async fn test_similar_items() {
        let db = test_db().await;
        let owner = create_user(&db, "iris").await;
        let anchor = create_approved_item(&db, &owner.id, "Anchor top", 10000).await;
        create_approved_item(&db, &owner.id, "Same category", 99000).await;
        create_approved_item(&db, &owner.id, "Close price", 11000).await;

        let similar = db.items().similar(&anchor.id, 8).await.unwrap();
        assert_eq!(similar.len(), 2);
        assert!(similar.iter().all(|i| i.id != anchor.id));
    }
}
