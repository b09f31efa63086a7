//! # Cart Repository
//!
//! One cart per user, created lazily on first access.
//!
//! ## The Cart Is a Staging View
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Carts never lock prices or availability.                               │
//! │                                                                         │
//! │  get() ──► prune entries whose item is gone or not `approved`          │
//! │        ──► recompute totals from LIVE item price × quantity            │
//! │                                                                         │
//! │  A read therefore has a write side effect (the prune); two             │
//! │  consecutive reads never disagree about which entries exist.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use restyle_core::{
    validation, CartEntry, CartEntryView, CartView, CoreError, Item, ItemStatus, MAX_CART_ENTRIES,
};

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Loads the user's cart, pruning stale entries and recomputing totals
    /// from live item state.
    pub async fn get(&self, user_id: &str) -> DbResult<CartView> {
        let cart_id = self.ensure_cart(user_id).await?;

        // Entries referencing items that are missing or no longer approved
        // are silently dropped on read
        sqlx::query(
            r#"
            DELETE FROM cart_entries
            WHERE cart_id = ?1
              AND item_id NOT IN (SELECT id FROM items WHERE status = 'approved')
            "#,
        )
        .bind(&cart_id)
        .execute(&self.pool)
        .await?;

        let entries = sqlx::query_as::<_, CartEntry>(
            "SELECT * FROM cart_entries WHERE cart_id = ?1 ORDER BY added_at, id",
        )
        .bind(&cart_id)
        .fetch_all(&self.pool)
        .await?;

        let mut views = Vec::with_capacity(entries.len());
        for entry in entries {
            let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = ?1")
                .bind(&entry.item_id)
                .fetch_optional(&self.pool)
                .await?;
            if let Some(item) = item {
                views.push(CartEntryView {
                    item,
                    quantity: entry.quantity,
                    size: entry.size,
                    added_at: entry.added_at,
                });
            }
        }

        Ok(CartView::from_entries(views))
    }

    /// Adds an item to the cart, merging into an existing (item, size)
    /// entry by summing quantities.
    pub async fn add(
        &self,
        user_id: &str,
        item_id: &str,
        size: &str,
        quantity: i64,
    ) -> DbResult<CartView> {
        validation::validate_quantity(quantity).map_err(CoreError::from)?;

        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = ?1")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::not_found("Item", item_id))?;

        if item.status != ItemStatus::Approved {
            return Err(CoreError::invalid_state(
                "Item",
                item_id,
                item.status.as_str(),
                "add to cart",
            )
            .into());
        }

        if item.owner_id == user_id {
            return Err(CoreError::forbidden("cannot add your own item to cart").into());
        }

        validation::validate_size_selection(size, &item.sizes).map_err(CoreError::from)?;

        let cart_id = self.ensure_cart(user_id).await?;

        let entry_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cart_entries WHERE cart_id = ?1")
                .bind(&cart_id)
                .fetch_one(&self.pool)
                .await?;
        if entry_count as usize >= MAX_CART_ENTRIES {
            return Err(CoreError::InvalidArgument(format!(
                "cart cannot hold more than {MAX_CART_ENTRIES} entries"
            ))
            .into());
        }

        debug!(user = %user_id, item = %item_id, size = %size, quantity, "Adding cart entry");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO cart_entries (id, cart_id, item_id, quantity, size, added_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(cart_id, item_id, size)
                DO UPDATE SET quantity = quantity + excluded.quantity
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&cart_id)
        .bind(item_id)
        .bind(quantity)
        .bind(size)
        .bind(now)
        .execute(&self.pool)
        .await?;

        sqlx::query("UPDATE items SET cart_additions = cart_additions + 1 WHERE id = ?1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        self.get(user_id).await
    }

    /// Updates an entry's quantity; a quantity ≤ 0 removes the entry.
    pub async fn update(
        &self,
        user_id: &str,
        item_id: &str,
        size: &str,
        quantity: i64,
    ) -> DbResult<CartView> {
        if quantity <= 0 {
            return self.remove(user_id, item_id, Some(size)).await;
        }
        validation::validate_quantity(quantity).map_err(CoreError::from)?;

        let cart_id = self.ensure_cart(user_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE cart_entries SET quantity = ?4
            WHERE cart_id = ?1 AND item_id = ?2 AND size = ?3
            "#,
        )
        .bind(&cart_id)
        .bind(item_id)
        .bind(size)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart entry", item_id));
        }

        self.get(user_id).await
    }

    /// Removes one size of an item, or every variant when `size` is None.
    pub async fn remove(
        &self,
        user_id: &str,
        item_id: &str,
        size: Option<&str>,
    ) -> DbResult<CartView> {
        let cart_id = self.ensure_cart(user_id).await?;

        match size {
            Some(size) => {
                sqlx::query(
                    "DELETE FROM cart_entries WHERE cart_id = ?1 AND item_id = ?2 AND size = ?3",
                )
                .bind(&cart_id)
                .bind(item_id)
                .bind(size)
                .execute(&self.pool)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM cart_entries WHERE cart_id = ?1 AND item_id = ?2")
                    .bind(&cart_id)
                    .bind(item_id)
                    .execute(&self.pool)
                    .await?;
            }
        }

        self.get(user_id).await
    }

    /// Clears every entry.
    pub async fn clear(&self, user_id: &str) -> DbResult<()> {
        let cart_id = self.ensure_cart(user_id).await?;

        sqlx::query("DELETE FROM cart_entries WHERE cart_id = ?1")
            .bind(&cart_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Total quantity across all entries (badge count).
    pub async fn count(&self, user_id: &str) -> DbResult<i64> {
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(ce.quantity)
            FROM cart_entries ce
            JOIN carts c ON c.id = ce.cart_id
            WHERE c.user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.unwrap_or(0))
    }

    /// Finds or lazily creates the user's cart row, returning its id.
    async fn ensure_cart(&self, user_id: &str) -> DbResult<String> {
        if let Some(id) =
            sqlx::query_scalar::<_, String>("SELECT id FROM carts WHERE user_id = ?1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?
        {
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO carts (id, user_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(user = %user_id, cart = %id, "Cart created lazily");

        Ok(id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::item::ItemUpdate;
    use crate::repository::test_support::{create_approved_item, create_user, test_db};

    #[tokio::test]
    async fn test_add_and_merge() {
        let db = test_db().await;
        let owner = create_user(&db, "seller").await;
        let buyer = create_user(&db, "buyer").await;
        let item = create_approved_item(&db, &owner.id, "Denim jacket", 30000).await;

        let cart = db.carts().add(&buyer.id, &item.id, "M", 1).await.unwrap();
        assert_eq!(cart.entries.len(), 1);
        assert_eq!(cart.total_cents, 30000);
        assert_eq!(cart.item_count, 1);

        // Same (item, size) merges by summing quantity
        let cart = db.carts().add(&buyer.id, &item.id, "M", 2).await.unwrap();
        assert_eq!(cart.entries.len(), 1);
        assert_eq!(cart.entries[0].quantity, 3);
        assert_eq!(cart.total_cents, 90000);
        assert_eq!(cart.item_count, 3);

        let item = db.items().require(&item.id).await.unwrap();
        assert_eq!(item.statistics.cart_additions, 2);
    }

    #[tokio::test]
    async fn test_add_rejects_own_and_unavailable_items() {
        let db = test_db().await;
        let owner = create_user(&db, "olga").await;
        let buyer = create_user(&db, "pete").await;
        let item = create_approved_item(&db, &owner.id, "Parka", 60000).await;

        let err = db.carts().add(&owner.id, &item.id, "M", 1).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));

        let err = db
            .carts()
            .add(&buyer.id, &item.id, "XL", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        db.items().soft_remove(&item.id, &owner.id).await.unwrap();
        let err = db.carts().add(&buyer.id, &item.id, "M", 1).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_prunes_and_recomputes() {
        let db = test_db().await;
        let owner = create_user(&db, "quin").await;
        let buyer = create_user(&db, "rhea").await;
        let keep = create_approved_item(&db, &owner.id, "Keep me", 10000).await;
        let gone = create_approved_item(&db, &owner.id, "Remove me", 5000).await;

        db.carts().add(&buyer.id, &keep.id, "M", 1).await.unwrap();
        db.carts().add(&buyer.id, &gone.id, "M", 2).await.unwrap();

        // Owner pulls one listing; the entry must vanish on next read
        db.items().soft_remove(&gone.id, &owner.id).await.unwrap();

        let cart = db.carts().get(&buyer.id).await.unwrap();
        assert_eq!(cart.entries.len(), 1);
        assert_eq!(cart.entries[0].item.id, keep.id);
        assert_eq!(cart.total_cents, 10000);

        // Price changes flow straight into the totals: no price lock
        db.items()
            .update(
                &keep.id,
                &owner.id,
                &ItemUpdate {
                    price_cents: Some(12000),
                    ..ItemUpdate::default()
                },
            )
            .await
            .unwrap();
        let cart = db.carts().get(&buyer.id).await.unwrap();
        assert_eq!(cart.total_cents, 12000);

        // Pruned entries never reappear
        let cart = db.carts().get(&buyer.id).await.unwrap();
        assert_eq!(cart.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_update_remove_clear_count() {
        let db = test_db().await;
        let owner = create_user(&db, "sol").await;
        let buyer = create_user(&db, "tess").await;
        let item = create_approved_item(&db, &owner.id, "Hoodie", 20000).await;

        db.carts().add(&buyer.id, &item.id, "M", 2).await.unwrap();
        assert_eq!(db.carts().count(&buyer.id).await.unwrap(), 2);

        let cart = db.carts().update(&buyer.id, &item.id, "M", 5).await.unwrap();
        assert_eq!(cart.entries[0].quantity, 5);

        // Quantity zero removes the entry
        let cart = db.carts().update(&buyer.id, &item.id, "M", 0).await.unwrap();
        assert!(cart.entries.is_empty());

        db.carts().add(&buyer.id, &item.id, "M", 1).await.unwrap();
        db.carts().clear(&buyer.id).await.unwrap();
        assert_eq!(db.carts().count(&buyer.id).await.unwrap(), 0);

        let err = db
            .carts()
            .update(&buyer.id, &item.id, "M", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
