//! # Order Repository
//!
//! The order lifecycle engine: placement, fulfilment, cancellation.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  create()                                                              │
//! │    ├── validate every item: exists, approved, not self-owned,          │
//! │    │   single seller                                                   │
//! │    └── ONE transaction:                                                │
//! │        insert order + lines (snapshots, payment completed)             │
//! │        items approved → sold   (guarded; a lost race aborts)           │
//! │        buyer: +200 points, purchases+1                                 │
//! │        purchased items pruned from the buyer's cart                    │
//! │                                                                         │
//! │  update_status()   seller only, forward-only:                          │
//! │        placed < confirmed < packed < shipped < delivered               │
//! │                                                                         │
//! │  cancel()          buyer or seller, only before shipping:              │
//! │        items sold → approved; buyer-initiated cancels revoke           │
//! │        the earned points                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Duration, Utc};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbResult;
use restyle_core::{
    ids, validation, CoreError, Item, ItemStatus, Money, Order, OrderDetail, OrderLine,
    OrderStatus, PageInfo, PageRequest, Paged, PaymentDetails, PaymentStatus, ShippingAddress,
    TrackingInfo, ESTIMATED_DELIVERY_DAYS, NO_REASON_PROVIDED, POINTS_PER_ORDER,
};

// =============================================================================
// Input / Output Types
// =============================================================================

/// One requested line of a new order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderLine {
    pub item_id: String,
    #[serde(default)]
    pub size: String,
    /// Defaults to 1.
    pub quantity: Option<i64>,
}

/// Payload for placing an order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<NewOrderLine>,
    pub shipping_address: ShippingAddress,
    /// Free-form method label recorded on the mocked payment.
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// Which side of the order history to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderRole {
    Purchases,
    Sales,
}

impl Default for OrderRole {
    fn default() -> Self {
        OrderRole::Purchases
    }
}

/// Marketplace-wide order statistics.
#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: i64,
    pub total_revenue_cents: i64,
    pub pending_orders: i64,
    pub completed_orders: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Places an order.
    ///
    /// All validation happens before any write; the writes form one
    /// transaction. The item flips use a status guard, so a concurrent
    /// purchase of the same item aborts here instead of double-selling.
    pub async fn create(&self, buyer_id: &str, input: &NewOrder) -> DbResult<OrderDetail> {
        if input.items.is_empty() {
            return Err(CoreError::InvalidArgument("order has no items".to_string()).into());
        }

        let mut tx = self.pool.begin().await?;

        // Validate every line against current item state
        let mut lines: Vec<(Item, String, i64)> = Vec::with_capacity(input.items.len());
        for line in &input.items {
            let quantity = line.quantity.unwrap_or(1);
            validation::validate_quantity(quantity).map_err(CoreError::from)?;

            let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = ?1")
                .bind(&line.item_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| CoreError::not_found("Item", &line.item_id))?;

            if item.status != ItemStatus::Approved {
                return Err(CoreError::invalid_state(
                    "Item",
                    &item.id,
                    item.status.as_str(),
                    "purchase",
                )
                .into());
            }

            if item.owner_id == buyer_id {
                return Err(CoreError::forbidden("cannot purchase your own item").into());
            }

            lines.push((item, line.size.clone(), quantity));
        }

        // One seller per order; mixed-seller requests must be split by the
        // caller into separate orders
        let seller_id = lines[0].0.owner_id.clone();
        if lines.iter().any(|(item, _, _)| item.owner_id != seller_id) {
            return Err(CoreError::InvalidArgument(
                "items from multiple sellers must be ordered separately".to_string(),
            )
            .into());
        }

        let mut total = Money::zero();
        for (item, _, quantity) in &lines {
            let line_total = item
                .price()
                .checked_mul(*quantity)
                .and_then(|line| total.checked_add(line))
                .ok_or_else(|| {
                    CoreError::InvalidArgument("order total overflows".to_string())
                })?;
            total = line_total;
        }

        let id = Uuid::new_v4().to_string();
        let order_id = ids::generate_order_id();
        let now = Utc::now();
        let payment = PaymentDetails {
            method: input
                .payment_method
                .clone()
                .unwrap_or_else(|| "mock".to_string()),
            status: PaymentStatus::Completed,
            transaction_id: Some(format!("txn_{}", Uuid::new_v4().simple())),
            currency: "INR".to_string(),
        };
        let estimated_delivery = now + Duration::days(ESTIMATED_DELIVERY_DAYS);

        debug!(order = %order_id, buyer = %buyer_id, seller = %seller_id, total = total.cents(), "Placing order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_id, buyer_id, seller_id, total_cents,
                shipping_address, payment, status, tracking,
                points_earned, estimated_delivery, actual_delivery,
                cancellation_reason, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'placed', NULL, ?8, ?9, NULL, '', ?10, ?10)
            "#,
        )
        .bind(&id)
        .bind(&order_id)
        .bind(buyer_id)
        .bind(&seller_id)
        .bind(total.cents())
        .bind(Json(&input.shipping_address))
        .bind(Json(&payment))
        .bind(POINTS_PER_ORDER)
        .bind(estimated_delivery)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let mut item_ids: Vec<String> = Vec::with_capacity(lines.len());
        for (item, size, quantity) in &lines {
            sqlx::query(
                r#"
                INSERT INTO order_lines (
                    id, order_id, item_id, title, price_cents, size, quantity,
                    image_url, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&id)
            .bind(&item.id)
            .bind(&item.title)
            .bind(item.price_cents)
            .bind(size)
            .bind(quantity)
            .bind(item.main_image.as_ref().map(|img| img.url.clone()))
            .bind(now)
            .execute(&mut *tx)
            .await?;
            item_ids.push(item.id.clone());
        }

        // Flip every purchased item approved → sold. The status guard makes
        // this the commit point of the race: if any item was taken since we
        // read it, the count mismatches and the transaction rolls back.
        let mut flip: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("UPDATE items SET status = 'sold', updated_at = ");
        flip.push_bind(now).push(" WHERE status = 'approved' AND id IN (");
        let mut separated = flip.separated(", ");
        for item_id in &item_ids {
            separated.push_bind(item_id);
        }
        flip.push(")");
        let flipped = flip.build().execute(&mut *tx).await?;
        if flipped.rows_affected() != item_ids.len() as u64 {
            return Err(CoreError::invalid_state(
                "Item",
                item_ids.join(","),
                "sold",
                "purchase",
            )
            .into());
        }

        sqlx::query(
            r#"
            UPDATE users SET
                points_balance = points_balance + ?2,
                total_purchases = total_purchases + 1,
                total_points_earned = total_points_earned + ?2
            WHERE id = ?1
            "#,
        )
        .bind(buyer_id)
        .bind(POINTS_PER_ORDER)
        .execute(&mut *tx)
        .await?;

        // Purchased items leave the buyer's cart immediately
        let mut prune: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "DELETE FROM cart_entries WHERE cart_id IN (SELECT id FROM carts WHERE user_id = ",
        );
        prune.push_bind(buyer_id.to_string()).push(") AND item_id IN (");
        let mut separated = prune.separated(", ");
        for item_id in &item_ids {
            separated.push_bind(item_id);
        }
        prune.push(")");
        prune.build().execute(&mut *tx).await?;

        tx.commit().await?;

        info!(order = %order_id, buyer = %buyer_id, total = total.cents(), items = item_ids.len(), "Order placed");

        self.require_detail(&id).await
    }

    /// Gets an order with its lines; only the buyer or seller may read it.
    pub async fn get(&self, id: &str, actor_id: &str) -> DbResult<OrderDetail> {
        let detail = self.require_detail(id).await?;

        if detail.order.buyer_id != actor_id && detail.order.seller_id != actor_id {
            return Err(CoreError::forbidden("not a participant in this order").into());
        }

        Ok(detail)
    }

    /// Pages a user's purchase or sale history, newest first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        role: OrderRole,
        page: PageRequest,
    ) -> DbResult<Paged<OrderDetail>> {
        let page = page.clamped();
        let column = match role {
            OrderRole::Purchases => "buyer_id",
            OrderRole::Sales => "seller_id",
        };

        let total_count: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders WHERE {column} = ?1"))
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT * FROM orders WHERE {column} = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
        ))
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Paged {
            rows: self.hydrate_many(orders).await?,
            pagination: PageInfo::compute(total_count, page),
        })
    }

    /// Pages all orders, optionally by status (admin).
    pub async fn admin_list(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> DbResult<Paged<OrderDetail>> {
        let page = page.clamped();

        let mut count_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM orders WHERE 1=1");
        let mut list_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM orders WHERE 1=1");

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
        let orders: Vec<Order> = list_query.build_query_as().fetch_all(&self.pool).await?;

        Ok(Paged {
            rows: self.hydrate_many(orders).await?,
            pagination: PageInfo::compute(total_count, page),
        })
    }

    /// Advances fulfilment status (seller only, forward only).
    ///
    /// `shipped` records tracking (generating a number when the seller
    /// supplies none); `delivered` stamps the actual delivery time;
    /// `cancelled` delegates to [`OrderRepository::cancel`] so item
    /// reversion is never skipped.
    pub async fn update_status(
        &self,
        id: &str,
        actor_id: &str,
        new_status: OrderStatus,
        tracking_number: Option<&str>,
        carrier: Option<&str>,
    ) -> DbResult<OrderDetail> {
        let order = self.require_order(id).await?;

        if order.seller_id != actor_id {
            return Err(CoreError::forbidden("only the seller may update this order").into());
        }

        if new_status == OrderStatus::Cancelled {
            self.cancel(id, actor_id, None).await?;
            return self.require_detail(id).await;
        }

        if new_status == OrderStatus::Placed {
            return Err(CoreError::InvalidArgument(
                "status must be one of confirmed, packed, shipped, delivered, cancelled"
                    .to_string(),
            )
            .into());
        }

        if !order.status.can_advance_to(new_status) {
            return Err(CoreError::invalid_state(
                "Order",
                id,
                order.status.as_str(),
                "advance status",
            )
            .into());
        }

        let now = Utc::now();
        let tracking = if new_status == OrderStatus::Shipped {
            let number = tracking_number
                .map(str::to_string)
                .unwrap_or_else(ids::generate_tracking_number);
            Some(TrackingInfo {
                tracking_url: ids::tracking_url(&number),
                tracking_number: number,
                carrier: carrier.map(str::to_string),
            })
        } else {
            order.tracking.clone()
        };
        let actual_delivery = if new_status == OrderStatus::Delivered {
            Some(now)
        } else {
            order.actual_delivery
        };

        debug!(order = %order.order_id, from = %order.status, to = %new_status, "Advancing order status");

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?3,
                tracking = ?4,
                actual_delivery = ?5,
                updated_at = ?6
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(id)
        .bind(order.status)
        .bind(new_status)
        .bind(tracking.as_ref().map(Json))
        .bind(actual_delivery)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Status moved under us between read and write
            return Err(CoreError::invalid_state(
                "Order",
                id,
                order.status.as_str(),
                "advance status",
            )
            .into());
        }

        self.require_detail(id).await
    }

    /// Cancels an order (buyer or seller, only before shipping).
    ///
    /// One transaction: order → cancelled, every line item reverts
    /// sold → approved, and a buyer-initiated cancel revokes the earned
    /// points (the balance may go negative; that is logged, not floored).
    pub async fn cancel(&self, id: &str, actor_id: &str, reason: Option<&str>) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", id))?;

        let is_buyer = order.buyer_id == actor_id;
        if !is_buyer && order.seller_id != actor_id {
            return Err(CoreError::forbidden("not a participant in this order").into());
        }

        if !order.status.can_cancel() {
            return Err(CoreError::invalid_state(
                "Order",
                id,
                order.status.as_str(),
                "cancel",
            )
            .into());
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'cancelled',
                cancellation_reason = ?2,
                updated_at = ?3
            WHERE id = ?1 AND status IN ('placed', 'confirmed', 'packed')
            "#,
        )
        .bind(id)
        .bind(reason.unwrap_or(NO_REASON_PROVIDED))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::invalid_state(
                "Order",
                id,
                order.status.as_str(),
                "cancel",
            )
            .into());
        }

        // Every line item returns to the catalog
        sqlx::query(
            r#"
            UPDATE items SET status = 'approved', updated_at = ?2
            WHERE status = 'sold'
              AND id IN (SELECT item_id FROM order_lines WHERE order_id = ?1)
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if is_buyer {
            sqlx::query(
                "UPDATE users SET points_balance = points_balance - ?2 WHERE id = ?1",
            )
            .bind(&order.buyer_id)
            .bind(order.points_earned)
            .execute(&mut *tx)
            .await?;

            let balance: i64 =
                sqlx::query_scalar("SELECT points_balance FROM users WHERE id = ?1")
                    .bind(&order.buyer_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if balance < 0 {
                warn!(user = %order.buyer_id, balance, order = %order.order_id, "Points balance went negative on cancellation revocation");
            }
        }

        tx.commit().await?;

        info!(order = %order.order_id, actor = %actor_id, "Order cancelled");

        Ok(())
    }

    /// Marketplace-wide order statistics.
    pub async fn stats_overview(&self) -> DbResult<OrderStats> {
        let total_orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        let total_revenue_cents: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(total_cents) FROM orders WHERE json_extract(payment, '$.status') = 'completed'",
        )
        .fetch_one(&self.pool)
        .await?;

        let pending_orders: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = 'placed'")
                .fetch_one(&self.pool)
                .await?;

        let completed_orders: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = 'delivered'")
                .fetch_one(&self.pool)
                .await?;

        Ok(OrderStats {
            total_orders,
            total_revenue_cents: total_revenue_cents.unwrap_or(0),
            pending_orders,
            completed_orders,
        })
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    async fn require_order(&self, id: &str) -> DbResult<Order> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", id).into())
    }

    async fn require_detail(&self, id: &str) -> DbResult<OrderDetail> {
        let order = self.require_order(id).await?;
        let items = sqlx::query_as::<_, OrderLine>(
            "SELECT * FROM order_lines WHERE order_id = ?1 ORDER BY created_at, id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(OrderDetail { order, items })
    }

    async fn hydrate_many(&self, orders: Vec<Order>) -> DbResult<Vec<OrderDetail>> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM order_lines WHERE order_id IN (");
        let mut separated = query.separated(", ");
        for order in &orders {
            separated.push_bind(order.id.clone());
        }
        query.push(") ORDER BY created_at, id");

        let lines: Vec<OrderLine> = query.build_query_as().fetch_all(&self.pool).await?;

        let mut by_order: HashMap<String, Vec<OrderLine>> = HashMap::new();
        for line in lines {
            by_order.entry(line.order_id.clone()).or_default().push(line);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderDetail { order, items }
            })
            .collect())
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

    fn order_for(item_id: &str) -> NewOrder {
        NewOrder {
            items: vec![NewOrderLine {
                item_id: item_id.to_string(),
                size: "M".to_string(),
                quantity: None,
            }],
            shipping_address: ShippingAddress::default(),
            payment_method: Some("card".to_string()),
        }
    }

    #[tokio::test]
    async fn test_place_order_end_to_end() {
        let db = test_db().await;
        let seller = create_user(&db, "ava").await;
        let buyer = create_user(&db, "bob").await;
        let item = create_approved_item(&db, &seller.id, "Denim jacket", 30000).await;

        // The item sits in the buyer's cart before checkout
        db.carts().add(&buyer.id, &item.id, "M", 1).await.unwrap();

        let detail = db.orders().create(&buyer.id, &order_for(&item.id)).await.unwrap();

        assert!(detail.order.order_id.starts_with("ORD"));
        assert_eq!(detail.order.total_cents, 30000);
        assert_eq!(detail.order.points_earned, POINTS_PER_ORDER);
        assert_eq!(detail.order.status, OrderStatus::Placed);
        assert_eq!(detail.order.seller_id, seller.id);
        assert_eq!(detail.order.payment.status, PaymentStatus::Completed);
        assert!(detail.order.estimated_delivery.is_some());
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].title, "Denim jacket");
        assert_eq!(detail.items[0].price_cents, 30000);

        // Item sold, buyer credited, cart pruned
        let item = db.items().require(&item.id).await.unwrap();
        assert_eq!(item.status, ItemStatus::Sold);

        let buyer = reload_user(&db, &buyer.id).await;
        assert_eq!(buyer.points_balance, POINTS_PER_ORDER);
        assert_eq!(buyer.statistics.total_purchases, 1);
        assert_eq!(buyer.statistics.total_points_earned, POINTS_PER_ORDER);

        let cart = db.carts().get(&buyer.id).await.unwrap();
        assert!(cart.entries.is_empty());
    }

    #[tokio::test]
    async fn test_create_validations_leave_no_side_effects() {
        let db = test_db().await;
        let seller = create_user(&db, "cara").await;
        let buyer = create_user(&db, "dan").await;
        let item = create_approved_item(&db, &seller.id, "Parka", 60000).await;

        // Self-purchase
        let err = db
            .orders()
            .create(&seller.id, &order_for(&item.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));

        // Unknown item
        let err = db
            .orders()
            .create(&buyer.id, &order_for("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::NotFound { .. })));

        // Pending item
        let pending = db
            .items()
            .create(&seller.id, &new_item("Still pending", 1000))
            .await
            .unwrap();
        let err = db
            .orders()
            .create(&buyer.id, &order_for(&pending.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));

        // Mixed sellers
        let other_seller = create_user(&db, "elif").await;
        let second = create_approved_item(&db, &other_seller.id, "Beanie", 4000).await;
        let err = db
            .orders()
            .create(
                &buyer.id,
                &NewOrder {
                    items: vec![
                        NewOrderLine {
                            item_id: item.id.clone(),
                            size: "M".to_string(),
                            quantity: None,
                        },
                        NewOrderLine {
                            item_id: second.id.clone(),
                            size: "M".to_string(),
                            quantity: None,
                        },
                    ],
                    shipping_address: ShippingAddress::default(),
                    payment_method: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidArgument(_))
        ));

        // No side effects from any failed attempt
        let buyer = reload_user(&db, &buyer.id).await;
        assert_eq!(buyer.points_balance, 0);
        assert_eq!(buyer.statistics.total_purchases, 0);
        let item = db.items().require(&item.id).await.unwrap();
        assert_eq!(item.status, ItemStatus::Approved);
    }

    #[tokio::test]
    async fn test_double_sale_is_impossible() {
        let db = test_db().await;
        let seller = create_user(&db, "fay").await;
        let first = create_user(&db, "gil").await;
        let second = create_user(&db, "hal").await;
        let item = create_approved_item(&db, &seller.id, "One of a kind", 9900).await;

        db.orders().create(&first.id, &order_for(&item.id)).await.unwrap();

        let err = db
            .orders()
            .create(&second.id, &order_for(&item.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));

        let second = reload_user(&db, &second.id).await;
        assert_eq!(second.points_balance, 0);
    }

    #[tokio::test]
    async fn test_buyer_cancel_reverts_items_and_points() {
        let db = test_db().await;
        let seller = create_user(&db, "ida").await;
        let buyer = create_user(&db, "jon").await;
        let item = create_approved_item(&db, &seller.id, "Denim jacket", 30000).await;

        let detail = db.orders().create(&buyer.id, &order_for(&item.id)).await.unwrap();
        db.orders()
            .cancel(&detail.order.id, &buyer.id, Some("changed my mind"))
            .await
            .unwrap();

        let order = db.orders().get(&detail.order.id, &buyer.id).await.unwrap().order;
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.cancellation_reason, "changed my mind");

        let item = db.items().require(&item.id).await.unwrap();
        assert_eq!(item.status, ItemStatus::Approved);

        // Points return to their pre-purchase value
        let buyer = reload_user(&db, &buyer.id).await;
        assert_eq!(buyer.points_balance, 0);
    }

    #[tokio::test]
    async fn test_seller_cancel_keeps_buyer_points() {
        let db = test_db().await;
        let seller = create_user(&db, "kim").await;
        let buyer = create_user(&db, "lou").await;
        let item = create_approved_item(&db, &seller.id, "Raincoat", 45000).await;

        let detail = db.orders().create(&buyer.id, &order_for(&item.id)).await.unwrap();
        db.orders().cancel(&detail.order.id, &seller.id, None).await.unwrap();

        let order = db.orders().get(&detail.order.id, &seller.id).await.unwrap().order;
        assert_eq!(order.cancellation_reason, NO_REASON_PROVIDED);

        let buyer = reload_user(&db, &buyer.id).await;
        assert_eq!(buyer.points_balance, POINTS_PER_ORDER);
    }

    #[tokio::test]
    async fn test_status_progression_and_guards() {
        let db = test_db().await;
        let seller = create_user(&db, "mia").await;
        let buyer = create_user(&db, "ned").await;
        let item = create_approved_item(&db, &seller.id, "Blazer", 52000).await;
        let detail = db.orders().create(&buyer.id, &order_for(&item.id)).await.unwrap();
        let order_id = detail.order.id;

        // Buyer may not drive fulfilment
        let err = db
            .orders()
            .update_status(&order_id, &buyer.id, OrderStatus::Confirmed, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));

        let confirmed = db
            .orders()
            .update_status(&order_id, &seller.id, OrderStatus::Confirmed, None, None)
            .await
            .unwrap();
        assert_eq!(confirmed.order.status, OrderStatus::Confirmed);

        // Shipping derives a tracking number when none is supplied
        let shipped = db
            .orders()
            .update_status(&order_id, &seller.id, OrderStatus::Shipped, None, Some("BlueDart"))
            .await
            .unwrap();
        let tracking = shipped.order.tracking.expect("tracking recorded");
        assert!(tracking.tracking_number.starts_with("RW"));
        assert_eq!(tracking.carrier.as_deref(), Some("BlueDart"));

        // Backward transitions are rejected
        let err = db
            .orders()
            .update_status(&order_id, &seller.id, OrderStatus::Packed, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));

        // Shipped orders can no longer be cancelled
        let err = db.orders().cancel(&order_id, &buyer.id, None).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));

        let delivered = db
            .orders()
            .update_status(&order_id, &seller.id, OrderStatus::Delivered, None, None)
            .await
            .unwrap();
        assert_eq!(delivered.order.status, OrderStatus::Delivered);
        assert!(delivered.order.actual_delivery.is_some());
    }

    #[tokio::test]
    async fn test_history_and_stats() {
        let db = test_db().await;
        let seller = create_user(&db, "oto").await;
        let buyer = create_user(&db, "pia").await;
        let item = create_approved_item(&db, &seller.id, "Scarf", 8000).await;
        db.orders().create(&buyer.id, &order_for(&item.id)).await.unwrap();

        let purchases = db
            .orders()
            .list_for_user(&buyer.id, OrderRole::Purchases, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(purchases.rows.len(), 1);
        assert_eq!(purchases.pagination.total_count, 1);
        assert_eq!(purchases.rows[0].items.len(), 1);

        let sales = db
            .orders()
            .list_for_user(&seller.id, OrderRole::Sales, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(sales.rows.len(), 1);

        let stats = db.orders().stats_overview().await.unwrap();
        assert_eq!(stats.total_orders, 1);
        assert_eq!(stats.total_revenue_cents, 8000);
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.completed_orders, 0);
    }
}
