//! # Exchange Repository
//!
//! The exchange lifecycle engine: a bilateral proposal where a requester
//! offers their items for an owner's item, optionally with cash on top.
//!
//! ## Exchange State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create()            respond(accepted)          both legs shipped     │
//! │      │                      │                          │                │
//! │      ▼                      ▼                          ▼                │
//! │   pending ────────────► accepted ───────────────► completed            │
//! │      │    \                 │                                           │
//! │      │     \ respond        │ cancel()  items revert,                   │
//! │      │      ▼ (rejected)    ▼           bonus revoked both sides        │
//! │      │    rejected      cancelled                                       │
//! │      │                      ▲                                           │
//! │      └──────────────────────┘ cancel()                                  │
//! │                                                                         │
//! │   accept flips requested + offered items to `exchanged` and credits    │
//! │   BOTH parties the completion bonus, in one transaction.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use restyle_core::{
    ids, validation, CoreError, Exchange, ExchangeDetail, ExchangeOffer, ExchangeSide,
    ExchangeStatus, ExchangeType, Item, ItemStatus, Money, PageInfo, PageRequest, Paged,
    RatingEntry, ShipmentStatus, ShippingLeg, WhoPays, EXCHANGE_BONUS_POINTS,
};

// =============================================================================
// Input Types
// =============================================================================

/// One item offered by the requester.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferedItemInput {
    pub item_id: String,
    /// Defaults to the item's asking price.
    pub estimated_value_cents: Option<i64>,
}

/// Payload for a new exchange proposal.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExchange {
    pub requested_item_id: String,
    pub offered_items: Vec<OfferedItemInput>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub exchange_type: ExchangeType,
    #[serde(default)]
    pub cash_difference_cents: i64,
}

/// The owner's verdict on a pending exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeDecision {
    Accepted,
    Rejected,
}

/// Which slice of a user's exchange history to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeRole {
    Sent,
    Received,
    All,
}

impl Default for ExchangeRole {
    fn default() -> Self {
        ExchangeRole::All
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for exchange database operations.
#[derive(Debug, Clone)]
pub struct ExchangeRepository {
    pool: SqlitePool,
}

impl ExchangeRepository {
    /// Creates a new ExchangeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExchangeRepository { pool }
    }

    /// Creates an exchange proposal (status `pending`).
    ///
    /// The requested item must be approved, accept exchanges, and belong
    /// to someone else; every offered item must be the requester's own
    /// approved listing.
    pub async fn create(&self, requester_id: &str, input: &NewExchange) -> DbResult<ExchangeDetail> {
        if input.offered_items.is_empty() {
            return Err(
                CoreError::InvalidArgument("at least one item must be offered".to_string()).into(),
            );
        }

        let mut tx = self.pool.begin().await?;

        let requested = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = ?1")
            .bind(&input.requested_item_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::not_found("Item", &input.requested_item_id))?;

        if requested.status != ItemStatus::Approved {
            return Err(CoreError::invalid_state(
                "Item",
                &requested.id,
                requested.status.as_str(),
                "request exchange",
            )
            .into());
        }

        if !requested.exchange_preferences.accepts_exchange {
            return Err(CoreError::invalid_state(
                "Item",
                &requested.id,
                "exchange-disabled",
                "request exchange",
            )
            .into());
        }

        if requested.owner_id == requester_id {
            return Err(CoreError::forbidden("cannot request exchange for your own item").into());
        }

        let mut offers: Vec<(String, i64)> = Vec::with_capacity(input.offered_items.len());
        let mut offered_values: Vec<Money> = Vec::with_capacity(input.offered_items.len());
        for offered in &input.offered_items {
            let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = ?1")
                .bind(&offered.item_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| CoreError::not_found("Item", &offered.item_id))?;

            if item.owner_id != requester_id {
                return Err(CoreError::forbidden("you can only offer your own items").into());
            }

            if item.status != ItemStatus::Approved {
                return Err(CoreError::invalid_state(
                    "Item",
                    &item.id,
                    item.status.as_str(),
                    "offer in exchange",
                )
                .into());
            }

            let value = offered.estimated_value_cents.unwrap_or(item.price_cents);
            validation::validate_price("estimatedValue", value).map_err(CoreError::from)?;
            offers.push((item.id, value));
            offered_values.push(Money::from_cents(value));
        }

        let total_offered = Money::checked_sum(offered_values)
            .ok_or_else(|| CoreError::InvalidArgument("offered value overflows".to_string()))?;
        let who_pays = WhoPays::derive(
            Money::from_cents(input.cash_difference_cents),
            total_offered,
            requested.price(),
        );

        let id = Uuid::new_v4().to_string();
        let exchange_id = ids::generate_exchange_id();
        let now = Utc::now();

        debug!(exchange = %exchange_id, requester = %requester_id, owner = %requested.owner_id, "Creating exchange");

        sqlx::query(
            r#"
            INSERT INTO exchanges (
                id, exchange_id, requester_id, owner_id, requested_item_id,
                message, status, response_message, exchange_type,
                cash_difference_cents, who_pays,
                requester_shipping, owner_shipping, completion_date,
                requester_rating, owner_rating, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', '', ?7, ?8, ?9,
                      NULL, NULL, NULL, NULL, NULL, ?10, ?10)
            "#,
        )
        .bind(&id)
        .bind(&exchange_id)
        .bind(requester_id)
        .bind(&requested.owner_id)
        .bind(&requested.id)
        .bind(&input.message)
        .bind(input.exchange_type)
        .bind(input.cash_difference_cents)
        .bind(who_pays)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for (item_id, value) in &offers {
            sqlx::query(
                r#"
                INSERT INTO exchange_offers (id, exchange_id, item_id, estimated_value_cents)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&id)
            .bind(item_id)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE items SET exchange_requests = exchange_requests + 1 WHERE id = ?1")
            .bind(&requested.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.require_detail(&id).await
    }

    /// Gets an exchange with its offers; participants only.
    pub async fn get(&self, id: &str, actor_id: &str) -> DbResult<ExchangeDetail> {
        let detail = self.require_detail(id).await?;

        if detail.exchange.side_of(actor_id).is_none() {
            return Err(CoreError::forbidden("not a participant in this exchange").into());
        }

        Ok(detail)
    }

    /// Pages a user's exchange history.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        role: ExchangeRole,
        status: Option<ExchangeStatus>,
        page: PageRequest,
    ) -> DbResult<Paged<ExchangeDetail>> {
        let page = page.clamped();

        let mut count_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM exchanges WHERE ");
        let mut list_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM exchanges WHERE ");

        for query in [&mut count_query, &mut list_query] {
            match role {
                ExchangeRole::Sent => {
                    query.push("requester_id = ").push_bind(user_id.to_string());
                }
                ExchangeRole::Received => {
                    query.push("owner_id = ").push_bind(user_id.to_string());
                }
                ExchangeRole::All => {
                    query
                        .push("(requester_id = ")
                        .push_bind(user_id.to_string())
                        .push(" OR owner_id = ")
                        .push_bind(user_id.to_string())
                        .push(")");
                }
            }
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
        let exchanges: Vec<Exchange> = list_query.build_query_as().fetch_all(&self.pool).await?;

        Ok(Paged {
            rows: self.hydrate_many(exchanges).await?,
            pagination: PageInfo::compute(total_count, page),
        })
    }

    /// Pages all exchanges, optionally by status (admin).
    pub async fn admin_list(
        &self,
        status: Option<ExchangeStatus>,
        page: PageRequest,
    ) -> DbResult<Paged<ExchangeDetail>> {
        let page = page.clamped();

        let mut count_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM exchanges WHERE 1=1");
        let mut list_query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM exchanges WHERE 1=1");

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
        let exchanges: Vec<Exchange> = list_query.build_query_as().fetch_all(&self.pool).await?;

        Ok(Paged {
            rows: self.hydrate_many(exchanges).await?,
            pagination: PageInfo::compute(total_count, page),
        })
    }

    /// Owner's response to a pending exchange.
    ///
    /// Accept runs as one transaction: completion date stamped, requested
    /// and offered items flip approved → exchanged (guarded - if any
    /// involved item was sold in the meantime the accept aborts), and both
    /// parties are credited the completion bonus. Reject is terminal with
    /// no further side effects.
    pub async fn respond(
        &self,
        id: &str,
        actor_id: &str,
        decision: ExchangeDecision,
        response_message: &str,
    ) -> DbResult<ExchangeDetail> {
        let mut tx = self.pool.begin().await?;

        let exchange = sqlx::query_as::<_, Exchange>("SELECT * FROM exchanges WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::not_found("Exchange", id))?;

        if exchange.owner_id != actor_id {
            return Err(CoreError::forbidden("only the owner may respond to this exchange").into());
        }

        if exchange.status != ExchangeStatus::Pending {
            return Err(CoreError::invalid_state(
                "Exchange",
                id,
                exchange.status.as_str(),
                "respond",
            )
            .into());
        }

        let now = Utc::now();
        match decision {
            ExchangeDecision::Rejected => {
                let result = sqlx::query(
                    r#"
                    UPDATE exchanges SET
                        status = 'rejected', response_message = ?2, updated_at = ?3
                    WHERE id = ?1 AND status = 'pending'
                    "#,
                )
                .bind(id)
                .bind(response_message)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(CoreError::invalid_state(
                        "Exchange",
                        id,
                        exchange.status.as_str(),
                        "respond",
                    )
                    .into());
                }
            }
            ExchangeDecision::Accepted => {
                let result = sqlx::query(
                    r#"
                    UPDATE exchanges SET
                        status = 'accepted', response_message = ?2,
                        completion_date = ?3, updated_at = ?3
                    WHERE id = ?1 AND status = 'pending'
                    "#,
                )
                .bind(id)
                .bind(response_message)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(CoreError::invalid_state(
                        "Exchange",
                        id,
                        exchange.status.as_str(),
                        "respond",
                    )
                    .into());
                }

                let item_ids = self.involved_item_ids(&mut tx, id, &exchange).await?;

                let mut flip: QueryBuilder<'_, Sqlite> =
                    QueryBuilder::new("UPDATE items SET status = 'exchanged', updated_at = ");
                flip.push_bind(now)
                    .push(" WHERE status = 'approved' AND id IN (");
                let mut separated = flip.separated(", ");
                for item_id in &item_ids {
                    separated.push_bind(item_id.clone());
                }
                flip.push(")");
                let flipped = flip.build().execute(&mut *tx).await?;
                if flipped.rows_affected() != item_ids.len() as u64 {
                    // An involved item was sold/removed since the proposal
                    return Err(CoreError::invalid_state(
                        "Exchange",
                        id,
                        "item no longer available",
                        "accept",
                    )
                    .into());
                }

                sqlx::query(
                    r#"
                    UPDATE users SET
                        points_balance = points_balance + ?3,
                        total_exchanges = total_exchanges + 1,
                        total_points_earned = total_points_earned + ?3
                    WHERE id IN (?1, ?2)
                    "#,
                )
                .bind(&exchange.requester_id)
                .bind(&exchange.owner_id)
                .bind(EXCHANGE_BONUS_POINTS)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        info!(exchange = %exchange.exchange_id, decision = ?decision, "Exchange responded");

        self.require_detail(id).await
    }

    /// Requester cancels a pending or accepted exchange.
    ///
    /// Cancelling an accepted exchange undoes the accept: involved items
    /// revert to `approved` and the completion bonus is revoked from BOTH
    /// parties (balances may go negative; logged, not floored).
    pub async fn cancel(&self, id: &str, actor_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let exchange = sqlx::query_as::<_, Exchange>("SELECT * FROM exchanges WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::not_found("Exchange", id))?;

        if exchange.requester_id != actor_id {
            return Err(CoreError::forbidden("only the requester may cancel this exchange").into());
        }

        if !matches!(
            exchange.status,
            ExchangeStatus::Pending | ExchangeStatus::Accepted
        ) {
            return Err(CoreError::invalid_state(
                "Exchange",
                id,
                exchange.status.as_str(),
                "cancel",
            )
            .into());
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE exchanges SET status = 'cancelled', updated_at = ?2
            WHERE id = ?1 AND status IN ('pending', 'accepted')
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::invalid_state(
                "Exchange",
                id,
                exchange.status.as_str(),
                "cancel",
            )
            .into());
        }

        if exchange.status == ExchangeStatus::Accepted {
            let item_ids = self.involved_item_ids(&mut tx, id, &exchange).await?;

            let mut revert: QueryBuilder<'_, Sqlite> =
                QueryBuilder::new("UPDATE items SET status = 'approved', updated_at = ");
            revert
                .push_bind(now)
                .push(" WHERE status = 'exchanged' AND id IN (");
            let mut separated = revert.separated(", ");
            for item_id in &item_ids {
                separated.push_bind(item_id.clone());
            }
            revert.push(")");
            revert.build().execute(&mut *tx).await?;

            // Revoke the bonus credited at accept time, on both sides
            sqlx::query(
                r#"
                UPDATE users SET points_balance = points_balance - ?3
                WHERE id IN (?1, ?2)
                "#,
            )
            .bind(&exchange.requester_id)
            .bind(&exchange.owner_id)
            .bind(EXCHANGE_BONUS_POINTS)
            .execute(&mut *tx)
            .await?;

            for user_id in [&exchange.requester_id, &exchange.owner_id] {
                let balance: i64 =
                    sqlx::query_scalar("SELECT points_balance FROM users WHERE id = ?1")
                        .bind(user_id)
                        .fetch_one(&mut *tx)
                        .await?;
                if balance < 0 {
                    warn!(user = %user_id, balance, exchange = %exchange.exchange_id, "Points balance went negative on exchange cancellation");
                }
            }
        }

        tx.commit().await?;

        info!(exchange = %exchange.exchange_id, "Exchange cancelled");

        Ok(())
    }

    /// Records one side's shipment leg on an accepted exchange.
    ///
    /// When both legs report `shipped`, the exchange auto-advances to
    /// `completed` in the same transaction.
    pub async fn update_shipping(
        &self,
        id: &str,
        actor_id: &str,
        side: ExchangeSide,
        tracking_number: Option<&str>,
        carrier: Option<&str>,
        status: ShipmentStatus,
    ) -> DbResult<ExchangeDetail> {
        let mut tx = self.pool.begin().await?;

        let exchange = sqlx::query_as::<_, Exchange>("SELECT * FROM exchanges WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::not_found("Exchange", id))?;

        if exchange.status != ExchangeStatus::Accepted {
            return Err(CoreError::invalid_state(
                "Exchange",
                id,
                exchange.status.as_str(),
                "update shipping",
            )
            .into());
        }

        if exchange.side_of(actor_id) != Some(side) {
            return Err(
                CoreError::forbidden("you may only update your own side's shipping").into(),
            );
        }

        let leg = ShippingLeg {
            tracking_number: tracking_number.map(str::to_string),
            carrier: carrier.map(str::to_string),
            status,
        };
        let column = match side {
            ExchangeSide::Requester => "requester_shipping",
            ExchangeSide::Owner => "owner_shipping",
        };
        let now = Utc::now();

        let result = sqlx::query(&format!(
            "UPDATE exchanges SET {column} = ?2, updated_at = ?3 WHERE id = ?1 AND status = 'accepted'"
        ))
        .bind(id)
        .bind(Json(&leg))
        .bind(now)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::invalid_state(
                "Exchange",
                id,
                exchange.status.as_str(),
                "update shipping",
            )
            .into());
        }

        let refreshed = sqlx::query_as::<_, Exchange>("SELECT * FROM exchanges WHERE id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if refreshed.both_shipped() {
            sqlx::query(
                "UPDATE exchanges SET status = 'completed', updated_at = ?2 WHERE id = ?1 AND status = 'accepted'",
            )
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            info!(exchange = %exchange.exchange_id, "Both sides shipped, exchange completed");
        }

        tx.commit().await?;

        self.require_detail(id).await
    }

    /// Records a post-completion rating from one side.
    ///
    /// One rating per side; a second attempt is rejected.
    pub async fn rate(
        &self,
        id: &str,
        actor_id: &str,
        rating: i64,
        review: &str,
    ) -> DbResult<ExchangeDetail> {
        validation::validate_rating(rating).map_err(CoreError::from)?;

        let exchange = sqlx::query_as::<_, Exchange>("SELECT * FROM exchanges WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::not_found("Exchange", id))?;

        if exchange.status != ExchangeStatus::Completed {
            return Err(CoreError::invalid_state(
                "Exchange",
                id,
                exchange.status.as_str(),
                "rate",
            )
            .into());
        }

        let side = exchange
            .side_of(actor_id)
            .ok_or_else(|| CoreError::forbidden("not a participant in this exchange"))?;

        let already_rated = match side {
            ExchangeSide::Requester => exchange.requester_rating.is_some(),
            ExchangeSide::Owner => exchange.owner_rating.is_some(),
        };
        if already_rated {
            return Err(CoreError::invalid_state(
                "Exchange",
                id,
                "already rated",
                "rate",
            )
            .into());
        }

        let entry = RatingEntry {
            rating,
            review: review.to_string(),
        };
        let column = match side {
            ExchangeSide::Requester => "requester_rating",
            ExchangeSide::Owner => "owner_rating",
        };
        let now = Utc::now();

        sqlx::query(&format!(
            "UPDATE exchanges SET {column} = ?2, updated_at = ?3 WHERE id = ?1"
        ))
        .bind(id)
        .bind(Json(&entry))
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.require_detail(id).await
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// The requested item plus every offered item.
    async fn involved_item_ids(
        &self,
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        id: &str,
        exchange: &Exchange,
    ) -> DbResult<Vec<String>> {
        let mut item_ids: Vec<String> =
            sqlx::query_scalar("SELECT item_id FROM exchange_offers WHERE exchange_id = ?1")
                .bind(id)
                .fetch_all(&mut **tx)
                .await?;
        item_ids.push(exchange.requested_item_id.clone());
        Ok(item_ids)
    }

    async fn require_detail(&self, id: &str) -> DbResult<ExchangeDetail> {
        let exchange = sqlx::query_as::<_, Exchange>("SELECT * FROM exchanges WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::from(CoreError::not_found("Exchange", id)))?;

        let offered_items = sqlx::query_as::<_, ExchangeOffer>(
            "SELECT * FROM exchange_offers WHERE exchange_id = ?1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ExchangeDetail {
            exchange,
            offered_items,
        })
    }

    async fn hydrate_many(&self, exchanges: Vec<Exchange>) -> DbResult<Vec<ExchangeDetail>> {
        if exchanges.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM exchange_offers WHERE exchange_id IN (");
        let mut separated = query.separated(", ");
        for exchange in &exchanges {
            separated.push_bind(exchange.id.clone());
        }
        query.push(") ORDER BY id");

        let offers: Vec<ExchangeOffer> = query.build_query_as().fetch_all(&self.pool).await?;

        let mut by_exchange: HashMap<String, Vec<ExchangeOffer>> = HashMap::new();
        for offer in offers {
            by_exchange
                .entry(offer.exchange_id.clone())
                .or_default()
                .push(offer);
        }

        Ok(exchanges
            .into_iter()
            .map(|exchange| {
                let offered_items = by_exchange.remove(&exchange.id).unwrap_or_default();
                ExchangeDetail {
                    exchange,
                    offered_items,
                }
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
    use crate::repository::item::ItemUpdate;
    use crate::repository::order::{NewOrder, NewOrderLine};
    use crate::repository::test_support::{
        create_approved_item, create_user, reload_user, test_db,
    };
    use restyle_core::ShippingAddress;

    fn proposal(requested: &str, offered: &str) -> NewExchange {
        NewExchange {
            requested_item_id: requested.to_string(),
            offered_items: vec![OfferedItemInput {
                item_id: offered.to_string(),
                estimated_value_cents: None,
            }],
            message: "interested in a swap".to_string(),
            exchange_type: ExchangeType::ItemForItem,
            cash_difference_cents: 0,
        }
    }

    #[tokio::test]
    async fn test_create_validations() {
        let db = test_db().await;
        let requester = create_user(&db, "ana").await;
        let owner = create_user(&db, "bo").await;
        let mine = create_approved_item(&db, &requester.id, "My jacket", 20000).await;
        let theirs = create_approved_item(&db, &owner.id, "Their coat", 30000).await;

        // Self-request
        let err = db
            .exchanges()
            .create(&requester.id, &proposal(&mine.id, &mine.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));

        // Offering someone else's item
        let err = db
            .exchanges()
            .create(&requester.id, &proposal(&theirs.id, &theirs.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));

        // Exchange-disabled target
        db.items()
            .update(
                &theirs.id,
                &owner.id,
                &ItemUpdate {
                    exchange_preferences: Some(restyle_core::ExchangePreferences {
                        accepts_exchange: false,
                        min_exchange_value_cents: 0,
                    }),
                    ..ItemUpdate::default()
                },
            )
            .await
            .unwrap();
        let err = db
            .exchanges()
            .create(&requester.id, &proposal(&theirs.id, &mine.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_derives_who_pays_and_counts_request() {
        let db = test_db().await;
        let requester = create_user(&db, "cia").await;
        let owner = create_user(&db, "dev").await;
        let mine = create_approved_item(&db, &requester.id, "Shirt", 20000).await;
        let theirs = create_approved_item(&db, &owner.id, "Coat", 30000).await;

        let detail = db
            .exchanges()
            .create(
                &requester.id,
                &NewExchange {
                    cash_difference_cents: 10000,
                    exchange_type: ExchangeType::ItemWithCash,
                    ..proposal(&theirs.id, &mine.id)
                },
            )
            .await
            .unwrap();

        assert!(detail.exchange.exchange_id.starts_with("EXC"));
        assert_eq!(detail.exchange.status, ExchangeStatus::Pending);
        // Offered 200 < requested 300, so the requester pays the difference
        assert_eq!(detail.exchange.who_pays, WhoPays::Requester);
        assert_eq!(detail.offered_items.len(), 1);
        assert_eq!(detail.offered_items[0].estimated_value_cents, 20000);

        let theirs = db.items().require(&theirs.id).await.unwrap();
        assert_eq!(theirs.statistics.exchange_requests, 1);
    }

    #[tokio::test]
    async fn test_accept_flips_items_and_credits_both() {
        let db = test_db().await;
        let requester = create_user(&db, "eva").await;
        let owner = create_user(&db, "finn").await;
        let mine = create_approved_item(&db, &requester.id, "Item Y", 20000).await;
        let theirs = create_approved_item(&db, &owner.id, "Item Z", 25000).await;

        let detail = db
            .exchanges()
            .create(&requester.id, &proposal(&theirs.id, &mine.id))
            .await
            .unwrap();

        // Only the owner may respond, and only while pending
        let err = db
            .exchanges()
            .respond(&detail.exchange.id, &requester.id, ExchangeDecision::Accepted, "")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));

        let accepted = db
            .exchanges()
            .respond(&detail.exchange.id, &owner.id, ExchangeDecision::Accepted, "deal")
            .await
            .unwrap();
        assert_eq!(accepted.exchange.status, ExchangeStatus::Accepted);
        assert!(accepted.exchange.completion_date.is_some());

        for item_id in [&mine.id, &theirs.id] {
            let item = db.items().require(item_id).await.unwrap();
            assert_eq!(item.status, ItemStatus::Exchanged);
        }

        for user_id in [&requester.id, &owner.id] {
            let user = reload_user(&db, user_id).await;
            assert_eq!(user.points_balance, EXCHANGE_BONUS_POINTS);
            assert_eq!(user.statistics.total_exchanges, 1);
        }

        // Terminal check: responding twice is illegal
        let err = db
            .exchanges()
            .respond(&detail.exchange.id, &owner.id, ExchangeDecision::Rejected, "")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_reject_is_terminal_without_side_effects() {
        let db = test_db().await;
        let requester = create_user(&db, "gia").await;
        let owner = create_user(&db, "hank").await;
        let mine = create_approved_item(&db, &requester.id, "Mine", 10000).await;
        let theirs = create_approved_item(&db, &owner.id, "Theirs", 15000).await;

        let detail = db
            .exchanges()
            .create(&requester.id, &proposal(&theirs.id, &mine.id))
            .await
            .unwrap();
        let rejected = db
            .exchanges()
            .respond(&detail.exchange.id, &owner.id, ExchangeDecision::Rejected, "not my size")
            .await
            .unwrap();

        assert_eq!(rejected.exchange.status, ExchangeStatus::Rejected);
        assert_eq!(rejected.exchange.response_message, "not my size");

        let mine = db.items().require(&mine.id).await.unwrap();
        assert_eq!(mine.status, ItemStatus::Approved);
        let requester = reload_user(&db, &requester.id).await;
        assert_eq!(requester.points_balance, 0);
    }

    #[tokio::test]
    async fn test_accept_aborts_if_item_was_sold_meanwhile() {
        let db = test_db().await;
        let requester = create_user(&db, "iva").await;
        let owner = create_user(&db, "jay").await;
        let buyer = create_user(&db, "kit").await;
        let mine = create_approved_item(&db, &requester.id, "Mine", 10000).await;
        let theirs = create_approved_item(&db, &owner.id, "Theirs", 15000).await;

        let detail = db
            .exchanges()
            .create(&requester.id, &proposal(&theirs.id, &mine.id))
            .await
            .unwrap();

        // The offered item is purchased while the proposal sits pending
        db.orders()
            .create(
                &buyer.id,
                &NewOrder {
                    items: vec![NewOrderLine {
                        item_id: mine.id.clone(),
                        size: "M".to_string(),
                        quantity: None,
                    }],
                    shipping_address: ShippingAddress::default(),
                    payment_method: None,
                },
            )
            .await
            .unwrap();

        let err = db
            .exchanges()
            .respond(&detail.exchange.id, &owner.id, ExchangeDecision::Accepted, "")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));

        // The failed accept left everything untouched
        let exchange = db
            .exchanges()
            .get(&detail.exchange.id, &owner.id)
            .await
            .unwrap()
            .exchange;
        assert_eq!(exchange.status, ExchangeStatus::Pending);
        let theirs = db.items().require(&theirs.id).await.unwrap();
        assert_eq!(theirs.status, ItemStatus::Approved);
        let owner = reload_user(&db, &owner.id).await;
        assert_eq!(owner.points_balance, 0);
    }

    #[tokio::test]
    async fn test_cancel_accepted_reverts_items_and_bonus() {
        let db = test_db().await;
        let requester = create_user(&db, "lena").await;
        let owner = create_user(&db, "milo").await;
        let mine = create_approved_item(&db, &requester.id, "Mine", 10000).await;
        let theirs = create_approved_item(&db, &owner.id, "Theirs", 15000).await;

        let detail = db
            .exchanges()
            .create(&requester.id, &proposal(&theirs.id, &mine.id))
            .await
            .unwrap();
        db.exchanges()
            .respond(&detail.exchange.id, &owner.id, ExchangeDecision::Accepted, "")
            .await
            .unwrap();

        // Only the requester may cancel
        let err = db
            .exchanges()
            .cancel(&detail.exchange.id, &owner.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));

        db.exchanges()
            .cancel(&detail.exchange.id, &requester.id)
            .await
            .unwrap();

        for item_id in [&mine.id, &theirs.id] {
            let item = db.items().require(item_id).await.unwrap();
            assert_eq!(item.status, ItemStatus::Approved);
        }

        // The accept-time bonus is revoked on both sides
        for user_id in [&requester.id, &owner.id] {
            let user = reload_user(&db, user_id).await;
            assert_eq!(user.points_balance, 0);
        }

        // Terminal: cancelling again is illegal
        let err = db
            .exchanges()
            .cancel(&detail.exchange.id, &requester.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_both_shipped_auto_completes() {
        let db = test_db().await;
        let requester = create_user(&db, "nora").await;
        let owner = create_user(&db, "omar").await;
        let mine = create_approved_item(&db, &requester.id, "Mine", 10000).await;
        let theirs = create_approved_item(&db, &owner.id, "Theirs", 15000).await;

        let detail = db
            .exchanges()
            .create(&requester.id, &proposal(&theirs.id, &mine.id))
            .await
            .unwrap();
        let id = detail.exchange.id.clone();

        // Shipping before accept is illegal
        let err = db
            .exchanges()
            .update_shipping(&id, &requester.id, ExchangeSide::Requester, None, None, ShipmentStatus::Shipped)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));

        db.exchanges()
            .respond(&id, &owner.id, ExchangeDecision::Accepted, "")
            .await
            .unwrap();

        // A participant cannot report the other side's leg
        let err = db
            .exchanges()
            .update_shipping(&id, &requester.id, ExchangeSide::Owner, None, None, ShipmentStatus::Shipped)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));

        let one_side = db
            .exchanges()
            .update_shipping(
                &id,
                &requester.id,
                ExchangeSide::Requester,
                Some("RW1"),
                Some("IndiaPost"),
                ShipmentStatus::Shipped,
            )
            .await
            .unwrap();
        assert_eq!(one_side.exchange.status, ExchangeStatus::Accepted);

        let both = db
            .exchanges()
            .update_shipping(
                &id,
                &owner.id,
                ExchangeSide::Owner,
                Some("RW2"),
                None,
                ShipmentStatus::Shipped,
            )
            .await
            .unwrap();
        assert_eq!(both.exchange.status, ExchangeStatus::Completed);
    }

    #[tokio::test]
    async fn test_rating_rules() {
        let db = test_db().await;
        let requester = create_user(&db, "pria").await;
        let owner = create_user(&db, "quinn").await;
        let outsider = create_user(&db, "rudy").await;
        let mine = create_approved_item(&db, &requester.id, "Mine", 10000).await;
        let theirs = create_approved_item(&db, &owner.id, "Theirs", 15000).await;

        let detail = db
            .exchanges()
            .create(&requester.id, &proposal(&theirs.id, &mine.id))
            .await
            .unwrap();
        let id = detail.exchange.id.clone();

        // Rating before completion is illegal
        let err = db.exchanges().rate(&id, &requester.id, 5, "great").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));

        db.exchanges()
            .respond(&id, &owner.id, ExchangeDecision::Accepted, "")
            .await
            .unwrap();
        for (user, side) in [
            (&requester.id, ExchangeSide::Requester),
            (&owner.id, ExchangeSide::Owner),
        ] {
            db.exchanges()
                .update_shipping(&id, user, side, None, None, ShipmentStatus::Shipped)
                .await
                .unwrap();
        }

        let rated = db.exchanges().rate(&id, &requester.id, 5, "great swap").await.unwrap();
        assert_eq!(
            rated.exchange.requester_rating.as_ref().map(|r| r.rating),
            Some(5)
        );
        assert!(rated.exchange.owner_rating.is_none());

        // One rating per side
        let err = db.exchanges().rate(&id, &requester.id, 1, "redo").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidState { .. })
        ));

        // Outsiders may not rate
        let err = db.exchanges().rate(&id, &outsider.id, 4, "").await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));

        // Out-of-range ratings are rejected
        let err = db.exchanges().rate(&id, &owner.id, 9, "").await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }
}
