//! # Domain Types
//!
//! Core domain types used throughout Restyle.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │      Order      │   │    Exchange     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  status machine │   │  order_id (ORD…)│   │  exchange_id    │       │
//! │  │  price_cents    │   │  status machine │   │  status machine │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Reward      │   │ RewardRedemption│   │      User       │       │
//! │  │  in_stock is    │   │  points_spent   │   │  points ledger, │       │
//! │  │  DERIVED        │   │  snapshot       │   │  role, stats    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every transactional entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (order_id, exchange_id, ...) - human-readable
//!
//! ## Status Enums Are State Machines
//! Every status enum owns its transition table. Callers never compare
//! strings; they ask `can_transition_to` / `can_cancel` / `is_terminal`,
//! and illegal transitions are unrepresentable at the database layer too
//! (status-guarded updates).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Item Enums
// =============================================================================

/// Garment category of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
pub enum ItemCategory {
    Topwear,
    Bottomwear,
    Winterwear,
}

/// Wear condition of a listed garment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum ItemCondition {
    #[serde(rename = "Like New")]
    LikeNew,
    Excellent,
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    Fair,
}

/// The moderation / availability status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Awaiting admin review.
    Pending,
    /// Visible in the catalog, purchasable and exchangeable.
    Approved,
    /// Rejected by moderation; re-enters `pending` on edit.
    Rejected,
    /// Purchased through an order.
    Sold,
    /// Swapped through an accepted exchange.
    Exchanged,
    /// Soft-removed by its owner.
    Removed,
}

impl ItemStatus {
    /// The legal item transitions:
    ///
    /// ```text
    /// pending  → approved | rejected | removed
    /// rejected → pending (owner re-edit) | removed
    /// approved → sold | exchanged | removed
    /// sold / exchanged / removed    (terminal)
    /// ```
    ///
    /// Cancellation paths (`sold → approved`, `exchanged → approved`) are
    /// compensations, not forward transitions, and are covered by
    /// [`ItemStatus::can_revert_to_approved`].
    pub fn can_transition_to(self, next: ItemStatus) -> bool {
        use ItemStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Removed)
                | (Rejected, Pending)
                | (Rejected, Removed)
                | (Approved, Sold)
                | (Approved, Exchanged)
                | (Approved, Removed)
        )
    }

    /// Whether a cancellation may return this item to the catalog.
    pub fn can_revert_to_approved(self) -> bool {
        matches!(self, ItemStatus::Sold | ItemStatus::Exchanged)
    }

    /// Terminal for the normal lifecycle (only admin hard-delete applies).
    pub fn is_locked(self) -> bool {
        matches!(self, ItemStatus::Sold | ItemStatus::Exchanged)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Approved => "approved",
            ItemStatus::Rejected => "rejected",
            ItemStatus::Sold => "sold",
            ItemStatus::Exchanged => "exchanged",
            ItemStatus::Removed => "removed",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order Enums
// =============================================================================

/// The status of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Placed,
    Confirmed,
    Packed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Position on the forward fulfilment path, `None` for `cancelled`.
    pub fn rank(self) -> Option<u8> {
        match self {
            OrderStatus::Placed => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Packed => Some(2),
            OrderStatus::Shipped => Some(3),
            OrderStatus::Delivered => Some(4),
            OrderStatus::Cancelled => None,
        }
    }

    /// Fulfilment only moves forward: placed < confirmed < packed <
    /// shipped < delivered. Repeats and backward moves are illegal.
    pub fn can_advance_to(self, next: OrderStatus) -> bool {
        match (self.rank(), next.rank()) {
            (Some(current), Some(next)) => next > current,
            _ => false,
        }
    }

    /// An order is cancellable until it ships.
    pub fn can_cancel(self) -> bool {
        matches!(
            self,
            OrderStatus::Placed | OrderStatus::Confirmed | OrderStatus::Packed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Packed => "packed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state recorded on an order.
///
/// The gateway itself is an external collaborator; orders record a
/// `completed` payment with a generated transaction id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

// =============================================================================
// Exchange Enums
// =============================================================================

/// The status of a bilateral exchange proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ExchangeStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
    Cancelled,
}

impl ExchangeStatus {
    /// The exchange state machine:
    ///
    /// ```text
    /// pending  → accepted | rejected | cancelled
    /// accepted → completed (auto, both legs shipped) | cancelled
    /// rejected / completed / cancelled   (terminal)
    /// ```
    pub fn can_transition_to(self, next: ExchangeStatus) -> bool {
        use ExchangeStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Accepted, Completed)
                | (Accepted, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExchangeStatus::Rejected | ExchangeStatus::Completed | ExchangeStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExchangeStatus::Pending => "pending",
            ExchangeStatus::Accepted => "accepted",
            ExchangeStatus::Rejected => "rejected",
            ExchangeStatus::Completed => "completed",
            ExchangeStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ExchangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The shape of an exchange deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "kebab-case")]
pub enum ExchangeType {
    ItemForItem,
    ItemWithCash,
    DirectSwap,
}

impl Default for ExchangeType {
    fn default() -> Self {
        ExchangeType::ItemForItem
    }
}

/// Which side covers the cash difference, derived from value comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum WhoPays {
    Requester,
    Owner,
    None,
}

impl WhoPays {
    /// Derivation rule: somebody pays only when a cash difference was
    /// declared; the side offering less value pays.
    pub fn derive(cash_difference: Money, total_offered: Money, requested_price: Money) -> Self {
        if cash_difference.cents() > 0 {
            if total_offered < requested_price {
                WhoPays::Requester
            } else {
                WhoPays::Owner
            }
        } else {
            WhoPays::None
        }
    }
}

/// Participant side of an exchange, used for shipping and rating updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeSide {
    Requester,
    Owner,
}

/// Per-leg shipment state inside an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipmentStatus {
    Pending,
    Shipped,
    Delivered,
}

// =============================================================================
// Reward Enums
// =============================================================================

/// Catalog category of a redeemable reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
pub enum RewardCategory {
    Accessories,
    Clothing,
    Lifestyle,
    Digital,
    Vouchers,
}

/// Fulfilment status of a reward redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum RedemptionStatus {
    Pending,
    Processed,
    Shipped,
    Delivered,
    Cancelled,
}

impl RedemptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RedemptionStatus::Pending => "pending",
            RedemptionStatus::Processed => "processed",
            RedemptionStatus::Shipped => "shipped",
            RedemptionStatus::Delivered => "delivered",
            RedemptionStatus::Cancelled => "cancelled",
        }
    }
}

// =============================================================================
// User Enums
// =============================================================================

/// Account role; admin unlocks the moderation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

// =============================================================================
// Catalog Query Enums
// =============================================================================

/// Sort keys accepted by the catalog search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    #[serde(rename = "newest")]
    Newest,
    #[serde(rename = "oldest")]
    Oldest,
    #[serde(rename = "price-low")]
    PriceLow,
    #[serde(rename = "price-high")]
    PriceHigh,
    #[serde(rename = "title")]
    Title,
}

impl Default for SortKey {
    fn default() -> Self {
        SortKey::Newest
    }
}

// =============================================================================
// Embedded Sub-Records (stored as JSON columns)
// =============================================================================

/// A stored image reference; the bytes live in external object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub storage_id: String,
    pub url: String,
}

/// A postal shipping address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
}

/// Payment sub-record on an order. The gateway is mocked upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub method: String,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub currency: String,
}

/// Carrier tracking details on an order or redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
    pub tracking_number: String,
    pub carrier: Option<String>,
    pub tracking_url: String,
}

/// One side's shipment leg inside an accepted exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingLeg {
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub status: ShipmentStatus,
}

/// A single post-completion rating from one side of an exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingEntry {
    pub rating: i64,
    pub review: String,
}

// =============================================================================
// Statistics (flattened to columns in SQL, nested objects in JSON)
// =============================================================================

/// Engagement counters on an item.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ItemStatistics {
    pub views: i64,
    pub favorites: i64,
    pub exchange_requests: i64,
    pub cart_additions: i64,
}

/// Lifetime activity counters on a user account.
///
/// These are monotonic event totals; cancellations adjust the points
/// balance but never rewind these counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
    pub total_uploads: i64,
    pub total_purchases: i64,
    pub total_exchanges: i64,
    pub total_points_earned: i64,
    pub total_points_spent: i64,
}

/// Owner preferences about exchanging an item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ExchangePreferences {
    pub accepts_exchange: bool,
    pub min_exchange_value_cents: i64,
}

impl Default for ExchangePreferences {
    fn default() -> Self {
        ExchangePreferences {
            accepts_exchange: true,
            min_exchange_value_cents: 0,
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// An account and points wallet.
///
/// Identity verification happens in an external provider; `external_id`
/// is the provider's subject for this account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub external_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_image: String,
    pub role: UserRole,
    /// Signed ledger balance. Gated spends can never push it below zero;
    /// cancellation revocations can (logged upstream).
    pub points_balance: i64,
    pub location: String,
    pub phone: String,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub statistics: UserStatistics,
    pub is_active: bool,
    pub is_banned: bool,
    pub ban_reason: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Default shipping address assembled from the profile, used when a
    /// redemption does not supply one.
    pub fn default_shipping_address(&self) -> ShippingAddress {
        ShippingAddress {
            name: format!("{} {}", self.first_name, self.last_name)
                .trim()
                .to_string(),
            phone: self.phone.clone(),
            address: self.location.clone(),
            ..ShippingAddress::default()
        }
    }
}

// =============================================================================
// Item
// =============================================================================

/// A listed garment - the unit of both sale and exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: ItemCategory,
    pub brand: String,
    pub color: String,
    pub material: String,
    /// Primary size of the garment.
    pub size: String,
    /// All sizes the owner will hand out (single physical garment, but
    /// some listings cover adjustable/multi-fit pieces).
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub sizes: Vec<String>,
    pub condition: ItemCondition,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub images: Vec<StoredImage>,
    #[cfg_attr(feature = "sqlx", sqlx(json(nullable)))]
    pub main_image: Option<StoredImage>,
    pub price_cents: i64,
    pub original_price_cents: i64,
    pub location: String,
    pub owner_id: String,
    pub status: ItemStatus,
    pub rejection_reason: String,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub exchange_preferences: ExchangePreferences,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub statistics: ItemStatistics,
    pub featured: bool,
    /// Fixed points credited to the buyer when this item is purchased.
    pub points_on_purchase: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Returns the asking price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn is_approved(&self) -> bool {
        self.status == ItemStatus::Approved
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A raw cart entry row. Hydrated into [`CartEntryView`] on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub id: String,
    pub cart_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub size: String,
    pub added_at: DateTime<Utc>,
}

/// A cart entry joined with its live item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntryView {
    pub item: Item,
    pub quantity: i64,
    pub size: String,
    pub added_at: DateTime<Utc>,
}

/// The cart as returned to callers.
///
/// Totals are ALWAYS recomputed from the current price/status of each
/// item - the cart is a staging view, never a price lock. Entries whose
/// item is no longer `approved` have been pruned before this is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub entries: Vec<CartEntryView>,
    pub total_cents: i64,
    pub item_count: i64,
}

impl CartView {
    /// Builds a view from pruned entries, recomputing totals from live
    /// item prices.
    pub fn from_entries(entries: Vec<CartEntryView>) -> Self {
        let total_cents = entries
            .iter()
            .map(|e| e.item.price_cents * e.quantity)
            .sum();
        let item_count = entries.iter().map(|e| e.quantity).sum();
        CartView {
            entries,
            total_cents,
            item_count,
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A monetary purchase of one or more items from a single seller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// Human-readable business id (`ORD…`).
    pub order_id: String,
    pub buyer_id: String,
    pub seller_id: String,
    /// Snapshot total: Σ(line price × quantity) at creation time.
    /// Immutable afterwards, unlike cart totals.
    pub total_cents: i64,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub shipping_address: ShippingAddress,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub payment: PaymentDetails,
    pub status: OrderStatus,
    #[cfg_attr(feature = "sqlx", sqlx(json(nullable)))]
    pub tracking: Option<TrackingInfo>,
    pub points_earned: i64,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub cancellation_reason: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item on an order, with data frozen at purchase time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub item_id: String,
    /// Title at time of purchase (frozen).
    pub title: String,
    /// Unit price in cents at time of purchase (frozen).
    pub price_cents: i64,
    pub size: String,
    pub quantity: i64,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An order together with its lines, the shape most callers want.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLine>,
}

// =============================================================================
// Exchange
// =============================================================================

/// A bilateral proposal to swap items, optionally with a cash differential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    pub id: String,
    /// Human-readable business id (`EXC…`).
    pub exchange_id: String,
    pub requester_id: String,
    pub owner_id: String,
    pub requested_item_id: String,
    pub message: String,
    pub status: ExchangeStatus,
    pub response_message: String,
    pub exchange_type: ExchangeType,
    pub cash_difference_cents: i64,
    pub who_pays: WhoPays,
    #[cfg_attr(feature = "sqlx", sqlx(json(nullable)))]
    pub requester_shipping: Option<ShippingLeg>,
    #[cfg_attr(feature = "sqlx", sqlx(json(nullable)))]
    pub owner_shipping: Option<ShippingLeg>,
    pub completion_date: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "sqlx", sqlx(json(nullable)))]
    pub requester_rating: Option<RatingEntry>,
    #[cfg_attr(feature = "sqlx", sqlx(json(nullable)))]
    pub owner_rating: Option<RatingEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Exchange {
    /// Classifies an actor as requester or owner, if they participate.
    pub fn side_of(&self, user_id: &str) -> Option<ExchangeSide> {
        if self.requester_id == user_id {
            Some(ExchangeSide::Requester)
        } else if self.owner_id == user_id {
            Some(ExchangeSide::Owner)
        } else {
            None
        }
    }

    /// Both legs reported shipped - the auto-completion trigger.
    pub fn both_shipped(&self) -> bool {
        let shipped =
            |leg: &Option<ShippingLeg>| leg.as_ref().is_some_and(|l| l.status == ShipmentStatus::Shipped);
        shipped(&self.requester_shipping) && shipped(&self.owner_shipping)
    }
}

/// One offered item inside an exchange proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ExchangeOffer {
    pub id: String,
    pub exchange_id: String,
    pub item_id: String,
    /// Requester's estimate, defaulting to the item's asking price.
    pub estimated_value_cents: i64,
}

/// An exchange together with its offered items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeDetail {
    #[serde(flatten)]
    pub exchange: Exchange,
    pub offered_items: Vec<ExchangeOffer>,
}

// =============================================================================
// Reward
// =============================================================================

/// A non-marketplace item redeemable only with points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: String,
    /// Human-readable business id (`RWD…`).
    pub reward_id: String,
    pub title: String,
    pub description: String,
    pub category: RewardCategory,
    pub points_required: i64,
    #[cfg_attr(feature = "sqlx", sqlx(json(nullable)))]
    pub image: Option<StoredImage>,
    pub stock_quantity: i64,
    pub redeemed_count: i64,
    pub is_active: bool,
    pub valid_until: Option<DateTime<Utc>>,
    pub terms: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reward {
    /// Stock availability is DERIVED, never stored: true exactly while
    /// `stock_quantity > 0`.
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    /// Whether the reward's redemption window has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| now > until)
    }
}

/// The record of one reward being exchanged for points by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct RewardRedemption {
    pub id: String,
    /// Human-readable business id (`RDM…`).
    pub redemption_id: String,
    pub user_id: String,
    pub reward_id: String,
    /// Snapshot of the reward's points price at redemption time.
    pub points_spent: i64,
    pub status: RedemptionStatus,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub shipping_address: ShippingAddress,
    #[cfg_attr(feature = "sqlx", sqlx(json(nullable)))]
    pub tracking: Option<TrackingInfo>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_transitions() {
        use ItemStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Rejected.can_transition_to(Pending));
        assert!(Approved.can_transition_to(Sold));
        assert!(Approved.can_transition_to(Exchanged));
        assert!(Approved.can_transition_to(Removed));

        assert!(!Approved.can_transition_to(Pending));
        assert!(!Sold.can_transition_to(Approved));
        assert!(!Exchanged.can_transition_to(Sold));
        assert!(Sold.can_revert_to_approved());
        assert!(Exchanged.can_revert_to_approved());
        assert!(!Pending.can_revert_to_approved());
    }

    #[test]
    fn test_order_forward_progression() {
        use OrderStatus::*;
        assert!(Placed.can_advance_to(Confirmed));
        assert!(Placed.can_advance_to(Shipped));
        assert!(Packed.can_advance_to(Delivered));

        assert!(!Shipped.can_advance_to(Packed));
        assert!(!Delivered.can_advance_to(Delivered));
        assert!(!Cancelled.can_advance_to(Confirmed));
        assert!(!Placed.can_advance_to(Cancelled));
    }

    #[test]
    fn test_order_cancel_window() {
        use OrderStatus::*;
        assert!(Placed.can_cancel());
        assert!(Confirmed.can_cancel());
        assert!(Packed.can_cancel());
        assert!(!Shipped.can_cancel());
        assert!(!Delivered.can_cancel());
        assert!(!Cancelled.can_cancel());
    }

    #[test]
    fn test_exchange_transitions() {
        use ExchangeStatus::*;
        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Accepted.can_transition_to(Completed));
        assert!(Accepted.can_transition_to(Cancelled));

        // completed is reachable ONLY from accepted
        assert!(!Pending.can_transition_to(Completed));
        for terminal in [Rejected, Completed, Cancelled] {
            assert!(terminal.is_terminal());
            for next in [Pending, Accepted, Rejected, Completed, Cancelled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_who_pays_derivation() {
        let offered = Money::from_cents(20000);
        let requested = Money::from_cents(30000);

        assert_eq!(
            WhoPays::derive(Money::from_cents(5000), offered, requested),
            WhoPays::Requester
        );
        assert_eq!(
            WhoPays::derive(Money::from_cents(5000), requested, offered),
            WhoPays::Owner
        );
        assert_eq!(
            WhoPays::derive(Money::zero(), offered, requested),
            WhoPays::None
        );
    }

    #[test]
    fn test_reward_in_stock_derivation() {
        let mut reward = sample_reward();
        assert!(reward.in_stock());
        reward.stock_quantity = 0;
        assert!(!reward.in_stock());
    }

    #[test]
    fn test_reward_expiry() {
        let mut reward = sample_reward();
        let now = Utc::now();
        assert!(!reward.is_expired(now));

        reward.valid_until = Some(now - chrono::Duration::days(1));
        assert!(reward.is_expired(now));

        reward.valid_until = Some(now + chrono::Duration::days(1));
        assert!(!reward.is_expired(now));
    }

    #[test]
    fn test_condition_serde_labels() {
        let json = serde_json::to_string(&ItemCondition::LikeNew).unwrap();
        assert_eq!(json, "\"Like New\"");
        let parsed: ItemCondition = serde_json::from_str("\"Very Good\"").unwrap();
        assert_eq!(parsed, ItemCondition::VeryGood);
    }

    #[test]
    fn test_exchange_type_serde() {
        let json = serde_json::to_string(&ExchangeType::ItemWithCash).unwrap();
        assert_eq!(json, "\"item-with-cash\"");
    }

    fn sample_reward() -> Reward {
        Reward {
            id: "r-1".to_string(),
            reward_id: "RWD123".to_string(),
            title: "Tote bag".to_string(),
            description: "Canvas tote".to_string(),
            category: RewardCategory::Accessories,
            points_required: 600,
            image: None,
            stock_quantity: 1,
            redeemed_count: 0,
            is_active: true,
            valid_until: None,
            terms: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
