//! Shared helpers for repository tests.
//!
//! Every test runs against a fresh in-memory database with migrations
//! applied, so tests are isolated and need no cleanup.

use restyle_core::{
    Item, ItemCategory, ItemCondition, Reward, RewardCategory, User,
};

use crate::pool::{Database, DbConfig};
use crate::repository::item::NewItem;
use crate::repository::reward::NewReward;
use crate::repository::user::UpsertUser;

/// A fresh in-memory database with the full schema.
pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

/// Creates a user named after `handle`.
pub async fn create_user(db: &Database, handle: &str) -> User {
    let (user, _) = db
        .users()
        .upsert_from_identity(&UpsertUser {
            external_id: format!("ext-{handle}"),
            email: format!("{handle}@example.com"),
            first_name: handle.to_string(),
            last_name: String::new(),
            profile_image: String::new(),
        })
        .await
        .expect("create user");
    user
}

/// Sets a user's points balance directly.
pub async fn set_points(db: &Database, user_id: &str, points: i64) {
    sqlx::query("UPDATE users SET points_balance = ?2 WHERE id = ?1")
        .bind(user_id)
        .bind(points)
        .execute(db.pool())
        .await
        .expect("set points");
}

/// Reloads a user.
pub async fn reload_user(db: &Database, user_id: &str) -> User {
    db.users()
        .get_by_id(user_id)
        .await
        .expect("load user")
        .expect("user exists")
}

/// A listing payload with sensible defaults.
pub fn new_item(title: &str, price_cents: i64) -> NewItem {
    NewItem {
        title: title.to_string(),
        description: format!("{title}, gently used"),
        category: ItemCategory::Topwear,
        brand: String::new(),
        color: String::new(),
        material: String::new(),
        size: "M".to_string(),
        sizes: vec!["M".to_string()],
        condition: ItemCondition::Good,
        images: vec![],
        main_image: None,
        price_cents,
        original_price_cents: 0,
        location: "Mumbai".to_string(),
        exchange_preferences: None,
    }
}

/// Creates an item and moderates it straight to `approved`.
pub async fn create_approved_item(
    db: &Database,
    owner_id: &str,
    title: &str,
    price_cents: i64,
) -> Item {
    let item = db
        .items()
        .create(owner_id, &new_item(title, price_cents))
        .await
        .expect("create item");
    db.items()
        .review(
            &item.id,
            crate::repository::item::ReviewAction::Approve,
            None,
            None,
        )
        .await
        .expect("approve item")
}

/// Creates an active reward.
pub async fn create_reward(db: &Database, points_required: i64, stock: i64) -> Reward {
    db.rewards()
        .create(&NewReward {
            title: "Canvas tote".to_string(),
            description: "Reusable tote bag".to_string(),
            category: RewardCategory::Accessories,
            points_required,
            stock_quantity: Some(stock),
            image: None,
            valid_until: None,
            terms: String::new(),
        })
        .await
        .expect("create reward")
}
