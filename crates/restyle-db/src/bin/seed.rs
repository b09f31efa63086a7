//! # Seed Data Generator
//!
//! Populates the database with a starter reward catalog for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p restyle-db --bin seed
//!
//! # Specify database path
//! cargo run -p restyle-db --bin seed -- --db ./data/restyle.db
//! ```
//!
//! Seeding is idempotent: rewards are matched by title and skipped when
//! they already exist.

use std::env;

use restyle_core::RewardCategory;
use restyle_db::repository::reward::NewReward;
use restyle_db::{Database, DbConfig};

/// The starter reward catalog.
const REWARDS: &[(&str, &str, RewardCategory, i64, i64)] = &[
    (
        "Organic Cotton Tote Bag",
        "A sturdy reusable tote made from organic cotton.",
        RewardCategory::Accessories,
        500,
        100,
    ),
    (
        "Bamboo Sunglasses",
        "Handmade sunglasses with bamboo frames and UV400 lenses.",
        RewardCategory::Accessories,
        1200,
        50,
    ),
    (
        "Upcycled Denim Jacket",
        "One-of-a-kind jacket stitched from reclaimed denim.",
        RewardCategory::Clothing,
        2500,
        20,
    ),
    (
        "Organic Cotton T-Shirt",
        "Plain tee in unbleached organic cotton.",
        RewardCategory::Clothing,
        800,
        80,
    ),
    (
        "Steel Water Bottle",
        "Insulated stainless-steel bottle, 750ml.",
        RewardCategory::Lifestyle,
        600,
        120,
    ),
    (
        "Plantable Notebook",
        "A5 notebook with seed-paper covers you can plant afterwards.",
        RewardCategory::Lifestyle,
        400,
        150,
    ),
    (
        "Capsule Wardrobe Guide",
        "Digital guide to building a 30-piece capsule wardrobe.",
        RewardCategory::Digital,
        300,
        1000,
    ),
    (
        "Thrift Store Voucher",
        "₹500 voucher redeemable at partner thrift stores.",
        RewardCategory::Vouchers,
        1000,
        200,
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let db_path = parse_db_path().unwrap_or_else(|| "./restyle.db".to_string());
    println!("Seeding rewards into {db_path}");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let rewards = db.rewards();

    let mut created = 0;
    for (title, description, category, points, stock) in REWARDS {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rewards WHERE title = ?1")
            .bind(title)
            .fetch_one(db.pool())
            .await?;
        if exists > 0 {
            continue;
        }

        rewards
            .create(&NewReward {
                title: (*title).to_string(),
                description: (*description).to_string(),
                category: *category,
                points_required: *points,
                stock_quantity: Some(*stock),
                image: None,
                valid_until: None,
                terms: String::new(),
            })
            .await?;
        created += 1;
    }

    println!("Done: {created} rewards created, {} skipped", REWARDS.len() - created);

    Ok(())
}

/// Parses `--db <path>` from the command line.
fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
}
