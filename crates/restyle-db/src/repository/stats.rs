//! # Stats Repository
//!
//! Aggregate counters for the admin dashboard. Read-only.

use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::DbResult;

/// Marketplace-wide totals.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub total_users: i64,
    pub total_items: i64,
    pub total_orders: i64,
    pub total_exchanges: i64,
    pub pending_items: i64,
    pub active_users: i64,
    pub total_revenue_cents: i64,
}

/// Activity over the trailing seven days.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub new_users: i64,
    pub new_items: i64,
    pub new_orders: i64,
}

/// The admin dashboard payload.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub overview: DashboardOverview,
    pub recent_activity: RecentActivity,
}

/// Repository for dashboard statistics.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
}

impl StatsRepository {
    /// Creates a new StatsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StatsRepository { pool }
    }

    /// Collects the admin dashboard counters.
    pub async fn admin_dashboard(&self) -> DbResult<AdminDashboard> {
        let total_users = self.count("SELECT COUNT(*) FROM users").await?;
        let total_items = self.count("SELECT COUNT(*) FROM items").await?;
        let total_orders = self.count("SELECT COUNT(*) FROM orders").await?;
        let total_exchanges = self.count("SELECT COUNT(*) FROM exchanges").await?;
        let pending_items = self
            .count("SELECT COUNT(*) FROM items WHERE status = 'pending'")
            .await?;
        let active_users = self
            .count("SELECT COUNT(*) FROM users WHERE is_active = 1")
            .await?;

        let total_revenue_cents: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(total_cents) FROM orders WHERE json_extract(payment, '$.status') = 'completed'",
        )
        .fetch_one(&self.pool)
        .await?;

        let week_ago = Utc::now() - Duration::days(7);
        let new_users: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE created_at >= ?1")
                .bind(week_ago)
                .fetch_one(&self.pool)
                .await?;
        let new_items: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE created_at >= ?1")
                .bind(week_ago)
                .fetch_one(&self.pool)
                .await?;
        let new_orders: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE created_at >= ?1")
                .bind(week_ago)
                .fetch_one(&self.pool)
                .await?;

        Ok(AdminDashboard {
            overview: DashboardOverview {
                total_users,
                total_items,
                total_orders,
                total_exchanges,
                pending_items,
                active_users,
                total_revenue_cents: total_revenue_cents.unwrap_or(0),
            },
            recent_activity: RecentActivity {
                new_users,
                new_items,
                new_orders,
            },
        })
    }

    async fn count(&self, sql: &str) -> DbResult<i64> {
        Ok(sqlx::query_scalar(sql).fetch_one(&self.pool).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{create_approved_item, create_user, new_item, test_db};

    #[tokio::test]
    async fn test_dashboard_counters() {
        let db = test_db().await;
        let seller = create_user(&db, "ada").await;
        create_user(&db, "ben").await;
        create_approved_item(&db, &seller.id, "Jacket", 30000).await;
        db.items()
            .create(&seller.id, &new_item("Pending coat", 100))
            .await
            .unwrap();

        let dashboard = db.stats().admin_dashboard().await.unwrap();
        assert_eq!(dashboard.overview.total_users, 2);
        assert_eq!(dashboard.overview.total_items, 2);
        assert_eq!(dashboard.overview.pending_items, 1);
        assert_eq!(dashboard.overview.active_users, 2);
        assert_eq!(dashboard.overview.total_orders, 0);
        assert_eq!(dashboard.recent_activity.new_users, 2);
        assert_eq!(dashboard.recent_activity.new_items, 2);
    }
}
