//! # Restyle API Server
//!
//! Startup sequence: tracing → config → database (+ migrations) → router
//! → serve.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use restyle_api::routes::build_router;
use restyle_api::storage::DisabledStore;
use restyle_api::{ApiConfig, AppState, Environment};
use restyle_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting Restyle API server...");

    // Load configuration
    let config = ApiConfig::load()?;
    Environment::set(config.environment);
    info!(
        port = config.http_port,
        database = %config.database_path,
        environment = ?config.environment,
        "Configuration loaded"
    );

    // Connect to database and run migrations
    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    info!("Database ready");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let state = AppState::new(db, config, Arc::new(DisabledStore));
    let router = build_router(state);

    info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
