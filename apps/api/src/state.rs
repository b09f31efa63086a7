//! Shared application state.

use std::sync::Arc;

use restyle_db::Database;

use crate::config::ApiConfig;
use crate::storage::ObjectStore;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
    pub storage: Arc<dyn ObjectStore>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig, storage: Arc<dyn ObjectStore>) -> Self {
        AppState {
            db,
            config: Arc::new(config),
            storage,
        }
    }
}
