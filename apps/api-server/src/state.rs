//! Shared application state.

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::auth::{strategy_from_config, IdentityStrategy};
use crate::config::ServerConfig;
use medbill_db::Database;

/// Handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ServerConfig>,
    /// `None` when bearer tokens are ignored.
    pub identity: Option<Arc<dyn IdentityStrategy>>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let identity = strategy_from_config(&config.auth);
        AppState {
            db,
            config: Arc::new(config),
            identity,
        }
    }

    /// Local business date. Expiry, "today" revenue and subscriptions use it.
    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
