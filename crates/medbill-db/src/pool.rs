//! # Connection Pool
//!
//! One [`Database`] per process. Handlers clone it freely; the clones share
//! a single `SqlitePool` and hand out short-lived repository values.
//!
//! ```text
//! ServerConfig.database_path
//!        │
//!        ▼
//! DbConfig ──► Database::new ──► SqlitePool ──► migrations (schema_version)
//!                                     │
//!              ┌──────────────┬───────┴──────┬───────────────┐
//!              ▼              ▼              ▼               ▼
//!        db.items()     db.bills()     db.ledger()    db.reports() ...
//! ```
//!
//! Every connection runs with WAL journaling, `synchronous = NORMAL` and
//! `foreign_keys = ON`. Items and bills reference `users` through foreign
//! keys. Loss records carry none, so they outlive the items they were
//! written for.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::ledger::{ProfitLedger, SqliteLedgerStore};
use crate::migrations;
use crate::repository::{
    BillRepository, CustomerRepository, ExpiryLossRepository, HistoryRepository, ItemRepository,
    ReportRepository, SubscriptionRepository, UserRepository,
};

const MEMORY_PATH: &str = ":memory:";

/// Pool settings, built fluently.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/medbill/medbill.db").max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file; created on first open. `:memory:` selects a private
    /// in-memory database.
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a request waits for a free connection.
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(10 * 60),
            run_migrations: true,
        }
    }

    /// A throwaway database for tests.
    ///
    /// An in-memory database dies with its connection, so the pool holds
    /// exactly one and never lets it idle out.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(24 * 60 * 60),
            ..DbConfig::new(MEMORY_PATH)
        }
    }

    pub fn max_connections(self, max_connections: u32) -> Self {
        DbConfig { max_connections, ..self }
    }

    pub fn min_connections(self, min_connections: u32) -> Self {
        DbConfig { min_connections, ..self }
    }

    pub fn connect_timeout(self, connect_timeout: Duration) -> Self {
        DbConfig { connect_timeout, ..self }
    }

    pub fn run_migrations(self, run_migrations: bool) -> Self {
        DbConfig { run_migrations, ..self }
    }

    fn is_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let base = if self.is_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
        };

        Ok(base
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true))
    }
}

/// Handle to the shop database. Cheap to clone.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./medbill.db")).await?;
/// let items = db.items().search(owner, "para", 20).await?;
/// let summary = db.ledger().summary(owner, today).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");

        let options = config.connect_options()?;
        debug!(
            max = config.max_connections,
            min = config.min_connections,
            "Pool limits"
        );

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }

        info!(max_connections = config.max_connections, "Database pool created");
        Ok(db)
    }

    /// Applies pending migrations. Called by `new()` unless disabled.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Raw pool access for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn items(&self) -> ItemRepository {
        ItemRepository::new(self.pool.clone())
    }

    pub fn bills(&self) -> BillRepository {
        BillRepository::new(self.pool.clone())
    }

    pub fn history(&self) -> HistoryRepository {
        HistoryRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    pub fn subscriptions(&self) -> SubscriptionRepository {
        SubscriptionRepository::new(self.pool.clone())
    }

    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    pub fn expiry_losses(&self) -> ExpiryLossRepository {
        ExpiryLossRepository::new(self.pool.clone())
    }

    /// Returns the profit ledger backed by this database.
    pub fn ledger(&self) -> ProfitLedger<SqliteLedgerStore> {
        ProfitLedger::new(SqliteLedgerStore::new(self.pool.clone()))
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// `true` while `SELECT 1` succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
