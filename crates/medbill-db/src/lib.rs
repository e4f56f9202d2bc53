//! # medbill-db: Database Layer for MedBill
//!
//! SQLite storage for shops, inventory, bills and the expiry loss ledger,
//! using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         MedBill Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (GET /api/dashboard/summary)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    medbill-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐  ┌───────────────┐  ┌──────────────────┐   │   │
//! │  │   │   Database    │  │  Repositories │  │  ProfitLedger    │   │   │
//! │  │   │   (pool.rs)   │  │  items, bills │  │  (ledger.rs)     │   │   │
//! │  │   │               │  │  users, ...   │  │                  │   │   │
//! │  │   │  SqlitePool   │◄─│               │  │  detection +     │   │   │
//! │  │   │  Migrations   │◄─┼───────────────┼──│  summary         │   │   │
//! │  │   └───────────────┘  └───────────────┘  └──────────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded, versioned schema migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`ledger`] - Expiry loss detection and the profit summary
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medbill_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./medbill.db")).await?;
//! let items = db.items().search(owner, "para", 20).await?;
//! let summary = db.ledger().summary(owner, today).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use ledger::{DetectionReport, LedgerStore, ProfitLedger, SqliteLedgerStore};
pub use pool::{Database, DbConfig};

pub use repository::user::{DEMO_SHOP_NAME, DEMO_USER_EMAIL, DEMO_USER_ID, DEMO_USER_PASSWORD};
pub use repository::{
    BillRepository, CustomerRepository, ExpiryLossRepository, HistoryRepository, ItemRepository,
    ReportRepository, SubscriptionRepository, UserRepository,
};

// =============================================================================
// Test Helpers
// =============================================================================
