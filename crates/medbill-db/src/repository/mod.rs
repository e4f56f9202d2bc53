//! # Repository Module
//!
//! Database repository implementations for MedBill.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.items().search(owner, "para", 20)                          │
//! │       ▼                                                                 │
//! │  ItemRepository                                                        │
//! │  ├── list / search / get                                               │
//! │  ├── create / update   (+ item_updates_history in the same tx)         │
//! │  └── delete / bulk_delete                                              │
//! │       │                                                                 │
//! │       │  SQL, always filtered by user_id                               │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`] - Accounts, login, identity linking
//! - [`ItemRepository`] - Inventory CRUD and search
//! - [`HistoryRepository`] - Stock adjustment log
//! - [`BillRepository`] - Bills, lines, stock decrement
//! - [`ReportRepository`] - Dashboard charts and item reports
//! - [`CustomerRepository`] - Shop letterhead details
//! - [`SubscriptionRepository`] - Plan recharges
//! - [`ExpiryLossRepository`] - Read side of the expiry loss ledger

pub mod bill;
pub mod customer;
pub mod expiry_loss;
pub mod history;
pub mod item;
pub mod report;
pub mod subscription;
pub mod user;

pub use bill::{BillFilter, BillRepository, BillWithItems, NewBill, NewBillLine, PricedBill};
pub use customer::CustomerRepository;
pub use expiry_loss::ExpiryLossRepository;
pub use history::{HistoryPage, HistoryRepository};
pub use item::{ItemInput, ItemPage, ItemRepository};
pub use report::{ReportFilter, ReportRepository, RevenuePoint, TopItem};
pub use subscription::SubscriptionRepository;
pub use user::{ExternalIdentity, UserRepository};
