//! # medbill-core: Pure Business Logic for MedBill
//!
//! Business rules of the shop backend as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MedBill Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    api-server (axum)                            │   │
//! │  │    /api/items, /api/bills, /api/dashboard/summary, ...          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ medbill-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  ledger   │  │ validation│  │   │
//! │  │   │   Item    │  │   Money   │  │  profit   │  │   rules   │  │   │
//! │  │   │   Bill    │  │  GST calc │  │  expiry   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    medbill-db (Database Layer)                  │   │
//! │  │         SQLite queries, migrations, repositories, ledger        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Bill, ExpiryLossRecord, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`ledger`] - Profit and expiry-loss rules
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use medbill_core::ledger::{billing_profit, final_profit, MarginLine};
//! use medbill_core::money::Money;
//!
//! // cost 60, sold at 100, 10 units
//! let lines = [MarginLine::from_cents(10_000, Some(6_000), 10)];
//! let billing = billing_profit(&lines).unwrap();
//!
//! // ₹1000 written off for expired stock
//! let profit = final_profit(billing, Money::from_cents(100_000));
//! assert_eq!(profit.to_string(), "-600.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use ledger::{ProfitSummary, RevenueTotals};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Unit of measure used when an item is created without one.
pub const DEFAULT_UOM: &str = "PCS";

/// Upper bound for any paginated listing.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Results returned by the quick item search box.
pub const QUICK_SEARCH_LIMIT: u32 = 20;

/// Rows on the dashboard's best-sellers list.
pub const TOP_ITEMS_LIMIT: u32 = 10;

/// Days covered by the dashboard revenue graph, today included.
pub const REVENUE_GRAPH_DAYS: i64 = 30;

/// Largest stock or bill-line quantity accepted.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Largest single amount accepted, in paise (₹10,00,000).
///
/// With [`MAX_QUANTITY`] this keeps `price × quantity` per item around
/// 10^14 paise, far from the `i64` limit even when summed over an owner's
/// whole inventory.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000;

/// Longest subscription recharge accepted in one go.
pub const MAX_PLAN_MONTHS: u32 = 36;
