//! # Domain Types
//!
//! Core domain types used throughout MedBill.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │      Item       │   │      Bill       │   │  ExpiryLossRecord   │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  item_code      │   │  bill_number    │   │  (user_id, item_id) │   │
//! │  │  cost / price   │   │  total_cents    │   │  loss_cents         │   │
//! │  │  quantity       │   │  pending_cents  │   │  write-once         │   │
//! │  │  expiry_date    │   │  bill_date      │   └─────────────────────┘   │
//! │  └────────┬────────┘   └────────┬────────┘                              │
//! │           │ item_id (nullable)  │ bill_id                               │
//! │           └──────────►┌─────────▼───────┐                               │
//! │                       │    BillItem     │  name/price frozen at sale    │
//! │                       └─────────────────┘                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity is scoped to an owner (`user_id`), the shop account.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Identifier of the shop account that owns inventory, bills and ledger rows.
pub type OwnerId = i64;

// =============================================================================
// Tax Rate
// =============================================================================

/// GST rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so the 18% slab is `1800`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a rate from a percentage, rounding to the nearest basis point.
    ///
    /// Negative input clamps to zero; callers validate the range first.
    pub fn from_percentage(pct: Decimal) -> Self {
        use rust_decimal::prelude::ToPrimitive;
        let bps = (pct * Decimal::ONE_HUNDRED).round().to_u32().unwrap_or(0);
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (`1800` → `18`).
    #[inline]
    pub fn percentage(&self) -> Decimal {
        Decimal::new(self.0 as i64, 2)
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// User
// =============================================================================

/// A shop account. The password hash never leaves the database layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: OwnerId,
    pub email: String,
    pub shop_name: String,
    /// Subject of the identity provider token this account is linked to.
    pub external_uid: Option<String>,
    pub subscription_expiry: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

impl User {
    /// An account with no expiry recorded is treated as active.
    pub fn subscription_active(&self, today: NaiveDate) -> bool {
        self.subscription_expiry.map_or(true, |expiry| expiry >= today)
    }
}

// =============================================================================
// Item
// =============================================================================

/// A stocked inventory item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    pub id: i64,
    pub user_id: OwnerId,
    /// Business identifier, unique per owner.
    pub item_code: String,
    pub item_name: String,
    /// Units on hand. Never negative.
    pub quantity: i64,
    /// Sale price in paise.
    pub item_price_cents: i64,
    /// Purchase cost in paise. Basis for margin and expiry loss.
    pub cost_price_cents: i64,
    pub mrp_cents: i64,
    /// GST in basis points.
    pub gst_bps: i64,
    /// Unit of measure ("PCS", "STRIP", "BOX").
    pub uom: String,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Item {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.item_price_cents)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    #[inline]
    pub fn gst(&self) -> TaxRate {
        TaxRate::from_bps(self.gst_bps.max(0) as u32)
    }
}

// =============================================================================
// Stock change history
// =============================================================================

/// Direction of a manual stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum StockChange {
    Added,
    Reduced,
}

impl StockChange {
    /// Classifies a quantity edit. `None` when the quantity did not change.
    pub fn between(previous: i64, updated: i64) -> Option<(StockChange, i64)> {
        match updated.cmp(&previous) {
            std::cmp::Ordering::Greater => Some((StockChange::Added, updated - previous)),
            std::cmp::Ordering::Less => Some((StockChange::Reduced, previous - updated)),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// One row of the item update history report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ItemUpdate {
    pub id: i64,
    pub item_id: Option<i64>,
    pub item_code: String,
    pub item_name: String,
    pub change_type: StockChange,
    pub quantity_changed: i64,
    pub available_qty: i64,
    pub updated_qty: i64,
    pub price_cents: i64,
    pub created_at: NaiveDateTime,
}

// =============================================================================
// Bill
// =============================================================================

/// A customer bill. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Bill {
    pub id: i64,
    pub user_id: OwnerId,
    pub bill_number: String,
    pub customer_name: String,
    pub customer_mobile: Option<String>,
    /// Sum of line totals including GST.
    pub total_cents: i64,
    /// Amount still owed by the customer.
    pub pending_cents: i64,
    /// Local business date the bill was issued on.
    pub bill_date: NaiveDate,
    pub created_at: NaiveDateTime,
}

/// A line in a bill.
/// Uses snapshot pattern to freeze item data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BillItem {
    pub id: i64,
    pub bill_id: i64,
    /// `None` once the source item has been deleted.
    pub item_id: Option<i64>,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub gst_bps: i64,
    pub total_cents: i64,
    pub uom: String,
}

/// GST-inclusive total for a bill line: `unit_price * qty + gst`.
///
/// `None` on overflow.
pub fn line_total(unit_price: Money, quantity: i64, gst: TaxRate) -> Option<Money> {
    let net = unit_price.checked_multiply_quantity(quantity)?;
    net.cents()
        .checked_add(net.calculate_tax(gst).cents())
        .map(Money::from_cents)
}

// =============================================================================
// Expiry loss ledger
// =============================================================================

/// A permanent expiry write-off. At most one per (owner, item), ever.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ExpiryLossRecord {
    pub id: i64,
    pub user_id: OwnerId,
    pub item_id: i64,
    /// Name at the time the loss was recorded.
    pub item_name: String,
    pub loss_cents: i64,
    pub recorded_at: NaiveDateTime,
}

// =============================================================================
// Customer details
// =============================================================================

/// Shop letterhead printed on bills. One per owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(default)]
#[ts(export)]
pub struct CustomerDetails {
    pub name: String,
    pub organization_name: String,
    pub email: String,
    pub address: String,
    pub gstin: String,
}

// =============================================================================
// Pagination
// =============================================================================

/// Page request with 1-based page numbers and a clamped page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    /// Page < 1 becomes 1; limit is clamped into `1..=max_limit`.
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: u32, max_limit: u32) -> Self {
        let page = page.unwrap_or(1).clamp(1, u32::MAX as i64) as u32;
        let limit = limit
            .unwrap_or(default_limit as i64)
            .clamp(1, max_limit as i64) as u32;
        Page { page, limit }
    }

    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    /// Number of pages needed for `total` rows.
    pub fn page_count(&self, total: i64) -> i64 {
        let limit = self.limit as i64;
        (total + limit - 1) / limit
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
