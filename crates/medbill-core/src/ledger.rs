//! # Profit & Expiry-Loss Ledger Rules
//!
//! The pure half of the dashboard profit computation. `medbill-db` feeds
//! these functions with rows and persists what they decide.
//!
//! ## How Profit Is Composed
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Items (expired, not yet evaluated)                                    │
//! │       │  expiry_loss(qty, cost)                                        │
//! │       ▼                                                                 │
//! │  ExpiryLossRecord (write-once per owner+item) ──► Σ loss (all time)    │
//! │                                                       │                 │
//! │  BillItems ⋈ Items                                    │                 │
//! │       │  MarginLine::margin()                         │                 │
//! │       ▼                                               │                 │
//! │  billing_profit = round2(Σ margin)                    │                 │
//! │       │                                               │                 │
//! │       └──────────────► final_profit = round2(billing − loss)           │
//! │                         (may be negative, never clamped)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding
//! Line margins are summed exactly as `Decimal` and rounded to two places
//! once, half away from zero. Rounding each line first drifts: three lines
//! of `19.995` sum to `59.985 → 59.99`, but per-line rounding gives `60.00`.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Expiry detection
// =============================================================================

/// An item counts as expired on its expiry date, not the day after.
#[inline]
pub fn is_expired(expiry_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    matches!(expiry_date, Some(date) if date <= today)
}

/// Loss to write off for an expired item.
///
/// Sold-out stock (`quantity <= 0`) has nothing physical to write off and
/// yields zero. A zero loss never produces a ledger record.
pub fn expiry_loss(quantity: i64, cost: Money) -> Result<Money, CoreError> {
    if quantity > 0 {
        cost.checked_multiply_quantity(quantity)
            .ok_or(CoreError::AmountOverflow("expiry loss"))
    } else {
        Ok(Money::zero())
    }
}

/// Outcome of evaluating one expired item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryDecision {
    /// Write a ledger record for this amount.
    RecordLoss(Money),
    /// Nothing to write off. The item is still marked as evaluated.
    NoLoss,
}

impl ExpiryDecision {
    /// Fails when the loss does not fit in `Money`. Nothing should be
    /// written or marked for such an item.
    pub fn for_item(quantity: i64, cost: Money) -> Result<Self, CoreError> {
        let loss = expiry_loss(quantity, cost)?;
        Ok(if loss.is_positive() {
            ExpiryDecision::RecordLoss(loss)
        } else {
            ExpiryDecision::NoLoss
        })
    }
}

// =============================================================================
// Margin aggregation
// =============================================================================

/// One billed line joined to its source item's cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarginLine {
    pub unit_price: Decimal,
    /// Zero when the source item no longer exists.
    pub cost_price: Decimal,
    pub quantity: i64,
}

impl MarginLine {
    pub fn new(unit_price: Decimal, cost_price: Option<Decimal>, quantity: i64) -> Self {
        MarginLine {
            unit_price,
            cost_price: cost_price.unwrap_or(Decimal::ZERO),
            quantity,
        }
    }

    /// Builds a line from stored minor-unit columns.
    pub fn from_cents(unit_price_cents: i64, cost_price_cents: Option<i64>, quantity: i64) -> Self {
        MarginLine::new(
            Money::from_cents(unit_price_cents).to_decimal(),
            cost_price_cents.map(|c| Money::from_cents(c).to_decimal()),
            quantity,
        )
    }

    /// Unrounded `(unit_price - cost_price) * quantity`, `None` past
    /// `Decimal`'s range.
    #[inline]
    pub fn margin(&self) -> Option<Decimal> {
        self.unit_price
            .checked_sub(self.cost_price)?
            .checked_mul(Decimal::from(self.quantity))
    }
}

/// Rounds to currency precision, half away from zero.
#[inline]
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Sum of all line margins, rounded once.
pub fn billing_profit<'a, I>(lines: I) -> Result<Decimal, CoreError>
where
    I: IntoIterator<Item = &'a MarginLine>,
{
    lines
        .into_iter()
        .try_fold(Decimal::ZERO, |sum, line| sum.checked_add(line.margin()?))
        .map(round_currency)
        .ok_or(CoreError::AmountOverflow("billing profit"))
}

/// `billing_profit - total_recorded_loss`, rounded. Negative is a valid result.
pub fn final_profit(billing_profit: Decimal, total_recorded_loss: Money) -> Decimal {
    round_currency(billing_profit.saturating_sub(total_recorded_loss.to_decimal()))
}

// =============================================================================
// Summary
// =============================================================================

/// Bill aggregates that sit next to profit on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevenueTotals {
    pub total_revenue: Money,
    pub today_revenue: Money,
    pub total_bills: i64,
    pub pending_amount: Money,
}

/// The dashboard summary for one owner, in rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProfitSummary {
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub total_revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub today_revenue: Decimal,
    #[ts(type = "number")]
    pub total_bills: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub pending_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub profit_amount: Decimal,
}

impl ProfitSummary {
    pub fn compose(totals: RevenueTotals, billing_profit: Decimal, total_recorded_loss: Money) -> Self {
        ProfitSummary {
            total_revenue: totals.total_revenue.to_decimal(),
            today_revenue: totals.today_revenue.to_decimal(),
            total_bills: totals.total_bills,
            pending_amount: totals.pending_amount.to_decimal(),
            profit_amount: final_profit(billing_profit, total_recorded_loss),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
