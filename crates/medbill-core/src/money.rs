//! # Money
//!
//! Prices, bill totals and expiry losses are stored as whole paise in an
//! `i64`. [`Money`] wraps that count so it cannot be confused with a
//! quantity or a row id.
//!
//! Anything that needs precision below one paisa, such as per-line profit
//! margins before the summary rounds them, is done in [`Decimal`] and only
//! turned back into `Money` at the end.
//!
//! ```text
//! Item.item_price_cents ──► line_total (+GST) ──► Bill.total_cents
//! Item.cost_price_cents × quantity ─────────────► ExpiryLossRecord.loss_cents
//! ```
//!
//! ```rust
//! use medbill_core::money::Money;
//!
//! let strip = Money::from_cents(1099);
//! let total: Money = [strip, strip, Money::from_cents(500)].into_iter().sum();
//! assert_eq!(total.cents(), 2698);
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::TaxRate;

/// An amount in paise. Signed, because a loss is recorded as a positive
/// amount but profit after losses can go below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Rupees to paise, rounding the third decimal half away from zero.
    /// `None` if the result does not fit in an `i64`.
    ///
    /// ```rust
    /// use medbill_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let m = Money::from_decimal(Decimal::new(10995, 3)).unwrap(); // 10.995
    /// assert_eq!(m.cents(), 1100);
    /// ```
    pub fn from_decimal(rupees: Decimal) -> Option<Self> {
        rupees
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Money)
    }

    /// Exact rupee value, `1099` → `10.99`.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// GST on this amount, rounded half up to the paisa.
    ///
    /// ```rust
    /// use medbill_core::money::Money;
    /// use medbill_core::types::TaxRate;
    ///
    /// let gst = Money::from_cents(1000).calculate_tax(TaxRate::from_bps(1200));
    /// assert_eq!(gst.cents(), 120);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // widened so a large line cannot overflow before the division
        let scaled = i128::from(self.0) * i128::from(rate.bps()) + 5_000;
        Money((scaled / 10_000) as i64)
    }

    /// Value of `qty` units at this price, `None` on overflow.
    ///
    /// Validation caps prices and quantities, but stored rows are not
    /// re-checked, so every product of the two goes through here.
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }
}

/// For logs only; API responses carry plain numbers.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rupees = self.to_decimal();
        if rupees.is_sign_negative() {
            write!(f, "-₹{}", rupees.abs())
        } else {
            write!(f, "₹{}", rupees)
        }
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "₹10.99");
        assert_eq!(Money::from_cents(500).to_string(), "₹5.00");
        assert_eq!(Money::from_cents(-80000).to_string(), "-₹800.00");
    }

    #[test]
    fn test_from_decimal_rounds_half_away_from_zero() {
        assert_eq!(Money::from_decimal(dec!(19.995)), Some(Money::from_cents(2000)));
        assert_eq!(Money::from_decimal(dec!(19.994)), Some(Money::from_cents(1999)));
        assert_eq!(Money::from_decimal(dec!(-0.005)), Some(Money::from_cents(-1)));
        assert_eq!(Money::from_decimal(dec!(60)), Some(Money::from_cents(6000)));
        assert_eq!(Money::from_decimal(Decimal::MAX), None);
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(Money::from_cents(1099).to_decimal(), dec!(10.99));
        assert_eq!(Money::from_cents(-5).to_decimal(), dec!(-0.05));
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((b - a).cents(), -500);
        assert_eq!(a.checked_multiply_quantity(3), Some(Money::from_cents(3000)));

        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
        assert!(total.is_positive());
        assert!(!(b - a).is_positive());
    }

    #[test]
    fn test_gst_rounds_half_up() {
        // 4.95 paise
        assert_eq!(Money::from_cents(99).calculate_tax(TaxRate::from_bps(500)).cents(), 5);
        // 599.94 paise
        assert_eq!(Money::from_cents(3333).calculate_tax(TaxRate::from_bps(1800)).cents(), 600);
    }

    #[test]
    fn test_checked_multiply_quantity() {
        let unit = Money::from_cents(299);
        assert_eq!(unit.checked_multiply_quantity(3), Some(Money::from_cents(897)));
        assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2), None);
    }
}
