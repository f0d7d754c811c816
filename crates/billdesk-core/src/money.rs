//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing 0.1 + 0.2 in binary floating point gives 0.30000000000000004   │
//! │  A bill total assembled from a few dozen float line totals drifts.      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (paise)                              │
//! │    Rs 20.00 × 2 = 2000 paise × 2 = 4000 paise, exactly                  │
//! │    Tax is computed in integer basis-point arithmetic, rounded half-up   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The persisted bill document stores amounts as decimal numbers with two
//! fraction digits. [`Money::to_decimal`] and [`Money::from_decimal`] are the
//! only bridge between the two and they round-trip exactly for any value a
//! bill can hold.
//!
//! ## Usage
//! ```rust
//! use billdesk_core::money::Money;
//!
//! let price = Money::from_minor(2000); // 20.00
//! let line_total = price.checked_multiply_quantity(2).unwrap();
//! assert_eq!(line_total.minor(), 4000);
//! assert_eq!(line_total.to_string(), "40.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (paise for INR).
///
/// ## Design Decisions
/// - **i64 (signed)**: arithmetic never underflows on intermediate differences
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **No float constructor** other than [`Money::from_decimal`], which exists
///   only to read persisted documents
///
/// ## Where Money Flows
/// ```text
/// Product.unit_price ──► LineItem.unit_price ──► LineItem.line_total
///                                                      │
///                          per-category subtotal ◄─────┘
///                                │
///                                ├──► calculate_tax(rate) ──► category tax
///                                ▼
///                          Bill.total_amount = Σ subtotals + Σ taxes
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use billdesk_core::money::Money;
    ///
    /// let price = Money::from_minor(3550); // 35.50
    /// assert_eq!(price.minor(), 3550);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    ///
    /// ```rust
    /// use billdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(35, 0).minor(), 3500);
    /// assert_eq!(Money::from_major_minor(-5, 50).minor(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Creates a Money value from whole major units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Reads a two-decimal amount from a persisted document.
    ///
    /// The value is rounded to the nearest minor unit, so `20.0`, `0.35` and
    /// `77.35000000000001` all land on the amount that was written.
    /// Returns `None` for NaN, infinities, and values outside the i64 range.
    ///
    /// ```rust
    /// use billdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(77.35), Some(Money::from_minor(7735)));
    /// assert_eq!(Money::from_decimal(f64::NAN), None);
    /// ```
    pub fn from_decimal(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let minor = (value * 100.0).round();
        if minor < i64::MIN as f64 || minor > i64::MAX as f64 {
            return None;
        }
        Some(Money(minor as i64))
    }

    /// Converts to a decimal number for the persisted document.
    ///
    /// Display and arithmetic never go through this value.
    #[inline]
    pub fn to_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    ///
    /// ```rust
    /// use billdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(7735).major(), 77);
    /// assert_eq!(Money::from_minor(-550).major(), -5);
    /// ```
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is less than zero.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax rounded half-up to the minor unit.
    ///
    /// ## Rounding
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  HALF-UP ROUNDING (not bankers rounding)                           │
    /// │                                                                     │
    /// │  tax = (amount × bps + 5000) / 10000      for amount ≥ 0           │
    /// │                                                                     │
    /// │  35.00 at 1%   = 0.35   → 0.35                                      │
    /// │  0.50  at 1%   = 0.005  → 0.01   (half rounds away from zero)       │
    /// │  0.49  at 1%   = 0.0049 → 0.00                                      │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// Negative amounts mirror positive ones (half rounds away from zero).
    ///
    /// ```rust
    /// use billdesk_core::money::Money;
    /// use billdesk_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_minor(4000); // 40.00
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(500)); // 5%
    /// assert_eq!(tax.minor(), 200);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 keeps amount × bps from overflowing on large subtotals
        let product = self.0 as i128 * rate.bps() as i128;
        let magnitude = (product.abs() + 5000) / 10000;
        let tax = if product < 0 { -magnitude } else { magnitude };
        // only rates above 100% can leave the i64 range
        Money(i64::try_from(tax).unwrap_or(if tax < 0 { i64::MIN } else { i64::MAX }))
    }

    /// Multiplies money by a quantity, or `None` when the product does not
    /// fit in an i64.
    ///
    /// ```rust
    /// use billdesk_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(9500); // Sprite, 95.00
    /// assert_eq!(unit_price.checked_multiply_quantity(3), Some(Money::from_minor(28500)));
    /// assert_eq!(unit_price.checked_multiply_quantity(i64::MAX), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(minor) => Some(Money(minor)),
            None => None,
        }
    }

    /// Adds two amounts, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(minor) => Some(Money(minor)),
            None => None,
        }
    }

    /// Sums amounts from an untrusted source, or `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, amount| acc.checked_add(amount))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount with two fraction digits and no currency symbol.
///
/// The renderer adds the symbol from configuration.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(7735);
        assert_eq!(money.minor(), 7735);
        assert_eq!(money.major(), 77);
        assert_eq!(money.minor_part(), 35);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(7735).to_string(), "77.35");
        assert_eq!(Money::from_minor(500).to_string(), "5.00");
        assert_eq!(Money::from_minor(-550).to_string(), "-5.50");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_tax_half_up() {
        let rate = TaxRate::from_bps(100); // 1%

        assert_eq!(Money::from_minor(3500).calculate_tax(rate).minor(), 35);
        // 0.50 × 1% = 0.005 → 0.01
        assert_eq!(Money::from_minor(50).calculate_tax(rate).minor(), 1);
        // 0.49 × 1% = 0.0049 → 0.00
        assert_eq!(Money::from_minor(49).calculate_tax(rate).minor(), 0);
        // 1.50 × 1% = 0.015 → 0.02 (half-up, bankers would give 0.02 too)
        assert_eq!(Money::from_minor(150).calculate_tax(rate).minor(), 2);
        // 2.50 × 1% = 0.025 → 0.03 (bankers would give 0.02)
        assert_eq!(Money::from_minor(250).calculate_tax(rate).minor(), 3);
    }

    #[test]
    fn test_tax_negative_mirrors_positive() {
        let rate = TaxRate::from_bps(100);
        assert_eq!(Money::from_minor(-250).calculate_tax(rate).minor(), -3);
    }

    #[test]
    fn test_tax_does_not_overflow() {
        let big = Money::from_minor(i64::MAX / 2);
        let tax = big.calculate_tax(TaxRate::from_bps(1000));
        // 461168601842738790.3 rounds down
        assert_eq!(tax.minor(), (i64::MAX / 2) / 10);
    }

    #[test]
    fn test_decimal_bridge_is_exact() {
        for minor in [0_i64, 1, 5, 35, 99, 100, 7735, 123_456_789, -550] {
            let money = Money::from_minor(minor);
            assert_eq!(Money::from_decimal(money.to_decimal()), Some(money));
        }
        // float drift from a sum still lands on the written amount
        assert_eq!(
            Money::from_decimal(40.0 + 2.0 + 35.0 + 0.35),
            Some(Money::from_minor(7735))
        );
        assert_eq!(Money::from_decimal(f64::INFINITY), None);
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let price = Money::from_minor(2000);
        assert_eq!(price.checked_multiply_quantity(3), Some(Money::from_minor(6000)));
        assert_eq!(price.checked_multiply_quantity(i64::MAX / 100), None);

        let near_max = Money::from_minor(i64::MAX - 1);
        assert_eq!(near_max.checked_add(Money::from_minor(1)), Some(Money::from_minor(i64::MAX)));
        assert_eq!(near_max.checked_add(Money::from_minor(2)), None);

        assert_eq!(
            Money::checked_sum([Money::from_minor(4000), Money::from_minor(35)]),
            Some(Money::from_minor(4035))
        );
        assert_eq!(Money::checked_sum([near_max, near_max]), None);
    }

    #[test]
    fn test_tax_saturates_above_full_rate() {
        let max = Money::from_minor(i64::MAX);
        assert_eq!(max.calculate_tax(TaxRate::from_bps(20000)).minor(), i64::MAX);
    }

    #[test]
    fn test_sum() {
        let parts = [Money::from_minor(4000), Money::from_minor(200), Money::from_minor(35)];
        let total: Money = parts.iter().sum();
        assert_eq!(total.minor(), 4235);
    }

    /// 0.1 + 0.2 in floats is not 0.3; in minor units it is.
    #[test]
    fn test_no_float_drift() {
        let total: Money = (0..3).map(|_| Money::from_minor(10)).sum();
        assert_eq!(total, Money::from_minor(30));
        assert!((0.1_f64 + 0.2_f64) != 0.3_f64);
    }
}
