//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  An invoice with 40 lines of float math drifts by whole cents.          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every amount is an i64 in cents. Percentage math happens in          │
//! │    basis points with i128 intermediates, rounded half-up at 1 cent.     │
//! │    When rounding loses a cent, we know exactly where it went.           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use garage_core::money::Money;
//! use garage_core::types::Rate;
//!
//! // A part that cost the shop 1,000.00
//! let cost = Money::from_cents(100_000);
//!
//! // 20% markup -> customer unit price 1,200.00
//! let price = cost.apply_markup(Rate::from_bps(2_000));
//! assert_eq!(price.cents(), 120_000);
//!
//! // 16% VAT on 2,160.00 -> 345.60
//! let vat = Money::from_cents(216_000).vat_amount(Rate::from_bps(1_600));
//! assert_eq!(vat.cents(), 34_560);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::Rate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for losses and corrections
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money Flows
/// ```text
/// LaborCharge.amount ──┐
/// SupplierInvoiceItem.unit_cost ──┼──► PricingCalculator ──► CustomerInvoice
/// SubcontractWork.cost ──┘             (markup, discount, VAT)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use garage_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -5.50, not -4.50
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Applies a markup percentage to a cost, producing the selling price.
    ///
    /// ## Formula
    /// `price = cost × (1 + rate)` with half-up rounding at 1 cent.
    ///
    /// ## Example
    /// ```rust
    /// use garage_core::money::Money;
    /// use garage_core::types::Rate;
    ///
    /// let cost = Money::from_cents(100_000);           // 1,000.00
    /// let price = cost.apply_markup(Rate::from_bps(2_000)); // 20%
    /// assert_eq!(price.cents(), 120_000);              // 1,200.00
    /// ```
    pub fn apply_markup(&self, rate: Rate) -> Money {
        // i128 intermediates prevent overflow on large amounts
        let priced =
            (self.0 as i128 * (10_000 + rate.bps() as i128) + 5_000) / 10_000;
        Money::from_cents(priced as i64)
    }

    /// Calculates the discount amount for a percentage rate.
    ///
    /// ## Example
    /// ```rust
    /// use garage_core::money::Money;
    /// use garage_core::types::Rate;
    ///
    /// let subtotal = Money::from_cents(240_000);              // 2,400.00
    /// let disc = subtotal.discount_amount(Rate::from_bps(1_000)); // 10%
    /// assert_eq!(disc.cents(), 24_000);                       // 240.00
    /// ```
    pub fn discount_amount(&self, rate: Rate) -> Money {
        let amount = (self.0 as i128 * rate.bps() as i128 + 5_000) / 10_000;
        Money::from_cents(amount as i64)
    }

    /// Applies a percentage discount and returns the remaining amount.
    ///
    /// Equivalent to `self - self.discount_amount(rate)`, so the discount
    /// amount and the discounted total always add back to the original.
    pub fn apply_discount(&self, rate: Rate) -> Money {
        *self - self.discount_amount(rate)
    }

    /// Calculates VAT on this amount with half-up rounding at 1 cent.
    ///
    /// ## Example
    /// ```rust
    /// use garage_core::money::Money;
    /// use garage_core::types::Rate;
    ///
    /// let net = Money::from_cents(300_000);           // 3,000.00
    /// let vat = net.vat_amount(Rate::from_bps(1_600)); // 16%
    /// assert_eq!(vat.cents(), 48_000);                // 480.00
    /// ```
    pub fn vat_amount(&self, rate: Rate) -> Money {
        let vat = (self.0 as i128 * rate.bps() as i128 + 5_000) / 10_000;
        Money::from_cents(vat as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use garage_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(120_000);
    /// let line_total = unit_price.times(2);
    /// assert_eq!(line_total.cents(), 240_000);
    /// ```
    #[inline]
    pub const fn times(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs, outstanding-item descriptions, and debugging.
/// Currency symbols and localization belong to a presentation layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

/// Default money is zero.
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        let money = Money::from_major_minor(10, 99);
        assert_eq!(money.cents(), 1099);

        let negative = Money::from_major_minor(-5, 50);
        assert_eq!(negative.cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
    }

    #[test]
    fn test_markup_exact() {
        // 1,000.00 at 20% markup = 1,200.00
        let cost = Money::from_cents(100_000);
        assert_eq!(cost.apply_markup(Rate::from_bps(2_000)).cents(), 120_000);

        // 0% markup leaves the cost unchanged (labor convention)
        assert_eq!(cost.apply_markup(Rate::zero()).cents(), 100_000);
    }

    #[test]
    fn test_markup_rounding() {
        // 3.33 at 15% = 3.8295 -> 3.83 (half-up)
        let cost = Money::from_cents(333);
        assert_eq!(cost.apply_markup(Rate::from_bps(1_500)).cents(), 383);
    }

    #[test]
    fn test_vat_exact() {
        // 3,000.00 at 16% = 480.00
        let net = Money::from_cents(300_000);
        assert_eq!(net.vat_amount(Rate::from_bps(1_600)).cents(), 48_000);

        // 2,160.00 at 16% = 345.60
        let net = Money::from_cents(216_000);
        assert_eq!(net.vat_amount(Rate::from_bps(1_600)).cents(), 34_560);
    }

    #[test]
    fn test_discount_splits_cleanly() {
        // discount_amount + apply_discount always reconstruct the original
        for cents in [0, 1, 99, 12345, 999_999] {
            let amount = Money::from_cents(cents);
            let rate = Rate::from_bps(1_250); // 12.5%
            let disc = amount.discount_amount(rate);
            let after = amount.apply_discount(rate);
            assert_eq!(disc + after, amount);
        }
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 200, 300]
            .iter()
            .map(|c| Money::from_cents(*c))
            .sum();
        assert_eq!(total.cents(), 600);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
    }
}
