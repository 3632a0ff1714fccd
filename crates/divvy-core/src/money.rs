//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing receipt lines as floats:                                       │
//! │    3.10 + 2.20 = 5.300000000000001  ❌ WRONG!                           │
//! │                                                                         │
//! │  Splitting a shared pool:                                               │
//! │    $10.00 / 3 = $3.33 (×3 = $9.99)  → Lost $0.01!                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Receipt text "3.10" is parsed straight into 310 cents               │
//! │    1000 cents / 3 = 333 cents, residue of 1 cent is reported           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use divvy_core::money::Money;
//!
//! // Parse straight from receipt text
//! let price: Money = "10.99".parse().unwrap();
//! assert_eq!(price.cents(), 1099);
//!
//! // Arithmetic operations
//! let total = price + Money::from_cents(500); // $15.99
//! assert_eq!(total.to_string(), "$15.99");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ParseError;
use crate::types::DiscountRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: Discount lines are negative adjustments
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  "Milk   3.00" ──► GroceryItem.price ──► Cart.total ──► Settlement      │
/// │                                                                         │
/// │  "Member Price Saving -1.00" ──► folded into the preceding item price   │
/// │                                                                         │
/// │  "TOTAL   $45.60" ──► Receipt.declared_total ──► reconciliation check  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use divvy_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the dollar portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
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

    /// Formats the amount without a currency symbol, always with two
    /// fraction digits (`-1.00`, `2.50`).
    ///
    /// This is the inverse of [`Money::from_str`] for normalized input and
    /// the format written to the shopper ledger.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }

    /// Divides the amount into `parts` equal shares, rounding each share
    /// half-up to the cent.
    ///
    /// Returns `None` when `parts` is zero.
    ///
    /// ## Example
    /// ```rust
    /// use divvy_core::money::Money;
    ///
    /// let pool = Money::from_cents(1000);
    /// assert_eq!(pool.split_evenly(3), Some(Money::from_cents(333)));
    /// assert_eq!(Money::from_cents(500).split_evenly(3), Some(Money::from_cents(167)));
    /// ```
    pub fn split_evenly(&self, parts: usize) -> Option<Money> {
        if parts == 0 {
            return None;
        }
        let share = div_round_half_up(self.0 as i128, parts as i128);
        Some(Money::from_cents(share as i64))
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// The discount itself is rounded half-up to the cent exactly once.
    ///
    /// ## Example
    /// ```rust
    /// use divvy_core::money::Money;
    /// use divvy_core::types::DiscountRate;
    ///
    /// let price = Money::from_cents(1099);
    /// let discounted = price.apply_discount(DiscountRate::from_bps(1000)); // 10% off
    /// assert_eq!(discounted.cents(), 989); // 1099 - 110
    /// ```
    pub fn apply_discount(&self, rate: DiscountRate) -> Money {
        let discount = div_round_half_up(self.0 as i128 * rate.bps() as i128, 10_000);
        Money::from_cents(self.0 - discount as i64)
    }
}

/// Integer division rounding halves away from zero.
pub(crate) fn div_round_half_up(numerator: i128, denominator: i128) -> i128 {
    let magnitude = (2 * numerator.abs() + denominator.abs()) / (2 * denominator.abs());
    if (numerator < 0) != (denominator < 0) {
        -magnitude
    } else {
        magnitude
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses receipt-style decimal text into cents.
///
/// Accepts an optional leading `-`, an optional `$`, a digit run and an
/// optional fraction of at most two digits: `3`, `3.5`, `-1.00`, `$45.60`,
/// `-$2.00`. Anything else is [`ParseError::PriceUnparseable`].
impl FromStr for Money {
    type Err = ParseError;

    /// Parses `3`, `3.5`, `.99`, `$45.60`, `-1.00` or `-$2.00`. More than two
    /// fraction digits is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s, false)
    }
}

impl Money {
    /// Parses like [`FromStr`] but accepts any number of fraction digits,
    /// rounding half away from zero to the cent.
    ///
    /// ## Example
    /// ```rust
    /// use divvy_core::money::Money;
    ///
    /// assert_eq!(Money::parse_rounded("5.300000000000001").unwrap().cents(), 530);
    /// assert_eq!(Money::parse_rounded("0.125").unwrap().cents(), 13);
    /// ```
    pub fn parse_rounded(s: &str) -> Result<Self, ParseError> {
        parse_decimal(s, true)
    }
}

fn parse_decimal(s: &str, round_extra_digits: bool) -> Result<Money, ParseError> {
    let unparseable = || ParseError::PriceUnparseable {
        text: s.to_string(),
    };

    let mut rest = s.trim();
    let mut negative = false;
    if let Some(stripped) = rest.strip_prefix('-') {
        negative = true;
        rest = stripped;
    }
    rest = rest.strip_prefix('$').unwrap_or(rest);
    if !negative {
        if let Some(stripped) = rest.strip_prefix('-') {
            negative = true;
            rest = stripped;
        }
    }

    let (whole, fraction) = match rest.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (rest, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(unparseable());
    }
    if !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
        || (fraction.len() > 2 && !round_extra_digits)
    {
        return Err(unparseable());
    }

    let dollars: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| unparseable())?
    };

    let (kept, dropped) = fraction.split_at(fraction.len().min(2));
    let mut cents: i64 = match kept.len() {
        0 => 0,
        1 => kept.parse::<i64>().map_err(|_| unparseable())? * 10,
        _ => kept.parse().map_err(|_| unparseable())?,
    };
    if dropped.starts_with(|c: char| ('5'..='9').contains(&c)) {
        cents += 1;
    }

    let total = dollars
        .checked_mul(100)
        .and_then(|d| d.checked_add(cents))
        .ok_or_else(unparseable)?;

    Ok(Money(if negative { -total } else { total }))
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money as `$10.99` / `-$5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by a head count (pool share × participants).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
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
    use proptest::prelude::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_parse_receipt_amounts() {
        assert_eq!("2.50".parse::<Money>().unwrap().cents(), 250);
        assert_eq!("3".parse::<Money>().unwrap().cents(), 300);
        assert_eq!("3.5".parse::<Money>().unwrap().cents(), 350);
        assert_eq!(".99".parse::<Money>().unwrap().cents(), 99);
        assert_eq!("-1.00".parse::<Money>().unwrap().cents(), -100);
        assert_eq!("$45.60".parse::<Money>().unwrap().cents(), 4560);
        assert_eq!("-$2.00".parse::<Money>().unwrap().cents(), -200);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for text in ["", ".", "1.2.3", "1.005", "abc", "12a", "$", "-"] {
            assert!(
                matches!(
                    text.parse::<Money>(),
                    Err(ParseError::PriceUnparseable { .. })
                ),
                "{text:?} should not parse"
            );
        }
    }

    #[test]
    fn test_parse_rounded_to_cent() {
        assert_eq!(Money::parse_rounded("5.300000000000001").unwrap().cents(), 530);
        assert_eq!(Money::parse_rounded("12.345").unwrap().cents(), 1235);
        assert_eq!(Money::parse_rounded("12.344999").unwrap().cents(), 1234);
        assert_eq!(Money::parse_rounded("0.995").unwrap().cents(), 100);
        assert_eq!(Money::parse_rounded("-1.005").unwrap().cents(), -101);
        assert_eq!(Money::parse_rounded("12.5").unwrap().cents(), 1250);
        assert!(Money::parse_rounded("1.2x").is_err());
    }

    #[test]
    fn test_decimal_string() {
        assert_eq!(Money::from_cents(200).to_decimal_string(), "2.00");
        assert_eq!(Money::from_cents(-100).to_decimal_string(), "-1.00");
        assert_eq!(Money::from_cents(5).to_decimal_string(), "0.05");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-b).cents(), -500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!([a, b].iter().sum::<Money>().cents(), 1500);
    }

    #[test]
    fn test_split_evenly_rounds_half_up() {
        assert_eq!(Money::from_cents(900).split_evenly(3).unwrap().cents(), 300);
        assert_eq!(Money::from_cents(1000).split_evenly(3).unwrap().cents(), 333);
        assert_eq!(Money::from_cents(1001).split_evenly(2).unwrap().cents(), 501);
        assert_eq!(Money::from_cents(-1001).split_evenly(2).unwrap().cents(), -501);
        assert!(Money::from_cents(100).split_evenly(0).is_none());
    }

    #[test]
    fn test_apply_discount() {
        let price = Money::from_cents(10000);
        assert_eq!(price.apply_discount(DiscountRate::from_bps(1000)).cents(), 9000);

        // 5% of $2.50 is 12.5 cents, rounded half-up to 13
        let price = Money::from_cents(250);
        assert_eq!(price.apply_discount(DiscountRate::from_bps(500)).cents(), 237);
    }

    /// $10.00 split three ways loses a cent; the settlement layer reports it.
    #[test]
    fn test_division_precision_loss_documented() {
        let ten_dollars = Money::from_cents(1000);
        let one_third = ten_dollars.split_evenly(3).unwrap();
        let reconstructed = one_third * 3;

        assert_eq!(reconstructed.cents(), 999);
        assert_eq!((ten_dollars - reconstructed).cents(), 1);
    }

    proptest! {
        #[test]
        fn prop_format_parse_round_trip(cents in -10_000_000i64..10_000_000) {
            let money = Money::from_cents(cents);
            let text = money.to_decimal_string();
            prop_assert_eq!(text.parse::<Money>().unwrap(), money);
        }

        #[test]
        fn prop_well_formed_tokens_parse_exactly(dollars in 0u32..100_000, cents in 0u32..100) {
            let text = format!("${}.{:02}", dollars, cents);
            let parsed: Money = text.parse().unwrap();
            prop_assert_eq!(parsed.cents(), dollars as i64 * 100 + cents as i64);
            prop_assert_eq!(format!("{}", parsed), text);
        }
    }
}
