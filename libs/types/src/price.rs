//! Fixed-point price types
//!
//! `FixedPrice` is a signed integer scaled by 10^7, giving exact
//! addition/subtraction and a total ordering that is consistent with
//! the underlying integer. Division rounds half-to-even so repeated
//! average-price calculations stay deterministic across platforms.
//!
//! Market orders carry no limit price; `Price` makes that explicit
//! with a `Market` variant instead of infinite sentinel values.
//! Serialized as a decimal string to prevent JSON number precision
//! loss.

use crate::errors::PriceParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

/// Number of fractional decimal digits carried by every price.
pub const SCALE_DIGITS: u32 = 7;

/// Scaling factor: `10^SCALE_DIGITS`.
pub const SCALE: i64 = 10_000_000;

/// Decimal price with seven fixed fractional digits.
///
/// Internally a scaled `i64`; all arithmetic is integer arithmetic.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FixedPrice(i64);

impl FixedPrice {
    pub const ZERO: FixedPrice = FixedPrice(0);

    /// Wrap an already-scaled raw value.
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Create from a whole number of currency units.
    ///
    /// # Panics
    /// Panics if the value does not fit the scaled representation.
    pub fn from_int(value: i64) -> Self {
        let raw = value.checked_mul(SCALE);
        assert!(raw.is_some(), "price {value} overflows the fixed-point range");
        Self(raw.unwrap_or(0))
    }

    /// Get the scaled raw value.
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Checked addition.
    pub fn checked_add(self, rhs: FixedPrice) -> Option<FixedPrice> {
        self.0.checked_add(rhs.0).map(FixedPrice)
    }

    /// Checked subtraction.
    pub fn checked_sub(self, rhs: FixedPrice) -> Option<FixedPrice> {
        self.0.checked_sub(rhs.0).map(FixedPrice)
    }

    /// Running volume-weighted average: blend this price (carrying
    /// `own_weight`) with `price` (carrying `weight`).
    ///
    /// Used for average-fill-price accounting. The division rounds
    /// half-to-even. `own_weight + weight` must be non-zero.
    pub fn weighted_avg(self, own_weight: u64, price: FixedPrice, weight: u64) -> FixedPrice {
        let total = own_weight + weight;
        debug_assert!(total > 0, "weighted average of zero quantity");
        let numerator =
            self.0 as i128 * own_weight as i128 + price.0 as i128 * weight as i128;
        // |avg| <= max(|self|, |price|), so the i64 cast cannot lose bits.
        FixedPrice(div_half_even(numerator, total as i128) as i64)
    }
}

/// Integer division rounding half-to-even (banker's rounding).
fn div_half_even(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder == 0 {
        return quotient;
    }
    let twice = remainder.unsigned_abs() * 2;
    let magnitude = denominator.unsigned_abs();
    let round_away = twice > magnitude || (twice == magnitude && quotient % 2 != 0);
    if !round_away {
        quotient
    } else if (numerator < 0) != (denominator < 0) {
        quotient - 1
    } else {
        quotient + 1
    }
}

impl Add for FixedPrice {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for FixedPrice {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul for FixedPrice {
    type Output = Self;

    /// Fixed-point multiply via an `i128` intermediate, rounding
    /// half-to-even on the rescale.
    ///
    /// # Panics
    /// Panics if the product does not fit the scaled representation.
    fn mul(self, rhs: Self) -> Self::Output {
        let wide = div_half_even(self.0 as i128 * rhs.0 as i128, SCALE as i128);
        match i64::try_from(wide) {
            Ok(raw) => Self(raw),
            Err(_) => panic!("fixed-point overflow in multiply"),
        }
    }
}

impl Div for FixedPrice {
    type Output = Self;

    /// Fixed-point divide, rounding half-to-even.
    ///
    /// # Panics
    /// Panics on division by zero or overflow.
    fn div(self, rhs: Self) -> Self::Output {
        assert!(rhs.0 != 0, "division by zero price");
        let wide = div_half_even(self.0 as i128 * SCALE as i128, rhs.0 as i128);
        match i64::try_from(wide) {
            Ok(raw) => Self(raw),
            Err(_) => panic!("fixed-point overflow in divide"),
        }
    }
}

impl FromStr for FixedPrice {
    type Err = PriceParseError;

    /// Parse `[-]?DIGITS(.DIGITS)?` into the scaled representation.
    ///
    /// A leading bare fraction such as `".001"` is accepted for
    /// compatibility with hand-written fixtures; an empty string,
    /// a lone sign and a trailing dot are rejected. Values that do
    /// not fit the scaled `i64` are rejected as overflow.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((int_part, frac_part)) => {
                if frac_part.is_empty() {
                    return Err(PriceParseError::Empty);
                }
                (int_part, frac_part)
            }
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(PriceParseError::Empty);
        }
        if frac_part.len() > SCALE_DIGITS as usize {
            return Err(PriceParseError::TooManyFractionalDigits {
                max: SCALE_DIGITS,
                got: frac_part.len(),
            });
        }

        let mut magnitude: i128 = 0;
        for c in int_part.chars() {
            let digit = c.to_digit(10).ok_or(PriceParseError::InvalidDigit(c))? as i128;
            magnitude = magnitude
                .checked_mul(10)
                .and_then(|m| m.checked_add(digit))
                .ok_or(PriceParseError::Overflow)?;
        }
        magnitude = magnitude
            .checked_mul(SCALE as i128)
            .ok_or(PriceParseError::Overflow)?;

        let mut frac: i128 = 0;
        for c in frac_part.chars() {
            let digit = c.to_digit(10).ok_or(PriceParseError::InvalidDigit(c))? as i128;
            frac = frac * 10 + digit;
        }
        frac *= 10_i128.pow(SCALE_DIGITS - frac_part.len() as u32);
        magnitude += frac;

        let signed = if negative { -magnitude } else { magnitude };
        i64::try_from(signed)
            .map(FixedPrice)
            .map_err(|_| PriceParseError::Overflow)
    }
}

impl fmt::Display for FixedPrice {
    /// Render with all seven fractional digits, e.g. `1.5000000`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{sign}{}.{:07}",
            magnitude / SCALE as u64,
            magnitude % SCALE as u64
        )
    }
}

impl fmt::Debug for FixedPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedPrice({self})")
    }
}

// Custom serialization to preserve precision
impl Serialize for FixedPrice {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FixedPrice {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Price of an order: either a finite limit or "cross anything".
///
/// Market orders never rest on the book, so a `Market` price is only
/// ever observed on an in-flight aggressor. `Price` deliberately has
/// no `Ord`: how a market price ranks depends on the side of the
/// book it sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Price {
    /// No price limit; crosses any finite opposite price.
    Market,
    /// Finite limit price.
    Limit(FixedPrice),
}

impl Price {
    pub fn is_market(self) -> bool {
        matches!(self, Price::Market)
    }

    /// The finite limit price, if any.
    pub fn limit(self) -> Option<FixedPrice> {
        match self {
            Price::Market => None,
            Price::Limit(price) => Some(price),
        }
    }
}

impl From<FixedPrice> for Price {
    fn from(price: FixedPrice) -> Self {
        Price::Limit(price)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Market => write!(f, "MARKET"),
            Price::Limit(price) => write!(f, "{price}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(s: &str) -> FixedPrice {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_whole_number() {
        assert_eq!(px("1").raw(), SCALE);
        assert_eq!(px("250").raw(), 250 * SCALE);
    }

    #[test]
    fn test_parse_fraction() {
        assert_eq!(px("1.5").raw(), 15_000_000);
        assert_eq!(px("0.0000001").raw(), 1);
        assert_eq!(px(".001").raw(), 10_000);
    }

    #[test]
    fn test_parse_negative() {
        assert_eq!(px("-1.5").raw(), -15_000_000);
        assert_eq!(px("-0.0000001").raw(), -1);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(FixedPrice::from_str("").is_err());
        assert!(FixedPrice::from_str("-").is_err());
        assert!(FixedPrice::from_str(".").is_err());
        assert!(FixedPrice::from_str("1.").is_err());
        assert!(FixedPrice::from_str("1.2.3").is_err());
        assert!(FixedPrice::from_str("abc").is_err());
        assert!(FixedPrice::from_str("1,5").is_err());
    }

    #[test]
    fn test_parse_rejects_excess_precision() {
        assert_eq!(
            FixedPrice::from_str("1.00000001"),
            Err(PriceParseError::TooManyFractionalDigits { max: 7, got: 8 })
        );
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert_eq!(
            FixedPrice::from_str("99999999999999999999"),
            Err(PriceParseError::Overflow)
        );
    }

    #[test]
    fn test_render_preserves_trailing_zeros() {
        assert_eq!(px("1.5").to_string(), "1.5000000");
        assert_eq!(px("0").to_string(), "0.0000000");
        assert_eq!(px("-2.25").to_string(), "-2.2500000");
    }

    #[test]
    fn test_parse_render_roundtrip() {
        for s in ["0.0000000", "1.0000000", "-1.0000001", "123.4567890"] {
            assert_eq!(px(s).to_string(), s);
        }
    }

    #[test]
    fn test_ordering_total() {
        assert!(px("-1") < px("0"));
        assert!(px("0") < px("0.0000001"));
        assert!(px("1.5") < px("2"));
        assert_eq!(px("1.50"), px("1.5"));
    }

    #[test]
    fn test_add_sub_exact() {
        assert_eq!(px("1") + px(".001"), px("1.001"));
        assert_eq!(px("2.5") - px("1.25"), px("1.25"));
        assert_eq!(px("1") - px("2"), px("-1"));
    }

    #[test]
    fn test_mul() {
        assert_eq!(px("1.5") * px("2"), px("3"));
        assert_eq!(px("0.1") * px("0.1"), px("0.01"));
        assert_eq!(px("-1.5") * px("2"), px("-3"));
    }

    #[test]
    fn test_div_half_even() {
        assert_eq!(px("3") / px("2"), px("1.5"));
        // 1 / 3 = 0.33333333... -> 0.3333333
        assert_eq!(px("1") / px("3"), px("0.3333333"));
        // 0.0000005 / 2 = 0.00000025 -> ties to even 0.0000002
        assert_eq!(px("0.0000005") / px("2"), px("0.0000002"));
        // 0.0000015 / 2 = 0.00000075 -> ties to even 0.0000008
        assert_eq!(px("0.0000015") / px("2"), px("0.0000008"));
    }

    #[test]
    fn test_weighted_avg() {
        // 10 @ 1.00 blended with 10 @ 2.00 -> 1.50
        assert_eq!(px("1").weighted_avg(10, px("2"), 10), px("1.5"));
        // first fill: zero prior weight
        assert_eq!(FixedPrice::ZERO.weighted_avg(0, px("2"), 5), px("2"));
        // 20 @ 1.00 then 10 @ 2.50 -> (20 + 25) / 30 = 1.5
        assert_eq!(px("1").weighted_avg(20, px("2.5"), 10), px("1.5"));
    }

    #[test]
    fn test_serialization_as_string() {
        let price = px("50000.25");
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"50000.2500000\"");

        let deserialized: FixedPrice = serde_json::from_str(&json).unwrap();
        assert_eq!(price, deserialized);
    }

    #[test]
    fn test_price_kind() {
        assert!(Price::Market.is_market());
        assert!(!Price::Limit(px("1")).is_market());
        assert_eq!(Price::Limit(px("1")).limit(), Some(px("1")));
        assert_eq!(Price::Market.limit(), None);
        assert_eq!(Price::Market.to_string(), "MARKET");
        assert_eq!(Price::from(px("1.5")).to_string(), "1.5000000");
    }
}
