use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};

/// A signed monetary amount at cent precision. Positive is money out
/// (expense), negative is money in (income).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn from_cents(cents: i64) -> Self {
        Amount(Decimal::new(cents, 2))
    }

    pub fn to_cents(self) -> i64 {
        (self.0 * Decimal::from(100)).to_i64().unwrap()
    }

    /// Rounds to cent precision, half away from zero: -45.809 becomes -45.81.
    /// The result always carries two decimal places, so serialized amounts
    /// read "45.80" rather than "45.8".
    pub fn from_decimal(decimal: Decimal) -> Self {
        let mut rounded = decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        Amount(rounded)
    }

    /// Converts a float carried in an external report payload. Values a
    /// `Decimal` cannot represent (NaN, infinities) collapse to zero.
    pub fn from_f64(value: f64) -> Self {
        Decimal::from_f64(value)
            .map(Amount::from_decimal)
            .unwrap_or_else(Amount::zero)
    }

    pub fn zero() -> Self {
        Amount(Decimal::new(0, 2))
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn abs(self) -> Self {
        Amount(self.0.abs())
    }

    /// Positive amounts are money out.
    pub fn is_expense(self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Negative amounts are money in.
    pub fn is_income(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Amount(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Amount(self.0 - rhs.0)
    }
}

impl Neg for Amount {
    type Output = Self;
    fn neg(self) -> Self {
        Amount(-self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn rounds_half_away_from_zero() {
        let d = Decimal::from_str("-45.809").unwrap();
        assert_eq!(Amount::from_decimal(d).to_string(), "-45.81");
        let d = Decimal::from_str("45.805").unwrap();
        assert_eq!(Amount::from_decimal(d).to_string(), "45.81");
    }

    #[test]
    fn cents_round_trip() {
        assert_eq!(Amount::from_cents(4580).to_cents(), 4580);
        assert_eq!(Amount::from_cents(-200000).to_string(), "-2000.00");
    }

    #[test]
    fn sign_predicates() {
        assert!(Amount::from_cents(4580).is_expense());
        assert!(Amount::from_cents(-4580).is_income());
        assert!(!Amount::zero().is_expense());
        assert!(!Amount::zero().is_income());
    }

    #[test]
    fn abs_and_neg() {
        let a = Amount::from_cents(-999);
        assert_eq!(a.abs(), Amount::from_cents(999));
        assert_eq!(-a, Amount::from_cents(999));
    }

    #[test]
    fn from_f64_pins_two_places() {
        assert_eq!(Amount::from_f64(161.0).to_string(), "161.00");
        assert_eq!(Amount::from_f64(-45.809).to_string(), "-45.81");
        assert_eq!(Amount::from_f64(f64::NAN), Amount::zero());
    }
}
