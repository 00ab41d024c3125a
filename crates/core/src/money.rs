//! Currency amounts in minor units.

use core::fmt;
use core::num::ParseIntError;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// A currency amount stored as a signed count of minor units (cents).
///
/// Amounts never carry more than two decimal places, so a price, a subtotal
/// and a total can be compared exactly. Comparisons that tolerate rounding at
/// the API boundary use [`Money::approx_eq`], whose tolerance is one cent.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    /// Largest difference (in cents) still considered equal by `approx_eq`.
    pub const TOLERANCE_CENTS: i64 = 1;

    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Whole currency units, e.g. `from_major(5)` is 5.00.
    pub const fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Parse a decimal amount such as `"12.5"` or `"-3.00"`.
    ///
    /// More than two decimal places is a validation error.
    pub fn parse(input: &str) -> DomainResult<Self> {
        let s = input.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        let dangling_point = digits.contains('.') && frac.is_empty();
        if whole.is_empty() || !all_digits(whole) || !all_digits(frac) || dangling_point {
            return Err(DomainError::validation(format!("invalid amount '{input}'")));
        }
        if frac.len() > 2 {
            return Err(DomainError::validation(format!(
                "amount '{input}' must have at most 2 decimal places"
            )));
        }

        let out_of_range =
            |_: ParseIntError| DomainError::validation(format!("amount '{input}' is out of range"));
        let whole: i64 = whole.parse().map_err(out_of_range)?;
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(out_of_range)? * 10,
            _ => frac.parse::<i64>().map_err(out_of_range)?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .ok_or_else(|| DomainError::validation(format!("amount '{input}' is out of range")))?;

        Ok(Self(if negative { -cents } else { cents }))
    }

    pub fn checked_add(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::validation("amount overflow"))
    }

    /// `self × quantity`, e.g. unit price times item quantity.
    pub fn times(self, quantity: u32) -> DomainResult<Money> {
        self.0
            .checked_mul(i64::from(quantity))
            .map(Money)
            .ok_or_else(|| DomainError::validation("amount overflow"))
    }

    /// Sum of amounts, failing on overflow.
    pub fn sum<I>(amounts: I) -> DomainResult<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }

    pub fn abs_diff(self, other: Money) -> u64 {
        self.0.abs_diff(other.0)
    }

    /// Equal within one cent.
    pub fn approx_eq(self, other: Money) -> bool {
        self.abs_diff(other) <= Self::TOLERANCE_CENTS as u64
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_forms() {
        assert_eq!(Money::parse("12").unwrap(), Money::from_cents(1200));
        assert_eq!(Money::parse("12.5").unwrap(), Money::from_cents(1250));
        assert_eq!(Money::parse(" 0.07 ").unwrap(), Money::from_cents(7));
        assert_eq!(Money::parse("-3.00").unwrap(), Money::from_cents(-300));
    }

    #[test]
    fn rejects_more_than_two_decimals() {
        let err = Money::parse("1.999").unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("2 decimal places")));
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "abc", "1.", ".5", "1.2.3", "1,50", "--1"] {
            assert!(Money::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn oversized_amounts_are_out_of_range() {
        for big in ["99999999999999999999", "92233720368547758.08"] {
            let err = Money::parse(big).unwrap_err();
            assert!(matches!(err, DomainError::Validation(msg) if msg.contains("out of range")));
        }
    }

    #[test]
    fn display_pads_cents() {
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(5000).to_string(), "50.00");
        assert_eq!(Money::from_cents(-250).to_string(), "-2.50");
    }

    #[test]
    fn approx_eq_tolerates_one_cent() {
        let a = Money::from_cents(1000);
        assert!(a.approx_eq(Money::from_cents(1001)));
        assert!(a.approx_eq(Money::from_cents(999)));
        assert!(!a.approx_eq(Money::from_cents(1002)));
    }

    #[test]
    fn times_and_sum_detect_overflow() {
        assert_eq!(Money::from_cents(250).times(4).unwrap(), Money::from_major(10));
        assert!(Money::from_cents(i64::MAX).times(2).is_err());
        assert!(Money::sum([Money::from_cents(i64::MAX), Money::from_cents(1)]).is_err());
    }

    #[test]
    fn serializes_as_cents() {
        let json = serde_json::to_string(&Money::from_cents(1999)).unwrap();
        assert_eq!(json, "1999");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: Display output parses back to the same amount.
            #[test]
            fn display_parses_back(cents in -1_000_000_000i64..1_000_000_000i64) {
                let m = Money::from_cents(cents);
                prop_assert_eq!(Money::parse(&m.to_string()).unwrap(), m);
            }

            /// Property: a sum equals the sum of the parts' cents.
            #[test]
            fn sum_matches_cents(parts in prop::collection::vec(0i64..10_000_000, 0..20)) {
                let expected: i64 = parts.iter().sum();
                let total = Money::sum(parts.into_iter().map(Money::from_cents)).unwrap();
                prop_assert_eq!(total.cents(), expected);
            }
        }
    }
}
