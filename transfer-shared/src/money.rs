use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// An amount in euro cents.
///
/// All fares and extras are carried as integer minor units so that sums
/// never pick up binary floating point error. Formatting always renders
/// exactly two decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn from_euros(euros: i64) -> Self {
        Self(euros * 100)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn times(self, factor: i64) -> Self {
        Self(self.0 * factor)
    }

    /// Split into two halves; the odd cent, if any, goes to the first half.
    pub const fn split_in_two(self) -> (Money, Money) {
        let second = self.0 / 2;
        (Money(self.0 - second), Money(second))
    }

    /// Two-decimal rendering without the currency sign, e.g. `60.00`.
    pub fn amount_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}€", self.amount_string())
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid amount: {0}")]
pub struct MoneyParseError(pub String);

/// Parses `60`, `60.5` and `60.00`. More than two decimals is rejected
/// rather than rounded.
impl FromStr for Money {
    type Err = MoneyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('€');
        let err = || MoneyParseError(s.to_string());

        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() || frac.len() > 2 {
            return Err(err());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }

        let whole: i64 = whole.parse().map_err(|_| err())?;
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| err())? * 10,
            _ => frac.parse().map_err(|_| err())?,
        };

        let cents = whole.checked_mul(100).and_then(|c| c.checked_add(frac)).ok_or_else(err)?;
        Ok(Money(if negative { -cents } else { cents }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Money::from_euros(60).to_string(), "60.00€");
        assert_eq!(Money::from_cents(7505).to_string(), "75.05€");
        assert_eq!(Money::from_cents(5).amount_string(), "0.05");
    }

    #[test]
    fn test_parse() {
        assert_eq!("60".parse::<Money>().unwrap(), Money::from_euros(60));
        assert_eq!("60.5".parse::<Money>().unwrap(), Money::from_cents(6050));
        assert_eq!("15.00€".parse::<Money>().unwrap(), Money::from_cents(1500));
        assert!("15.005".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!(".50".parse::<Money>().is_err());
    }

    #[test]
    fn test_sum_has_no_float_drift() {
        // 0.10 + 0.20 summed many times stays exact
        let total: Money = (0..1000).map(|_| Money::from_cents(10) + Money::from_cents(20)).sum();
        assert_eq!(total, Money::from_euros(300));
    }

    #[test]
    fn test_split_in_two() {
        assert_eq!(Money::from_euros(120).split_in_two(), (Money::from_euros(60), Money::from_euros(60)));
        assert_eq!(Money::from_cents(7501).split_in_two(), (Money::from_cents(3751), Money::from_cents(3750)));
    }
}
