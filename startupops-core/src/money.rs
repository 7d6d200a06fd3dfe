//! Currency amounts held as whole cents
//!
//! Workspace files keep amounts as plain decimal numbers (`1200.5`); they are
//! rounded to the nearest cent when read, and all arithmetic happens on the
//! integer cent count.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

use crate::error::OpsError;

const CENTS_PER_UNIT: i64 = 100;

/// An amount of money in cents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Whole currency units (`Money::from_units(12)` is 12.00)
    pub const fn from_units(units: i64) -> Self {
        Money(units * CENTS_PER_UNIT)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Approximate value in currency units, for display and ratios only
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / CENTS_PER_UNIT as f64
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Rounded to whole units, half away from zero
    pub fn round_units(self) -> i64 {
        let half = CENTS_PER_UNIT / 2;
        if self.0 >= 0 {
            (self.0 + half) / CENTS_PER_UNIT
        } else {
            (self.0 - half) / CENTS_PER_UNIT
        }
    }
}

impl From<f64> for Money {
    fn from(value: f64) -> Self {
        // `as` saturates and maps NaN to zero
        Money((value * CENTS_PER_UNIT as f64).round() as i64)
    }
}

impl From<Money> for f64 {
    fn from(value: Money) -> Self {
        value.as_f64()
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / CENTS_PER_UNIT as u64;
        let cents = abs % CENTS_PER_UNIT as u64;
        write!(f, "{}{}.{:02}", sign, units, cents)
    }
}

/// Parses a decimal amount with at most two fractional digits. Thousands
/// separators are ignored; exponents, `inf` and `NaN` are rejected.
impl FromStr for Money {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || OpsError::InvalidAmount(s.to_string());
        let cleaned = s.trim().replace(',', "");
        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.strip_prefix('+').unwrap_or(cleaned.as_str())),
        };

        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if fraction.len() > 2 || !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let units: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
        let mut cents: i64 = if fraction.is_empty() { 0 } else { fraction.parse().map_err(|_| invalid())? };
        if fraction.len() == 1 {
            cents *= 10;
        }

        let total = units
            .checked_mul(CENTS_PER_UNIT)
            .and_then(|c| c.checked_add(cents))
            .ok_or_else(invalid)?;
        Ok(Money(if negative { -total } else { total }))
    }
}
