//! Currency amounts as integer cents.
//!
//! Blobs written by earlier versions hold amounts as plain JSON numbers
//! (`500`, `150.5`); those are accepted and rounded to the nearest cent.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Whole currency units, e.g. `Money::from_major(500)` is $500.00.
    pub const fn from_major(units: i64) -> Self {
        Money(units * 100)
    }

    /// Rounds half away from zero to the nearest cent.
    pub fn from_f64(amount: f64) -> Self {
        Money((amount * 100.0).round() as i64)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Mean over `count` items, rounded to the nearest cent. Zero when empty.
    pub fn average(self, count: usize) -> Money {
        if count == 0 {
            return Money::ZERO;
        }
        let n = count as i64;
        let half = n / 2;
        let rounded = if self.0 >= 0 {
            self.0.saturating_add(half) / n
        } else {
            self.0.saturating_sub(half) / n
        };
        Money(rounded)
    }

    /// Percentage of `target`, capped at 100. A zero target yields 0.
    pub fn percent_of(self, target: Money) -> f64 {
        if target.0 <= 0 {
            return 0.0;
        }
        (self.0 as f64 / target.0 as f64 * 100.0).min(100.0)
    }

    /// Plain decimal form without symbol or grouping: `1234.50`.
    pub fn to_decimal_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }

    /// Whole units from stored data, `None` past the representable range.
    pub fn checked_from_major(units: i64) -> Option<Self> {
        units.checked_mul(100).map(Money)
    }

    /// Parse user input such as `12`, `12.5`, `$1,234.56` or `-3.10`.
    pub fn parse(input: &str) -> Option<Money> {
        let cleaned: String = input
            .trim()
            .chars()
            .filter(|c| !matches!(c, '$' | ',' | ' '))
            .collect();
        if cleaned.is_empty() {
            return None;
        }

        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }

        let whole_cents = if whole.is_empty() {
            0
        } else {
            whole.parse::<i64>().ok()?.checked_mul(100)?
        };

        // Round on the third fractional digit.
        let mut frac_digits = frac.chars().map(|c| c as i64 - '0' as i64);
        let tenths = frac_digits.next().unwrap_or(0);
        let hundredths = frac_digits.next().unwrap_or(0);
        let round_up = frac_digits.next().map(|d| d >= 5).unwrap_or(false);
        let mut cents = whole_cents.checked_add(tenths * 10 + hundredths)?;
        if round_up {
            cents = cents.checked_add(1)?;
        }

        Some(Money(if negative { -cents } else { cents }))
    }
}

impl fmt::Display for Money {
    /// `$1,234.56`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let whole = (abs / 100).to_string();
        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}${grouped}.{:02}", abs % 100)
    }
}

impl FromStr for Money {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s).ok_or_else(|| format!("'{s}' is not a valid amount"))
    }
}

// Arithmetic saturates at the ends of the cent range.
impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |total, m| total + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl<'de> Visitor<'de> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an amount as a number or decimal string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                Money::checked_from_major(v)
                    .ok_or_else(|| E::custom(format!("amount {v} is out of range")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                i64::try_from(v)
                    .ok()
                    .and_then(Money::checked_from_major)
                    .ok_or_else(|| E::custom(format!("amount {v} is out of range")))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
                Ok(Money::from_f64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
                if v.trim().is_empty() {
                    return Ok(Money::ZERO);
                }
                Money::parse(v).ok_or_else(|| E::custom(format!("invalid amount '{v}'")))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Money, E> {
                Ok(Money::ZERO)
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}
