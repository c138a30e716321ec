//! Currency amounts held in minor units (pence).

use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount of pounds sterling stored as a whole number of pence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub i64);

impl Money {
    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn from_pence(pence: i64) -> Self {
        Self(pence)
    }

    pub const fn from_pounds(pounds: i64) -> Self {
        Self(pounds * 100)
    }

    /// Converts a major-unit amount as reported by an agent (e.g. `4200.5`).
    ///
    /// Returns `None` for NaN, infinities and values outside the representable range.
    pub fn from_major(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let pence = (value * 100.0).round();
        if pence.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(Self(pence as i64))
    }

    pub fn pence(self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Plain numeric form without symbol or grouping, as used in agent instructions.
    pub fn plain(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        if abs % 100 == 0 {
            format!("{sign}{}", abs / 100)
        } else {
            format!("{sign}{}.{:02}", abs / 100, abs % 100)
        }
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let pounds = group_thousands(abs / 100);
        if abs % 100 == 0 {
            write!(f, "{sign}£{pounds}")
        } else {
            write!(f, "{sign}£{pounds}.{:02}", abs % 100)
        }
    }
}
