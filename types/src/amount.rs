//! Payment amount type.
//!
//! Amounts are represented as fixed-point integers (u128) to avoid
//! floating-point errors. The smallest unit is 1 raw; one whole unit of the
//! settlement currency is `UNIT` raw (18 decimal digits of precision).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Raw units per whole currency unit (18 decimals).
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// A payment amount, stored as raw units (u128) for precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Whole currency units, e.g. `Amount::from_whole(2)` is 2.0.
    pub fn from_whole(units: u128) -> Self {
        Self(units * UNIT)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    /// Truncating conversion back to whole units.
    pub fn to_whole(&self) -> u128 {
        self.0 / UNIT
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Split into two halves; the first half receives the odd raw unit.
    pub fn split_even(self) -> (Self, Self) {
        let half = self.0 / 2;
        (Self(self.0 - half), Self(half))
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / UNIT;
        let frac = self.0 % UNIT;
        if frac == 0 {
            write!(f, "{whole}")
        } else {
            let s = format!("{frac:018}");
            write!(f, "{}.{}", whole, s.trim_end_matches('0'))
        }
    }
}
