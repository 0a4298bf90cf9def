//! Round counters with an explicit indefinite state.
//!
//! Mode abilities stay engaged until canceled. Rather than storing a very large
//! sentinel, the remaining time is either a finite number of rounds or
//! [`Rounds::Indefinite`]. Arithmetic saturates: nothing subtracts below zero
//! and nothing added to an indefinite count becomes finite.

use std::fmt;
use std::ops::Add;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "i64", from = "i64"))]
pub enum Rounds {
    Finite(u32),
    Indefinite,
}

impl Rounds {
    pub const ZERO: Self = Self::Finite(0);

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    pub fn is_indefinite(self) -> bool {
        matches!(self, Self::Indefinite)
    }

    /// Subtracts `rounds`, flooring at zero. Indefinite counts never shrink.
    pub fn saturating_sub(self, rounds: u32) -> Self {
        match self {
            Self::Finite(left) => Self::Finite(left.saturating_sub(rounds)),
            Self::Indefinite => Self::Indefinite,
        }
    }

    /// Finite value, if any.
    pub fn finite(self) -> Option<u32> {
        match self {
            Self::Finite(left) => Some(left),
            Self::Indefinite => None,
        }
    }

    /// Label shown next to slot icons; an infinity glyph once the count
    /// exceeds `threshold` or is indefinite.
    pub fn label(self, threshold: u32) -> String {
        match self {
            Self::Finite(left) if left <= threshold => left.to_string(),
            _ => "\u{221e}".to_string(),
        }
    }
}

impl Default for Rounds {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<u32> for Rounds {
    fn from(value: u32) -> Self {
        Self::Finite(value)
    }
}

impl Add for Rounds {
    type Output = Rounds;

    fn add(self, rhs: Rounds) -> Rounds {
        match (self, rhs) {
            (Self::Finite(a), Self::Finite(b)) => Self::Finite(a.saturating_add(b)),
            _ => Self::Indefinite,
        }
    }
}

impl Add<u32> for Rounds {
    type Output = Rounds;

    fn add(self, rhs: u32) -> Rounds {
        self + Rounds::Finite(rhs)
    }
}

// Save records store round counts as integers; -1 marks an indefinite count.
impl From<Rounds> for i64 {
    fn from(value: Rounds) -> i64 {
        match value {
            Rounds::Finite(left) => i64::from(left),
            Rounds::Indefinite => -1,
        }
    }
}

impl From<i64> for Rounds {
    fn from(value: i64) -> Rounds {
        // Negative values and anything past u32 both load as indefinite.
        u32::try_from(value).map_or(Rounds::Indefinite, Rounds::Finite)
    }
}

impl fmt::Display for Rounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(left) => write!(f, "{left}"),
            Self::Indefinite => write!(f, "\u{221e}"),
        }
    }
}
