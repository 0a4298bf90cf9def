//! Bonus application following the layered stack.
//!
//! Flat → %Inc → More → Less → Clamp
//!
//! Effects carry bonuses tagged with the [`StatKind`] they modify. Effect sets
//! gather the bonuses for one stat into a [`BonusStack`], which is then applied
//! to the creature's base value.

use super::StatKind;

/// How a single bonus modifies a value.
///
/// - **Flat**: additive, applied first (e.g. +5 Strength)
/// - **Increased**: percentages summed then multiplied (e.g. +20%)
/// - **More**: sequential multipliers (50 = ×1.5)
/// - **Less**: sequential reductions (10 = ×0.9)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum BonusKind {
    Flat(i32),
    Increased(i32),
    More(i32),
    Less(i32),
}

/// A modifier to one stat, carried by an effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bonus {
    pub stat: StatKind,
    pub kind: BonusKind,
}

impl Bonus {
    pub fn flat(stat: StatKind, value: i32) -> Self {
        Self {
            stat,
            kind: BonusKind::Flat(value),
        }
    }

    pub fn increased(stat: StatKind, percent: i32) -> Self {
        Self {
            stat,
            kind: BonusKind::Increased(percent),
        }
    }

    pub fn more(stat: StatKind, percent: i32) -> Self {
        Self {
            stat,
            kind: BonusKind::More(percent),
        }
    }

    pub fn less(stat: StatKind, percent: i32) -> Self {
        Self {
            stat,
            kind: BonusKind::Less(percent),
        }
    }
}

/// Bonuses for one stat, applied in stack order.
///
/// ```
/// # use tactics_core::stats::BonusStack;
/// let result = BonusStack::new()
///     .flat(5)
///     .increased(20)
///     .increased(15)
///     .more(50)
///     .less(10)
///     .apply(10, 5, 100);
/// // clamp((10 + 5) × 1.35 × 1.5 × 0.9, 5, 100)
/// assert_eq!(result, 27);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BonusStack {
    bonuses: Vec<BonusKind>,
}

impl BonusStack {
    pub fn new() -> Self {
        Self {
            bonuses: Vec::new(),
        }
    }

    pub fn add(&mut self, bonus: BonusKind) {
        self.bonuses.push(bonus);
    }

    pub fn extend(&mut self, bonuses: impl IntoIterator<Item = BonusKind>) {
        self.bonuses.extend(bonuses);
    }

    /// Applies all bonuses to `base` and clamps to `[min, max]`.
    ///
    /// ```text
    /// result = clamp((base + flat) × (1 + inc/100) × Π more × Π less, min, max)
    /// ```
    pub fn apply(&self, base: i32, min: i32, max: i32) -> i32 {
        let flat_sum: i32 = self
            .bonuses
            .iter()
            .filter_map(|b| match b {
                BonusKind::Flat(v) => Some(*v),
                _ => None,
            })
            .sum();

        let inc_sum: i32 = self
            .bonuses
            .iter()
            .filter_map(|b| match b {
                BonusKind::Increased(p) => Some(*p),
                _ => None,
            })
            .sum();

        let after_inc = if inc_sum == 0 {
            base + flat_sum
        } else {
            ((base + flat_sum) * (100 + inc_sum)) / 100
        };

        let after_more = self
            .bonuses
            .iter()
            .filter_map(|b| match b {
                BonusKind::More(p) => Some(*p),
                _ => None,
            })
            .fold(after_inc, |acc, more| (acc * (100 + more)) / 100);

        let after_less = self
            .bonuses
            .iter()
            .filter_map(|b| match b {
                BonusKind::Less(p) => Some(*p),
                _ => None,
            })
            .fold(after_more, |acc, less| (acc * (100 - less)) / 100);

        after_less.clamp(min, max)
    }

    /// Applies with the stat's own bounds.
    pub fn apply_bounded(&self, base: i32, bounds: StatBounds) -> i32 {
        self.apply(base, bounds.min, bounds.max)
    }

    pub fn is_empty(&self) -> bool {
        self.bonuses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bonuses.len()
    }
}

impl BonusStack {
    pub fn flat(mut self, value: i32) -> Self {
        self.add(BonusKind::Flat(value));
        self
    }

    pub fn increased(mut self, percent: i32) -> Self {
        self.add(BonusKind::Increased(percent));
        self
    }

    pub fn more(mut self, percent: i32) -> Self {
        self.add(BonusKind::More(percent));
        self
    }

    pub fn less(mut self, percent: i32) -> Self {
        self.add(BonusKind::Less(percent));
        self
    }
}

impl FromIterator<BonusKind> for BonusStack {
    fn from_iter<I: IntoIterator<Item = BonusKind>>(iter: I) -> Self {
        Self {
            bonuses: iter.into_iter().collect(),
        }
    }
}

/// Clamping range for a stat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatBounds {
    pub min: i32,
    pub max: i32,
}

impl StatBounds {
    /// Attributes never drop to zero.
    pub const ATTRIBUTES: Self = Self { min: 1, max: 99 };

    /// Combat values (armor, attack, damage).
    pub const COMBAT: Self = Self { min: 0, max: 9_999 };

    /// Spell resistance is a percentage.
    pub const PERCENT: Self = Self { min: 0, max: 100 };

    /// Movement cost multiplier in percent.
    pub const SPEED: Self = Self { min: 50, max: 200 };
}
