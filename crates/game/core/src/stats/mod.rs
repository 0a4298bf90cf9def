//! Stats touched by effects.
//!
//! The creature stat model is intentionally small: a base value per
//! [`StatKind`] plus whatever bonuses its effect set contributes. Full stat
//! formulas live outside this crate.

pub mod bonus;

pub use bonus::{Bonus, BonusKind, BonusStack, StatBounds};

use std::collections::BTreeMap;

/// Stats that effects may modify.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "camelCase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum StatKind {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
    ArmorClass,
    AttackBonus,
    Damage,
    MovementCost,
    SpellResistance,
}

impl StatKind {
    pub fn bounds(self) -> StatBounds {
        match self {
            Self::Strength
            | Self::Dexterity
            | Self::Constitution
            | Self::Intelligence
            | Self::Wisdom
            | Self::Charisma => StatBounds::ATTRIBUTES,
            Self::ArmorClass | Self::AttackBonus | Self::Damage => StatBounds::COMBAT,
            Self::MovementCost => StatBounds::SPEED,
            Self::SpellResistance => StatBounds::PERCENT,
        }
    }

    /// Value used when a creature defines no base for this stat.
    pub fn default_base(self) -> i32 {
        match self {
            Self::ArmorClass | Self::AttackBonus | Self::Damage | Self::SpellResistance => 0,
            Self::MovementCost => 100,
            _ => 10,
        }
    }
}

/// Base values of a creature's stats.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseStats {
    values: BTreeMap<StatKind, i32>,
}

impl BaseStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, stat: StatKind, value: i32) -> Self {
        self.set(stat, value);
        self
    }

    pub fn set(&mut self, stat: StatKind, value: i32) {
        self.values.insert(stat, value);
    }

    pub fn get(&self, stat: StatKind) -> i32 {
        self.values
            .get(&stat)
            .copied()
            .unwrap_or_else(|| stat.default_base())
    }

    /// Base value with `stack` applied, clamped to the stat's bounds.
    pub fn effective(&self, stat: StatKind, stack: &BonusStack) -> i32 {
        stack.apply_bounded(self.get(stat), stat.bounds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn stat_names_are_camel_case() {
        assert_eq!(StatKind::SpellResistance.to_string(), "spellResistance");
        assert_eq!(
            StatKind::from_str("armorClass").ok(),
            Some(StatKind::ArmorClass)
        );
    }

    #[test]
    fn spell_resistance_is_a_percentage() {
        let base = BaseStats::new().with(StatKind::SpellResistance, 60);
        let stack = BonusStack::new().flat(70);
        assert_eq!(base.effective(StatKind::SpellResistance, &stack), 100);
    }

    #[test]
    fn missing_base_uses_default() {
        let base = BaseStats::new();
        assert_eq!(base.get(StatKind::Strength), 10);
        assert_eq!(base.get(StatKind::SpellResistance), 0);
    }
}
