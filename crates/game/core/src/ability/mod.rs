//! Ability definitions.
//!
//! An [`Ability`] is parsed once from a resource and shared behind an `Arc` by
//! every slot that readies it. It is never mutated after construction and is
//! referenced by id across save/load.

mod definition;
pub mod prereq;
mod ruleset;
pub mod slot;
mod spell;

pub use definition::{AbilityDefinition, AiDefinition, ApCostDefinition, UpgradeDefinition};
pub use prereq::Prerequisite;
pub use ruleset::Ruleset;
pub use slot::{AbilitySlot, SlotError, SlotState};
pub use spell::SpellData;

use std::sync::Arc;

use bitflags::bitflags;

use crate::script::Scriptable;
use crate::world::Creature;

bitflags! {
    /// Behavior switches of an ability.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AbilityFlags: u8 {
        /// Granted by race/role; its slot never changes ability.
        const FIXED = 1 << 0;
        /// Can be used, as opposed to a passive.
        const ACTIVATEABLE = 1 << 1;
        /// Stays engaged once activated.
        const MODE = 1 << 2;
        /// The player may end it early.
        const CANCELABLE = 1 << 3;
        const OUTSIDE_COMBAT = 1 << 4;
    }
}

/// What an ability does, used by AI and UI grouping.
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
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionType {
    Buff,
    Heal,
    Debuff,
    Damage,
    Summon,
    Tactical,
}

/// Number of targets. Ordered so that wider groups compare greater.
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
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupType {
    Single,
    Multiple,
}

/// Reach of an ability. Ordered from shortest to longest.
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
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RangeType {
    Personal,
    Touch,
    Short,
    Long,
}

/// Hints consumed by AI ability selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AiProfile {
    pub power: i32,
    pub priority: i32,
}

/// Action point cost, in stored units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionPointCost {
    Fixed(i32),
    /// Computed by the ability's script; only a description is known up front.
    Described(String),
}

impl ActionPointCost {
    /// Cost charged on activation. Described costs are charged by script.
    pub fn fixed(&self) -> i32 {
        match self {
            Self::Fixed(cost) => *cost,
            Self::Described(_) => 0,
        }
    }
}

/// A later ability that improves this one when its owner also has it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbilityUpgrade {
    pub ability_id: String,
    pub description: String,
    /// The upgrade replaces the base ability's name and icon.
    pub overrides: bool,
}

#[derive(Debug)]
pub struct Ability {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) slot_type: String,
    pub(crate) description: String,
    pub(crate) icon: Option<String>,
    pub(crate) flags: AbilityFlags,
    pub(crate) cooldown: u32,
    pub(crate) ap_cost: ActionPointCost,
    pub(crate) action_type: ActionType,
    pub(crate) group_type: GroupType,
    pub(crate) range_type: RangeType,
    pub(crate) ai: AiProfile,
    pub(crate) prereqs: Vec<Prerequisite>,
    pub(crate) restrictions: Vec<Prerequisite>,
    pub(crate) upgrades: Vec<AbilityUpgrade>,
    pub(crate) script: Option<Arc<Scriptable>>,
    pub(crate) spell: Option<SpellData>,
}

impl Ability {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot_type(&self) -> &str {
        &self.slot_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn flags(&self) -> AbilityFlags {
        self.flags
    }

    pub fn is_fixed(&self) -> bool {
        self.flags.contains(AbilityFlags::FIXED)
    }

    pub fn is_activateable(&self) -> bool {
        self.flags.contains(AbilityFlags::ACTIVATEABLE)
    }

    pub fn is_mode(&self) -> bool {
        self.flags.contains(AbilityFlags::MODE)
    }

    pub fn is_cancelable(&self) -> bool {
        self.flags.contains(AbilityFlags::CANCELABLE)
    }

    pub fn can_activate_outside_combat(&self) -> bool {
        self.flags.contains(AbilityFlags::OUTSIDE_COMBAT)
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    pub fn ap_cost(&self) -> &ActionPointCost {
        &self.ap_cost
    }

    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    pub fn group_type(&self) -> GroupType {
        self.group_type
    }

    pub fn range_type(&self) -> RangeType {
        self.range_type
    }

    pub fn ai(&self) -> AiProfile {
        self.ai
    }

    pub fn prereqs(&self) -> &[Prerequisite] {
        &self.prereqs
    }

    pub fn restrictions(&self) -> &[Prerequisite] {
        &self.restrictions
    }

    pub fn upgrades(&self) -> &[AbilityUpgrade] {
        &self.upgrades
    }

    pub fn script(&self) -> Option<&Arc<Scriptable>> {
        self.script.as_ref()
    }

    pub fn is_spell(&self) -> bool {
        self.spell.is_some()
    }

    pub fn spell(&self) -> Option<&SpellData> {
        self.spell.as_ref()
    }

    /// Spell level; zero for non-spells.
    pub fn spell_level(&self) -> u32 {
        self.spell.as_ref().map_or(0, |spell| spell.level)
    }

    // ===== upgrade resolution =====
    //
    // Numeric and classification traits take the most favorable value among
    // the base and every owned upgrade. Presentation (name, icon) takes the
    // last-defined owned override.

    fn owned_upgrades<'a>(
        &'a self,
        ruleset: &'a Ruleset,
        owner: &'a Creature,
    ) -> impl DoubleEndedIterator<Item = (&'a AbilityUpgrade, &'a Arc<Ability>)> + 'a {
        self.upgrades.iter().filter_map(move |upgrade| {
            if !owner.has_ability(&upgrade.ability_id) {
                return None;
            }
            ruleset.get(&upgrade.ability_id).map(|ability| (upgrade, ability))
        })
    }

    pub fn upgraded_ai_power(&self, ruleset: &Ruleset, owner: &Creature) -> i32 {
        self.owned_upgrades(ruleset, owner)
            .map(|(_, ability)| ability.ai.power)
            .fold(self.ai.power, i32::max)
    }

    pub fn upgraded_ai_priority(&self, ruleset: &Ruleset, owner: &Creature) -> i32 {
        self.owned_upgrades(ruleset, owner)
            .map(|(_, ability)| ability.ai.priority)
            .fold(self.ai.priority, i32::max)
    }

    pub fn upgraded_range_type(&self, ruleset: &Ruleset, owner: &Creature) -> RangeType {
        self.owned_upgrades(ruleset, owner)
            .map(|(_, ability)| ability.range_type)
            .fold(self.range_type, RangeType::max)
    }

    pub fn upgraded_group_type(&self, ruleset: &Ruleset, owner: &Creature) -> GroupType {
        self.owned_upgrades(ruleset, owner)
            .map(|(_, ability)| ability.group_type)
            .fold(self.group_type, GroupType::max)
    }

    pub fn upgraded_name<'a>(&'a self, ruleset: &'a Ruleset, owner: &'a Creature) -> &'a str {
        self.owned_upgrades(ruleset, owner)
            .rev()
            .find(|(upgrade, _)| upgrade.overrides)
            .map_or(self.name.as_str(), |(_, ability)| ability.name.as_str())
    }

    pub fn upgraded_icon<'a>(
        &'a self,
        ruleset: &'a Ruleset,
        owner: &'a Creature,
    ) -> Option<&'a str> {
        self.owned_upgrades(ruleset, owner)
            .rev()
            .find(|(upgrade, _)| upgrade.overrides)
            .map_or(self.icon(), |(_, ability)| ability.icon())
    }

    /// Upgrade descriptions the owner has unlocked, in definition order.
    pub fn upgrade_descriptions<'a>(
        &'a self,
        ruleset: &'a Ruleset,
        owner: &'a Creature,
    ) -> Vec<&'a str> {
        self.owned_upgrades(ruleset, owner)
            .map(|(upgrade, _)| upgrade.description.as_str())
            .collect()
    }
}
