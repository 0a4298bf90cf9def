use std::collections::BTreeSet;

use crate::effect::{EffectTarget, EntityEffectSet};
use crate::grid::Position;
use crate::ids::{EntityId, SlotId};
use crate::stats::BaseStats;
use crate::timer::RoundTimer;

/// The slice of a creature the ability engine needs.
#[derive(Clone, Debug)]
pub struct Creature {
    pub(crate) id: EntityId,
    pub(crate) name: String,
    pub(crate) faction: String,
    pub(crate) player_controlled: bool,
    pub(crate) position: Position,
    pub(crate) dead: bool,
    pub(crate) level: u32,
    pub(crate) stats: BaseStats,
    pub(crate) abilities: BTreeSet<String>,
    pub(crate) timer: RoundTimer,
    pub(crate) effects: EntityEffectSet,
    pub(crate) slots: Vec<SlotId>,
}

impl Creature {
    /// New creature; its id is assigned when it is added to a world.
    pub fn new(name: impl Into<String>, faction: impl Into<String>, position: Position) -> Self {
        Self {
            id: EntityId(0),
            name: name.into(),
            faction: faction.into(),
            player_controlled: false,
            position,
            dead: false,
            level: 1,
            stats: BaseStats::new(),
            abilities: BTreeSet::new(),
            timer: RoundTimer::default(),
            effects: EntityEffectSet::new(),
            slots: Vec::new(),
        }
    }

    pub fn player_controlled(mut self) -> Self {
        self.player_controlled = true;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_stats(mut self, stats: BaseStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_timer(mut self, timer: RoundTimer) -> Self {
        self.timer = timer;
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn faction(&self) -> &str {
        &self.faction
    }

    pub fn is_player_controlled(&self) -> bool {
        self.player_controlled
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn stats(&self) -> &BaseStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut BaseStats {
        &mut self.stats
    }

    pub fn has_ability(&self, id: &str) -> bool {
        self.abilities.contains(id)
    }

    pub fn abilities(&self) -> impl Iterator<Item = &str> {
        self.abilities.iter().map(String::as_str)
    }

    /// Records ownership without checking prerequisites.
    pub fn grant_ability(&mut self, id: impl Into<String>) {
        self.abilities.insert(id.into());
    }

    pub fn timer(&self) -> &RoundTimer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut RoundTimer {
        &mut self.timer
    }

    pub fn slots(&self) -> &[SlotId] {
        &self.slots
    }
}

impl EffectTarget for Creature {
    fn effects(&self) -> &EntityEffectSet {
        &self.effects
    }

    fn effects_mut(&mut self) -> &mut EntityEffectSet {
        &mut self.effects
    }

    fn position(&self) -> Option<Position> {
        Some(self.position)
    }

    fn is_valid_effect_target(&self) -> bool {
        !self.dead
    }
}
