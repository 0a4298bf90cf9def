//! The explicit game context.
//!
//! [`World`] owns every mutable piece of ability state: creatures, the area,
//! the effect and slot arenas and the targeter session. It is also the handle
//! scripts receive as their first argument, so callbacks can create, apply
//! and remove effects while a dispatch is in progress.

mod area;
mod creature;
mod effects;
mod faction;
mod feedback;
mod slots;

pub use area::Area;
pub use creature::Creature;
pub use faction::{FactionTable, Relationship};
pub use feedback::{Feedback, FeedbackEntry, NullFeedback, RecordingFeedback};

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ability::{AbilitySlot, Ruleset};
use crate::config::RulesConfig;
use crate::effect::{Effect, EffectTarget, EntityEffectSet, TargetRef};
use crate::ids::{EffectId, EntityId, SlotId};
use crate::script::ScriptEngine;
use crate::targeter::{PollOutcome, TargeterManager};

pub struct World {
    pub(crate) config: RulesConfig,
    pub(crate) ruleset: Arc<Ruleset>,
    pub(crate) engine: Arc<dyn ScriptEngine>,
    pub(crate) feedback: Arc<dyn Feedback>,
    pub(crate) area: Area,
    pub(crate) factions: FactionTable,
    pub(crate) creatures: BTreeMap<EntityId, Creature>,
    pub(crate) effects: BTreeMap<EffectId, Effect>,
    pub(crate) slots: BTreeMap<SlotId, AbilitySlot>,
    pub(crate) targeters: TargeterManager,
    pub(crate) turn_mode: bool,
    pub(crate) next_entity: u32,
    pub(crate) next_slot: u32,
    pub(crate) next_effect: u32,
}

impl World {
    pub fn new(
        config: RulesConfig,
        area: Area,
        ruleset: Arc<Ruleset>,
        engine: Arc<dyn ScriptEngine>,
    ) -> Self {
        Self {
            config,
            ruleset,
            engine,
            feedback: Arc::new(NullFeedback),
            area,
            factions: FactionTable::default(),
            creatures: BTreeMap::new(),
            effects: BTreeMap::new(),
            slots: BTreeMap::new(),
            targeters: TargeterManager::new(),
            turn_mode: false,
            next_entity: 1,
            next_slot: 1,
            next_effect: 1,
        }
    }

    pub fn with_feedback(mut self, feedback: Arc<dyn Feedback>) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn with_factions(mut self, factions: FactionTable) -> Self {
        self.factions = factions;
        self
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn ruleset(&self) -> &Arc<Ruleset> {
        &self.ruleset
    }

    pub fn engine(&self) -> &Arc<dyn ScriptEngine> {
        &self.engine
    }

    pub fn feedback(&self) -> &Arc<dyn Feedback> {
        &self.feedback
    }

    pub fn area(&self) -> &Area {
        &self.area
    }

    pub fn area_mut(&mut self) -> &mut Area {
        &mut self.area
    }

    pub fn factions(&self) -> &FactionTable {
        &self.factions
    }

    pub fn factions_mut(&mut self) -> &mut FactionTable {
        &mut self.factions
    }

    /// Combat (turn-based) mode.
    pub fn is_turn_mode(&self) -> bool {
        self.turn_mode
    }

    pub fn set_turn_mode(&mut self, turn_mode: bool) {
        self.turn_mode = turn_mode;
    }

    // ===== creatures =====

    /// Adds `creature`, assigning its id.
    pub fn add_creature(&mut self, mut creature: Creature) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        creature.id = id;
        self.creatures.insert(id, creature);
        id
    }

    pub fn creature(&self, id: EntityId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    pub fn creature_mut(&mut self, id: EntityId) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }

    pub fn creatures(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.values()
    }

    /// Living creature standing on `position`.
    pub fn creature_at(&self, position: crate::grid::Position) -> Option<&Creature> {
        self.creatures
            .values()
            .find(|c| !c.dead && c.position == position)
    }

    /// Marks a creature dead. Its effects stay attached until slots or rounds
    /// notice the target is no longer valid.
    pub fn kill_creature(&mut self, id: EntityId) -> bool {
        match self.creatures.get_mut(&id) {
            Some(creature) => {
                creature.dead = true;
                true
            }
            None => false,
        }
    }

    // ===== arenas =====

    pub fn effect(&self, id: EffectId) -> Option<&Effect> {
        self.effects.get(&id)
    }

    pub fn effect_mut(&mut self, id: EffectId) -> Option<&mut Effect> {
        self.effects.get_mut(&id)
    }

    pub fn slot(&self, id: SlotId) -> Option<&AbilitySlot> {
        self.slots.get(&id)
    }

    pub fn slots(&self) -> impl Iterator<Item = &AbilitySlot> {
        self.slots.values()
    }

    pub(crate) fn allocate_effect(&mut self) -> EffectId {
        let id = EffectId(self.next_effect);
        self.next_effect += 1;
        id
    }

    pub(crate) fn allocate_slot(&mut self) -> SlotId {
        let id = SlotId(self.next_slot);
        self.next_slot += 1;
        id
    }

    // ===== effect hosts =====

    pub fn effect_target(&self, target: TargetRef) -> Option<&dyn EffectTarget> {
        match target {
            TargetRef::Creature(id) => self.creatures.get(&id).map(|c| c as &dyn EffectTarget),
            TargetRef::Area => Some(&self.area as &dyn EffectTarget),
        }
    }

    pub fn effect_set(&self, target: TargetRef) -> Option<&EntityEffectSet> {
        self.effect_target(target).map(|t| t.effects())
    }

    pub fn is_valid_target(&self, target: TargetRef) -> bool {
        self.effect_target(target)
            .is_some_and(|t| t.is_valid_effect_target())
    }

    // ===== targeting =====

    pub fn targeters(&self) -> &TargeterManager {
        &self.targeters
    }

    /// Runs one resolution step of the targeter session.
    pub fn poll_targeters(&mut self) -> PollOutcome {
        let manager = self.targeters.clone();
        manager.poll(self)
    }
}

/// Host effect set borrowed from the two owners, leaving the arenas free.
pub(crate) fn effect_set_mut<'a>(
    creatures: &'a mut BTreeMap<EntityId, Creature>,
    area: &'a mut Area,
    target: TargetRef,
) -> Option<&'a mut EntityEffectSet> {
    match target {
        TargetRef::Creature(id) => creatures.get_mut(&id).map(|c| c.effects_mut()),
        TargetRef::Area => Some(area.effects_mut()),
    }
}
