//! Slot transitions that reach beyond the slot's own counters: binding
//! abilities, activation with its gate and scripts, deactivation cascades and
//! the per-round driver.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::World;
use crate::ability::prereq::meets_prereqs;
use crate::ability::{Ability, AbilitySlot, SlotError};
use crate::effect::{Aura, TargetRef};
use crate::ids::{EffectId, EntityId, SlotId};
use crate::rounds::Rounds;
use crate::script::scriptable::dispatch;
use crate::script::{ScriptFunction, ScriptValue, Scriptable};

impl World {
    // ===== slot creation =====

    /// Adds an empty, settable slot to `owner`.
    pub fn add_slot(&mut self, owner: EntityId, slot_type: &str) -> Result<SlotId, SlotError> {
        if !self.creatures.contains_key(&owner) {
            return Err(SlotError::OwnerNotFound(owner));
        }
        let id = self.allocate_slot();
        self.insert_slot(AbilitySlot::new(id, owner, slot_type));
        Ok(id)
    }

    /// Adds a slot permanently bound to `ability_id`.
    pub fn add_fixed_slot(&mut self, owner: EntityId, ability_id: &str) -> Result<SlotId, SlotError> {
        if !self.creatures.contains_key(&owner) {
            return Err(SlotError::OwnerNotFound(owner));
        }
        let ability = self.lookup_ability(ability_id)?;
        let id = self.allocate_slot();
        self.insert_slot(AbilitySlot::fixed(id, owner, ability));
        Ok(id)
    }

    pub(crate) fn insert_slot(&mut self, slot: AbilitySlot) {
        if let Some(owner) = self.creatures.get_mut(&slot.owner) {
            owner.slots.push(slot.id);
        }
        trace!(target: "tactics::slot", slot = %slot.id, owner = %slot.owner, "slot added");
        self.slots.insert(slot.id, slot);
    }

    pub(crate) fn lookup_ability(&self, id: &str) -> Result<Arc<Ability>, SlotError> {
        self.ruleset
            .get(id)
            .cloned()
            .ok_or_else(|| SlotError::UnknownAbility(id.to_string()))
    }

    pub fn slots_of(&self, owner: EntityId) -> Vec<&AbilitySlot> {
        self.creatures
            .get(&owner)
            .map(|c| c.slots.iter().filter_map(|id| self.slots.get(id)).collect())
            .unwrap_or_default()
    }

    /// Grants an ability whose prerequisites the creature meets.
    ///
    /// Fixed abilities also get their own fixed slot. Returns false when the
    /// creature already has the ability or does not qualify.
    pub fn grant_ability(&mut self, entity: EntityId, ability_id: &str) -> Result<bool, SlotError> {
        let ability = self.lookup_ability(ability_id)?;
        let creature = self
            .creatures
            .get(&entity)
            .ok_or(SlotError::OwnerNotFound(entity))?;
        if creature.has_ability(ability_id) {
            return Ok(false);
        }
        if !meets_prereqs(self, creature, ability.prereqs(), ability.restrictions()) {
            debug!(target: "tactics::slot", %entity, ability = ability_id, "prerequisites not met");
            return Ok(false);
        }

        if let Some(creature) = self.creatures.get_mut(&entity) {
            creature.grant_ability(ability_id);
        }
        if ability.is_fixed() {
            self.add_fixed_slot(entity, ability_id)?;
        }
        Ok(true)
    }

    /// Readies `ability_id` in the slot, or clears it with `None`.
    ///
    /// An active, cancelable ability is deactivated first. The running
    /// cooldown carries over to the new ability.
    pub fn set_slot_ability(&mut self, slot: SlotId, ability_id: Option<&str>) -> Result<(), SlotError> {
        let ability = ability_id.map(|id| self.lookup_ability(id)).transpose()?;
        let current = self.slots.get(&slot).ok_or(SlotError::NotFound(slot))?;
        if !current.is_settable() {
            return Err(SlotError::NotSettable(slot));
        }
        if current.can_deactivate() {
            self.deactivate_slot(slot)?;
        }

        let current = self.slots.get_mut(&slot).ok_or(SlotError::NotFound(slot))?;
        current.bind(ability);
        debug!(
            target: "tactics::slot",
            %slot,
            ability = ability_id.unwrap_or("<none>"),
            "slot ability set"
        );
        Ok(())
    }

    pub fn set_active_rounds_left(&mut self, slot: SlotId, rounds: Rounds) -> Result<(), SlotError> {
        let current = self.slots.get_mut(&slot).ok_or(SlotError::NotFound(slot))?;
        current.active_rounds_left = rounds;
        Ok(())
    }

    // ===== activation =====

    /// Whether the slot could be fired right now.
    ///
    /// Takes `&mut self` because the ability script's `canActivate` hook, when
    /// defined, has the last word.
    pub fn can_activate_slot(&mut self, slot: SlotId) -> bool {
        let Some(current) = self.slots.get(&slot) else {
            return false;
        };
        let Some(ability) = current.ability.clone() else {
            return false;
        };
        if current.active || !current.cooldown_rounds_left.is_zero() {
            return false;
        }
        let owner = current.owner;
        let Some(creature) = self.creatures.get(&owner) else {
            return false;
        };
        if creature.dead || !creature.timer.can_perform(ability.ap_cost().fixed()) {
            return false;
        }
        if !self.turn_mode && !ability.can_activate_outside_combat() {
            return false;
        }

        match ability.script() {
            Some(script) if script.has_function(ScriptFunction::CanActivate) => dispatch(
                self,
                script,
                ScriptFunction::CanActivate,
                &[ScriptValue::Slot(slot), ScriptValue::Entity(owner)],
            )
            .is_some_and(|result| result.is_truthy()),
            _ => true,
        }
    }

    /// Applies the activation counters and activates the ability.
    ///
    /// Returns false while the slot is cooling down. Does not check
    /// [`World::can_activate_slot`]; see [`World::fire_slot`].
    pub fn activate_slot(&mut self, slot: SlotId) -> Result<bool, SlotError> {
        let current = self.slots.get_mut(&slot).ok_or(SlotError::NotFound(slot))?;
        let ability = current.ability.clone().ok_or(SlotError::Empty(slot))?;
        if !current.engage() {
            return Ok(false);
        }
        let owner = current.owner;
        debug!(
            target: "tactics::slot",
            %slot,
            ability = ability.id(),
            cooldown = %current.cooldown_rounds_left,
            active = current.active,
            "slot activated"
        );
        self.activate_ability(&ability, owner);
        Ok(true)
    }

    /// Announces an ability use: notifies the user's effects, reports it, and
    /// charges the fixed action point cost.
    pub fn activate_ability(&mut self, ability: &Arc<Ability>, entity: EntityId) {
        self.execute_on_all(
            TargetRef::Creature(entity),
            ScriptFunction::OnAbilityActivated,
            &[ScriptValue::from(ability.id()), ScriptValue::Entity(entity)],
        );

        let feedback = Arc::clone(&self.feedback);
        let Some(creature) = self.creatures.get_mut(&entity) else {
            return;
        };
        feedback.message(&ability.activation_message(&creature.name));

        let cost = ability.ap_cost().fixed();
        if !creature.timer.perform(cost) {
            warn!(
                target: "tactics::slot",
                %entity,
                ability = ability.id(),
                cost,
                available = creature.timer.ap(),
                "ability activated without enough action points"
            );
        }
    }

    /// Full use of a slot: the activation gate, then activation, then the
    /// ability script's `onActivate`.
    pub fn fire_slot(&mut self, slot: SlotId) -> Result<bool, SlotError> {
        if !self.can_activate_slot(slot) {
            return Ok(false);
        }
        if !self.activate_slot(slot)? {
            return Ok(false);
        }
        self.run_ability_hook(slot, ScriptFunction::OnActivate);
        Ok(true)
    }

    fn run_ability_hook(&mut self, slot: SlotId, function: ScriptFunction) {
        let Some(current) = self.slots.get(&slot) else {
            return;
        };
        let owner = current.owner;
        let Some(script) = current.ability.as_ref().and_then(|a| a.script().cloned()) else {
            return;
        };
        dispatch(
            self,
            &script,
            function,
            &[ScriptValue::Slot(slot), ScriptValue::Entity(owner)],
        );
    }

    /// Ends an active period.
    ///
    /// Restarts the cooldown from the ability's base value and removes every
    /// tracked effect flagged remove-on-deactivate, then runs `onDeactivate`.
    /// Returns false when the slot is empty or inactive.
    pub fn deactivate_slot(&mut self, slot: SlotId) -> Result<bool, SlotError> {
        let current = self.slots.get_mut(&slot).ok_or(SlotError::NotFound(slot))?;
        if !current.disengage() {
            return Ok(false);
        }
        let cascade: Vec<EffectId> = current
            .effects
            .iter()
            .copied()
            .filter(|id| self.effects.get(id).is_some_and(|e| e.remove_on_deactivate))
            .collect();
        debug!(target: "tactics::slot", %slot, removing = cascade.len(), "slot deactivated");

        for id in cascade {
            self.remove_effect(id);
            if let Some(current) = self.slots.get_mut(&slot) {
                current.untrack(id);
            }
        }
        self.run_ability_hook(slot, ScriptFunction::OnDeactivate);
        Ok(true)
    }

    // ===== slot effects =====

    /// Creates an effect owned by the slot; the slot tracks it until removal.
    pub fn create_slot_effect(
        &mut self,
        slot: SlotId,
        script: Option<Arc<Scriptable>>,
    ) -> Result<EffectId, SlotError> {
        self.create_tracked(slot, script, None)
    }

    pub fn create_slot_aura(
        &mut self,
        slot: SlotId,
        script: Option<Arc<Scriptable>>,
        min_radius: u32,
        max_radius: u32,
    ) -> Result<EffectId, SlotError> {
        self.create_tracked(slot, script, Some(Aura::new(min_radius, max_radius)))
    }

    fn create_tracked(
        &mut self,
        slot: SlotId,
        script: Option<Arc<Scriptable>>,
        aura: Option<Aura>,
    ) -> Result<EffectId, SlotError> {
        if !self.slots.contains_key(&slot) {
            return Err(SlotError::NotFound(slot));
        }
        let id = self.insert_effect(script, Some(slot), aura);
        if let Some(current) = self.slots.get_mut(&slot) {
            current.track(id);
        }
        Ok(id)
    }

    /// Removes every effect the slot tracks, then deactivates it if it can be
    /// canceled. Safe against callbacks that remove tracked effects themselves.
    pub fn cancel_all_effects(&mut self, slot: SlotId) -> Result<(), SlotError> {
        loop {
            let current = self.slots.get_mut(&slot).ok_or(SlotError::NotFound(slot))?;
            let Some(&first) = current.effects.first() else {
                break;
            };
            // Untracked even if the effect was already gone from the arena.
            current.untrack(first);
            self.remove_effect(first);
        }

        let cancelable = self.slots.get(&slot).is_some_and(AbilitySlot::can_deactivate);
        if cancelable {
            self.deactivate_slot(slot)?;
        }
        Ok(())
    }

    /// Removes the slot's auras. Deactivates the slot only when one was found.
    pub fn cancel_all_auras(&mut self, slot: SlotId) -> Result<bool, SlotError> {
        let current = self.slots.get(&slot).ok_or(SlotError::NotFound(slot))?;
        let auras: Vec<EffectId> = current
            .effects
            .iter()
            .copied()
            .filter(|id| self.effects.get(id).is_some_and(|e| e.is_aura()))
            .collect();
        if auras.is_empty() {
            return Ok(false);
        }

        for id in auras {
            self.remove_effect(id);
        }
        self.deactivate_slot(slot)?;
        Ok(true)
    }

    // ===== rounds =====

    /// Counts the slot's timers down and elapses the effects it tracks.
    ///
    /// The slot deactivates once its active period runs out. Tracked effects
    /// are elapsed from a snapshot; lapsed ones and ones whose host is no
    /// longer a valid target are removed.
    pub fn elapse_slot_rounds(&mut self, slot: SlotId, rounds: u32) -> Result<(), SlotError> {
        let current = self.slots.get_mut(&slot).ok_or(SlotError::NotFound(slot))?;
        if current.tick(rounds) && current.active {
            self.deactivate_slot(slot)?;
        }

        let snapshot = self
            .slots
            .get(&slot)
            .map(|s| s.effects.clone())
            .unwrap_or_default();
        for id in snapshot {
            let Some(effect) = self.effects.get(&id) else {
                continue;
            };
            let host_valid = effect.target.is_some_and(|t| self.is_valid_target(t));

            self.elapse_effect(id, rounds);
            let lapsed = self.effects.get(&id).is_some_and(|e| e.is_lapsed());
            if lapsed || !host_valid {
                trace!(target: "tactics::slot", %slot, effect = %id, lapsed, "slot effect expired");
                self.remove_effect(id);
            }
        }
        Ok(())
    }

    /// Advances the whole world by `rounds`.
    ///
    /// Refills every action point pool, then elapses slots, creature effect
    /// sets and finally the area's effect set.
    pub fn elapse_rounds(&mut self, rounds: u32) {
        for creature in self.creatures.values_mut() {
            creature.timer.reset();
        }

        let slots: Vec<SlotId> = self.slots.keys().copied().collect();
        for slot in slots {
            if let Err(err) = self.elapse_slot_rounds(slot, rounds) {
                trace!(target: "tactics::slot", %slot, %err, "slot vanished during round elapse");
            }
        }

        let creatures: Vec<EntityId> = self.creatures.keys().copied().collect();
        for creature in creatures {
            self.elapse_target_rounds(TargetRef::Creature(creature), rounds);
        }
        self.elapse_target_rounds(TargetRef::Area, rounds);

        debug!(target: "tactics::slot", rounds, "rounds elapsed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::ability::tests::ability;
    use crate::ability::{AbilityFlags, ActionPointCost, Ruleset, SlotState};
    use crate::grid::Position;
    use crate::script::{NativeScriptEngine, ScriptEngine};
    use crate::stats::BaseStats;
    use crate::timer::RoundTimer;
    use crate::world::test_support::world_with;
    use crate::world::{Creature, RecordingFeedback};

    fn mode_flags() -> AbilityFlags {
        AbilityFlags::ACTIVATEABLE | AbilityFlags::MODE | AbilityFlags::CANCELABLE
    }

    fn hero(world: &mut World, ap: i32) -> EntityId {
        let mut timer = RoundTimer::new(150);
        timer.set_ap(ap);
        world.add_creature(
            Creature::new("Aldo", "Player", Position::new(1, 1))
                .player_controlled()
                .with_timer(timer),
        )
    }

    fn strike_ruleset() -> Ruleset {
        let mut strike = ability("Strike");
        strike.cooldown = 2;
        strike.ap_cost = ActionPointCost::Fixed(100);
        let mut ruleset = Ruleset::new();
        ruleset.insert(strike);
        ruleset
    }

    fn empty_engine() -> Arc<dyn ScriptEngine> {
        Arc::new(NativeScriptEngine::new())
    }

    #[test]
    fn activation_gate_scenario() {
        let mut world = world_with(empty_engine(), strike_ruleset());
        world.set_turn_mode(true);
        let entity = hero(&mut world, 50);
        let slot = world.add_slot(entity, "Innate").unwrap();
        world.set_slot_ability(slot, Some("Strike")).unwrap();

        assert!(!world.can_activate_slot(slot));

        world.creature_mut(entity).unwrap().timer_mut().set_ap(150);
        assert!(world.can_activate_slot(slot));
        assert!(world.fire_slot(slot).unwrap());

        let current = world.slot(slot).unwrap();
        assert_eq!(current.cooldown_rounds_left(), Rounds::Finite(2));
        assert_eq!(current.state(), SlotState::OnCooldown);
        assert_eq!(world.creature(entity).unwrap().timer().ap(), 50);
        assert!(!world.can_activate_slot(slot));
    }

    #[test]
    fn outside_combat_needs_permission() {
        let mut world = world_with(empty_engine(), strike_ruleset());
        let entity = hero(&mut world, 150);
        let slot = world.add_slot(entity, "Innate").unwrap();
        world.set_slot_ability(slot, Some("Strike")).unwrap();

        assert!(!world.can_activate_slot(slot));
        world.set_turn_mode(true);
        assert!(world.can_activate_slot(slot));
    }

    #[test]
    fn can_activate_hook_has_last_word() {
        let engine = Arc::new(NativeScriptEngine::new());
        let allow = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&allow);
        engine.define("gate", "canActivate", move |_, _| Ok(ScriptValue::Bool(*flag.lock())));

        let mut gated = ability("Gated");
        gated.script = Some(Arc::new(Scriptable::inline(&*engine, "gate", "gate").unwrap()));
        let mut ruleset = Ruleset::new();
        ruleset.insert(gated);

        let mut world = world_with(engine.clone(), ruleset);
        world.set_turn_mode(true);
        let entity = hero(&mut world, 150);
        let slot = world.add_slot(entity, "Innate").unwrap();
        world.set_slot_ability(slot, Some("Gated")).unwrap();

        assert!(!world.can_activate_slot(slot));
        *allow.lock() = true;
        assert!(world.can_activate_slot(slot));
    }

    #[test]
    fn firing_runs_hooks_and_reports() {
        let engine = Arc::new(NativeScriptEngine::new());
        let calls = Arc::new(Mutex::new(Vec::new()));
        for function in ["onActivate", "onDeactivate"] {
            let sink = Arc::clone(&calls);
            engine.define("stance", function, move |_, args| {
                assert!(args[0].as_slot().is_some());
                sink.lock().push(function);
                Ok(ScriptValue::Null)
            });
        }
        let mut stance = ability("Stance");
        stance.flags = mode_flags();
        stance.script = Some(Arc::new(Scriptable::inline(&*engine, "stance", "stance").unwrap()));
        let mut ruleset = Ruleset::new();
        ruleset.insert(stance);

        let feedback = Arc::new(RecordingFeedback::new());
        let mut world = world_with(engine.clone(), ruleset).with_feedback(feedback.clone());
        world.set_turn_mode(true);
        let entity = hero(&mut world, 150);
        let slot = world.add_slot(entity, "Innate").unwrap();
        world.set_slot_ability(slot, Some("Stance")).unwrap();

        assert!(world.fire_slot(slot).unwrap());
        assert_eq!(world.slot(slot).unwrap().active_rounds_left(), Rounds::Indefinite);
        assert!(world.deactivate_slot(slot).unwrap());
        assert!(!world.deactivate_slot(slot).unwrap());

        assert_eq!(*calls.lock(), vec!["onActivate", "onDeactivate"]);
        assert_eq!(feedback.messages(), vec!["Aldo uses Stance.".to_string()]);
    }

    #[test]
    fn deactivation_cascade_removes_only_flagged_effects() {
        let mut stance = ability("Stance");
        stance.flags = mode_flags();
        stance.cooldown = 3;
        let mut ruleset = Ruleset::new();
        ruleset.insert(stance);

        let mut world = world_with(empty_engine(), ruleset);
        world.set_turn_mode(true);
        let entity = hero(&mut world, 150);
        let slot = world.add_slot(entity, "Innate").unwrap();
        world.set_slot_ability(slot, Some("Stance")).unwrap();
        assert!(world.fire_slot(slot).unwrap());

        let sticky = world.create_slot_effect(slot, None).unwrap();
        let flagged = world.create_slot_effect(slot, None).unwrap();
        world.effect_mut(flagged).unwrap().set_remove_on_deactivate(true);
        for id in [sticky, flagged] {
            world.apply_effect(id, TargetRef::Creature(entity)).unwrap();
        }

        assert!(world.deactivate_slot(slot).unwrap());
        let current = world.slot(slot).unwrap();
        assert!(!current.is_active());
        assert_eq!(current.cooldown_rounds_left(), Rounds::Finite(3));
        assert_eq!(current.active_rounds_left(), Rounds::ZERO);
        assert_eq!(current.effects(), &[sticky]);
        assert!(world.effect(flagged).is_none());
    }

    #[test]
    fn setting_ability_deactivates_and_keeps_cooldown() {
        let mut stance = ability("Stance");
        stance.flags = mode_flags();
        stance.cooldown = 1;
        let mut ruleset = Ruleset::new();
        ruleset.insert(stance);
        ruleset.insert(ability("Strike"));

        let mut world = world_with(empty_engine(), ruleset);
        world.set_turn_mode(true);
        let entity = hero(&mut world, 150);
        let slot = world.add_slot(entity, "Innate").unwrap();
        world.set_slot_ability(slot, Some("Stance")).unwrap();
        world.fire_slot(slot).unwrap();

        world.set_slot_ability(slot, Some("Strike")).unwrap();
        let current = world.slot(slot).unwrap();
        assert_eq!(current.ability_id(), Some("Strike"));
        assert!(!current.is_active());
        assert_eq!(current.cooldown_rounds_left(), Rounds::Finite(1));

        assert_eq!(
            world.set_slot_ability(slot, Some("Missing")),
            Err(SlotError::UnknownAbility("Missing".to_string()))
        );
    }

    #[test]
    fn fixed_slots_are_not_settable() {
        let mut innate = ability("Innate");
        innate.flags |= AbilityFlags::FIXED;
        let mut ruleset = Ruleset::new();
        ruleset.insert(innate);

        let mut world = world_with(empty_engine(), ruleset);
        let entity = hero(&mut world, 150);
        assert!(world.grant_ability(entity, "Innate").unwrap());
        assert!(!world.grant_ability(entity, "Innate").unwrap());

        let slots = world.slots_of(entity);
        assert_eq!(slots.len(), 1);
        let slot = slots[0].id();
        assert!(slots[0].is_fixed());
        assert_eq!(world.set_slot_ability(slot, None), Err(SlotError::NotSettable(slot)));
    }

    #[test]
    fn grant_checks_prerequisites() {
        use crate::ability::Prerequisite;
        use crate::stats::StatKind;

        let mut cleave = ability("Cleave");
        cleave.prereqs = vec![Prerequisite::MinStat {
            stat: StatKind::Strength,
            value: 13,
        }];
        let mut ruleset = Ruleset::new();
        ruleset.insert(cleave);

        let mut world = world_with(empty_engine(), ruleset);
        let weak = hero(&mut world, 150);
        let strong = world.add_creature(
            Creature::new("Brute", "Player", Position::new(3, 3))
                .with_stats(BaseStats::new().with(StatKind::Strength, 16)),
        );

        assert!(!world.grant_ability(weak, "Cleave").unwrap());
        assert!(world.grant_ability(strong, "Cleave").unwrap());
        assert!(world.creature(strong).unwrap().has_ability("Cleave"));
    }

    #[test]
    fn elapse_rounds_expires_mode_and_effects() {
        let mut stance = ability("Stance");
        stance.flags = mode_flags();
        stance.cooldown = 1;
        let mut ruleset = Ruleset::new();
        ruleset.insert(stance);

        let mut world = world_with(empty_engine(), ruleset);
        world.set_turn_mode(true);
        let entity = hero(&mut world, 150);
        let slot = world.add_slot(entity, "Innate").unwrap();
        world.set_slot_ability(slot, Some("Stance")).unwrap();
        world.set_active_rounds_left(slot, Rounds::Finite(2)).unwrap();
        world.fire_slot(slot).unwrap();
        assert_eq!(world.creature(entity).unwrap().timer().ap(), 150);

        let timed = world.create_slot_effect(slot, None).unwrap();
        world.effect_mut(timed).unwrap().set_duration(1);
        world.apply_effect(timed, TargetRef::Creature(entity)).unwrap();

        world.creature_mut(entity).unwrap().timer_mut().set_ap(0);
        world.elapse_rounds(1);
        assert_eq!(world.creature(entity).unwrap().timer().ap(), 150);
        assert!(world.effect(timed).is_none());
        assert!(world.slot(slot).unwrap().is_active());

        world.elapse_rounds(1);
        let current = world.slot(slot).unwrap();
        assert!(!current.is_active());
        assert_eq!(current.cooldown_rounds_left(), Rounds::Finite(1));
    }

    #[test]
    fn dead_hosts_drop_slot_effects() {
        let mut world = world_with(empty_engine(), strike_ruleset());
        let caster = hero(&mut world, 150);
        let victim = world.add_creature(Creature::new("Rat", "Vermin", Position::new(4, 4)));
        let slot = world.add_slot(caster, "Innate").unwrap();
        world.set_slot_ability(slot, Some("Strike")).unwrap();

        let permanent = world.create_slot_effect(slot, None).unwrap();
        world.apply_effect(permanent, TargetRef::Creature(victim)).unwrap();
        world.elapse_slot_rounds(slot, 1).unwrap();
        assert!(world.effect(permanent).is_some());

        world.kill_creature(victim);
        world.elapse_slot_rounds(slot, 1).unwrap();
        assert!(world.effect(permanent).is_none());
        assert!(world.slot(slot).unwrap().effects().is_empty());
    }

    #[test]
    fn cancel_all_effects_survives_reentrant_removal() {
        let engine = Arc::new(NativeScriptEngine::new());
        // Each removal hook removes the next tracked effect as well.
        engine.define("chain", "onEffectRemoved", |world, args| {
            let me = args[0].as_effect().unwrap();
            let slot = world.effect(me).and_then(|e| e.slot()).unwrap();
            let next = world
                .slot(slot)
                .and_then(|s| s.effects().iter().copied().find(|id| *id != me));
            if let Some(next) = next {
                world.remove_effect(next);
            }
            Ok(ScriptValue::Null)
        });
        let chain = Arc::new(Scriptable::inline(&*engine, "chain", "chain").unwrap());

        let mut stance = ability("Stance");
        stance.flags = mode_flags();
        let mut ruleset = Ruleset::new();
        ruleset.insert(stance);
        let mut world = world_with(engine.clone(), ruleset);
        world.set_turn_mode(true);
        let entity = hero(&mut world, 150);
        let slot = world.add_slot(entity, "Innate").unwrap();
        world.set_slot_ability(slot, Some("Stance")).unwrap();
        world.fire_slot(slot).unwrap();

        for _ in 0..4 {
            let id = world.create_slot_effect(slot, Some(Arc::clone(&chain))).unwrap();
            world.apply_effect(id, TargetRef::Creature(entity)).unwrap();
        }

        world.cancel_all_effects(slot).unwrap();
        assert!(world.slot(slot).unwrap().effects().is_empty());
        assert!(world.creature(entity).unwrap().effects.is_empty());
        assert!(!world.slot(slot).unwrap().is_active());
    }

    #[test]
    fn cancel_all_auras_deactivates_only_when_found() {
        let mut stance = ability("Stance");
        stance.flags = mode_flags();
        let mut ruleset = Ruleset::new();
        ruleset.insert(stance);
        let mut world = world_with(empty_engine(), ruleset);
        world.set_turn_mode(true);
        let entity = hero(&mut world, 150);
        let slot = world.add_slot(entity, "Innate").unwrap();
        world.set_slot_ability(slot, Some("Stance")).unwrap();
        world.fire_slot(slot).unwrap();

        let plain = world.create_slot_effect(slot, None).unwrap();
        world.apply_effect(plain, TargetRef::Creature(entity)).unwrap();
        assert!(!world.cancel_all_auras(slot).unwrap());
        assert!(world.slot(slot).unwrap().is_active());

        let aura = world.create_slot_aura(slot, None, 0, 1).unwrap();
        world.apply_effect(aura, TargetRef::Creature(entity)).unwrap();
        assert!(world.cancel_all_auras(slot).unwrap());
        assert!(world.effect(aura).is_none());
        assert!(world.effect(plain).is_some());
        assert!(!world.slot(slot).unwrap().is_active());
    }
}
