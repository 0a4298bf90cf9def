//! Effect lifecycle: creation, attachment, dispatch, elapse and removal.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::{Creature, World, effect_set_mut};
use crate::effect::{Aura, Effect, EffectError, TargetRef};
use crate::grid::Position;
use crate::ids::{EffectId, EntityId, SlotId};
use crate::script::scriptable::dispatch;
use crate::script::{ScriptFunction, ScriptValue, Scriptable};
use crate::stats::{BonusStack, StatKind};

fn target_value(target: Option<TargetRef>) -> ScriptValue {
    match target {
        Some(TargetRef::Creature(id)) => ScriptValue::Entity(id),
        Some(TargetRef::Area) | None => ScriptValue::Null,
    }
}

impl World {
    /// Creates an unattached effect that no slot tracks.
    pub fn create_effect(&mut self, script: Option<Arc<Scriptable>>) -> EffectId {
        self.insert_effect(script, None, None)
    }

    /// Creates an unattached aura that no slot tracks.
    pub fn create_aura(
        &mut self,
        script: Option<Arc<Scriptable>>,
        min_radius: u32,
        max_radius: u32,
    ) -> EffectId {
        self.insert_effect(script, None, Some(Aura::new(min_radius, max_radius)))
    }

    pub(crate) fn insert_effect(
        &mut self,
        script: Option<Arc<Scriptable>>,
        slot: Option<SlotId>,
        aura: Option<Aura>,
    ) -> EffectId {
        let id = self.allocate_effect();
        let mut effect = Effect::new(id, script, slot);
        effect.aura = aura;
        self.effects.insert(id, effect);
        id
    }

    /// Tracks `child` under `parent` so it is removed along with it.
    pub fn add_child_effect(&mut self, parent: EffectId, child: EffectId) -> Result<(), EffectError> {
        if !self.effects.contains_key(&child) {
            return Err(EffectError::NotFound(child));
        }
        let effect = self
            .effects
            .get_mut(&parent)
            .ok_or(EffectError::NotFound(parent))?;
        effect.add_child(child);
        Ok(())
    }

    // ===== stats =====

    /// Bonuses to `stat` from the host's effects.
    pub fn bonus_stack(&self, target: TargetRef, stat: StatKind) -> BonusStack {
        self.effect_set(target)
            .map(|set| set.bonus_stack(&self.effects, stat))
            .unwrap_or_default()
    }

    /// Base stat with effect bonuses applied and clamped.
    pub fn effective_stat(&self, creature: &Creature, stat: StatKind) -> i32 {
        let stack = creature.effects.bonus_stack(&self.effects, stat);
        creature.stats.effective(stat, &stack)
    }

    // ===== attach / remove =====

    /// Attaches an effect to its host.
    ///
    /// Spell resistance shortens the duration here, once, when the effect was
    /// created through a slot readying a spell. Auras register their points
    /// with the area when the host has a valid position. Every scripted effect
    /// already on the host then receives `onEffectApplied`.
    pub fn apply_effect(&mut self, id: EffectId, target: TargetRef) -> Result<(), EffectError> {
        let effect = self.effects.get(&id).ok_or(EffectError::NotFound(id))?;
        if effect.target.is_some() {
            return Err(EffectError::AlreadyAttached(id));
        }
        if self.effect_target(target).is_none() {
            return Err(EffectError::TargetNotFound(target));
        }

        let mut duration = effect.duration;
        if let (Some(slot), TargetRef::Creature(creature)) = (effect.slot, target) {
            let ability = self.slots.get(&slot).and_then(|s| s.ability.clone());
            let creature = self.creatures.get(&creature);
            if let (Some(ability), Some(creature)) = (ability, creature) {
                let resistance = self.effective_stat(creature, StatKind::SpellResistance);
                duration = ability.spell_duration(duration, resistance);
            }
        }

        let live_position = match target {
            TargetRef::Creature(creature) => self
                .creatures
                .get(&creature)
                .filter(|c| !c.dead && self.area.contains(c.position))
                .map(|c| c.position),
            TargetRef::Area => None,
        };

        let effect = self
            .effects
            .get_mut(&id)
            .ok_or(EffectError::NotFound(id))?;
        if duration != effect.duration {
            debug!(
                target: "tactics::effect",
                effect = %id,
                from = effect.duration,
                to = duration,
                "spell resistance shortened effect"
            );
            effect.duration = duration;
        }
        effect.target = Some(target);

        if let Some(set) = effect_set_mut(&mut self.creatures, &mut self.area, target) {
            set.insert(effect);
        }

        if let Some(aura) = effect.aura {
            match live_position {
                Some(center) => {
                    let points = aura.affected_points(center, self.area.dimensions());
                    self.area.register_aura(id, points);
                }
                None if target == TargetRef::Area => warn!(
                    target: "tactics::effect",
                    effect = %id,
                    "aura attached to the area has no position to follow"
                ),
                None => {}
            }
        }

        debug!(target: "tactics::effect", effect = %id, %target, "effect applied");
        self.execute_on_all(target, ScriptFunction::OnEffectApplied, &[ScriptValue::Effect(id)]);
        Ok(())
    }

    /// Removes an effect from its host and deletes it.
    ///
    /// Runs the effect's `onEffectRemoved`, then removes its children, then
    /// detaches it from its slot. Removing an effect that is already gone, or
    /// already being removed further up the stack, does nothing.
    pub fn remove_effect(&mut self, id: EffectId) -> bool {
        let Some(effect) = self.effects.get_mut(&id) else {
            return false;
        };
        if effect.removing {
            return false;
        }
        effect.removing = true;

        let target = effect.target;
        let slot = effect.slot;
        let script = effect.script.clone();
        let children = effect.children.clone();

        if let Some(target) = target {
            if let Some(set) = effect_set_mut(&mut self.creatures, &mut self.area, target) {
                set.remove(id);
            }
            self.area.deregister_aura(id);
        }

        if let Some(script) = script {
            dispatch(
                self,
                &script,
                ScriptFunction::OnEffectRemoved,
                &[ScriptValue::Effect(id), target_value(target)],
            );
        }

        for child in children {
            self.remove_effect(child);
        }

        if let Some(slot) = slot.and_then(|slot| self.slots.get_mut(&slot)) {
            slot.untrack(id);
        }
        self.effects.remove(&id);

        debug!(target: "tactics::effect", effect = %id, "effect removed");
        true
    }

    /// Removes every effect on the host.
    pub fn clear_effects(&mut self, target: TargetRef) {
        let drained = effect_set_mut(&mut self.creatures, &mut self.area, target)
            .map(|set| set.drain())
            .unwrap_or_default();
        for id in drained {
            self.remove_effect(id);
        }
    }

    // ===== dispatch =====

    /// Dispatches `function` to every scripted effect on the host.
    ///
    /// Each effect receives its own id followed by `args`. Callbacks may add
    /// or remove effects on the same host: the scan restarts whenever the
    /// partition changes size, skipping effects that already ran, so every
    /// effect still present is visited exactly once. Returns the number of
    /// effects dispatched to.
    pub fn execute_on_all(
        &mut self,
        target: TargetRef,
        function: ScriptFunction,
        args: &[ScriptValue],
    ) -> usize {
        let mut executed = HashSet::new();

        'scan: loop {
            let Some(set) = self.effect_set(target) else {
                break;
            };
            let scan_len = set.with_script().len();
            let mut index = 0;

            loop {
                let Some(set) = self.effect_set(target) else {
                    break 'scan;
                };
                if set.with_script().len() != scan_len {
                    trace!(target: "tactics::effect", %target, "effect set changed during dispatch, rescanning");
                    continue 'scan;
                }
                let Some(&id) = set.with_script().get(index) else {
                    break 'scan;
                };
                index += 1;

                if !executed.insert(id) {
                    continue;
                }
                let Some(script) = self.effects.get(&id).and_then(|e| e.script.clone()) else {
                    continue;
                };

                let mut call_args = Vec::with_capacity(args.len() + 1);
                call_args.push(ScriptValue::Effect(id));
                call_args.extend_from_slice(args);
                dispatch(self, &script, function, &call_args);
            }
        }

        executed.len()
    }

    // ===== rounds =====

    /// Counts an effect down and runs `onRoundElapsed` once, however many
    /// rounds passed.
    pub fn elapse_effect(&mut self, id: EffectId, rounds: u32) -> bool {
        let Some(effect) = self.effects.get_mut(&id) else {
            return false;
        };
        effect.count_down(rounds);
        let script = effect.script.clone();

        if let Some(script) = script {
            dispatch(
                self,
                &script,
                ScriptFunction::OnRoundElapsed,
                &[ScriptValue::Effect(id)],
            );
        }
        true
    }

    /// Elapses the host's effects that no slot owns, removing lapsed ones.
    ///
    /// Slot-owned effects are elapsed by their slot. Only effects whose
    /// duration was ever nonzero can lapse here.
    pub fn elapse_target_rounds(&mut self, target: TargetRef, rounds: u32) {
        let Some(set) = self.effect_set(target) else {
            return;
        };
        let snapshot: Vec<EffectId> = set
            .iter()
            .filter(|id| self.effects.get(id).is_some_and(|e| e.slot.is_none()))
            .collect();

        for id in snapshot {
            let still_attached = self.effect_set(target).is_some_and(|set| set.contains(id));
            if !still_attached {
                continue;
            }
            self.elapse_effect(id, rounds);
            if self.effects.get(&id).is_some_and(Effect::is_lapsed) {
                trace!(target: "tactics::effect", effect = %id, "effect lapsed");
                self.remove_effect(id);
            }
        }
    }

    /// Effects a dispel may remove: created through an activateable spell
    /// slot whose spell level is positive and which spell resistance applies to.
    pub fn dispellable_effects(&self, target: TargetRef) -> Vec<EffectId> {
        let Some(set) = self.effect_set(target) else {
            return Vec::new();
        };
        set.iter()
            .filter(|id| {
                let ability = self
                    .effects
                    .get(id)
                    .and_then(|e| e.slot)
                    .and_then(|slot| self.slots.get(&slot))
                    .and_then(|slot| slot.ability.as_ref());
                ability.is_some_and(|ability| {
                    ability.is_activateable()
                        && ability.spell_level() > 0
                        && ability
                            .spell()
                            .is_some_and(|spell| spell.spell_resistance_applies)
                })
            })
            .collect()
    }

    // ===== auras =====

    /// Points an attached aura covers right now, recomputed from its host.
    pub fn aura_points(&self, id: EffectId) -> Vec<Position> {
        let Some(effect) = self.effects.get(&id) else {
            return Vec::new();
        };
        let (Some(aura), Some(TargetRef::Creature(host))) = (effect.aura, effect.target) else {
            return Vec::new();
        };
        self.creatures
            .get(&host)
            .filter(|c| !c.dead)
            .map(|c| aura.affected_points(c.position, self.area.dimensions()))
            .unwrap_or_default()
    }

    /// Moves a creature and keeps aura bookkeeping in sync.
    ///
    /// The mover's own auras are re-registered at the new position. Auras
    /// then receive `onTargetEnter`/`onTargetExit` for every creature whose
    /// coverage changed, the mover included. Path validity is the caller's
    /// concern.
    pub fn move_creature(&mut self, id: EntityId, to: Position) -> bool {
        let Some(creature) = self.creatures.get_mut(&id) else {
            return false;
        };
        let from = creature.position;
        if from == to {
            return true;
        }
        creature.position = to;
        let own_auras = creature.effects.auras().to_vec();

        let mut events = Vec::new();

        for aura in &own_auras {
            let old_points = self.area.aura_points(*aura).map(<[_]>::to_vec).unwrap_or_default();
            let new_points = self.aura_points(*aura);
            for other in self.creatures.values().filter(|c| c.id != id && !c.dead) {
                let was = old_points.contains(&other.position);
                let now = new_points.contains(&other.position);
                if now && !was {
                    events.push((*aura, other.id, ScriptFunction::OnTargetEnter));
                } else if was && !now {
                    events.push((*aura, other.id, ScriptFunction::OnTargetExit));
                }
            }
            self.area.register_aura(*aura, new_points);
        }

        for (aura, points) in self.area.registered_auras() {
            if own_auras.contains(&aura) {
                continue;
            }
            let was = points.contains(&from);
            let now = points.contains(&to);
            if now && !was {
                events.push((aura, id, ScriptFunction::OnTargetEnter));
            } else if was && !now {
                events.push((aura, id, ScriptFunction::OnTargetExit));
            }
        }

        for (aura, creature, function) in events {
            let Some(script) = self.effects.get(&aura).and_then(|e| e.script.clone()) else {
                continue;
            };
            dispatch(
                self,
                &script,
                function,
                &[ScriptValue::Effect(aura), ScriptValue::Entity(creature)],
            );
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::script::{NativeScriptEngine, ScriptEngine};
    use crate::stats::Bonus;
    use crate::world::test_support::world_with_engine;

    fn scripted(engine: &NativeScriptEngine, source: &str) -> Arc<Scriptable> {
        Arc::new(Scriptable::inline(engine, source, source).unwrap())
    }

    fn creature(world: &mut World, x: i32, y: i32) -> EntityId {
        world.add_creature(Creature::new("Goblin", "Goblins", Position::new(x, y)))
    }

    #[test]
    fn duration_round_trip_invokes_callback_once_per_elapse() {
        let engine = Arc::new(NativeScriptEngine::new());
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        engine.define("tick", "onRoundElapsed", move |_, _| {
            *counter.lock() += 1;
            Ok(ScriptValue::Null)
        });
        let script = scripted(&engine, "tick");
        let mut world = world_with_engine(engine.clone());

        let id = world.create_effect(Some(script));
        world.effect_mut(id).unwrap().set_duration(5);

        world.elapse_effect(id, 2);
        assert_eq!(world.effect(id).unwrap().duration(), 3);
        world.elapse_effect(id, 3);
        assert_eq!(world.effect(id).unwrap().duration(), 0);
        assert_eq!(*calls.lock(), 2);
    }

    #[test]
    fn reentrant_dispatch_visits_each_effect_once() {
        let engine = Arc::new(NativeScriptEngine::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let first_log = Arc::clone(&log);
        engine.define("first", "onDamaged", move |world, args| {
            let me = args[0].as_effect().unwrap();
            first_log.lock().push(me);
            let victim = args[1].as_effect().unwrap();
            world.remove_effect(victim);
            Ok(ScriptValue::Null)
        });
        let other_log = Arc::clone(&log);
        engine.define("other", "onDamaged", move |_, args| {
            other_log.lock().push(args[0].as_effect().unwrap());
            Ok(ScriptValue::Null)
        });

        let mut world = world_with_engine(engine.clone());
        let host = creature(&mut world, 2, 2);
        let first = scripted(&engine, "first");
        let other = scripted(&engine, "other");

        let e1 = world.create_effect(Some(first));
        let e2 = world.create_effect(Some(Arc::clone(&other)));
        let e3 = world.create_effect(Some(other));
        for id in [e1, e2, e3] {
            world.apply_effect(id, TargetRef::Creature(host)).unwrap();
        }

        let dispatched = world.execute_on_all(
            TargetRef::Creature(host),
            ScriptFunction::OnDamaged,
            &[ScriptValue::Effect(e2)],
        );

        assert_eq!(*log.lock(), vec![e1, e3]);
        assert_eq!(dispatched, 2);
        assert!(world.effect(e2).is_none());
    }

    #[test]
    fn applied_callback_reaches_every_scripted_effect() {
        let engine = Arc::new(NativeScriptEngine::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        engine.define("watch", "onEffectApplied", move |_, args| {
            sink.lock().push((args[0].clone(), args[1].clone()));
            Ok(ScriptValue::Null)
        });
        let mut world = world_with_engine(engine.clone());
        let host = creature(&mut world, 2, 2);

        let watcher = world.create_effect(Some(scripted(&engine, "watch")));
        world.apply_effect(watcher, TargetRef::Creature(host)).unwrap();
        let plain = world.create_effect(None);
        world.apply_effect(plain, TargetRef::Creature(host)).unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[1],
            (ScriptValue::Effect(watcher), ScriptValue::Effect(plain))
        );
    }

    #[test]
    fn effects_attach_once() {
        let mut world = world_with_engine(Arc::new(NativeScriptEngine::new()));
        let host = creature(&mut world, 1, 1);
        let id = world.create_effect(None);

        world.apply_effect(id, TargetRef::Creature(host)).unwrap();
        assert_eq!(
            world.apply_effect(id, TargetRef::Area),
            Err(EffectError::AlreadyAttached(id))
        );
        let fresh = world.create_effect(None);
        assert_eq!(
            world.apply_effect(fresh, TargetRef::Creature(EntityId(99))),
            Err(EffectError::TargetNotFound(TargetRef::Creature(EntityId(99))))
        );
    }

    #[test]
    fn removal_cascades_to_children_and_runs_hook() {
        let engine = Arc::new(NativeScriptEngine::new());
        let removed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&removed);
        engine.define("bye", "onEffectRemoved", move |world, args| {
            let me = args[0].as_effect().unwrap();
            sink.lock().push(me);
            // Removing yourself again from inside the hook is harmless.
            world.remove_effect(me);
            Ok(ScriptValue::Null)
        });
        let mut world = world_with_engine(engine.clone());
        let host = creature(&mut world, 3, 3);

        let parent = world.create_effect(Some(scripted(&engine, "bye")));
        let child = world.create_effect(Some(scripted(&engine, "bye")));
        world.apply_effect(parent, TargetRef::Creature(host)).unwrap();
        world.apply_effect(child, TargetRef::Area).unwrap();
        world.add_child_effect(parent, child).unwrap();

        assert!(world.remove_effect(parent));
        assert!(!world.remove_effect(parent));
        assert_eq!(*removed.lock(), vec![parent, child]);
        assert!(world.effect(child).is_none());
        assert!(world.effect_set(TargetRef::Area).unwrap().is_empty());
        assert!(world.creature(host).unwrap().effects.is_empty());
    }

    #[test]
    fn unowned_effects_lapse_only_if_ever_timed() {
        let mut world = world_with_engine(Arc::new(NativeScriptEngine::new()));
        let host = creature(&mut world, 1, 1);

        let permanent = world.create_effect(None);
        let timed = world.create_effect(None);
        world.effect_mut(timed).unwrap().set_duration(2);
        for id in [permanent, timed] {
            world.apply_effect(id, TargetRef::Creature(host)).unwrap();
        }

        world.elapse_target_rounds(TargetRef::Creature(host), 1);
        assert!(world.effect(timed).is_some());
        world.elapse_target_rounds(TargetRef::Creature(host), 1);
        assert!(world.effect(timed).is_none());
        assert!(world.effect(permanent).is_some());
    }

    #[test]
    fn bonuses_feed_effective_stats() {
        let mut world = world_with_engine(Arc::new(NativeScriptEngine::new()));
        let host = creature(&mut world, 1, 1);
        let id = world.create_effect(None);
        world
            .effect_mut(id)
            .unwrap()
            .add_bonus(Bonus::flat(StatKind::ArmorClass, 4));
        world.apply_effect(id, TargetRef::Creature(host)).unwrap();

        let creature = world.creature(host).unwrap();
        assert_eq!(world.effective_stat(creature, StatKind::ArmorClass), 4);
        assert_eq!(
            world
                .bonus_stack(TargetRef::Creature(host), StatKind::ArmorClass)
                .len(),
            1
        );
    }

    #[test]
    fn aura_registers_and_follows_its_host() {
        let engine = Arc::new(NativeScriptEngine::new());
        let events = Arc::new(Mutex::new(Vec::new()));
        for function in ["onTargetEnter", "onTargetExit"] {
            let sink = Arc::clone(&events);
            engine.define("aura", function, move |_, args| {
                sink.lock().push((function, args[1].as_entity().unwrap()));
                Ok(ScriptValue::Null)
            });
        }
        let mut world = world_with_engine(engine.clone());
        let host = creature(&mut world, 5, 5);
        let bystander = creature(&mut world, 5, 8);

        let aura = world.create_aura(Some(scripted(&engine, "aura")), 1, 2);
        world.apply_effect(aura, TargetRef::Creature(host)).unwrap();
        assert_eq!(world.area().aura_points(aura).map(<[_]>::len), Some(18));
        assert!(world.creature(host).unwrap().effects.auras().contains(&aura));

        // Step toward the bystander until it is two hexes away.
        world.move_creature(host, Position::new(5, 6));
        assert_eq!(*events.lock(), vec![("onTargetEnter", bystander)]);

        world.move_creature(host, Position::new(5, 2));
        assert_eq!(events.lock().last(), Some(&("onTargetExit", bystander)));

        // A creature walking into the aura is reported too.
        world.move_creature(bystander, Position::new(5, 3));
        assert_eq!(events.lock().last(), Some(&("onTargetEnter", bystander)));

        world.remove_effect(aura);
        assert!(world.area().aura_points(aura).is_none());
    }

    #[test]
    fn dispellable_requires_every_condition() {
        use crate::ability::tests::ability;
        use crate::ability::{AbilityFlags, Ruleset, SpellData};
        use crate::world::test_support::world_with;

        let spell = |level: u32, applies: bool| SpellData {
            level,
            spell_resistance_applies: applies,
        };
        let mut ruleset = Ruleset::new();
        let mut ok = ability("Ok");
        ok.spell = Some(spell(2, true));
        ruleset.insert(ok);
        let mut passive = ability("Passive");
        passive.flags = AbilityFlags::empty();
        passive.spell = Some(spell(2, true));
        ruleset.insert(passive);
        let mut cantrip = ability("Cantrip");
        cantrip.spell = Some(spell(0, true));
        ruleset.insert(cantrip);
        ruleset.insert(ability("NotSpell"));
        let mut resisted = ability("Unresisted");
        resisted.spell = Some(spell(2, false));
        ruleset.insert(resisted);

        let engine: Arc<dyn ScriptEngine> = Arc::new(NativeScriptEngine::new());
        let mut world = world_with(engine, ruleset);
        let caster = creature(&mut world, 1, 1);
        let target = creature(&mut world, 2, 2);

        let mut expected = None;
        for id in ["Ok", "Passive", "Cantrip", "NotSpell", "Unresisted"] {
            let slot = world.add_slot(caster, "Spell").unwrap();
            world.set_slot_ability(slot, Some(id)).unwrap();
            let effect = world.create_slot_effect(slot, None).unwrap();
            world.apply_effect(effect, TargetRef::Creature(target)).unwrap();
            if id == "Ok" {
                expected = Some(effect);
            }
        }
        // No originating slot at all.
        let loose = world.create_effect(None);
        world.apply_effect(loose, TargetRef::Creature(target)).unwrap();

        assert_eq!(
            world.dispellable_effects(TargetRef::Creature(target)),
            expected.into_iter().collect::<Vec<_>>()
        );
    }
}
