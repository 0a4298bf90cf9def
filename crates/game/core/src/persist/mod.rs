//! Save and restore of ability state.
//!
//! Creatures themselves are rebuilt by the caller from templates; these
//! records carry what templates cannot: slot counters, timed and
//! remove-on-deactivate effects, script state and aura bookkeeping.
//! References that cannot be resolved on load are logged and skipped.

mod records;

pub use records::{
    AbilitySlotRecord, CreatureRecord, EffectRecord, EntityEffectSetRecord, ScriptableRecord,
    WorldRecord,
};

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::ability::AbilitySlot;
use crate::effect::{Aura, Effect, TargetRef};
use crate::error::{ErrorSeverity, GameError};
use crate::ids::{EffectId, SlotId};
use crate::script::{ResourceLoader, Scriptable};
use crate::world::{World, effect_set_mut};

const INLINE_LOCATION: &str = "<saved>";

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("invalid save data: {0}")]
    Json(#[from] serde_json::Error),
}

impl GameError for PersistError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Json(_) => "PERSIST_JSON",
        }
    }
}

impl WorldRecord {
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, PersistError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Counts from [`World::load_records`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub slots: usize,
    pub effects: usize,
    /// Records or references that could not be resolved.
    pub skipped: usize,
}

/// Permanent effects that survive deactivation come back from templates.
fn is_saved(effect: &Effect) -> bool {
    effect.duration > 0 || effect.remove_on_deactivate
}

fn script_record(script: &Scriptable) -> ScriptableRecord {
    if script.is_inline() {
        ScriptableRecord {
            script_contents: Some(script.contents().to_string()),
            script_location: None,
        }
    } else {
        ScriptableRecord {
            script_contents: None,
            script_location: Some(script.location().to_string()),
        }
    }
}

struct Refs {
    effects: BTreeMap<EffectId, u32>,
    slots: BTreeMap<SlotId, u32>,
}

impl World {
    // ===== save =====

    /// Snapshot of every living or player-controlled creature's slots and
    /// effects, plus the area's effects.
    pub fn save_records(&self) -> WorldRecord {
        let hosts: Vec<TargetRef> = self
            .creatures
            .values()
            .filter(|c| !c.dead || c.player_controlled)
            .map(|c| TargetRef::Creature(c.id))
            .chain(std::iter::once(TargetRef::Area))
            .collect();

        let mut refs = Refs {
            effects: BTreeMap::new(),
            slots: BTreeMap::new(),
        };
        for host in &hosts {
            if let Some(set) = self.effect_set(*host) {
                for id in set.iter() {
                    if self.effects.get(&id).is_some_and(is_saved) {
                        let next = refs.effects.len() as u32 + 1;
                        refs.effects.insert(id, next);
                    }
                }
            }
            if let TargetRef::Creature(entity) = host {
                for slot in self.creatures.get(entity).map(|c| c.slots.as_slice()).unwrap_or_default() {
                    let next = refs.slots.len() as u32 + 1;
                    refs.slots.insert(*slot, next);
                }
            }
        }

        let mut record = WorldRecord::default();
        for host in hosts {
            let effects = self.save_set(host, &refs);
            match host {
                TargetRef::Creature(entity) => {
                    let slots = self
                        .slots_of(entity)
                        .into_iter()
                        .filter_map(|slot| self.save_slot(slot, &refs))
                        .collect();
                    record.creatures.push(CreatureRecord {
                        entity,
                        slots,
                        effects,
                    });
                }
                TargetRef::Area => record.area_effects = effects,
            }
        }
        debug!(
            target: "tactics::persist",
            creatures = record.creatures.len(),
            effects = refs.effects.len(),
            slots = refs.slots.len(),
            "world saved"
        );
        record
    }

    fn save_set(&self, host: TargetRef, refs: &Refs) -> EntityEffectSetRecord {
        let Some(set) = self.effect_set(host) else {
            return EntityEffectSetRecord::default();
        };
        let save_all = |ids: &[EffectId]| -> Vec<EffectRecord> {
            ids.iter()
                .filter_map(|id| self.effects.get(id))
                .filter_map(|effect| self.save_effect(effect, refs))
                .collect()
        };
        EntityEffectSetRecord {
            no_active_script: save_all(set.no_script()),
            with_active_script: save_all(set.with_script()),
            auras: set
                .auras()
                .iter()
                .filter_map(|id| refs.effects.get(id).copied())
                .collect(),
        }
    }

    fn save_effect(&self, effect: &Effect, refs: &Refs) -> Option<EffectRecord> {
        let reference = *refs.effects.get(&effect.id)?;
        Some(EffectRecord {
            reference,
            title: effect.title.clone(),
            icons: effect.icons.clone(),
            duration: effect.duration,
            remove_on_deactivate: effect.remove_on_deactivate,
            has_description: effect.has_description,
            children: effect
                .children
                .iter()
                .filter_map(|child| refs.effects.get(child).copied())
                .collect(),
            slot: effect.slot.and_then(|slot| refs.slots.get(&slot).copied()),
            bonuses: effect.bonuses.clone(),
            animations: effect.animations.clone(),
            script_state: effect.script_state.clone(),
            script: effect.script.as_deref().map(script_record),
            is_aura: effect.aura.is_some(),
            min_radius: effect.aura.map(|a| a.min_radius),
            max_radius: effect.aura.map(|a| a.max_radius),
        })
    }

    fn save_slot(&self, slot: &AbilitySlot, refs: &Refs) -> Option<AbilitySlotRecord> {
        let reference = *refs.slots.get(&slot.id)?;
        let nonzero = |rounds: crate::rounds::Rounds| (!rounds.is_zero()).then_some(rounds);
        Some(AbilitySlotRecord {
            reference,
            slot_type: slot.slot_type.clone(),
            fixed: slot.fixed,
            ability_id: slot.ability_id().map(str::to_string),
            active: slot.active,
            active_rounds_left: nonzero(slot.active_rounds_left),
            cooldown_rounds_left: nonzero(slot.cooldown_rounds_left),
            // Effects on hosts that were not saved (dead NPCs) are dropped here.
            effects: slot
                .effects
                .iter()
                .filter_map(|id| refs.effects.get(id).copied())
                .collect(),
        })
    }

    // ===== load =====

    /// Restores ability state onto creatures that already exist.
    ///
    /// Timed and remove-on-deactivate effects already on a saved host are
    /// replaced by the record's; permanent ones came from templates and stay.
    /// Slots are rebuilt next, replacing any the creature has. Saved effects
    /// are attached without running callbacks or spell resistance. Slot
    /// effect lists, children and auras are resolved last, once every effect
    /// has an id.
    pub fn load_records(&mut self, record: &WorldRecord, loader: &dyn ResourceLoader) -> LoadReport {
        let mut report = LoadReport::default();
        let mut slot_refs = BTreeMap::new();
        let mut effect_refs = BTreeMap::new();

        let live: Vec<&CreatureRecord> = record
            .creatures
            .iter()
            .filter(|c| {
                let exists = self.creatures.contains_key(&c.entity);
                if !exists {
                    warn!(target: "tactics::persist", entity = %c.entity, "saved creature no longer exists");
                    report.skipped += 1;
                }
                exists
            })
            .collect();
        let hosts: Vec<(TargetRef, &EntityEffectSetRecord)> = live
            .iter()
            .map(|c| (TargetRef::Creature(c.entity), &c.effects))
            .chain(std::iter::once((TargetRef::Area, &record.area_effects)))
            .collect();

        for (host, _) in &hosts {
            self.discard_saved_effects(*host);
        }
        for creature in &live {
            self.clear_slots(creature.entity);
            for slot in &creature.slots {
                let id = self.load_slot(creature.entity, slot, &mut report);
                if slot_refs.insert(slot.reference, id).is_some() {
                    warn!(target: "tactics::persist", reference = slot.reference, "duplicate slot ref");
                }
                report.slots += 1;
            }
        }

        for (host, set) in &hosts {
            for effect in set.effects() {
                let id = self.load_effect(*host, effect, &slot_refs, loader, &mut report);
                if effect_refs.insert(effect.reference, id).is_some() {
                    warn!(target: "tactics::persist", reference = effect.reference, "duplicate effect ref");
                }
                report.effects += 1;
            }
        }

        for creature in &live {
            for slot in &creature.slots {
                let Some(slot_id) = slot_refs.get(&slot.reference).copied() else {
                    continue;
                };
                for reference in &slot.effects {
                    match effect_refs.get(reference) {
                        Some(effect) => {
                            if let Some(current) = self.slots.get_mut(&slot_id) {
                                current.track(*effect);
                            }
                        }
                        None => {
                            warn!(target: "tactics::persist", %slot_id, reference, "slot refers to unknown effect");
                            report.skipped += 1;
                        }
                    }
                }
            }
        }

        for (host, set) in &hosts {
            for effect in set.effects() {
                let Some(parent) = effect_refs.get(&effect.reference).copied() else {
                    continue;
                };
                for reference in &effect.children {
                    match effect_refs.get(reference) {
                        Some(child) => {
                            if let Some(parent) = self.effects.get_mut(&parent) {
                                parent.add_child(*child);
                            }
                        }
                        None => {
                            warn!(target: "tactics::persist", effect = %parent, reference, "unknown child effect");
                            report.skipped += 1;
                        }
                    }
                }
            }
            for reference in &set.auras {
                match effect_refs.get(reference).copied() {
                    Some(aura) => self.restore_aura(*host, aura),
                    None => {
                        warn!(target: "tactics::persist", %host, reference, "unknown aura");
                        report.skipped += 1;
                    }
                }
            }
        }

        debug!(
            target: "tactics::persist",
            slots = report.slots,
            effects = report.effects,
            skipped = report.skipped,
            "world loaded"
        );
        report
    }

    /// Drops, without callbacks, the host effects a record carries.
    fn discard_saved_effects(&mut self, host: TargetRef) {
        let saved: Vec<EffectId> = self
            .effect_set(host)
            .map(|set| {
                set.iter()
                    .filter(|id| self.effects.get(id).is_some_and(is_saved))
                    .collect()
            })
            .unwrap_or_default();
        for id in saved {
            if let Some(set) = effect_set_mut(&mut self.creatures, &mut self.area, host) {
                set.remove(id);
            }
            self.area.deregister_aura(id);
            self.effects.remove(&id);
        }
    }

    fn clear_slots(&mut self, entity: crate::ids::EntityId) {
        let Some(creature) = self.creatures.get_mut(&entity) else {
            return;
        };
        for slot in std::mem::take(&mut creature.slots) {
            self.slots.remove(&slot);
        }
    }

    fn load_slot(
        &mut self,
        owner: crate::ids::EntityId,
        record: &AbilitySlotRecord,
        report: &mut LoadReport,
    ) -> SlotId {
        let ability = record.ability_id.as_deref().and_then(|id| match self.lookup_ability(id) {
            Ok(ability) => Some(ability),
            Err(err) => {
                warn!(target: "tactics::persist", reference = record.reference, %err, "slot ability dropped");
                report.skipped += 1;
                None
            }
        });

        let id = self.allocate_slot();
        let mut slot = match ability {
            Some(ability) if record.fixed => AbilitySlot::fixed(id, owner, ability),
            ability => {
                let mut slot = AbilitySlot::new(id, owner, record.slot_type.clone());
                slot.bind(ability);
                slot
            }
        };
        slot.active = record.active && slot.ability.is_some();
        slot.active_rounds_left = record.active_rounds_left.unwrap_or_default();
        slot.cooldown_rounds_left = record.cooldown_rounds_left.unwrap_or_default();
        self.insert_slot(slot);
        id
    }

    fn load_effect(
        &mut self,
        host: TargetRef,
        record: &EffectRecord,
        slot_refs: &BTreeMap<u32, SlotId>,
        loader: &dyn ResourceLoader,
        report: &mut LoadReport,
    ) -> EffectId {
        let script = record
            .script
            .as_ref()
            .and_then(|script| self.load_script(script, loader, report))
            .map(Arc::new);
        let slot = record.slot.and_then(|reference| {
            let slot = slot_refs.get(&reference).copied();
            if slot.is_none() {
                warn!(target: "tactics::persist", effect = record.reference, reference, "unknown originating slot");
                report.skipped += 1;
            }
            slot
        });
        let aura = record.is_aura.then(|| {
            Aura::new(
                record.min_radius.unwrap_or_default(),
                record.max_radius.unwrap_or_default(),
            )
        });

        let id = self.insert_effect(script, slot, aura);
        let World {
            effects,
            creatures,
            area,
            ..
        } = self;
        if let Some(effect) = effects.get_mut(&id) {
            effect.title = record.title.clone();
            effect.icons = record.icons.clone();
            effect.set_duration(record.duration);
            effect.remove_on_deactivate = record.remove_on_deactivate;
            effect.has_description = record.has_description;
            effect.bonuses = record.bonuses.clone();
            effect.animations = record.animations.clone();
            effect.script_state = record.script_state.clone();
            effect.target = Some(host);

            if let Some(set) = effect_set_mut(creatures, area, host) {
                set.insert(effect);
            }
        }
        id
    }

    fn load_script(
        &self,
        record: &ScriptableRecord,
        loader: &dyn ResourceLoader,
        report: &mut LoadReport,
    ) -> Option<Scriptable> {
        let engine = self.engine.as_ref();
        let result = match (&record.script_contents, &record.script_location) {
            (Some(contents), _) => Scriptable::inline(engine, contents.clone(), INLINE_LOCATION),
            (None, Some(location)) => Scriptable::from_location(engine, loader, location.clone()),
            (None, None) => return None,
        };
        match result {
            Ok(script) => Some(script),
            Err(err) => {
                warn!(target: "tactics::persist", %err, "effect script dropped");
                report.skipped += 1;
                None
            }
        }
    }

    fn restore_aura(&mut self, host: TargetRef, aura: EffectId) {
        if !self.effects.get(&aura).is_some_and(Effect::is_aura) {
            warn!(target: "tactics::persist", effect = %aura, "aura ref points at a plain effect");
            return;
        }
        if let Some(set) = effect_set_mut(&mut self.creatures, &mut self.area, host) {
            set.track_aura(aura);
        }
        let points = self.aura_points(aura);
        if !points.is_empty() {
            self.area.register_aura(aura, points);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ability::tests::ability;
    use crate::ability::{AbilityFlags, Ruleset};
    use crate::grid::Position;
    use crate::rounds::Rounds;
    use crate::script::{NativeScriptEngine, ScriptError, ScriptValue};
    use crate::stats::{Bonus, StatKind};
    use crate::world::Creature;
    use crate::world::test_support::world_with;

    struct NoResources;

    impl ResourceLoader for NoResources {
        fn script_source(&self, location: &str) -> Result<String, ScriptError> {
            Err(ScriptError::ResourceNotFound(location.to_string()))
        }
    }

    fn ruleset() -> Ruleset {
        let mut stance = ability("Stance");
        stance.flags = AbilityFlags::ACTIVATEABLE | AbilityFlags::MODE | AbilityFlags::CANCELABLE;
        stance.cooldown = 2;
        let mut ruleset = Ruleset::new();
        ruleset.insert(stance);
        ruleset
    }

    fn engine() -> Arc<NativeScriptEngine> {
        let engine = Arc::new(NativeScriptEngine::new());
        engine.define("glow", "onRoundElapsed", |_, _| Ok(ScriptValue::Null));
        engine
    }

    fn populate(world: &mut World) {
        world.add_creature(Creature::new("Aldo", "Player", Position::new(5, 5)).player_controlled());
        world.add_creature(Creature::new("Rat", "Vermin", Position::new(2, 2)));
    }

    #[test]
    fn save_skips_permanent_effects_and_dead_npcs() {
        let engine = engine();
        let mut world = world_with(engine.clone(), ruleset());
        populate(&mut world);
        let hero = crate::ids::EntityId(1);
        let rat = crate::ids::EntityId(2);
        world.set_turn_mode(true);
        let slot = world.add_slot(hero, "Innate").unwrap();
        world.set_slot_ability(slot, Some("Stance")).unwrap();
        world.fire_slot(slot).unwrap();

        let permanent = world.create_slot_effect(slot, None).unwrap();
        world.apply_effect(permanent, TargetRef::Creature(hero)).unwrap();
        let on_rat = world.create_slot_effect(slot, None).unwrap();
        world.effect_mut(on_rat).unwrap().set_duration(3);
        world.apply_effect(on_rat, TargetRef::Creature(rat)).unwrap();
        world.kill_creature(rat);

        let record = world.save_records();
        assert_eq!(record.creatures.len(), 1);
        let hero_record = &record.creatures[0];
        assert!(hero_record.effects.is_empty());
        assert_eq!(hero_record.slots[0].effects, Vec::<u32>::new());
        assert!(hero_record.slots[0].active);
        assert_eq!(hero_record.slots[0].active_rounds_left, Some(Rounds::Indefinite));
    }

    #[test]
    fn save_and_load_restores_slots_effects_and_auras() {
        let engine = engine();
        let glow = Arc::new(Scriptable::inline(&*engine, "glow", "glow").unwrap());

        let mut world = world_with(engine.clone(), ruleset());
        populate(&mut world);
        let hero = crate::ids::EntityId(1);
        world.set_turn_mode(true);
        let slot = world.add_slot(hero, "Innate").unwrap();
        world.set_slot_ability(slot, Some("Stance")).unwrap();
        world.fire_slot(slot).unwrap();

        let aura = world.create_slot_aura(slot, Some(Arc::clone(&glow)), 1, 2).unwrap();
        world.effect_mut(aura).unwrap().set_remove_on_deactivate(true);
        world.apply_effect(aura, TargetRef::Creature(hero)).unwrap();

        let buff = world.create_slot_effect(slot, None).unwrap();
        {
            let effect = world.effect_mut(buff).unwrap();
            effect.set_duration(4);
            effect.set_title("Blessed");
            effect.add_bonus(Bonus::flat(StatKind::ArmorClass, 2));
            effect.put_state("stacks", 3i64);
        }
        world.apply_effect(buff, TargetRef::Creature(hero)).unwrap();
        world.add_child_effect(aura, buff).unwrap();

        let json = world.save_records().to_json().unwrap();
        let record = WorldRecord::from_json(&json).unwrap();

        let mut restored = world_with(engine.clone(), ruleset());
        populate(&mut restored);
        let report = restored.load_records(&record, &NoResources);
        assert_eq!(report, LoadReport { slots: 1, effects: 2, skipped: 0 });

        let slots = restored.slots_of(hero);
        let slot = slots[0];
        assert!(slot.is_active());
        assert_eq!(slot.ability_id(), Some("Stance"));
        assert_eq!(slot.cooldown_rounds_left(), Rounds::Indefinite);
        assert_eq!(slot.effects().len(), 2);

        let creature = restored.creature(hero).unwrap();
        assert_eq!(creature.effects.with_script().len(), 1);
        assert_eq!(creature.effects.no_script().len(), 1);
        assert_eq!(creature.effects.auras().len(), 1);
        assert_eq!(restored.effective_stat(creature, StatKind::ArmorClass), 2);

        let aura = creature.effects.auras()[0];
        assert_eq!(restored.area().aura_points(aura).map(<[_]>::len), Some(18));
        let children = restored.effect(aura).unwrap().children();
        assert_eq!(children.len(), 1);
        let buff = restored.effect(children[0]).unwrap();
        assert_eq!(buff.title(), Some("Blessed"));
        assert_eq!(buff.duration(), 4);
        assert_eq!(buff.get_state("stacks"), Some(&ScriptValue::Int(3)));
    }

    #[test]
    fn reload_keeps_template_effects_and_replaces_saved_ones() {
        let engine = engine();
        let mut world = world_with(engine.clone(), ruleset());
        populate(&mut world);
        let hero = crate::ids::EntityId(1);

        let racial = world.create_effect(None);
        world
            .effect_mut(racial)
            .unwrap()
            .add_bonus(Bonus::flat(StatKind::ArmorClass, 2));
        world.apply_effect(racial, TargetRef::Creature(hero)).unwrap();

        let timed = world.create_effect(None);
        {
            let effect = world.effect_mut(timed).unwrap();
            effect.set_duration(3);
            effect.add_bonus(Bonus::flat(StatKind::ArmorClass, 1));
        }
        world.apply_effect(timed, TargetRef::Creature(hero)).unwrap();
        assert_eq!(world.effective_stat(world.creature(hero).unwrap(), StatKind::ArmorClass), 3);

        let record = world.save_records();
        assert_eq!(record.creatures[0].effects.effects().count(), 1);

        // Same live world: the timed effect is replaced, the racial one stays.
        let report = world.load_records(&record, &NoResources);
        assert_eq!(report.effects, 1);

        let creature = world.creature(hero).unwrap();
        assert_eq!(creature.effects.len(), 2);
        assert!(creature.effects.contains(racial));
        assert!(!creature.effects.contains(timed));
        assert!(world.effect(racial).is_some());
        assert!(world.effect(timed).is_none());
        assert_eq!(world.effective_stat(creature, StatKind::ArmorClass), 3);
    }

    #[test]
    fn dangling_references_are_skipped() {
        let engine = engine();
        let mut world = world_with(engine.clone(), ruleset());
        populate(&mut world);

        let record = WorldRecord {
            creatures: vec![CreatureRecord {
                entity: crate::ids::EntityId(1),
                slots: vec![AbilitySlotRecord {
                    reference: 1,
                    slot_type: "Innate".into(),
                    fixed: false,
                    ability_id: Some("Forgotten".into()),
                    active: true,
                    active_rounds_left: None,
                    cooldown_rounds_left: Some(Rounds::Finite(1)),
                    effects: vec![99],
                }],
                effects: EntityEffectSetRecord::default(),
            }],
            area_effects: EntityEffectSetRecord {
                auras: vec![7],
                ..Default::default()
            },
        };

        let report = world.load_records(&record, &NoResources);
        assert_eq!(report.slots, 1);
        assert_eq!(report.skipped, 3);
        let slot = world.slots_of(crate::ids::EntityId(1))[0];
        assert!(slot.is_empty());
        assert!(!slot.is_active());
        assert_eq!(slot.cooldown_rounds_left(), Rounds::Finite(1));
    }
}
