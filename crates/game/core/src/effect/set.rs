use std::collections::BTreeMap;

use super::Effect;
use crate::ids::EffectId;
use crate::stats::{BonusStack, StatKind};

/// Effects attached to one host.
///
/// Effects are split into two ordered partitions: those whose script defines
/// no recognized callback, and those that do. Dispatch loops only walk the
/// second. Auras are additionally listed in `auras`; every aura there is also
/// present in one of the partitions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityEffectSet {
    no_script: Vec<EffectId>,
    with_script: Vec<EffectId>,
    auras: Vec<EffectId>,
}

impl EntityEffectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes `effect` into its partition. Returns false if already present.
    pub(crate) fn insert(&mut self, effect: &Effect) -> bool {
        if self.contains(effect.id) {
            return false;
        }
        if effect.has_active_script() {
            self.with_script.push(effect.id);
        } else {
            self.no_script.push(effect.id);
        }
        if effect.is_aura() {
            self.auras.push(effect.id);
        }
        true
    }

    /// Removes `id` from whichever partition holds it and from the aura list.
    pub(crate) fn remove(&mut self, id: EffectId) -> bool {
        let before = self.len();
        self.no_script.retain(|e| *e != id);
        self.with_script.retain(|e| *e != id);
        self.auras.retain(|e| *e != id);
        self.len() != before
    }

    /// Empties the set, returning every member in partition order.
    pub(crate) fn drain(&mut self) -> Vec<EffectId> {
        self.auras.clear();
        let mut all = std::mem::take(&mut self.no_script);
        all.append(&mut self.with_script);
        all
    }

    /// Registers an aura that is already in a partition (used by load).
    pub(crate) fn track_aura(&mut self, id: EffectId) -> bool {
        if !self.contains(id) || self.auras.contains(&id) {
            return false;
        }
        self.auras.push(id);
        true
    }

    pub fn contains(&self, id: EffectId) -> bool {
        self.no_script.contains(&id) || self.with_script.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.no_script.len() + self.with_script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn no_script(&self) -> &[EffectId] {
        &self.no_script
    }

    pub fn with_script(&self) -> &[EffectId] {
        &self.with_script
    }

    pub fn auras(&self) -> &[EffectId] {
        &self.auras
    }

    /// All members, scriptless partition first.
    pub fn iter(&self) -> impl Iterator<Item = EffectId> + '_ {
        self.no_script.iter().chain(self.with_script.iter()).copied()
    }

    /// Gathers every bonus to `stat` from member effects.
    pub fn bonus_stack(&self, arena: &BTreeMap<EffectId, Effect>, stat: StatKind) -> BonusStack {
        self.iter()
            .filter_map(|id| arena.get(&id))
            .flat_map(|effect| effect.bonuses_for(stat).map(|b| b.kind))
            .collect()
    }
}
