use std::collections::BTreeMap;
use std::sync::Arc;

use super::Ability;

/// Registry resolving ability ids to their shared definitions.
#[derive(Debug, Default)]
pub struct Ruleset {
    abilities: BTreeMap<String, Arc<Ability>>,
}

impl Ruleset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `ability`, replacing any previous definition with the same id.
    pub fn insert(&mut self, ability: Ability) -> Arc<Ability> {
        let ability = Arc::new(ability);
        self.abilities
            .insert(ability.id().to_string(), Arc::clone(&ability));
        ability
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Ability>> {
        self.abilities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.abilities.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.abilities.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Ability>> {
        self.abilities.values()
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

impl FromIterator<Ability> for Ruleset {
    fn from_iter<I: IntoIterator<Item = Ability>>(iter: I) -> Self {
        let mut ruleset = Self::new();
        for ability in iter {
            ruleset.insert(ability);
        }
        ruleset
    }
}
