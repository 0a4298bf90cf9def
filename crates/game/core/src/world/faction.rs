use std::collections::HashMap;

/// Standing between two factions.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Relationship {
    Friendly,
    Neutral,
    Hostile,
}

/// Symmetric faction relationship table.
///
/// A faction is always friendly to itself; pairs that were never set fall
/// back to `default`.
#[derive(Clone, Debug)]
pub struct FactionTable {
    relationships: HashMap<(String, String), Relationship>,
    default: Relationship,
}

impl FactionTable {
    pub fn new(default: Relationship) -> Self {
        Self {
            relationships: HashMap::new(),
            default,
        }
    }

    fn key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    pub fn set(&mut self, a: &str, b: &str, relationship: Relationship) {
        self.relationships.insert(Self::key(a, b), relationship);
    }

    pub fn relationship(&self, a: &str, b: &str) -> Relationship {
        if a == b {
            return Relationship::Friendly;
        }
        self.relationships
            .get(&Self::key(a, b))
            .copied()
            .unwrap_or(self.default)
    }
}

impl Default for FactionTable {
    fn default() -> Self {
        Self::new(Relationship::Hostile)
    }
}
