//! Prerequisite predicates gating who may own or use an ability.

use crate::stats::StatKind;
use crate::world::{Creature, World};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "camelCase"))]
pub enum Prerequisite {
    MinLevel { level: u32 },
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    HasAbility { ability_id: String },
    MinStat { stat: StatKind, value: i32 },
    Faction { faction: String },
}

impl Prerequisite {
    /// Checks one predicate against the creature's current (effective) state.
    pub fn is_met(&self, world: &World, creature: &Creature) -> bool {
        match self {
            Self::MinLevel { level } => creature.level() >= *level,
            Self::HasAbility { ability_id } => creature.has_ability(ability_id),
            Self::MinStat { stat, value } => world.effective_stat(creature, *stat) >= *value,
            Self::Faction { faction } => creature.faction() == faction,
        }
    }
}

/// Prerequisites must all hold; restrictions block only when every one holds.
///
/// An empty restriction list never blocks.
pub fn meets_prereqs(
    world: &World,
    creature: &Creature,
    prereqs: &[Prerequisite],
    restrictions: &[Prerequisite],
) -> bool {
    let prereqs_met = prereqs.iter().all(|p| p.is_met(world, creature));
    let restricted =
        !restrictions.is_empty() && restrictions.iter().all(|r| r.is_met(world, creature));
    prereqs_met && !restricted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Position;
    use crate::stats::BaseStats;
    use crate::world::test_support::empty_world;

    fn fighter() -> Creature {
        let mut creature = Creature::new("Bran", "Player", Position::new(0, 0))
            .with_level(4)
            .with_stats(BaseStats::new().with(StatKind::Strength, 14));
        creature.grant_ability("PowerAttack");
        creature
    }

    #[test]
    fn prereqs_are_conjunctive() {
        let world = empty_world();
        let creature = fighter();

        let prereqs = vec![
            Prerequisite::MinLevel { level: 3 },
            Prerequisite::HasAbility {
                ability_id: "PowerAttack".into(),
            },
            Prerequisite::MinStat {
                stat: StatKind::Strength,
                value: 13,
            },
        ];
        assert!(meets_prereqs(&world, &creature, &prereqs, &[]));

        let too_high = vec![Prerequisite::MinLevel { level: 5 }];
        assert!(!meets_prereqs(&world, &creature, &too_high, &[]));
    }

    #[test]
    fn restrictions_block_only_when_all_hold() {
        let world = empty_world();
        let creature = fighter();

        let restrictions = vec![
            Prerequisite::Faction {
                faction: "Player".into(),
            },
            Prerequisite::MinLevel { level: 10 },
        ];
        assert!(meets_prereqs(&world, &creature, &[], &restrictions));

        let restrictions = vec![Prerequisite::Faction {
            faction: "Player".into(),
        }];
        assert!(!meets_prereqs(&world, &creature, &[], &restrictions));
    }
}
