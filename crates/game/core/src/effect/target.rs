use std::fmt;

use super::EntityEffectSet;
use crate::grid::Position;
use crate::ids::EntityId;

/// Where an effect is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum TargetRef {
    Creature(EntityId),
    Area,
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creature(id) => write!(f, "creature {id}"),
            Self::Area => write!(f, "area"),
        }
    }
}

/// Anything that can host effects.
pub trait EffectTarget {
    fn effects(&self) -> &EntityEffectSet;

    fn effects_mut(&mut self) -> &mut EntityEffectSet;

    /// Live position, for hosts that have one. Auras follow it.
    fn position(&self) -> Option<Position>;

    /// False once the host can no longer carry effects (e.g. it died).
    fn is_valid_effect_target(&self) -> bool;
}
