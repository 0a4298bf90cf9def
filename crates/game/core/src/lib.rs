//! Ability, effect and targeting rules for a turn-based tactics game.
//!
//! `tactics-core` holds the canonical rules: ability definitions and the slot
//! state machine, effects and auras attached to creatures or the area, the
//! scripting contract callbacks are dispatched through, and interactive
//! targeters. All mutable state lives in an explicit [`World`]; scripts
//! receive it as their first argument. Loading content from disk and driving
//! the world from a UI thread belong to `tactics-content` and
//! `tactics-runtime`.
pub mod ability;
pub mod config;
pub mod effect;
pub mod error;
pub mod grid;
pub mod ids;
#[cfg(feature = "serde")]
pub mod persist;
pub mod rounds;
pub mod script;
pub mod stats;
pub mod targeter;
pub mod timer;
pub mod world;

pub use ability::{
    Ability, AbilityDefinition, AbilityFlags, AbilitySlot, ActionPointCost, ActionType, GroupType,
    Prerequisite, RangeType, Ruleset, SlotError, SlotState, SpellData,
};
pub use config::RulesConfig;
pub use effect::{Aura, Effect, EffectError, EffectTarget, EntityEffectSet, TargetRef};
pub use error::{DefinitionError, ErrorSeverity, GameError};
pub use grid::{AreaDimensions, FractionalHex, Position};
pub use ids::{EffectId, EntityId, SlotId, TargeterId};
#[cfg(feature = "serde")]
pub use persist::{LoadReport, PersistError, WorldRecord};
pub use rounds::Rounds;
pub use script::{
    NativeScriptEngine, ResourceLoader, ScriptContext, ScriptEngine, ScriptError, ScriptFunction,
    ScriptFunctions, ScriptValue, Scriptable, TargetSelection,
};
pub use stats::{BaseStats, Bonus, BonusKind, BonusStack, StatKind};
pub use targeter::{PollOutcome, Targeter, TargeterHandle, TargeterManager};
pub use timer::RoundTimer;
pub use world::{Area, Creature, FactionTable, Feedback, NullFeedback, Relationship, World};
