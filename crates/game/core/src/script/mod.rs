//! Script dispatch contract.
//!
//! Abilities, effects and targeters delegate behavior to user-authored
//! scripts. The interpreter itself is a black box behind [`ScriptEngine`];
//! this module fixes the callback vocabulary ([`ScriptFunction`]), the value
//! type passed across the boundary ([`ScriptValue`]) and the dispatch wrapper
//! ([`Scriptable`]) that contains every interpreter failure.

mod native;
pub(crate) mod scriptable;

pub use native::{NativeFn, NativeScriptEngine};
pub use scriptable::Scriptable;

use std::collections::BTreeMap;

use bitflags::bitflags;
use strum::IntoEnumIterator;

use crate::error::{ErrorSeverity, GameError};
use crate::grid::Position;
use crate::ids::{EffectId, EntityId, SlotId, TargeterId};
use crate::world::World;

/// Callback names a script may define.
///
/// The set is closed: a script function with any other name is never
/// dispatched by the engine, though scripts may still call it themselves.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum ScriptFunction {
    OnActivate,
    OnDeactivate,
    CanActivate,
    OnAbilityActivated,
    OnEffectApplied,
    OnEffectRemoved,
    OnRoundElapsed,
    OnTargetSelect,
    OnTargetCancel,
    OnTargetEnter,
    OnTargetExit,
    OnAttack,
    OnAttackHit,
    OnDefense,
    OnDefenseHit,
    OnDamaged,
    OnKilled,
}

impl ScriptFunction {
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn flag(self) -> ScriptFunctions {
        ScriptFunctions::from_bits_retain(1 << self as u32)
    }
}

bitflags! {
    /// Set of [`ScriptFunction`]s a script defines.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ScriptFunctions: u32 {
        const ON_ACTIVATE = 1 << 0;
        const ON_DEACTIVATE = 1 << 1;
        const CAN_ACTIVATE = 1 << 2;
        const ON_ABILITY_ACTIVATED = 1 << 3;
        const ON_EFFECT_APPLIED = 1 << 4;
        const ON_EFFECT_REMOVED = 1 << 5;
        const ON_ROUND_ELAPSED = 1 << 6;
        const ON_TARGET_SELECT = 1 << 7;
        const ON_TARGET_CANCEL = 1 << 8;
        const ON_TARGET_ENTER = 1 << 9;
        const ON_TARGET_EXIT = 1 << 10;
        const ON_ATTACK = 1 << 11;
        const ON_ATTACK_HIT = 1 << 12;
        const ON_DEFENSE = 1 << 13;
        const ON_DEFENSE_HIT = 1 << 14;
        const ON_DAMAGED = 1 << 15;
        const ON_KILLED = 1 << 16;
    }
}

impl ScriptFunctions {
    pub fn has(self, function: ScriptFunction) -> bool {
        self.contains(function.flag())
    }

    /// Defined functions in declaration order.
    pub fn functions(self) -> impl Iterator<Item = ScriptFunction> {
        ScriptFunction::iter().filter(move |f| self.has(*f))
    }
}

/// Points and creatures picked by a targeter, handed to its select callback.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TargetSelection {
    pub targeter: Option<TargeterId>,
    pub parent: Option<EntityId>,
    pub slot: Option<SlotId>,
    pub points: Vec<Position>,
    pub creatures: Vec<EntityId>,
    pub mouse: Option<Position>,
}

/// A value crossing the script boundary.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ScriptValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Entity(EntityId),
    Slot(SlotId),
    Effect(EffectId),
    Targeter(TargeterId),
    Point(Position),
    List(Vec<ScriptValue>),
    Map(BTreeMap<String, ScriptValue>),
    Selection(Box<TargetSelection>),
}

impl ScriptValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Script truthiness: null and false are falsy, as are zero and "".
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<EntityId> {
        match self {
            Self::Entity(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_effect(&self) -> Option<EffectId> {
        match self {
            Self::Effect(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_slot(&self) -> Option<SlotId> {
        match self {
            Self::Slot(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_selection(&self) -> Option<&TargetSelection> {
        match self {
            Self::Selection(selection) => Some(selection),
            _ => None,
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ScriptValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<EntityId> for ScriptValue {
    fn from(value: EntityId) -> Self {
        Self::Entity(value)
    }
}

impl From<SlotId> for ScriptValue {
    fn from(value: SlotId) -> Self {
        Self::Slot(value)
    }
}

impl From<EffectId> for ScriptValue {
    fn from(value: EffectId) -> Self {
        Self::Effect(value)
    }
}

impl From<Position> for ScriptValue {
    fn from(value: Position) -> Self {
        Self::Point(value)
    }
}

impl From<TargetSelection> for ScriptValue {
    fn from(value: TargetSelection) -> Self {
        Self::Selection(Box::new(value))
    }
}

/// Failures raised by a script engine.
///
/// These never escape [`Scriptable`]: dispatch logs them and yields `None`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("failed to evaluate `{location}`: {reason}")]
    Eval { location: String, reason: String },

    #[error("function `{0}` is not defined")]
    MissingFunction(String),

    #[error("`{function}` failed: {reason}")]
    Invocation { function: String, reason: String },

    #[error("script resource `{0}` not found")]
    ResourceNotFound(String),

    #[error("engine does not support invocation")]
    Unsupported,
}

impl ScriptError {
    pub fn invocation(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invocation {
            function: function.into(),
            reason: reason.into(),
        }
    }
}

impl GameError for ScriptError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Eval { .. } | Self::ResourceNotFound(_) => ErrorSeverity::Validation,
            Self::MissingFunction(_) | Self::Invocation { .. } => ErrorSeverity::Recoverable,
            Self::Unsupported => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Eval { .. } => "SCRIPT_EVAL",
            Self::MissingFunction(_) => "SCRIPT_MISSING_FUNCTION",
            Self::Invocation { .. } => "SCRIPT_INVOCATION",
            Self::ResourceNotFound(_) => "SCRIPT_RESOURCE_NOT_FOUND",
            Self::Unsupported => "SCRIPT_UNSUPPORTED",
        }
    }
}

/// Script interpreter handle.
///
/// Each call to [`ScriptEngine::context`] yields a fresh, isolated
/// interpreter context. Contexts are cheap and short-lived.
pub trait ScriptEngine: Send + Sync {
    fn context(&self) -> Box<dyn ScriptContext + '_>;
}

/// One interpreter context.
pub trait ScriptContext {
    /// Evaluates `source`. Scripts are expected to only define functions at
    /// top level, so evaluating twice is harmless.
    fn eval(&mut self, source: &str, location: &str) -> Result<(), ScriptError>;

    fn has_function(&self, name: &str) -> bool;

    /// Invokes `name` with the world handle followed by `args`.
    fn invoke_function(
        &mut self,
        name: &str,
        world: &mut World,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, ScriptError>;

    /// Frees interpreter resources.
    fn release(self: Box<Self>) {}
}

/// Source of script text by resource location.
pub trait ResourceLoader: Send + Sync {
    fn script_source(&self, location: &str) -> Result<String, ScriptError>;
}
