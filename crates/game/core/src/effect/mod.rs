//! Effects: timed or permanent bundles of bonuses with optional script hooks.
//!
//! Effects live in the world's effect arena and are referenced by
//! [`EffectId`]. Attaching, elapsing and removing them is driven through
//! [`crate::World`] because every transition may dispatch scripts.

mod set;
mod target;

pub use set::EntityEffectSet;
pub use target::{EffectTarget, TargetRef};

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ErrorSeverity, GameError};
use crate::grid::{AreaDimensions, Position};
use crate::ids::{EffectId, SlotId};
use crate::script::{ScriptValue, Scriptable};
use crate::stats::{Bonus, StatKind};

/// Radius rule of an aura.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Aura {
    pub min_radius: u32,
    pub max_radius: u32,
}

impl Aura {
    pub fn new(min_radius: u32, max_radius: u32) -> Self {
        Self {
            min_radius,
            max_radius,
        }
    }

    /// Points covered when centered on `center`: rings `min_radius` through
    /// `max_radius`, clipped to `bounds`. The center is covered only when
    /// `min_radius` is zero.
    pub fn affected_points(&self, center: Position, bounds: AreaDimensions) -> Vec<Position> {
        center
            .rings(self.min_radius, self.max_radius)
            .into_iter()
            .filter(|p| bounds.contains(*p))
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct Effect {
    pub(crate) id: EffectId,
    pub(crate) title: Option<String>,
    pub(crate) duration: u32,
    pub(crate) timed: bool,
    pub(crate) remove_on_deactivate: bool,
    pub(crate) has_description: bool,
    pub(crate) bonuses: Vec<Bonus>,
    pub(crate) icons: Vec<String>,
    pub(crate) children: Vec<EffectId>,
    pub(crate) animations: Vec<String>,
    pub(crate) script_state: BTreeMap<String, ScriptValue>,
    pub(crate) script: Option<Arc<Scriptable>>,
    pub(crate) slot: Option<SlotId>,
    pub(crate) target: Option<TargetRef>,
    pub(crate) aura: Option<Aura>,
    pub(crate) removing: bool,
}

impl Effect {
    pub(crate) fn new(id: EffectId, script: Option<Arc<Scriptable>>, slot: Option<SlotId>) -> Self {
        Self {
            id,
            title: None,
            duration: 0,
            timed: false,
            remove_on_deactivate: false,
            has_description: true,
            bonuses: Vec::new(),
            icons: Vec::new(),
            children: Vec::new(),
            animations: Vec::new(),
            script_state: BTreeMap::new(),
            script,
            slot,
            target: None,
            aura: None,
            removing: false,
        }
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Rounds left; zero means no natural expiry.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: u32) {
        self.duration = duration;
        if duration > 0 {
            self.timed = true;
        }
    }

    /// True once the duration has ever been nonzero.
    pub fn is_timed(&self) -> bool {
        self.timed
    }

    /// Ran out of time and is eligible for automatic removal.
    pub fn is_lapsed(&self) -> bool {
        self.timed && self.duration == 0 && !self.remove_on_deactivate
    }

    pub fn remove_on_deactivate(&self) -> bool {
        self.remove_on_deactivate
    }

    pub fn set_remove_on_deactivate(&mut self, remove: bool) {
        self.remove_on_deactivate = remove;
    }

    pub fn has_description(&self) -> bool {
        self.has_description
    }

    pub fn set_has_description(&mut self, has_description: bool) {
        self.has_description = has_description;
    }

    pub fn bonuses(&self) -> &[Bonus] {
        &self.bonuses
    }

    pub fn add_bonus(&mut self, bonus: Bonus) {
        self.bonuses.push(bonus);
    }

    pub fn bonuses_for(&self, stat: StatKind) -> impl Iterator<Item = &Bonus> {
        self.bonuses.iter().filter(move |b| b.stat == stat)
    }

    pub fn icons(&self) -> &[String] {
        &self.icons
    }

    pub fn add_icon(&mut self, icon: impl Into<String>) {
        self.icons.push(icon.into());
    }

    pub fn children(&self) -> &[EffectId] {
        &self.children
    }

    /// Tracks `child` so that it is removed along with this effect.
    pub fn add_child(&mut self, child: EffectId) {
        if child != self.id && !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub fn animations(&self) -> &[String] {
        &self.animations
    }

    pub fn add_animation(&mut self, animation: impl Into<String>) {
        self.animations.push(animation.into());
    }

    pub fn script_state(&self) -> &BTreeMap<String, ScriptValue> {
        &self.script_state
    }

    pub fn get_state(&self, key: &str) -> Option<&ScriptValue> {
        self.script_state.get(key)
    }

    pub fn put_state(&mut self, key: impl Into<String>, value: impl Into<ScriptValue>) {
        self.script_state.insert(key.into(), value.into());
    }

    pub fn script(&self) -> Option<&Arc<Scriptable>> {
        self.script.as_ref()
    }

    /// True if the script defines at least one recognized callback.
    pub fn has_active_script(&self) -> bool {
        self.script.as_ref().is_some_and(|s| s.has_any_function())
    }

    pub fn slot(&self) -> Option<SlotId> {
        self.slot
    }

    pub fn target(&self) -> Option<TargetRef> {
        self.target
    }

    pub fn aura(&self) -> Option<Aura> {
        self.aura
    }

    pub fn is_aura(&self) -> bool {
        self.aura.is_some()
    }

    /// Counts the duration down without running callbacks.
    pub(crate) fn count_down(&mut self, rounds: u32) {
        if self.duration > 0 {
            self.duration = self.duration.saturating_sub(rounds);
        }
    }
}

/// Errors raised by effect operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    #[error("effect {0} does not exist")]
    NotFound(EffectId),

    #[error("effect {0} is already attached to a target")]
    AlreadyAttached(EffectId),

    #[error("effect target {0} does not exist")]
    TargetNotFound(TargetRef),
}

impl GameError for EffectError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotFound(_) | Self::TargetNotFound(_) => ErrorSeverity::Internal,
            Self::AlreadyAttached(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "EFFECT_NOT_FOUND",
            Self::AlreadyAttached(_) => "EFFECT_ALREADY_ATTACHED",
            Self::TargetNotFound(_) => "EFFECT_TARGET_NOT_FOUND",
        }
    }
}
