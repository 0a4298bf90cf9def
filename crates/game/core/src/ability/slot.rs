//! Per-creature ability slots and their activation state machine.
//!
//! The counter bookkeeping lives here; transitions that touch effects or
//! scripts are driven through [`crate::World`] (see `world::slots`).

use std::sync::Arc;

use super::Ability;
use crate::error::{ErrorSeverity, GameError};
use crate::ids::{EffectId, EntityId, SlotId};
use crate::rounds::Rounds;

/// Observable state of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum SlotState {
    Empty,
    Readied,
    OnCooldown,
    Active,
    ActiveOnCooldown,
}

#[derive(Clone, Debug)]
pub struct AbilitySlot {
    pub(crate) id: SlotId,
    pub(crate) slot_type: String,
    pub(crate) fixed: bool,
    pub(crate) owner: EntityId,
    pub(crate) ability: Option<Arc<Ability>>,
    pub(crate) cooldown_rounds_left: Rounds,
    pub(crate) active_rounds_left: Rounds,
    pub(crate) active: bool,
    pub(crate) effects: Vec<EffectId>,
}

impl AbilitySlot {
    pub(crate) fn new(id: SlotId, owner: EntityId, slot_type: impl Into<String>) -> Self {
        Self {
            id,
            slot_type: slot_type.into(),
            fixed: false,
            owner,
            ability: None,
            cooldown_rounds_left: Rounds::ZERO,
            active_rounds_left: Rounds::ZERO,
            active: false,
            effects: Vec::new(),
        }
    }

    /// Slot permanently bound to `ability`.
    pub(crate) fn fixed(id: SlotId, owner: EntityId, ability: Arc<Ability>) -> Self {
        let mut slot = Self::new(id, owner, ability.slot_type().to_string());
        slot.fixed = true;
        slot.ability = Some(ability);
        slot
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn slot_type(&self) -> &str {
        &self.slot_type
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn ability(&self) -> Option<&Arc<Ability>> {
        self.ability.as_ref()
    }

    pub fn ability_id(&self) -> Option<&str> {
        self.ability.as_ref().map(|a| a.id())
    }

    pub fn is_empty(&self) -> bool {
        self.ability.is_none()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn cooldown_rounds_left(&self) -> Rounds {
        self.cooldown_rounds_left
    }

    pub fn active_rounds_left(&self) -> Rounds {
        self.active_rounds_left
    }

    /// Effects created through this slot that are still tracked.
    pub fn effects(&self) -> &[EffectId] {
        &self.effects
    }

    pub fn state(&self) -> SlotState {
        if self.ability.is_none() {
            return SlotState::Empty;
        }
        match (self.active, self.cooldown_rounds_left.is_zero()) {
            (true, true) => SlotState::Active,
            (true, false) => SlotState::ActiveOnCooldown,
            (false, true) => SlotState::Readied,
            (false, false) => SlotState::OnCooldown,
        }
    }

    /// False when fixed, or when engaged in an ability that cannot be canceled.
    pub fn is_settable(&self) -> bool {
        if self.fixed {
            return false;
        }
        match &self.ability {
            Some(ability) => !(self.active && !ability.is_cancelable()),
            None => true,
        }
    }

    pub fn can_deactivate(&self) -> bool {
        self.active && self.ability.as_ref().is_some_and(|a| a.is_cancelable())
    }

    /// Label for the slot's remaining time: active rounds while engaged,
    /// otherwise cooldown; empty when neither applies.
    pub fn rounds_label(&self, threshold: u32) -> String {
        let rounds = if self.active {
            self.active_rounds_left
        } else {
            self.cooldown_rounds_left
        };
        if rounds.is_zero() {
            String::new()
        } else {
            rounds.label(threshold)
        }
    }

    // ===== counter transitions =====

    /// Binds a new ability, keeping the cooldown that is already running.
    pub(crate) fn bind(&mut self, ability: Option<Arc<Ability>>) {
        self.ability = ability;
        self.active = false;
        self.active_rounds_left = Rounds::ZERO;
    }

    /// Applies the activation counters. Returns false, changing nothing, while
    /// the slot is empty or cooling down.
    pub(crate) fn engage(&mut self) -> bool {
        let Some(ability) = &self.ability else {
            return false;
        };
        if !self.cooldown_rounds_left.is_zero() {
            return false;
        }

        if ability.is_mode() {
            self.active = true;
            if self.active_rounds_left.is_zero() {
                self.active_rounds_left = Rounds::Indefinite;
            }
        }
        // A mode's cooldown starts counting only once its active period ends.
        self.cooldown_rounds_left = self.active_rounds_left + ability.cooldown();
        true
    }

    /// Applies the deactivation counters. Returns false while empty or inactive.
    pub(crate) fn disengage(&mut self) -> bool {
        let Some(ability) = &self.ability else {
            return false;
        };
        if !self.active {
            return false;
        }

        self.active = false;
        self.cooldown_rounds_left = Rounds::Finite(ability.cooldown());
        self.active_rounds_left = Rounds::ZERO;
        true
    }

    /// Counts both timers down. Returns true when the active period is over.
    pub(crate) fn tick(&mut self, rounds: u32) -> bool {
        self.cooldown_rounds_left = self.cooldown_rounds_left.saturating_sub(rounds);
        self.active_rounds_left = self.active_rounds_left.saturating_sub(rounds);
        self.active_rounds_left.is_zero()
    }

    pub(crate) fn track(&mut self, effect: EffectId) {
        if !self.effects.contains(&effect) {
            self.effects.push(effect);
        }
    }

    pub(crate) fn untrack(&mut self, effect: EffectId) {
        self.effects.retain(|id| *id != effect);
    }
}

/// Errors raised by slot operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("slot {0} does not exist")]
    NotFound(SlotId),

    #[error("creature {0} does not exist")]
    OwnerNotFound(EntityId),

    #[error("slot {0} cannot change ability right now")]
    NotSettable(SlotId),

    #[error("unknown ability `{0}`")]
    UnknownAbility(String),

    #[error("slot {0} has no ability")]
    Empty(SlotId),
}

impl GameError for SlotError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotSettable(_) | Self::Empty(_) => ErrorSeverity::Recoverable,
            Self::UnknownAbility(_) => ErrorSeverity::Validation,
            Self::NotFound(_) | Self::OwnerNotFound(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "SLOT_NOT_FOUND",
            Self::OwnerNotFound(_) => "SLOT_OWNER_NOT_FOUND",
            Self::NotSettable(_) => "SLOT_NOT_SETTABLE",
            Self::UnknownAbility(_) => "SLOT_UNKNOWN_ABILITY",
            Self::Empty(_) => "SLOT_EMPTY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::AbilityFlags;
    use crate::ability::tests::ability;

    fn slot_with(flags: AbilityFlags, cooldown: u32) -> AbilitySlot {
        let mut definition = ability("Stance");
        definition.flags = flags;
        definition.cooldown = cooldown;
        let mut slot = AbilitySlot::new(SlotId(1), EntityId(1), "Innate");
        slot.bind(Some(Arc::new(definition)));
        slot
    }

    fn mode() -> AbilityFlags {
        AbilityFlags::ACTIVATEABLE | AbilityFlags::MODE | AbilityFlags::CANCELABLE
    }

    #[test]
    fn mode_activation_sets_indefinite_period() {
        let mut slot = slot_with(mode(), 2);
        assert!(slot.engage());

        assert!(slot.is_active());
        assert_eq!(slot.active_rounds_left(), Rounds::Indefinite);
        assert_eq!(slot.cooldown_rounds_left(), Rounds::Indefinite);
        assert_eq!(slot.state(), SlotState::ActiveOnCooldown);
    }

    #[test]
    fn preset_active_period_adds_to_cooldown() {
        let mut slot = slot_with(mode(), 2);
        slot.active_rounds_left = Rounds::Finite(3);
        assert!(slot.engage());

        assert_eq!(slot.active_rounds_left(), Rounds::Finite(3));
        assert_eq!(slot.cooldown_rounds_left(), Rounds::Finite(5));
    }

    #[test]
    fn non_mode_activation_never_sets_active() {
        let mut slot = slot_with(AbilityFlags::ACTIVATEABLE, 4);
        assert!(slot.engage());

        assert!(!slot.is_active());
        assert_eq!(slot.cooldown_rounds_left(), Rounds::Finite(4));
        assert_eq!(slot.state(), SlotState::OnCooldown);

        // Still cooling down: nothing changes.
        assert!(!slot.engage());
        assert_eq!(slot.cooldown_rounds_left(), Rounds::Finite(4));
    }

    #[test]
    fn tick_decreases_by_min_of_rounds_and_value() {
        for rounds in 0..8 {
            let mut slot = slot_with(mode(), 2);
            slot.active_rounds_left = Rounds::Finite(3);
            slot.engage();

            slot.tick(rounds);
            assert_eq!(slot.active_rounds_left(), Rounds::Finite(3 - rounds.min(3)));
            assert_eq!(slot.cooldown_rounds_left(), Rounds::Finite(5 - rounds.min(5)));
        }
    }

    #[test]
    fn disengage_overwrites_cooldown() {
        let mut slot = slot_with(mode(), 2);
        slot.engage();
        assert!(slot.disengage());

        assert!(!slot.is_active());
        assert_eq!(slot.cooldown_rounds_left(), Rounds::Finite(2));
        assert_eq!(slot.active_rounds_left(), Rounds::ZERO);
        assert!(!slot.disengage());
    }

    #[test]
    fn settability() {
        let mut empty = AbilitySlot::new(SlotId(1), EntityId(1), "Innate");
        assert!(empty.is_settable());
        empty.fixed = true;
        assert!(!empty.is_settable());

        let mut cancelable = slot_with(mode(), 0);
        cancelable.engage();
        assert!(cancelable.is_settable());
        assert!(cancelable.can_deactivate());

        let mut locked = slot_with(AbilityFlags::ACTIVATEABLE | AbilityFlags::MODE, 0);
        assert!(locked.is_settable());
        locked.engage();
        assert!(!locked.is_settable());
        assert!(!locked.can_deactivate());
    }

    #[test]
    fn bind_keeps_running_cooldown() {
        let mut slot = slot_with(AbilityFlags::ACTIVATEABLE, 3);
        slot.engage();
        slot.bind(None);

        assert_eq!(slot.state(), SlotState::Empty);
        assert_eq!(slot.cooldown_rounds_left(), Rounds::Finite(3));
    }

    #[test]
    fn label_shows_infinity_for_indefinite_modes() {
        let mut slot = slot_with(mode(), 1);
        assert_eq!(slot.rounds_label(9_999), "");
        slot.engage();
        assert_eq!(slot.rounds_label(9_999), "\u{221e}");
    }
}
