//! Event types for different topics.

use serde::{Deserialize, Serialize};
use tactics_core::{Position, ScriptValue, SlotId, TargeterId};

/// Player-facing output, mirrored from the core feedback surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeedbackEvent {
    Message { text: String },
    /// Floating text over a tile
    FadeAway { text: String, position: Position },
}

/// Targeting session changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetingEvent {
    /// The current targeter changed; `None` once targeting ends.
    Changed { current: Option<TargeterId> },
    /// A targeter's select callback ran.
    Selected { targeter: TargeterId },
    /// A targeter was discarded after being canceled.
    Canceled { targeter: TargeterId },
}

/// Slot and round driver activity requested through the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityEvent {
    SlotFired { slot: SlotId },
    SlotDeactivated { slot: SlotId },
    RoundsElapsed { rounds: u32 },
}

/// Outcome of a queued or delayed script dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEvent {
    pub location: String,
    pub function: String,
    /// `None` when the script does not define the function or it failed.
    pub result: Option<ScriptValue>,
}
