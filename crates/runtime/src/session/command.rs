use std::sync::Arc;

use tactics_core::targeter::MouseActionCondition;
use tactics_core::{LoadReport, ScriptFunction, ScriptValue, Scriptable, SlotId, World, WorldRecord};
use tokio::sync::oneshot;

use crate::error::Result;

pub(crate) type WorldTask = Box<dyn FnOnce(&mut World) + Send>;

/// Commands processed by the session worker, in arrival order.
pub(crate) enum Command {
    /// Mouse moved to a screen-space point.
    MouseMoved { x: f32, y: f32 },
    Click {
        reply: oneshot::Sender<MouseActionCondition>,
    },
    /// User-initiated cancel of the current targeter.
    CancelTargeting { reply: oneshot::Sender<bool> },
    FireSlot {
        slot: SlotId,
        reply: oneshot::Sender<Result<bool>>,
    },
    DeactivateSlot {
        slot: SlotId,
        reply: oneshot::Sender<Result<bool>>,
    },
    ElapseRounds {
        rounds: u32,
        reply: oneshot::Sender<()>,
    },
    /// Runs a script callback on the worker. `reply` is absent for
    /// fire-and-forget dispatch.
    Dispatch {
        script: Arc<Scriptable>,
        function: ScriptFunction,
        args: Vec<ScriptValue>,
        reply: Option<oneshot::Sender<Option<ScriptValue>>>,
    },
    Save {
        reply: oneshot::Sender<WorldRecord>,
    },
    Load {
        record: Box<WorldRecord>,
        reply: oneshot::Sender<LoadReport>,
    },
    /// Arbitrary access to the world.
    Exec(WorldTask),
    Shutdown,
}
