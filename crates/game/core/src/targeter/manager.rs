//! The targeter session: a queue of pending targeters, at most one current.
//!
//! Any thread may activate, hover, click or cancel. Only the thread driving
//! the world resolves targeters, through [`TargeterManager::poll`]; blocking
//! cancellation waits on that loop and must never be called from it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use super::{MouseActionCondition, Targeter};
use crate::ids::TargeterId;
use crate::script::scriptable::{dispatch, dispatch_named};
use crate::script::{ScriptFunction, ScriptValue};
use crate::world::World;

#[derive(Default)]
struct State {
    pending: VecDeque<Targeter>,
    current: Option<Targeter>,
    next_id: u32,
}

impl State {
    fn holds(&self, id: TargeterId) -> bool {
        self.current.as_ref().is_some_and(|t| t.id == id) || self.pending.iter().any(|t| t.id == id)
    }

    fn current_id(&self) -> Option<TargeterId> {
        self.current.as_ref().map(|t| t.id)
    }
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    resolved: Condvar,
}

/// Result of one [`TargeterManager::poll`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PollOutcome {
    /// Targeter whose select callback ran.
    pub selected: Option<TargeterId>,
    /// Targeters discarded because they were canceled.
    pub canceled: Vec<TargeterId>,
    /// Targeter current after the poll.
    pub current: Option<TargeterId>,
}

impl PollOutcome {
    pub fn is_idle(&self) -> bool {
        self.selected.is_none() && self.canceled.is_empty() && self.current.is_none()
    }
}

enum Resolution {
    Selected,
    Canceled,
}

/// Cloneable handle to the shared targeter session.
#[derive(Clone, Default)]
pub struct TargeterManager {
    shared: Arc<Shared>,
}

impl fmt::Debug for TargeterManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("TargeterManager")
            .field("current", &state.current_id())
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl TargeterManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a targeter. It becomes current on the next poll that finds
    /// no other targeter current.
    pub fn activate(&self, mut targeter: Targeter) -> TargeterHandle {
        let mut state = self.shared.state.lock();
        state.next_id += 1;
        let id = TargeterId(state.next_id);
        targeter.id = id;
        let canceled = targeter.cancel_flag();
        state.pending.push_back(targeter);
        debug!(target: "tactics::targeter", targeter = %id, "targeter queued");

        TargeterHandle {
            id,
            canceled,
            manager: self.clone(),
        }
    }

    pub fn current_id(&self) -> Option<TargeterId> {
        self.shared.state.lock().current_id()
    }

    pub fn pending_len(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    pub fn is_targeting(&self) -> bool {
        let state = self.shared.state.lock();
        state.current.is_some() || !state.pending.is_empty()
    }

    /// Runs `f` against the current targeter.
    pub fn with_current<R>(&self, f: impl FnOnce(&Targeter) -> R) -> Option<R> {
        self.shared.state.lock().current.as_ref().map(f)
    }

    /// Forwards a mouse move to the current targeter. Returns whether the
    /// hovered cell changed.
    pub fn set_mouse_position(&self, world: &World, x: f32, y: f32) -> bool {
        self.shared
            .state
            .lock()
            .current
            .as_mut()
            .is_some_and(|t| t.set_mouse_position(world, x, y))
    }

    /// Forwards a click to the current targeter.
    pub fn click(&self, world: &World) -> MouseActionCondition {
        self.shared
            .state
            .lock()
            .current
            .as_mut()
            .map_or(MouseActionCondition::NoAction, |t| t.click(world))
    }

    /// User-initiated cancel of the current targeter; refused when it is
    /// not cancelable.
    pub fn cancel_current(&self) -> bool {
        let state = self.shared.state.lock();
        match &state.current {
            Some(targeter) if targeter.is_cancelable() => {
                targeter.request_cancel();
                true
            }
            _ => false,
        }
    }

    /// Resolves the session one step.
    ///
    /// A canceled current targeter is discarded and a current targeter with
    /// selected targets is finished. When nothing is current, canceled
    /// pending targeters are discarded and the next live one is promoted.
    /// Callbacks run after the session lock is released, so they may queue
    /// follow-up targeters.
    pub fn poll(&self, world: &mut World) -> PollOutcome {
        let mut finished = Vec::new();
        let before;
        let outcome = {
            let mut state = self.shared.state.lock();
            before = state.current_id();

            if let Some(targeter) = state.current.take_if(|t| t.is_canceled()) {
                finished.push((targeter, Resolution::Canceled));
            } else if let Some(targeter) = state.current.take_if(|t| t.has_selected_targets()) {
                finished.push((targeter, Resolution::Selected));
            }

            if state.current.is_none() {
                while let Some(next) = state.pending.pop_front() {
                    if next.is_canceled() {
                        finished.push((next, Resolution::Canceled));
                        continue;
                    }
                    debug!(target: "tactics::targeter", targeter = %next.id, "targeter promoted");
                    state.current = Some(next);
                    break;
                }
            }

            PollOutcome {
                selected: None,
                canceled: Vec::new(),
                current: state.current_id(),
            }
        };
        self.shared.resolved.notify_all();

        let mut outcome = outcome;
        for (targeter, resolution) in finished {
            let (callback, args) = callback_for(&targeter, &resolution);
            match resolution {
                Resolution::Selected => {
                    debug!(target: "tactics::targeter", targeter = %targeter.id, "targets selected");
                    outcome.selected = Some(targeter.id);
                }
                Resolution::Canceled => {
                    debug!(target: "tactics::targeter", targeter = %targeter.id, "targeter canceled");
                    outcome.canceled.push(targeter.id);
                }
            }
            if let Some(script) = targeter.script() {
                run_callback(world, script, callback, &args);
            }
        }

        if before != outcome.current {
            world.feedback().targeter_changed(outcome.current);
        }
        outcome
    }
}

fn callback_for<'a>(targeter: &'a Targeter, resolution: &Resolution) -> (&'a str, Vec<ScriptValue>) {
    let name = match resolution {
        Resolution::Selected => targeter.select_callback(),
        Resolution::Canceled => targeter.cancel_callback(),
    };
    let mut args = Vec::with_capacity(targeter.extra_args().len() + 1);
    args.push(ScriptValue::from(targeter.selection()));
    args.extend_from_slice(targeter.extra_args());
    (name, args)
}

fn run_callback(
    world: &mut World,
    script: &Arc<crate::script::Scriptable>,
    name: &str,
    args: &[ScriptValue],
) {
    // Recognized callbacks are skipped cheaply when undefined; custom names
    // always go to the engine.
    match name.parse::<ScriptFunction>() {
        Ok(function) => {
            dispatch(world, script, function, args);
        }
        Err(_) => {
            trace!(target: "tactics::targeter", callback = name, "custom targeter callback");
            dispatch_named(world, script, name, args);
        }
    }
}

/// Caller-side handle to a queued or current targeter.
#[derive(Clone)]
pub struct TargeterHandle {
    id: TargeterId,
    canceled: Arc<AtomicBool>,
    manager: TargeterManager,
}

impl fmt::Debug for TargeterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargeterHandle")
            .field("id", &self.id)
            .field("canceled", &self.canceled.load(Ordering::Relaxed))
            .finish()
    }
}

impl TargeterHandle {
    pub fn id(&self) -> TargeterId {
        self.id
    }

    /// Flags the targeter canceled without waiting.
    pub fn request_cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    /// True once the session no longer holds this targeter.
    pub fn is_resolved(&self) -> bool {
        !self.manager.shared.state.lock().holds(self.id)
    }

    /// Cancels and blocks until the polling loop has discarded the targeter.
    pub fn cancel(&self) {
        self.request_cancel();
        let shared = &self.manager.shared;
        let mut state = shared.state.lock();
        while state.holds(self.id) {
            shared.resolved.wait(&mut state);
        }
    }

    /// Like [`TargeterHandle::cancel`], giving up after `timeout`. Returns
    /// whether the targeter was discarded in time.
    pub fn cancel_timeout(&self, timeout: Duration) -> bool {
        self.request_cancel();
        let deadline = Instant::now() + timeout;
        let shared = &self.manager.shared;
        let mut state = shared.state.lock();
        while state.holds(self.id) {
            if shared.resolved.wait_until(&mut state, deadline).timed_out() {
                return !state.holds(self.id);
            }
        }
        true
    }
}
