//! Cloneable façade for issuing commands to a session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tactics_core::targeter::MouseActionCondition;
use tactics_core::{
    LoadReport, ScriptFunction, ScriptValue, Scriptable, SlotId, TargeterHandle, World,
    WorldRecord,
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

use super::command::Command;
use super::delayed::DelayedDispatch;
use crate::error::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};

/// Client-facing handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    events: EventBus,
}

impl SessionHandle {
    pub(crate) fn new(commands: mpsc::Sender<Command>, events: EventBus) -> Self {
        Self { commands, events }
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(build(reply_tx)).await?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    // ===== targeting input =====

    pub async fn mouse_moved(&self, x: f32, y: f32) -> Result<()> {
        self.send(Command::MouseMoved { x, y }).await
    }

    pub async fn click(&self) -> Result<MouseActionCondition> {
        self.request(|reply| Command::Click { reply }).await
    }

    /// User-initiated cancel of the current targeter; false when none is
    /// current or it is not cancelable.
    pub async fn cancel_targeting(&self) -> Result<bool> {
        self.request(|reply| Command::CancelTargeting { reply }).await
    }

    /// Cancels a specific targeter and waits until the worker has discarded
    /// it, giving up after `timeout`.
    ///
    /// The wait happens on the blocking pool so the worker keeps running.
    pub async fn cancel_targeter(&self, targeter: TargeterHandle, timeout: Duration) -> Result<bool> {
        debug!(target: "runtime::session", targeter = %targeter.id(), "blocking cancel");
        tokio::task::spawn_blocking(move || targeter.cancel_timeout(timeout))
            .await
            .map_err(RuntimeError::WorkerJoin)
    }

    // ===== abilities =====

    pub async fn fire_slot(&self, slot: SlotId) -> Result<bool> {
        self.request(|reply| Command::FireSlot { slot, reply }).await?
    }

    pub async fn deactivate_slot(&self, slot: SlotId) -> Result<bool> {
        self.request(|reply| Command::DeactivateSlot { slot, reply })
            .await?
    }

    pub async fn elapse_rounds(&self, rounds: u32) -> Result<()> {
        self.request(|reply| Command::ElapseRounds { rounds, reply })
            .await
    }

    // ===== script dispatch =====

    /// Queues a callback and returns without waiting for it to run.
    pub async fn dispatch(
        &self,
        script: Arc<Scriptable>,
        function: ScriptFunction,
        args: Vec<ScriptValue>,
    ) -> Result<()> {
        self.send(Command::Dispatch {
            script,
            function,
            args,
            reply: None,
        })
        .await
    }

    /// Runs a callback and waits for its result.
    pub async fn call(
        &self,
        script: Arc<Scriptable>,
        function: ScriptFunction,
        args: Vec<ScriptValue>,
    ) -> Result<Option<ScriptValue>> {
        self.request(|reply| Command::Dispatch {
            script,
            function,
            args,
            reply: Some(reply),
        })
        .await
    }

    /// Queues a callback once `delay` has elapsed.
    pub fn dispatch_after(
        &self,
        delay: Duration,
        script: Arc<Scriptable>,
        function: ScriptFunction,
        args: Vec<ScriptValue>,
    ) -> DelayedDispatch {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let commands = self.commands.clone();

        let task = tokio::spawn(async move {
            tokio::select! {
                // A dropped sender detaches rather than cancels.
                Ok(()) = cancel_rx => {
                    debug!(target: "runtime::session", function = function.name(), "delayed dispatch canceled");
                    false
                }
                _ = tokio::time::sleep(delay) => {
                    commands
                        .send(Command::Dispatch { script, function, args, reply: None })
                        .await
                        .is_ok()
                }
            }
        });

        DelayedDispatch::new(cancel_tx, task)
    }

    // ===== persistence =====

    pub async fn save(&self) -> Result<WorldRecord> {
        self.request(|reply| Command::Save { reply }).await
    }

    pub async fn load(&self, record: WorldRecord) -> Result<LoadReport> {
        self.request(|reply| Command::Load {
            record: Box::new(record),
            reply,
        })
        .await
    }

    // ===== direct access =====

    /// Runs `f` on the worker with exclusive access to the world.
    pub async fn with_world<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut World) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.request(|reply| {
            Command::Exec(Box::new(move |world| {
                let _ = reply.send(f(world));
            }))
        })
        .await
    }

    pub(crate) async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    // ===== events =====

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.events.subscribe(topic)
    }

    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.events.subscribe_multiple(topics)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }
}
