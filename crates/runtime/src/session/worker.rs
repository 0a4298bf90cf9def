//! The session worker: sole owner of the [`World`].

use std::sync::Arc;
use std::time::Duration;

use tactics_core::{ResourceLoader, ScriptFunction, ScriptValue, Scriptable, World};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use super::command::Command;
use crate::events::{AbilityEvent, Event, EventBus, ScriptEvent, TargetingEvent};

/// Processes commands one at a time and resolves the targeter session.
///
/// The worker is the only code that polls targeters, so blocking cancels
/// issued from other threads are woken by it, after every command and on
/// each poll tick.
pub(crate) struct SessionWorker {
    world: World,
    resources: Arc<dyn ResourceLoader>,
    commands: mpsc::Receiver<Command>,
    events: EventBus,
    poll_interval: Duration,
}

impl SessionWorker {
    pub(crate) fn new(
        world: World,
        resources: Arc<dyn ResourceLoader>,
        commands: mpsc::Receiver<Command>,
        events: EventBus,
        poll_interval: Duration,
    ) -> Self {
        Self {
            world,
            resources,
            commands,
            events,
            poll_interval,
        }
    }

    /// Main worker loop. Returns the world once every handle is gone or a
    /// shutdown is requested.
    pub(crate) async fn run(mut self) -> World {
        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(Command::Shutdown) | None => break,
                        Some(command) => self.handle_command(command),
                    }
                    self.poll_targeters();
                }
                _ = poll.tick() => self.poll_targeters(),
            }
        }

        // Wake anyone still blocked on a cancel.
        self.poll_targeters();
        debug!(target: "runtime::session", "session worker stopped");
        self.world
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::MouseMoved { x, y } => {
                let manager = self.world.targeters().clone();
                manager.set_mouse_position(&self.world, x, y);
            }
            Command::Click { reply } => {
                let manager = self.world.targeters().clone();
                let _ = reply.send(manager.click(&self.world));
            }
            Command::CancelTargeting { reply } => {
                let _ = reply.send(self.world.targeters().cancel_current());
            }
            Command::FireSlot { slot, reply } => {
                let result = self.world.fire_slot(slot).map_err(Into::into);
                if matches!(result, Ok(true)) {
                    self.publish(Event::Ability(AbilityEvent::SlotFired { slot }));
                }
                let _ = reply.send(result);
            }
            Command::DeactivateSlot { slot, reply } => {
                let result = self.world.deactivate_slot(slot).map_err(Into::into);
                if matches!(result, Ok(true)) {
                    self.publish(Event::Ability(AbilityEvent::SlotDeactivated { slot }));
                }
                let _ = reply.send(result);
            }
            Command::ElapseRounds { rounds, reply } => {
                self.world.elapse_rounds(rounds);
                self.publish(Event::Ability(AbilityEvent::RoundsElapsed { rounds }));
                let _ = reply.send(());
            }
            Command::Dispatch {
                script,
                function,
                args,
                reply,
            } => {
                let result = self.dispatch(&script, function, &args);
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            Command::Save { reply } => {
                let _ = reply.send(self.world.save_records());
            }
            Command::Load { record, reply } => {
                let report = self
                    .world
                    .load_records(&record, self.resources.as_ref());
                let _ = reply.send(report);
            }
            Command::Exec(task) => task(&mut self.world),
            Command::Shutdown => {}
        }
    }

    fn dispatch(
        &mut self,
        script: &Scriptable,
        function: ScriptFunction,
        args: &[ScriptValue],
    ) -> Option<ScriptValue> {
        let engine = Arc::clone(self.world.engine());
        let result = script.execute_function(engine.as_ref(), &mut self.world, function, args);
        trace!(
            target: "runtime::session",
            location = script.location(),
            function = function.name(),
            "dispatched script callback"
        );
        self.publish(Event::Script(ScriptEvent {
            location: script.location().to_string(),
            function: function.name().to_string(),
            result: result.clone(),
        }));
        result
    }

    fn poll_targeters(&mut self) {
        let outcome = self.world.poll_targeters();
        for targeter in outcome.canceled {
            self.publish(Event::Targeting(TargetingEvent::Canceled { targeter }));
        }
        if let Some(targeter) = outcome.selected {
            self.publish(Event::Targeting(TargetingEvent::Selected { targeter }));
        }
    }

    fn publish(&self, event: Event) {
        self.events.publish(event);
    }
}
