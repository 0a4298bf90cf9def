//! Threaded driver for a [`World`].
//!
//! A [`Session`] moves the world onto a worker task. UI code talks to it
//! through a cloneable [`SessionHandle`]: mouse input, slot activation,
//! round elapse, queued and delayed script callbacks, save/load, and
//! arbitrary closures. Feedback from the world and worker activity are
//! published on the session's [`EventBus`].

mod command;
mod delayed;
mod handle;
mod worker;

pub use delayed::DelayedDispatch;
pub use handle::SessionHandle;

use std::sync::Arc;

use tactics_content::FileResourceLoader;
use tactics_core::{ResourceLoader, World};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::events::{EventBus, EventFeedback};
use worker::SessionWorker;

/// A running session. Owns the worker task.
pub struct Session {
    handle: SessionHandle,
    worker: JoinHandle<World>,
}

impl Session {
    pub fn builder(world: World) -> SessionBuilder {
        SessionBuilder::new(world)
    }

    /// Get a cloneable handle to this session
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Stops the worker and returns the world.
    ///
    /// Commands queued before the call are processed first.
    pub async fn shutdown(self) -> Result<World> {
        // A closed channel means the worker is already on its way out.
        let _ = self.handle.shutdown().await;
        self.worker.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    world: World,
    config: RuntimeConfig,
    resources: Option<Arc<dyn ResourceLoader>>,
    events: Option<EventBus>,
}

impl SessionBuilder {
    fn new(world: World) -> Self {
        Self {
            world,
            config: RuntimeConfig::default(),
            resources: None,
            events: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Loader for script locations found in saves. Defaults to the
    /// configured data directory.
    pub fn resources(mut self, resources: Arc<dyn ResourceLoader>) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Publish to an existing bus instead of creating one.
    pub fn event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Spawns the worker on the current tokio runtime.
    ///
    /// The world's feedback surface is replaced so that messages are
    /// published on the session's event bus.
    pub fn spawn(self) -> Session {
        let events = self
            .events
            .unwrap_or_else(|| EventBus::with_capacity(self.config.event_buffer_size));
        let resources = self
            .resources
            .unwrap_or_else(|| Arc::new(FileResourceLoader::new(&self.config.data_dir)));
        let world = self
            .world
            .with_feedback(Arc::new(EventFeedback::new(events.clone())));

        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size.max(1));
        let worker = SessionWorker::new(
            world,
            resources,
            command_rx,
            events.clone(),
            self.config.poll_interval,
        );

        info!(
            target: "runtime::session",
            poll_ms = self.config.poll_interval.as_millis() as u64,
            "session started"
        );

        Session {
            handle: SessionHandle::new(command_tx, events),
            worker: tokio::spawn(worker.run()),
        }
    }
}
