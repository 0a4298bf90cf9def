//! Session runtime for the tactics rules engine.
//!
//! This crate moves a [`tactics_core::World`] onto a tokio worker task and
//! exposes it through a cloneable [`SessionHandle`]. The worker is the single
//! logic thread: it applies commands in order, runs queued and delayed script
//! callbacks, and is the only resolver of the targeter session.
//!
//! Modules are organized by responsibility:
//! - [`session`] hosts the worker, its handle and delayed dispatch
//! - [`events`] provides the topic-based event bus and feedback adapter
//! - [`config`] reads runtime settings from the environment
//! - [`logging`] installs the tracing subscriber for binaries
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod session;

pub use config::RuntimeConfig;
pub use error::{Result, RuntimeError};
pub use events::{
    AbilityEvent, Event, EventBus, EventFeedback, FeedbackEvent, ScriptEvent, TargetingEvent,
    Topic,
};
pub use session::{DelayedDispatch, Session, SessionBuilder, SessionHandle};
