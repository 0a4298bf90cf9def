//! Topic-based event bus for session events.
//!
//! Events are published to specific topics, and consumers subscribe only to
//! the topics they need. [`EventFeedback`] adapts the bus to the core
//! feedback surface so player-facing messages flow through it too.

mod bus;
mod feedback;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use feedback::EventFeedback;
pub use types::{AbilityEvent, FeedbackEvent, ScriptEvent, TargetingEvent};
