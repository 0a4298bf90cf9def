//! Broadcast channels, one per [`Topic`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{AbilityEvent, FeedbackEvent, ScriptEvent, TargetingEvent};

/// Channel an [`Event`] is delivered on.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Messages and floating text for the player
    Feedback,
    /// Targeter promotion, selection and cancellation
    Targeting,
    /// Slot activation and round elapse
    Ability,
    /// Queued and delayed script dispatches
    Script,
}

impl Topic {
    pub const ALL: [Topic; 4] = [
        Topic::Feedback,
        Topic::Targeting,
        Topic::Ability,
        Topic::Script,
    ];
}

/// Anything the session reports to UI subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Feedback(FeedbackEvent),
    Targeting(TargetingEvent),
    Ability(AbilityEvent),
    Script(ScriptEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Feedback(_) => Topic::Feedback,
            Event::Targeting(_) => Topic::Targeting,
            Event::Ability(_) => Topic::Ability,
            Event::Script(_) => Topic::Script,
        }
    }
}

/// Fan-out of session events. Channels for every topic exist from the start,
/// so publishing never takes a lock.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<HashMap<Topic, broadcast::Sender<Event>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// `capacity` events are buffered per topic; slow receivers see `Lagged`.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let channels = Topic::ALL
            .into_iter()
            .map(|topic| (topic, broadcast::channel(capacity).0))
            .collect();

        Self {
            channels: Arc::new(channels),
        }
    }

    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if let Some(tx) = self.channels.get(&topic)
            && tx.send(event).is_err()
        {
            tracing::trace!(target: "runtime::events", "No subscribers for topic {:?}", topic);
        }
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        match self.channels.get(&topic) {
            Some(tx) => tx.subscribe(),
            // Every topic is created in `with_capacity`.
            None => broadcast::channel(1).1,
        }
    }

    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("topics", &self.channels.len())
            .finish()
    }
}
