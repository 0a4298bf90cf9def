use tactics_core::{Feedback, Position, TargeterId};

use super::{Event, EventBus, FeedbackEvent, TargetingEvent};

/// Core feedback surface that publishes to an [`EventBus`].
#[derive(Clone, Debug)]
pub struct EventFeedback {
    bus: EventBus,
}

impl EventFeedback {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

impl Feedback for EventFeedback {
    fn message(&self, text: &str) {
        self.bus.publish(Event::Feedback(FeedbackEvent::Message {
            text: text.to_string(),
        }));
    }

    fn fade_away(&self, text: &str, position: Position) {
        self.bus.publish(Event::Feedback(FeedbackEvent::FadeAway {
            text: text.to_string(),
            position,
        }));
    }

    fn targeter_changed(&self, current: Option<TargeterId>) {
        self.bus
            .publish(Event::Targeting(TargetingEvent::Changed { current }));
    }
}
