//! UI feedback surface.

use parking_lot::Mutex;

use crate::grid::Position;
use crate::ids::TargeterId;

/// Sink for player-facing messages. Implementations must not call back into
/// the world.
pub trait Feedback: Send + Sync {
    fn message(&self, text: &str);

    /// Floating text over a tile.
    fn fade_away(&self, text: &str, position: Position);

    /// The current targeter changed; `None` once targeting ends.
    fn targeter_changed(&self, _current: Option<TargeterId>) {}
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullFeedback;

impl Feedback for NullFeedback {
    fn message(&self, _text: &str) {}

    fn fade_away(&self, _text: &str, _position: Position) {}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedbackEntry {
    Message(String),
    FadeAway { text: String, position: Position },
    TargeterChanged(Option<TargeterId>),
}

/// Keeps every entry, for tests and headless tools.
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    entries: Mutex<Vec<FeedbackEntry>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<FeedbackEntry> {
        self.entries.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter_map(|entry| match entry {
                FeedbackEntry::Message(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Feedback for RecordingFeedback {
    fn message(&self, text: &str) {
        self.entries
            .lock()
            .push(FeedbackEntry::Message(text.to_string()));
    }

    fn fade_away(&self, text: &str, position: Position) {
        self.entries.lock().push(FeedbackEntry::FadeAway {
            text: text.to_string(),
            position,
        });
    }

    fn targeter_changed(&self, current: Option<TargeterId>) {
        self.entries
            .lock()
            .push(FeedbackEntry::TargeterChanged(current));
    }
}
