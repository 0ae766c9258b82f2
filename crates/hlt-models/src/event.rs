//! Detected moments of interest.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A timestamp marking a moment of interest, with an optional category label.
///
/// An empty label means the event carries no topic information (for example
/// events synthesized from audio energy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Event {
    /// Position in the recording, in seconds.
    pub time: f64,

    /// Category label (game name, topic). May be empty.
    #[serde(default)]
    pub label: String,
}

impl Event {
    /// Create a labeled event.
    pub fn new(time: f64, label: impl Into<String>) -> Self {
        Self {
            time,
            label: label.into(),
        }
    }

    /// Create an event with an empty label.
    pub fn unlabeled(time: f64) -> Self {
        Self {
            time,
            label: String::new(),
        }
    }

    /// Whether this event carries a label.
    pub fn is_labeled(&self) -> bool {
        !self.label.is_empty()
    }
}

/// Sort events by time, keeping the relative order of equal timestamps.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_events_is_stable() {
        let mut events = vec![
            Event::new(30.0, "b"),
            Event::new(10.0, "a"),
            Event::new(30.0, "c"),
            Event::unlabeled(5.0),
        ];

        sort_events(&mut events);

        let order: Vec<_> = events.iter().map(|e| (e.time, e.label.as_str())).collect();
        assert_eq!(order, vec![(5.0, ""), (10.0, "a"), (30.0, "b"), (30.0, "c")]);
    }

    #[test]
    fn test_label_defaults_to_empty() {
        let event: Event = serde_json::from_str(r#"{"time": 12.5}"#).unwrap();
        assert_eq!(event.time, 12.5);
        assert!(!event.is_labeled());
    }
}
