//! Clip intervals cut from a single recording.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where an original per-event label starts inside a (possibly merged) interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LabelMark {
    /// Source-recording time, in seconds, at which the labeled highlight begins.
    pub at: f64,
    /// Label of the original event. May be empty.
    pub label: String,
}

/// A contiguous span to extract from one recording.
///
/// `label` is the label of the first event that produced the span; merging
/// never overwrites it. `marks` keeps every original event label in order so
/// chapter boundaries can still be placed at per-event granularity after
/// physical cuts have been merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipInterval {
    /// Start time in seconds (never negative).
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Label of the earliest event in the span.
    pub label: String,
    /// Original per-event labels, in time order.
    #[serde(default)]
    pub marks: Vec<LabelMark>,
}

impl ClipInterval {
    /// Create an interval produced by a single event.
    pub fn new(start: f64, end: f64, label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            start,
            end,
            marks: vec![LabelMark {
                at: start,
                label: label.clone(),
            }],
            label,
        }
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Distance from the end of this interval to the start of `next`.
    ///
    /// Negative when the two overlap.
    pub fn gap_to(&self, next: &ClipInterval) -> f64 {
        next.start - self.end
    }

    /// Grow this interval to cover `next`, keeping this interval's label.
    pub fn absorb(&mut self, next: ClipInterval) {
        self.end = self.end.max(next.end);
        self.marks.extend(next.marks);
    }

    /// Clamp the end of the interval to the recording duration.
    pub fn clamp_end(&mut self, duration: f64) {
        if self.end > duration {
            self.end = duration.max(self.start);
        }
    }
}
