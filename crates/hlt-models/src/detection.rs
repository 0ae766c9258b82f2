//! Persisted per-recording detection state.
//!
//! The on-disk record keeps the parallel-array layout
//! (`event_times` / `event_times_games` / `visually_processed`) with an added
//! schema `version`. Every field has a default so older or partial files
//! still load, and [`DetectionState::try_from`] validates the record before
//! the engine trusts it.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::Event;

/// Current schema version of the detection state file.
pub const DETECTION_STATE_VERSION: u32 = 1;

/// Validation errors for a persisted detection state record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    #[error("unsupported detection state version {found} (max {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("event_times has {times} entries but event_times_games has {labels}")]
    LengthMismatch { times: usize, labels: usize },

    #[error("event time at index {index} is not a finite non-negative number")]
    InvalidTime { index: usize },
}

/// On-disk representation of [`DetectionState`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectionStateFile {
    /// Schema version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Event times in seconds, in detection order.
    #[serde(default)]
    pub event_times: Vec<f64>,

    /// Label for each entry of `event_times`.
    #[serde(default)]
    pub event_times_games: Vec<String>,

    /// Whether the visual detection phase has completed.
    #[serde(default)]
    pub visually_processed: bool,
}

fn default_version() -> u32 {
    DETECTION_STATE_VERSION
}

/// Cached detector output for one recording.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionState {
    /// Detector events (not gap-fill events).
    pub events: Vec<Event>,
    /// When true the detection phase must never re-run for this recording.
    pub fully_scanned: bool,
}

impl DetectionState {
    /// A state for a recording nothing has been computed for yet.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A completed state holding `events`.
    pub fn scanned(events: Vec<Event>) -> Self {
        Self {
            events,
            fully_scanned: true,
        }
    }
}

impl From<&DetectionState> for DetectionStateFile {
    fn from(state: &DetectionState) -> Self {
        Self {
            version: DETECTION_STATE_VERSION,
            event_times: state.events.iter().map(|e| e.time).collect(),
            event_times_games: state.events.iter().map(|e| e.label.clone()).collect(),
            visually_processed: state.fully_scanned,
        }
    }
}

impl TryFrom<DetectionStateFile> for DetectionState {
    type Error = StateError;

    fn try_from(file: DetectionStateFile) -> Result<Self, Self::Error> {
        if file.version > DETECTION_STATE_VERSION {
            return Err(StateError::UnsupportedVersion {
                found: file.version,
                supported: DETECTION_STATE_VERSION,
            });
        }

        // A record written without labels gets empty labels; any other
        // mismatch means the parallel arrays cannot be trusted.
        let labels = if file.event_times_games.is_empty() {
            vec![String::new(); file.event_times.len()]
        } else if file.event_times_games.len() == file.event_times.len() {
            file.event_times_games
        } else {
            return Err(StateError::LengthMismatch {
                times: file.event_times.len(),
                labels: file.event_times_games.len(),
            });
        };

        let mut events = Vec::with_capacity(file.event_times.len());
        for (index, (time, label)) in file.event_times.into_iter().zip(labels).enumerate() {
            if !time.is_finite() || time < 0.0 {
                return Err(StateError::InvalidTime { index });
            }
            events.push(Event::new(time, label));
        }

        Ok(Self {
            events,
            fully_scanned: file.visually_processed,
        })
    }
}
