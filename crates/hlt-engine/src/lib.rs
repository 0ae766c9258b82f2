//! Highlight timeline engine.
//!
//! Turns detected events and recording audio into ordered clip intervals,
//! then assembles the intervals of a whole batch into one timeline with
//! chapter markers:
//!
//! - [`fill_gaps`] inserts synthetic events into long event-free spans
//! - [`extend_event`] grows clip bounds while the audio stays loud
//! - [`merge_intervals`] joins clips closer than the join threshold
//! - [`Timeline`] accumulates clips, chapters, tags and labels per batch
//! - [`HighlightEngine`] runs detection once per recording and persists it

pub mod assemble;
pub mod config;
pub mod error;
pub mod extend;
pub mod gap_fill;
pub mod merge;
pub mod metrics;
pub mod pipeline;
pub mod state;

pub use assemble::{Timeline, TimelineClip};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use extend::{extend_event, extend_events};
pub use gap_fill::fill_gaps;
pub use merge::merge_intervals;
pub use pipeline::{compute_highlights, HighlightEngine, RecordingHighlights};
pub use state::DetectionStore;
