//! Shared data models for the highlight timeline engine.
//!
//! This crate provides Serde-serializable types for:
//! - Detected events and clip intervals
//! - Chapters of an assembled highlight timeline
//! - Persisted per-recording detection state
//! - Batch metadata handed to the uploader
//! - Broadcast descriptors used for batch selection

pub mod broadcast;
pub mod chapter;
pub mod detection;
pub mod event;
pub mod interval;
pub mod metadata;
pub mod timestamp;

// Re-export common types
pub use broadcast::Broadcast;
pub use chapter::Chapter;
pub use detection::{DetectionState, DetectionStateFile, StateError, DETECTION_STATE_VERSION};
pub use event::{sort_events, Event};
pub use interval::{ClipInterval, LabelMark};
pub use metadata::{BatchMetadata, PrivacyStatus};
pub use timestamp::{format_clock, parse_timestamp, TimestampError};
