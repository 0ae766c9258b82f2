//! Engine metrics.
//!
//! Only the `metrics` facade is used here; installing a recorder is left to
//! the binary. Without one every call is a no-op.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const SYNTHETIC_EVENTS_TOTAL: &str = "hlt_synthetic_events_total";
    pub const CLIPS_MERGED_TOTAL: &str = "hlt_clips_merged_total";
    pub const CLIP_INTERVALS_TOTAL: &str = "hlt_clip_intervals_total";
    pub const CLIP_DURATION_SECONDS: &str = "hlt_clip_duration_seconds";
}

/// Record events inserted by the gap-fill scan.
pub fn record_synthetic_events(count: usize) {
    counter!(names::SYNTHETIC_EVENTS_TOTAL).increment(count as u64);
}

/// Record intervals absorbed by merging.
pub fn record_merges(count: usize) {
    counter!(names::CLIPS_MERGED_TOTAL).increment(count as u64);
}

/// Record a final clip interval of one recording.
pub fn record_clip_interval(duration_secs: f64) {
    counter!(names::CLIP_INTERVALS_TOTAL).increment(1);
    histogram!(names::CLIP_DURATION_SECONDS).record(duration_secs);
}
