//! Engine configuration.
//!
//! All thresholds, durations and caps live in one immutable structure that
//! callers pass to every entry point. Defaults are the reference values.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Highlight timeline engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Half-width of the boundary-extension energy window, seconds.
    pub sample_half_width: f64,
    /// Audio decode rate used for energy sampling, Hz.
    pub sample_rate: u32,

    /// Gap-fill tick length, seconds.
    pub tick_secs: f64,
    /// Event-free span that triggers an audio scan, seconds.
    pub max_time_without_events: f64,
    /// Distance between gap-fill scan centres, seconds.
    pub gap_scan_step: f64,
    /// Half-width of each gap-fill scan window, seconds.
    pub gap_scan_half_width: f64,
    /// Margin kept from both ends of a scanned gap, seconds.
    pub gap_scan_margin: f64,

    /// RMS level at or above which audio counts as loud.
    pub volume_threshold: f64,
    /// Boundary extension increment, seconds.
    pub extension_step: f64,
    /// Maximum backward extension of a clip start, seconds.
    pub max_extra_start: f64,
    /// Maximum forward extension of a clip end, seconds.
    pub max_extra_end: f64,
    /// Lead-in kept before each event, seconds.
    pub pre_event_duration: f64,
    /// Tail kept after each event, seconds.
    pub post_event_duration: f64,

    /// Clips closer than this are merged, seconds.
    pub join_threshold: f64,

    /// Fade-in at the start of the output; shifts every chapter offset.
    pub intro_duration: f64,
    /// Fade-out at the end of the output.
    pub outro_duration: f64,

    /// Run the visual detector on recordings that were never scanned.
    pub visual_processing: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_half_width: 0.75,
            sample_rate: 22_000,
            tick_secs: 60.0,
            max_time_without_events: 600.0,
            gap_scan_step: 10.0,
            gap_scan_half_width: 5.0,
            gap_scan_margin: 5.0,
            volume_threshold: 0.01,
            extension_step: 0.5,
            max_extra_start: 5.0,
            max_extra_end: 5.0,
            pre_event_duration: 10.0,
            post_event_duration: 4.0,
            join_threshold: 30.0,
            intro_duration: 0.4,
            outro_duration: 0.4,
            visual_processing: false,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl EngineConfig {
    /// Create config from `HLT_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            sample_half_width: env_or("HLT_SAMPLE_HALF_WIDTH", d.sample_half_width),
            sample_rate: env_or("HLT_SAMPLE_RATE", d.sample_rate),
            tick_secs: env_or("HLT_TICK_SECS", d.tick_secs),
            max_time_without_events: env_or("HLT_MAX_TIME_WITHOUT_EVENTS", d.max_time_without_events),
            gap_scan_step: env_or("HLT_GAP_SCAN_STEP", d.gap_scan_step),
            gap_scan_half_width: env_or("HLT_GAP_SCAN_HALF_WIDTH", d.gap_scan_half_width),
            gap_scan_margin: env_or("HLT_GAP_SCAN_MARGIN", d.gap_scan_margin),
            volume_threshold: env_or("HLT_VOLUME_THRESHOLD", d.volume_threshold),
            extension_step: env_or("HLT_EXTENSION_STEP", d.extension_step),
            max_extra_start: env_or("HLT_MAX_EXTRA_START", d.max_extra_start),
            max_extra_end: env_or("HLT_MAX_EXTRA_END", d.max_extra_end),
            pre_event_duration: env_or("HLT_PRE_EVENT_DURATION", d.pre_event_duration),
            post_event_duration: env_or("HLT_POST_EVENT_DURATION", d.post_event_duration),
            join_threshold: env_or("HLT_JOIN_THRESHOLD", d.join_threshold),
            intro_duration: env_or("HLT_INTRO_DURATION", d.intro_duration),
            outro_duration: env_or("HLT_OUTRO_DURATION", d.outro_duration),
            visual_processing: env_or("HLT_VISUAL_PROCESSING", d.visual_processing),
        }
    }

    /// Reject configurations the algorithms cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        let positive = [
            ("sample_half_width", self.sample_half_width),
            ("tick_secs", self.tick_secs),
            ("max_time_without_events", self.max_time_without_events),
            ("gap_scan_step", self.gap_scan_step),
            ("gap_scan_half_width", self.gap_scan_half_width),
            ("extension_step", self.extension_step),
            ("post_event_duration", self.post_event_duration),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::invalid_config(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        let non_negative = [
            ("gap_scan_margin", self.gap_scan_margin),
            ("volume_threshold", self.volume_threshold),
            ("max_extra_start", self.max_extra_start),
            ("max_extra_end", self.max_extra_end),
            ("pre_event_duration", self.pre_event_duration),
            ("join_threshold", self.join_threshold),
            ("intro_duration", self.intro_duration),
            ("outro_duration", self.outro_duration),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EngineError::invalid_config(format!(
                    "{} must not be negative, got {}",
                    name, value
                )));
            }
        }

        if self.sample_rate == 0 {
            return Err(EngineError::invalid_config("sample_rate must be positive"));
        }

        Ok(())
    }

    /// Builder-style setter for the join threshold.
    pub fn with_join_threshold(mut self, secs: f64) -> Self {
        self.join_threshold = secs;
        self
    }

    /// Builder-style setter for the gap-fill trigger.
    pub fn with_max_time_without_events(mut self, secs: f64) -> Self {
        self.max_time_without_events = secs;
        self
    }

    /// Builder-style setter for the chapter offset shift.
    pub fn with_intro_duration(mut self, secs: f64) -> Self {
        self.intro_duration = secs;
        self
    }
}
