//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};

/// Progress information from FFmpeg's `-progress` stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Progress percentage given the expected output duration in seconds.
    pub fn percentage(&self, total_secs: f64) -> f64 {
        if total_secs <= 0.0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / 1000.0 / total_secs) * 100.0).clamp(0.0, 100.0)
    }
}
