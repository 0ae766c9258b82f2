//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid recording: {0}")]
    InvalidRecording(String),

    #[error("Sample window [{start:.3}, {end:.3}] outside recording of {duration:.3}s")]
    OutOfRange { start: f64, end: f64, duration: f64 },

    #[error("Event detection failed: {0}")]
    DetectionFailed(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// Create an invalid recording error.
    pub fn invalid_recording(message: impl Into<String>) -> Self {
        Self::InvalidRecording(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether re-acquiring the recording may fix this error.
    ///
    /// Missing, truncated or undecodable files are transient: the recording
    /// can be fetched again. Missing tools and sampling bugs are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MediaError::FileNotFound(_)
                | MediaError::InvalidRecording(_)
                | MediaError::FfprobeFailed { .. }
                | MediaError::FfmpegFailed { .. }
                | MediaError::Io(_)
                | MediaError::JsonParse(_)
        )
    }
}
