//! Engine error types.

use thiserror::Error;

use hlt_media::MediaError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Sampling outside a recording means a clamp was skipped; such errors
    /// must stop the run instead of being treated as a bad recording.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::Media(MediaError::OutOfRange { .. }) | EngineError::InvalidConfig(_)
        )
    }

    /// Check if re-acquiring the recording could help.
    pub fn is_transient(&self) -> bool {
        match self {
            EngineError::Media(e) => e.is_transient(),
            EngineError::Io(_) => true,
            _ => false,
        }
    }
}
