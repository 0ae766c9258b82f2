//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Acquisition failed: {0}")]
    AcquireFailed(String),

    #[error("External command failed: {0}")]
    CommandFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Engine error: {0}")]
    Engine(#[from] hlt_engine::EngineError),

    #[error("Media error: {0}")]
    Media(#[from] hlt_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn acquire_failed(msg: impl Into<String>) -> Self {
        Self::AcquireFailed(msg.into())
    }

    pub fn command_failed(msg: impl Into<String>) -> Self {
        Self::CommandFailed(msg.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    /// Check if a later run could succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::AcquireFailed(_) | WorkerError::CommandFailed(_) | WorkerError::UploadFailed(_) => true,
            WorkerError::Engine(e) => e.is_transient(),
            WorkerError::Media(e) => e.is_transient(),
            WorkerError::Io(_) => true,
            _ => false,
        }
    }

    /// Errors that must stop the whole batch instead of skipping one recording.
    pub fn is_fatal(&self) -> bool {
        match self {
            WorkerError::Engine(e) => e.is_fatal(),
            WorkerError::ConfigError(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlt_media::MediaError;

    #[test]
    fn test_retryable() {
        assert!(WorkerError::upload_failed("exit 1").is_retryable());
        assert!(!WorkerError::config_error("bad").is_retryable());
        assert!(WorkerError::from(MediaError::FileNotFound("/x".into())).is_retryable());
    }

    #[test]
    fn test_fatal() {
        let err = WorkerError::from(hlt_engine::EngineError::from(MediaError::OutOfRange {
            start: 10.0,
            end: 20.0,
            duration: 15.0,
        }));
        assert!(err.is_fatal());
        assert!(!WorkerError::acquire_failed("gone").is_fatal());
    }
}
