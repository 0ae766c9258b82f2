//! Structured batch logging utilities.
//!
//! Every message carries the batch id (the batch date) and the stage it
//! belongs to, so JSON logs of one run can be filtered per batch.

use tracing::{error, info, warn, Span};

/// Batch logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct BatchLogger {
    batch_id: String,
    operation: String,
}

impl BatchLogger {
    /// Create a logger for `batch_id` and a stage such as `"acquire"` or `"render"`.
    pub fn new(batch_id: &str, operation: &str) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Same batch, different stage.
    pub fn stage(&self, operation: &str) -> Self {
        Self::new(&self.batch_id, operation)
    }

    pub fn log_start(&self, message: &str) {
        info!(
            batch_id = %self.batch_id,
            operation = %self.operation,
            "Batch started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            batch_id = %self.batch_id,
            operation = %self.operation,
            "Batch progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            batch_id = %self.batch_id,
            operation = %self.operation,
            "Batch warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            batch_id = %self.batch_id,
            operation = %self.operation,
            "Batch error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            batch_id = %self.batch_id,
            operation = %self.operation,
            "Batch completed: {}", message
        );
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this batch stage.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "batch",
            batch_id = %self.batch_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_logger_stage() {
        let logger = BatchLogger::new("07.03.2024", "select");
        let render = logger.stage("render");

        assert_eq!(render.batch_id(), "07.03.2024");
        assert_eq!(render.operation(), "render");
        assert_eq!(logger.operation(), "select");
    }
}
