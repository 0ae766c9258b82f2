//! Retry utilities with exponential backoff.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Base delay for exponential backoff (doubles each attempt).
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Operation name for logging.
    pub operation_name: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            operation_name: "operation".to_string(),
        }
    }
}

impl RetryConfig {
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..Default::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(2u32.pow(exp)).min(self.max_delay)
    }
}

/// Result of a retry operation.
#[derive(Debug)]
pub enum RetryResult<T, E> {
    Success { value: T, attempts: u32 },
    Failed { error: E, attempts: u32 },
}

impl<T, E> RetryResult<T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, RetryResult::Success { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RetryResult::Success { attempts, .. } | RetryResult::Failed { attempts, .. } => *attempts,
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            RetryResult::Success { value, .. } => Ok(value),
            RetryResult::Failed { error, .. } => Err(error),
        }
    }
}

/// Execute `operation`, running `repair` before each retry.
///
/// The operation runs up to `max_retries + 1` times and `repair` at most
/// `max_retries` times. A failing repair is logged and the operation is
/// retried anyway.
pub async fn retry_with_repair<Op, OpFut, Repair, RepairFut, T, E, RE>(
    config: &RetryConfig,
    operation: Op,
    repair: Repair,
) -> RetryResult<T, E>
where
    Op: Fn() -> OpFut,
    OpFut: Future<Output = Result<T, E>>,
    Repair: Fn(u32) -> RepairFut,
    RepairFut: Future<Output = Result<(), RE>>,
    E: std::fmt::Display,
    RE: std::fmt::Display,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => {
                return RetryResult::Success {
                    value,
                    attempts: attempt + 1,
                }
            }
            Err(e) if attempt < config.max_retries => {
                attempt += 1;
                debug!(
                    "{} attempt {} failed, repairing: {}",
                    config.operation_name, attempt, e
                );
                if let Err(re) = repair(attempt).await {
                    warn!(
                        "{} repair {}/{} failed: {}",
                        config.operation_name, attempt, config.max_retries, re
                    );
                }
                let delay = config.delay_for_attempt(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(e) => {
                return RetryResult::Failed {
                    error: e,
                    attempts: attempt + 1,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_retries: u32) -> RetryConfig {
        RetryConfig::new("test")
            .with_max_retries(max_retries)
            .with_base_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_success_without_repair() {
        let repairs = &AtomicU32::new(0);
        let result = retry_with_repair(
            &fast(3),
            move || async move { Ok::<_, String>(7) },
            move |_| async move {
                repairs.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(())
            },
        )
        .await;

        assert!(result.is_success());
        assert_eq!(result.attempts(), 1);
        assert_eq!(repairs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_repair_makes_operation_succeed() {
        let repaired = &AtomicU32::new(0);
        let result = retry_with_repair(
            &fast(3),
            move || async move {
                if repaired.load(Ordering::SeqCst) >= 2 {
                    Ok(())
                } else {
                    Err("missing")
                }
            },
            move |_| async move {
                repaired.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(())
            },
        )
        .await;

        assert!(result.is_success());
        assert_eq!(result.attempts(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let repairs = &AtomicU32::new(0);
        let result = retry_with_repair(
            &fast(3),
            move || async move { Err::<(), _>("still missing") },
            move |_| async move {
                repairs.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("download failed")
            },
        )
        .await;

        assert!(!result.is_success());
        assert_eq!(result.attempts(), 4);
        assert_eq!(repairs.load(Ordering::SeqCst), 3);
        assert_eq!(result.into_result().unwrap_err(), "still missing");
    }

    #[test]
    fn test_delay_backoff_is_capped() {
        let config = RetryConfig::new("x").with_base_delay(Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(30));
    }
}
