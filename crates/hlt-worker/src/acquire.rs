//! Recording acquisition.
//!
//! A recording is usable once it probes correctly. When it does not, the
//! configured fetcher downloads it again, up to a bounded number of times.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};

use hlt_media::Recording;
use hlt_models::Broadcast;

use crate::error::{WorkerError, WorkerResult};
use crate::external::ExternalCommand;
use crate::retry::{retry_with_repair, RetryConfig};

/// Downloads a broadcast's recording to a local path.
#[async_trait]
pub trait RecordingFetcher: Send + Sync {
    async fn fetch(&self, broadcast: &Broadcast, dest: &Path) -> WorkerResult<()>;
}

/// Fetcher used when no download command is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFetcher;

#[async_trait]
impl RecordingFetcher for NoFetcher {
    async fn fetch(&self, broadcast: &Broadcast, _dest: &Path) -> WorkerResult<()> {
        Err(WorkerError::acquire_failed(format!(
            "no fetch command configured for {}",
            broadcast.id
        )))
    }
}

/// Fetcher that runs an external downloader with `{id}` and `{path}` substituted.
#[derive(Debug, Clone)]
pub struct CommandFetcher {
    command: ExternalCommand,
}

impl CommandFetcher {
    pub fn new(command: ExternalCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl RecordingFetcher for CommandFetcher {
    async fn fetch(&self, broadcast: &Broadcast, dest: &Path) -> WorkerResult<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let dest = dest.display().to_string();
        self.command
            .run(&[("id", broadcast.id.as_str()), ("path", dest.as_str())])
            .await
    }
}

/// Local path of a broadcast's recording.
pub fn recording_path(broadcast: &Broadcast, recordings_dir: &Path) -> PathBuf {
    broadcast
        .path
        .clone()
        .unwrap_or_else(|| recordings_dir.join(format!("{}.mp4", broadcast.id)))
}

/// Open a recording, fetching it again while it is missing or unreadable.
///
/// `retry.max_retries` bounds the number of fetches.
pub async fn acquire_recording(
    broadcast: &Broadcast,
    path: &Path,
    fetcher: &dyn RecordingFetcher,
    retry: &RetryConfig,
) -> WorkerResult<Recording> {
    let result = retry_with_repair(
        retry,
        || Recording::open(broadcast.id.as_str(), path),
        |attempt| {
            info!(
                broadcast_id = %broadcast.id,
                attempt,
                max = retry.max_retries,
                "Fetching recording"
            );
            fetcher.fetch(broadcast, path)
        },
    )
    .await;

    let attempts = result.attempts();
    result.into_result().map_err(|e| {
        warn!(broadcast_id = %broadcast.id, attempts, error = %e, "Giving up on recording");
        WorkerError::acquire_failed(format!(
            "{} unusable after {} attempts: {}",
            broadcast.id, attempts, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    struct CountingFetcher(AtomicU32);

    #[async_trait]
    impl RecordingFetcher for CountingFetcher {
        async fn fetch(&self, _broadcast: &Broadcast, _dest: &Path) -> WorkerResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn broadcast(id: &str, path: Option<PathBuf>) -> Broadcast {
        Broadcast {
            id: id.to_string(),
            title: String::new(),
            published_at: Utc::now(),
            path,
        }
    }

    #[test]
    fn test_recording_path() {
        let dir = Path::new("/rec");
        assert_eq!(recording_path(&broadcast("1", None), dir), PathBuf::from("/rec/1.mp4"));
        assert_eq!(
            recording_path(&broadcast("1", Some("/other/x.mkv".into())), dir),
            PathBuf::from("/other/x.mkv")
        );
    }

    #[tokio::test]
    async fn test_missing_recording_is_fetched_max_times() {
        let dir = TempDir::new().unwrap();
        let fetcher = CountingFetcher(AtomicU32::new(0));
        let retry = RetryConfig::new("acquire")
            .with_max_retries(3)
            .with_base_delay(Duration::ZERO);
        let b = broadcast("404", None);

        let err = acquire_recording(&b, &dir.path().join("404.mp4"), &fetcher, &retry)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::AcquireFailed(_)));
        assert_eq!(fetcher.0.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_fetcher_errors() {
        let err = NoFetcher
            .fetch(&broadcast("1", None), Path::new("/rec/1.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::AcquireFailed(_)));
    }
}
