//! Upload hand-off.

use std::path::Path;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{WorkerError, WorkerResult};
use crate::external::ExternalCommand;

/// Publishes a finished video together with its metadata record.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, video: &Path, metadata: &Path) -> WorkerResult<()>;
}

/// Runs an external uploader with `{video}` and `{metadata}` substituted.
#[derive(Debug, Clone)]
pub struct CommandUploader {
    command: ExternalCommand,
}

impl CommandUploader {
    pub fn new(command: ExternalCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Uploader for CommandUploader {
    async fn upload(&self, video: &Path, metadata: &Path) -> WorkerResult<()> {
        let video = video.display().to_string();
        let metadata = metadata.display().to_string();
        self.command
            .run(&[("video", video.as_str()), ("metadata", metadata.as_str())])
            .await
            .map_err(|e| WorkerError::upload_failed(e.to_string()))
    }
}

/// Leaves outputs in the work directory; used when no uploader is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalOnly;

#[async_trait]
impl Uploader for LocalOnly {
    async fn upload(&self, video: &Path, metadata: &Path) -> WorkerResult<()> {
        warn!(
            video = %video.display(),
            metadata = %metadata.display(),
            "No upload command configured, keeping outputs locally"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failing_uploader_maps_error() {
        let uploader = CommandUploader::new(ExternalCommand::parse("hlt-no-such-uploader {video}").unwrap());
        let err = uploader
            .upload(Path::new("/w/a.mp4"), Path::new("/w/a.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::UploadFailed(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_local_only_succeeds() {
        assert!(LocalOnly
            .upload(Path::new("/w/a.mp4"), Path::new("/w/a.json"))
            .await
            .is_ok());
    }
}
