//! Batch runner.
//!
//! One run handles one batch:
//! 1. Select the oldest pending day from the candidate broadcasts
//! 2. Skip straight to upload when both the video and its metadata exist
//! 3. Otherwise acquire each recording, compute its highlights and append
//!    them to the batch timeline
//! 4. Write metadata and render the video (each only if missing)
//! 5. Upload, mark the batch processed, remove the source recordings
//!
//! A recording that cannot be acquired or processed is skipped; the rest of
//! the batch continues. A batch without any clip is marked processed
//! without producing output.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn, Instrument};

use hlt_engine::{DetectionStore, EngineConfig, HighlightEngine, RecordingHighlights, Timeline};
use hlt_media::{
    probe_recording, remove_if_exists, render_highlights, EnergySampler, EventDetector, FfmpegEnergySampler,
    NoopDetector, PcmAudio, PixelMatchDetector, Recording, RenderOptions, SidecarDetector, SourceClip, Watermark,
};
use hlt_models::Broadcast;

use crate::acquire::{acquire_recording, recording_path, CommandFetcher, NoFetcher, RecordingFetcher};
use crate::config::{DetectorKind, WorkerConfig};
use crate::error::{WorkerError, WorkerResult};
use crate::external::ExternalCommand;
use crate::ledger::ProcessedLedger;
use crate::logging::BatchLogger;
use crate::metadata::{build_metadata, write_metadata, MetadataSettings, PlaylistMap};
use crate::retry::RetryConfig;
use crate::selection::{select_batch, Batch};
use crate::upload::{CommandUploader, LocalOnly, Uploader};

/// What a run did.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// Every candidate broadcast is already processed.
    NothingPending,
    /// The batch produced no clips; it was marked processed without output.
    Empty { batch_id: String, ids: Vec<String> },
    /// The video was uploaded and the batch marked processed.
    Published {
        batch_id: String,
        video: PathBuf,
        metadata: PathBuf,
        ids: Vec<String>,
    },
}

/// Drives one batch from selection to upload.
pub struct BatchRunner {
    config: WorkerConfig,
    engine: HighlightEngine,
    detector: Box<dyn EventDetector>,
    fetcher: Box<dyn RecordingFetcher>,
    uploader: Box<dyn Uploader>,
    playlists: PlaylistMap,
}

impl BatchRunner {
    pub fn new(
        config: WorkerConfig,
        engine: HighlightEngine,
        detector: Box<dyn EventDetector>,
        fetcher: Box<dyn RecordingFetcher>,
        uploader: Box<dyn Uploader>,
        playlists: PlaylistMap,
    ) -> Self {
        Self {
            config,
            engine,
            detector,
            fetcher,
            uploader,
            playlists,
        }
    }

    /// Build a runner with collaborators chosen by configuration.
    pub async fn from_config(config: WorkerConfig, engine_config: EngineConfig) -> WorkerResult<Self> {
        if config.detector != DetectorKind::None && !engine_config.visual_processing {
            warn!(
                detector = ?config.detector,
                "Detector configured but visual processing is disabled; it will not run"
            );
        }

        let engine = HighlightEngine::new(engine_config, DetectionStore::new(config.state_dir()))?;

        let detector: Box<dyn EventDetector> = match config.detector {
            DetectorKind::None => Box::new(NoopDetector),
            DetectorKind::Sidecar => Box::new(SidecarDetector::default()),
            DetectorKind::Pixel => Box::new(PixelMatchDetector {
                label: config.pixel_label.clone(),
                ..Default::default()
            }),
        };

        let fetcher: Box<dyn RecordingFetcher> = match &config.fetch_command {
            Some(line) => Box::new(CommandFetcher::new(ExternalCommand::parse(line)?)),
            None => Box::new(NoFetcher),
        };

        let uploader: Box<dyn Uploader> = match &config.upload_command {
            Some(line) => Box::new(CommandUploader::new(ExternalCommand::parse(line)?)),
            None => Box::new(LocalOnly),
        };

        let playlists = PlaylistMap::load(config.playlists_path.as_deref()).await?;

        Ok(Self::new(config, engine, detector, fetcher, uploader, playlists))
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Process the next pending batch among `candidates`.
    pub async fn run(&self, candidates: &[Broadcast]) -> WorkerResult<BatchOutcome> {
        let mut ledger = ProcessedLedger::load(&self.config.ledger_path).await?;

        let Some(batch) = select_batch(candidates, &ledger) else {
            info!(candidates = candidates.len(), "No broadcasts to process");
            return Ok(BatchOutcome::NothingPending);
        };

        let logger = BatchLogger::new(&batch.formatted_date(), "batch");
        let span = logger.create_span();
        self.run_batch(&batch, &mut ledger, &logger).instrument(span).await
    }

    async fn run_batch(
        &self,
        batch: &Batch,
        ledger: &mut ProcessedLedger,
        logger: &BatchLogger,
    ) -> WorkerResult<BatchOutcome> {
        let batch_id = batch.formatted_date();
        logger.log_start(&format!("{} broadcast(s): {}", batch.len(), batch.ids().join(", ")));

        let (video_path, metadata_path) = self.config.output_paths(&batch_id);
        let video_ready = output_is_valid(&video_path).await;
        let metadata_ready = tokio::fs::try_exists(&metadata_path).await.unwrap_or(false);

        if video_ready && metadata_ready {
            logger.log_progress("video and metadata already exist, skipping to upload");
        } else {
            let (timeline, sources) = self.build_timeline(batch, logger).await?;

            if timeline.is_empty() {
                logger.log_warning("no clips to combine");
                self.complete(batch, ledger, logger).await?;
                return Ok(BatchOutcome::Empty {
                    batch_id,
                    ids: batch.ids(),
                });
            }

            if !metadata_ready {
                let settings = MetadataSettings::from(&self.config);
                let metadata = build_metadata(&settings, &self.playlists, batch, &timeline);
                write_metadata(&metadata_path, &metadata).await?;
                logger.stage("metadata").log_progress(&format!(
                    "{} chapter(s), {} tag(s), {} playlist(s)",
                    timeline.chapters().len(),
                    metadata.tags.len(),
                    metadata.playlist_ids.len()
                ));
            }

            if !video_ready {
                self.render(&batch_id, &timeline, &sources, &video_path, logger).await?;
            }
        }

        logger.stage("upload").log_progress("uploading");
        self.uploader.upload(&video_path, &metadata_path).await?;

        self.complete(batch, ledger, logger).await?;
        logger.log_completion(&format!("published {}", video_path.display()));

        Ok(BatchOutcome::Published {
            batch_id,
            video: video_path,
            metadata: metadata_path,
            ids: batch.ids(),
        })
    }

    /// Run every recording of the batch through the engine, in order.
    async fn build_timeline(
        &self,
        batch: &Batch,
        logger: &BatchLogger,
    ) -> WorkerResult<(Timeline, HashMap<String, PathBuf>)> {
        let logger = logger.stage("process");
        let retry = RetryConfig::new("acquire")
            .with_max_retries(self.config.max_acquire_tries)
            .with_base_delay(self.config.acquire_retry_delay);

        let mut timeline = Timeline::new(self.engine.config().intro_duration, self.config.base_tags.iter().cloned());
        let mut sources = HashMap::new();

        for (i, broadcast) in batch.broadcasts().iter().enumerate() {
            logger.log_progress(&format!("recording {} ({}/{})", broadcast.id, i + 1, batch.len()));
            let path = recording_path(broadcast, &self.config.recordings_dir);

            let recording = match acquire_recording(broadcast, &path, self.fetcher.as_ref(), &retry).await {
                Ok(recording) => recording,
                Err(e) => {
                    logger.log_warning(&format!("skipping {}: {}", broadcast.id, e));
                    continue;
                }
            };

            match self.highlights_for(&recording).await {
                Ok(highlights) => {
                    let appended = timeline.append_recording(recording.id(), highlights.intervals);
                    sources.insert(recording.id().to_string(), recording.path().to_path_buf());
                    logger.log_progress(&format!(
                        "{}: {} clip(s), timeline now {:.1}s",
                        recording.id(),
                        appended,
                        timeline.cumulative_duration()
                    ));
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => logger.log_error(&format!("skipping {}: {}", recording.id(), e)),
            }
        }

        Ok((timeline, sources))
    }

    async fn highlights_for(&self, recording: &Recording) -> WorkerResult<RecordingHighlights> {
        let rate = self.engine.config().sample_rate;
        let sampler: Box<dyn EnergySampler> = if self.config.preload_audio {
            Box::new(PcmAudio::decode(recording.path(), rate, 1).await?)
        } else {
            Box::new(FfmpegEnergySampler::new(recording, rate))
        };

        Ok(self
            .engine
            .process_recording(recording, self.detector.as_ref(), sampler.as_ref())
            .await?)
    }

    async fn render(
        &self,
        batch_id: &str,
        timeline: &Timeline,
        sources: &HashMap<String, PathBuf>,
        output: &Path,
        logger: &BatchLogger,
    ) -> WorkerResult<()> {
        let logger = logger.stage("render");
        let clips = timeline
            .clips()
            .iter()
            .map(|clip| {
                let path = sources.get(&clip.recording_id).cloned().ok_or_else(|| {
                    WorkerError::config_error(format!("no source path for {}", clip.recording_id))
                })?;
                Ok(SourceClip {
                    path,
                    start: clip.interval.start,
                    end: clip.interval.end,
                })
            })
            .collect::<WorkerResult<Vec<_>>>()?;

        let engine_config = self.engine.config();
        let options = RenderOptions {
            fade_in: engine_config.intro_duration,
            fade_out: engine_config.outro_duration,
            watermark: Some(Watermark {
                text: format!("HIGHLIGHTS FROM {}", batch_id),
                font: self.config.watermark_font.clone(),
                font_size: self.config.watermark_font_size,
                color: self.config.watermark_color.clone(),
                x: 20,
                y: 10,
            }),
            threads: self.config.render_threads,
            ..Default::default()
        };

        logger.log_start(&format!("{} clip(s), {:.1}s", clips.len(), timeline.cumulative_duration()));
        render_highlights(&clips, output, &options).await?;
        logger.log_completion(&output.display().to_string());
        Ok(())
    }

    /// Record the batch as processed and drop its source recordings.
    async fn complete(&self, batch: &Batch, ledger: &mut ProcessedLedger, logger: &BatchLogger) -> WorkerResult<()> {
        ledger.mark_processed(batch.ids()).await?;

        if self.config.keep_sources {
            return Ok(());
        }

        for broadcast in batch.broadcasts() {
            let path = recording_path(broadcast, &self.config.recordings_dir);
            if let Err(e) = remove_if_exists(&path).await {
                logger.log_warning(&format!("could not remove {}: {}", path.display(), e));
            }
        }
        Ok(())
    }
}

/// A previous render counts only if it probes as a playable file.
async fn output_is_valid(path: &Path) -> bool {
    probe_recording(path).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> WorkerConfig {
        let work_dir = dir.path().to_path_buf();
        WorkerConfig {
            recordings_dir: work_dir.join("recordings"),
            ledger_path: work_dir.join("processed_broadcasts.txt"),
            manifest_path: work_dir.join("broadcasts.json"),
            work_dir,
            acquire_retry_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    fn broadcast(id: &str, day: u32) -> Broadcast {
        Broadcast {
            id: id.to_string(),
            title: format!("Stream {}", id),
            published_at: Utc.with_ymd_and_hms(2024, 3, day, 18, 0, 0).unwrap(),
            path: None,
        }
    }

    #[tokio::test]
    async fn test_nothing_pending() {
        let dir = TempDir::new().unwrap();
        let runner = BatchRunner::from_config(config(&dir), EngineConfig::default()).await.unwrap();

        assert_eq!(runner.run(&[]).await.unwrap(), BatchOutcome::NothingPending);
    }

    #[tokio::test]
    async fn test_unusable_recordings_complete_empty_batch() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        tokio::fs::create_dir_all(&config.recordings_dir).await.unwrap();
        // Not a media file, so it never probes
        let broken = config.recording_path("a");
        tokio::fs::write(&broken, b"not a video").await.unwrap();

        let runner = BatchRunner::from_config(config.clone(), EngineConfig::default()).await.unwrap();
        let candidates = vec![broadcast("a", 7), broadcast("b", 7), broadcast("c", 8)];

        let outcome = runner.run(&candidates).await.unwrap();

        assert_eq!(
            outcome,
            BatchOutcome::Empty {
                batch_id: "07.03.2024".to_string(),
                ids: vec!["a".to_string(), "b".to_string()],
            }
        );
        let ledger = ProcessedLedger::load(&config.ledger_path).await.unwrap();
        assert!(ledger.is_processed("a"));
        assert!(ledger.is_processed("b"));
        assert!(!ledger.is_processed("c"));
        assert!(!broken.exists(), "source recordings are removed");

        // Next run moves on to the following day
        let next = runner.run(&candidates).await.unwrap();
        assert!(matches!(next, BatchOutcome::Empty { ref batch_id, .. } if batch_id == "08.03.2024"));
    }

    #[tokio::test]
    async fn test_keep_sources() {
        let dir = TempDir::new().unwrap();
        let config = WorkerConfig {
            keep_sources: true,
            ..config(&dir)
        };
        tokio::fs::create_dir_all(&config.recordings_dir).await.unwrap();
        let source = config.recording_path("a");
        tokio::fs::write(&source, b"not a video").await.unwrap();

        let runner = BatchRunner::from_config(config, EngineConfig::default()).await.unwrap();
        runner.run(&[broadcast("a", 7)]).await.unwrap();

        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_invalid_engine_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        let engine_config = EngineConfig {
            tick_secs: 0.0,
            ..Default::default()
        };
        assert!(BatchRunner::from_config(config(&dir), engine_config).await.is_err());
    }
}
