//! Per-recording highlight pipeline.
//!
//! Phase 1 (detection) runs at most once per recording and is persisted.
//! Phase 2 derives clip intervals from the detected events and the audio:
//! sort, gap-fill, extend, clamp to the recording, merge.

use std::time::Instant;

use tracing::{debug, info, instrument};

use hlt_media::{EnergySampler, EventDetector, Recording};
use hlt_models::{ClipInterval, DetectionState, Event};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::extend::extend_events;
use crate::gap_fill::fill_gaps;
use crate::merge::merge_intervals;
use crate::metrics;
use crate::state::DetectionStore;

/// Final intervals of one recording and how they were obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingHighlights {
    /// Events supplied by detection.
    pub detector_events: usize,
    /// Events inserted by the gap-fill scan.
    pub synthetic_events: usize,
    /// Intervals absorbed into a neighbour.
    pub merged: usize,
    /// Merged intervals, ordered, clamped to the recording.
    pub intervals: Vec<ClipInterval>,
}

impl RecordingHighlights {
    /// Total length of all intervals, seconds.
    pub fn total_duration(&self) -> f64 {
        self.intervals.iter().map(ClipInterval::duration).sum()
    }
}

/// Derive clip intervals for one recording from its events.
///
/// Does no I/O beyond energy sampling.
pub async fn compute_highlights<S>(
    sampler: &S,
    mut events: Vec<Event>,
    config: &EngineConfig,
) -> EngineResult<RecordingHighlights>
where
    S: EnergySampler + ?Sized,
{
    config.validate()?;
    let detector_events = events.len();
    let synthetic_events = fill_gaps(sampler, &mut events, config).await?;

    let mut intervals = extend_events(sampler, &events, config).await?;
    let duration = sampler.duration();
    for interval in &mut intervals {
        interval.clamp_end(duration);
    }
    intervals.retain(|i| i.duration() > 0.0);

    let before = intervals.len();
    let intervals = merge_intervals(intervals, config.join_threshold);
    let merged = before - intervals.len();

    metrics::record_synthetic_events(synthetic_events);
    metrics::record_merges(merged);
    for interval in &intervals {
        metrics::record_clip_interval(interval.duration());
    }

    Ok(RecordingHighlights {
        detector_events,
        synthetic_events,
        merged,
        intervals,
    })
}

/// Runs detection with persisted state and the interval pipeline.
#[derive(Debug, Clone)]
pub struct HighlightEngine {
    config: EngineConfig,
    store: DetectionStore,
}

impl HighlightEngine {
    /// Create an engine after validating `config`.
    pub fn new(config: EngineConfig, store: DetectionStore) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &DetectionStore {
        &self.store
    }

    /// Detection phase.
    ///
    /// A recording whose state is fully scanned is never handed to the
    /// detector again. Otherwise the detector runs when visual processing is
    /// enabled, and the result is persisted before returning.
    #[instrument(skip(self, recording, detector), fields(recording_id = %recording.id(), detector = detector.name()))]
    pub async fn detect(&self, recording: &Recording, detector: &dyn EventDetector) -> EngineResult<DetectionState> {
        let state = self.store.load(recording.id()).await;
        if state.fully_scanned {
            info!(events = state.events.len(), "Recording already scanned, reusing events");
            return Ok(state);
        }

        let mut events = state.events;
        if self.config.visual_processing {
            let started = Instant::now();
            let detected = detector.detect(recording).await?;
            info!(
                events = detected.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Detection finished"
            );
            events.extend(detected);
        } else {
            debug!("Visual processing disabled, skipping detector");
        }

        let state = DetectionState::scanned(events);
        self.store.save(recording.id(), &state).await?;
        Ok(state)
    }

    /// Full per-recording run: detection, then interval computation.
    #[instrument(skip_all, fields(recording_id = %recording.id()))]
    pub async fn process_recording<S>(
        &self,
        recording: &Recording,
        detector: &dyn EventDetector,
        sampler: &S,
    ) -> EngineResult<RecordingHighlights>
    where
        S: EnergySampler + ?Sized,
    {
        let state = self.detect(recording, detector).await?;
        let highlights = compute_highlights(sampler, state.events, &self.config).await?;

        info!(
            detector_events = highlights.detector_events,
            synthetic_events = highlights.synthetic_events,
            merged = highlights.merged,
            clips = highlights.intervals.len(),
            total_secs = format!("{:.1}", highlights.total_duration()),
            "Recording highlights computed"
        );

        Ok(highlights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use hlt_media::{MediaResult, PcmAudio, RecordingInfo};
    use tempfile::TempDir;

    const RATE: u32 = 100;

    struct CountingDetector {
        calls: AtomicUsize,
        events: Vec<Event>,
    }

    #[async_trait]
    impl EventDetector for CountingDetector {
        fn name(&self) -> &str {
            "counting"
        }

        async fn detect(&self, _recording: &Recording) -> MediaResult<Vec<Event>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.events.clone())
        }
    }

    fn recording(duration: f64) -> Recording {
        Recording::from_parts(
            "vod-1",
            "/tmp/vod-1.mp4",
            RecordingInfo {
                duration,
                sample_rate: RATE,
                channels: 1,
                has_video: true,
                fps: 30.0,
            },
        )
    }

    fn config() -> EngineConfig {
        EngineConfig {
            sample_rate: RATE,
            visual_processing: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_detector_runs_once() {
        let dir = TempDir::new().unwrap();
        let engine = HighlightEngine::new(config(), DetectionStore::new(dir.path())).unwrap();
        let detector = CountingDetector {
            calls: AtomicUsize::new(0),
            events: vec![Event::new(100.0, "Chess")],
        };
        let rec = recording(600.0);

        let first = engine.detect(&rec, &detector).await.unwrap();
        let second = engine.detect(&rec, &detector).await.unwrap();

        assert_eq!(detector.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert!(second.fully_scanned);
    }

    #[tokio::test]
    async fn test_disabled_visual_processing_skips_detector() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig {
            visual_processing: false,
            ..config()
        };
        let engine = HighlightEngine::new(config, DetectionStore::new(dir.path())).unwrap();
        let detector = CountingDetector {
            calls: AtomicUsize::new(0),
            events: vec![Event::new(100.0, "Chess")],
        };

        let state = engine.detect(&recording(600.0), &detector).await.unwrap();

        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
        assert!(state.events.is_empty());
        assert!(state.fully_scanned);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = EngineConfig {
            extension_step: 0.0,
            ..Default::default()
        };
        assert!(HighlightEngine::new(config, DetectionStore::new("/tmp")).is_err());
    }

    #[tokio::test]
    async fn test_compute_highlights_rejects_zero_extension_step() {
        let audio = PcmAudio::from_fn(600.0, RATE, |_| 0.5);
        let config = EngineConfig {
            extension_step: 0.0,
            ..config()
        };

        let err = compute_highlights(&audio, vec![Event::new(300.0, "Chess")], &config)
            .await
            .unwrap_err();

        assert!(matches!(err, crate::error::EngineError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_intervals_clamped_to_recording() {
        let audio = PcmAudio::from_fn(600.0, RATE, |_| 0.0);
        let highlights = compute_highlights(&audio, vec![Event::new(598.0, "End")], &config())
            .await
            .unwrap();

        assert_eq!(highlights.intervals.len(), 1);
        assert_eq!(highlights.intervals[0].end, 600.0);
        assert_eq!(highlights.intervals[0].start, 588.0);
    }

    #[tokio::test]
    async fn test_process_recording_uses_detector_events() {
        let dir = TempDir::new().unwrap();
        let engine = HighlightEngine::new(config(), DetectionStore::new(dir.path())).unwrap();
        let detector = CountingDetector {
            calls: AtomicUsize::new(0),
            events: vec![Event::new(120.0, "Chess"), Event::new(100.0, "Chess")],
        };
        let audio = PcmAudio::from_fn(600.0, RATE, |_| 0.0);

        let highlights = engine
            .process_recording(&recording(600.0), &detector, &audio)
            .await
            .unwrap();

        assert_eq!(highlights.detector_events, 2);
        assert_eq!(highlights.merged, 1);
        assert_eq!(highlights.intervals, {
            let mut expected = ClipInterval::new(90.0, 104.0, "Chess");
            expected.absorb(ClipInterval::new(110.0, 124.0, "Chess"));
            vec![expected]
        });
    }
}
