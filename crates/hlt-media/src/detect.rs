//! Event detectors.
//!
//! A detector turns a recording into `(time, label)` events. The engine
//! treats detectors as pluggable collaborators; an empty result is valid and
//! simply leaves the recording to audio gap-filling.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use hlt_models::{parse_timestamp, Event};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::Recording;

/// Produces events of interest for a recording.
#[async_trait]
pub trait EventDetector: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Detect events in `recording`. Order of the result is not significant.
    async fn detect(&self, recording: &Recording) -> MediaResult<Vec<Event>>;
}

/// Detector that never reports anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDetector;

#[async_trait]
impl EventDetector for NoopDetector {
    fn name(&self) -> &str {
        "noop"
    }

    async fn detect(&self, _recording: &Recording) -> MediaResult<Vec<Event>> {
        Ok(Vec::new())
    }
}

/// Event time in a sidecar file: seconds or a clock string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SidecarTime {
    Seconds(f64),
    Clock(String),
}

#[derive(Debug, Deserialize)]
struct SidecarEvent {
    time: SidecarTime,
    #[serde(default)]
    label: String,
}

/// Reads events produced by an external classifier from a JSON file next to
/// the recording (`<recording>.events.json` by default).
#[derive(Debug, Clone)]
pub struct SidecarDetector {
    suffix: String,
}

impl Default for SidecarDetector {
    fn default() -> Self {
        Self {
            suffix: "events.json".to_string(),
        }
    }
}

impl SidecarDetector {
    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Sidecar location for a recording path.
    pub fn sidecar_path(&self, recording: &Path) -> PathBuf {
        let mut name = recording.as_os_str().to_owned();
        name.push(".");
        name.push(&self.suffix);
        PathBuf::from(name)
    }

    fn parse(bytes: &[u8]) -> MediaResult<Vec<Event>> {
        let raw: Vec<SidecarEvent> = serde_json::from_slice(bytes)?;
        raw.into_iter()
            .map(|e| {
                let time = match e.time {
                    SidecarTime::Seconds(s) => s,
                    SidecarTime::Clock(c) => parse_timestamp(&c)
                        .map_err(|err| MediaError::detection_failed(err.to_string()))?,
                };
                if !time.is_finite() || time < 0.0 {
                    return Err(MediaError::detection_failed(format!(
                        "invalid event time {}",
                        time
                    )));
                }
                Ok(Event::new(time, e.label))
            })
            .collect()
    }
}

#[async_trait]
impl EventDetector for SidecarDetector {
    fn name(&self) -> &str {
        "sidecar"
    }

    async fn detect(&self, recording: &Recording) -> MediaResult<Vec<Event>> {
        let path = self.sidecar_path(recording.path());
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No sidecar events file");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let events = Self::parse(&bytes)?;
        info!(
            recording = recording.id(),
            events = events.len(),
            "Loaded sidecar events"
        );
        Ok(events)
    }
}

/// Scans frames at a fixed rate and reports an event whenever one pixel
/// matches a reference colour (for example a game's end screen).
#[derive(Debug, Clone)]
pub struct PixelMatchDetector {
    /// Frames inspected per second.
    pub fps: f64,
    /// Pixel column.
    pub x: u32,
    /// Pixel row.
    pub y: u32,
    /// Reference RGB value.
    pub rgb: [u8; 3],
    /// Allowed absolute difference per channel.
    pub tolerance: u8,
    /// Label attached to emitted events.
    pub label: String,
}

impl Default for PixelMatchDetector {
    fn default() -> Self {
        Self {
            fps: 4.0,
            x: 10,
            y: 10,
            rgb: [124, 199, 19],
            tolerance: 0,
            label: String::new(),
        }
    }
}

impl PixelMatchDetector {
    fn matches(&self, pixel: &[u8]) -> bool {
        pixel
            .iter()
            .zip(self.rgb.iter())
            .all(|(a, b)| a.abs_diff(*b) <= self.tolerance)
    }

    /// Turn a stream of rgb24 1x1 frames into events.
    fn events_from_frames(&self, frames: &[u8]) -> Vec<Event> {
        frames
            .chunks_exact(3)
            .enumerate()
            .filter(|(_, pixel)| self.matches(pixel))
            .map(|(i, _)| Event::new(i as f64 / self.fps, self.label.clone()))
            .collect()
    }
}

#[async_trait]
impl EventDetector for PixelMatchDetector {
    fn name(&self) -> &str {
        "pixel_match"
    }

    async fn detect(&self, recording: &Recording) -> MediaResult<Vec<Event>> {
        if !recording.info().has_video {
            return Err(MediaError::detection_failed(format!(
                "recording {} has no video stream",
                recording.id()
            )));
        }

        let cmd = FfmpegCommand::to_stdout(recording.path())
            .video_filter(format!(
                "fps={},crop=1:1:{}:{}",
                self.fps, self.x, self.y
            ))
            .output_args(["-an", "-pix_fmt", "rgb24"])
            .format("rawvideo");

        let frames = FfmpegRunner::new().capture(&cmd).await?;
        let events = self.events_from_frames(&frames);

        info!(
            recording = recording.id(),
            frames = frames.len() / 3,
            events = events.len(),
            "Pixel scan complete"
        );

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::RecordingInfo;
    use tempfile::TempDir;

    fn recording_at(path: &Path) -> Recording {
        Recording::from_parts(
            "rec-1",
            path,
            RecordingInfo {
                duration: 100.0,
                sample_rate: 48000,
                channels: 2,
                has_video: false,
                fps: 0.0,
            },
        )
    }

    #[test]
    fn test_pixel_events_from_frames() {
        let detector = PixelMatchDetector {
            label: "Chess".into(),
            ..Default::default()
        };
        let frames = [
            0, 0, 0, //
            124, 199, 19, //
            124, 199, 20, //
            124, 199, 19,
        ];

        let events = detector.events_from_frames(&frames);
        assert_eq!(events, vec![Event::new(0.25, "Chess"), Event::new(0.75, "Chess")]);
    }

    #[test]
    fn test_pixel_tolerance() {
        let detector = PixelMatchDetector {
            tolerance: 2,
            ..Default::default()
        };
        assert!(detector.matches(&[126, 197, 21]));
        assert!(!detector.matches(&[127, 199, 19]));
    }

    #[test]
    fn test_sidecar_parse_mixed_times() {
        let json = br#"[{"time": 12.5, "label": "Go"}, {"time": "01:00"}]"#;
        let events = SidecarDetector::parse(json).unwrap();
        assert_eq!(events, vec![Event::new(12.5, "Go"), Event::unlabeled(60.0)]);
    }

    #[test]
    fn test_sidecar_rejects_negative_time() {
        let json = br#"[{"time": -1.0}]"#;
        assert!(SidecarDetector::parse(json).is_err());
    }

    #[tokio::test]
    async fn test_sidecar_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let recording = recording_at(&dir.path().join("vod.mp4"));

        let events = SidecarDetector::default().detect(&recording).await.unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_sidecar_reads_file() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("vod.mp4");
        let detector = SidecarDetector::default();
        let sidecar = detector.sidecar_path(&video);
        assert!(sidecar.to_string_lossy().ends_with("vod.mp4.events.json"));

        tokio::fs::write(&sidecar, br#"[{"time": 1800, "label": "BossFight"}]"#)
            .await
            .unwrap();

        let events = detector.detect(&recording_at(&video)).await.unwrap();
        assert_eq!(events, vec![Event::new(1800.0, "BossFight")]);
    }

    #[tokio::test]
    async fn test_pixel_detector_requires_video() {
        let recording = recording_at(Path::new("/tmp/audio-only.m4a"));
        let err = PixelMatchDetector::default().detect(&recording).await.unwrap_err();
        assert!(matches!(err, MediaError::DetectionFailed(_)));
    }
}
