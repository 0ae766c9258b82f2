//! FFprobe recording information.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Recording stream information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Audio sample rate in Hz
    pub sample_rate: u32,
    /// Audio channel count
    pub channels: u16,
    /// Whether a video stream is present
    pub has_video: bool,
    /// Video frame rate (fps), 0 without video
    pub fps: f64,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    sample_rate: Option<String>,
    channels: Option<u16>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
}

/// A decodable recording, identified by an opaque id.
///
/// Probing happens once on [`Recording::open`]; the handle is immutable
/// afterwards.
#[derive(Debug, Clone)]
pub struct Recording {
    id: String,
    path: PathBuf,
    info: RecordingInfo,
}

impl Recording {
    /// Probe `path` and wrap it as a recording.
    ///
    /// Fails when the file is missing, unreadable, has no audio stream or
    /// reports no positive duration.
    pub async fn open(id: impl Into<String>, path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref().to_path_buf();
        let info = probe_recording(&path).await?;
        Ok(Self::from_parts(id, path, info))
    }

    /// Build a recording from already known information.
    pub fn from_parts(id: impl Into<String>, path: impl Into<PathBuf>, info: RecordingInfo) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            info,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> &RecordingInfo {
        &self.info
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.info.duration
    }
}

/// Probe a recording for duration and stream information.
pub async fn probe_recording(path: impl AsRef<Path>) -> MediaResult<RecordingInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe failed for {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let info = parse_probe_output(&output.stdout)?;
    debug!(
        path = %path.display(),
        duration = info.duration,
        sample_rate = info.sample_rate,
        has_video = info.has_video,
        "Probed recording"
    );

    Ok(info)
}

/// Parse FFprobe JSON into [`RecordingInfo`].
fn parse_probe_output(stdout: &[u8]) -> MediaResult<RecordingInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let audio = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "audio")
        .ok_or_else(|| MediaError::invalid_recording("No audio stream found"))?;
    let video = probe.streams.iter().find(|s| s.codec_type == "video");

    let duration = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| MediaError::invalid_recording("Missing or zero duration"))?;

    let fps = video
        .and_then(|v| v.avg_frame_rate.as_ref().or(v.r_frame_rate.as_ref()))
        .and_then(|r| parse_frame_rate(r))
        .unwrap_or(0.0);

    Ok(RecordingInfo {
        duration,
        sample_rate: audio
            .sample_rate
            .as_ref()
            .and_then(|r| r.parse().ok())
            .unwrap_or(0),
        channels: audio.channels.unwrap_or(0),
        has_video: video.is_some(),
        fps,
    })
}

/// Parse frame rate string (e.g., "30/1" or "29.97").
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    s.parse().ok()
}
