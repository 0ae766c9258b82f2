//! Audio energy sampling.
//!
//! Loudness is the root-mean-square amplitude of a decoded window
//! `[center - half_width, center + half_width]`. Two samplers are provided:
//!
//! - [`FfmpegEnergySampler`] decodes each window on demand with FFmpeg, so
//!   memory stays flat for multi-hour recordings.
//! - [`PcmAudio`] holds decoded samples in memory; it can be filled by
//!   decoding a whole file once or built directly from samples.
//!
//! Both refuse windows that leave `[0, duration]`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::Recording;

/// Reference decode rate for energy sampling.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_000;

/// Slack allowed on window bounds to absorb float rounding.
const WINDOW_EPSILON: f64 = 1e-6;

/// Source of loudness measurements for one recording.
#[async_trait]
pub trait EnergySampler: Send + Sync {
    /// Duration of the underlying recording in seconds.
    fn duration(&self) -> f64;

    /// RMS amplitude of `[center - half_width, center + half_width]`.
    ///
    /// Returns [`MediaError::OutOfRange`] when the window leaves the recording.
    async fn sample(&self, center: f64, half_width: f64) -> MediaResult<f64>;

    /// Whether a window centred at `center` lies inside the recording.
    fn contains(&self, center: f64, half_width: f64) -> bool {
        check_window(center, half_width, self.duration()).is_ok()
    }
}

/// Validate a sampling window against the recording bounds.
pub fn check_window(center: f64, half_width: f64, duration: f64) -> MediaResult<(f64, f64)> {
    let start = center - half_width;
    let end = center + half_width;

    if !start.is_finite() || !end.is_finite() || start < -WINDOW_EPSILON || end > duration + WINDOW_EPSILON {
        return Err(MediaError::OutOfRange {
            start,
            end,
            duration,
        });
    }

    Ok((start.max(0.0), end.min(duration)))
}

/// Root-mean-square amplitude of interleaved samples.
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|s| (*s as f64) * (*s as f64)).sum();
    (sum / samples.len() as f64).sqrt()
}

/// Convert raw f32le bytes to samples.
fn f32le_to_samples(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Decoded, interleaved PCM held in memory.
#[derive(Debug, Clone)]
pub struct PcmAudio {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl PcmAudio {
    /// Wrap interleaved samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate: sample_rate.max(1),
            channels: channels.max(1),
        }
    }

    /// Build mono audio of `duration` seconds from an amplitude function of time.
    pub fn from_fn(duration: f64, sample_rate: u32, amplitude: impl Fn(f64) -> f32) -> Self {
        let rate = sample_rate.max(1);
        let frames = (duration * rate as f64).round() as usize;
        let samples = (0..frames)
            .map(|i| amplitude(i as f64 / rate as f64))
            .collect();
        Self::new(samples, rate, 1)
    }

    /// Decode the whole audio track of `path` at `sample_rate` (channels kept).
    pub async fn decode(path: impl AsRef<Path>, sample_rate: u32, channels: u16) -> MediaResult<Self> {
        let path = path.as_ref();
        let cmd = FfmpegCommand::to_stdout(path)
            .no_video()
            .audio_rate(sample_rate)
            .output_args(["-ac", &channels.max(1).to_string()])
            .format("f32le");

        let bytes = FfmpegRunner::new().capture(&cmd).await?;
        let samples = f32le_to_samples(&bytes);
        if samples.is_empty() {
            return Err(MediaError::invalid_recording(format!(
                "No audio decoded from {}",
                path.display()
            )));
        }

        debug!(
            path = %path.display(),
            samples = samples.len(),
            sample_rate,
            "Decoded recording audio into memory"
        );

        Ok(Self::new(samples, sample_rate, channels))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }
}

#[async_trait]
impl EnergySampler for PcmAudio {
    fn duration(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    async fn sample(&self, center: f64, half_width: f64) -> MediaResult<f64> {
        let (start, end) = check_window(center, half_width, self.duration())?;

        let rate = self.sample_rate as f64;
        let channels = self.channels as usize;
        let first = ((start * rate).floor() as usize).min(self.frame_count());
        let last = ((end * rate).ceil() as usize).min(self.frame_count());

        Ok(rms(&self.samples[first * channels..last * channels]))
    }
}

/// Energy sampler that decodes each window with FFmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegEnergySampler {
    path: PathBuf,
    duration: f64,
    sample_rate: u32,
    timeout_secs: u64,
}

impl FfmpegEnergySampler {
    /// Sample `recording` at the given decode rate.
    pub fn new(recording: &Recording, sample_rate: u32) -> Self {
        Self {
            path: recording.path().to_path_buf(),
            duration: recording.duration(),
            sample_rate,
            timeout_secs: 60,
        }
    }

    /// Per-window decode timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn window_command(&self, start: f64, length: f64) -> FfmpegCommand {
        FfmpegCommand::to_stdout(&self.path)
            .seek(start)
            .duration(length)
            .no_video()
            .audio_rate(self.sample_rate)
            .format("f32le")
    }
}

#[async_trait]
impl EnergySampler for FfmpegEnergySampler {
    fn duration(&self) -> f64 {
        self.duration
    }

    async fn sample(&self, center: f64, half_width: f64) -> MediaResult<f64> {
        let (start, end) = check_window(center, half_width, self.duration)?;

        let cmd = self.window_command(start, end - start);
        let bytes = FfmpegRunner::new()
            .with_timeout(self.timeout_secs)
            .capture(&cmd)
            .await?;

        Ok(rms(&f32le_to_samples(&bytes)))
    }
}
