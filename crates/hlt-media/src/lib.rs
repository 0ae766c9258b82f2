#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for highlight production.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and running
//! - Progress parsing from `-progress pipe:2`
//! - Recording probing via FFprobe
//! - Audio energy sampling (on-demand FFmpeg decode or in-memory PCM)
//! - Pluggable event detectors
//! - Highlight rendering (cut, concat, fades, watermark)
//! - Atomic whole-file writes

pub mod command;
pub mod detect;
pub mod energy;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod progress;
pub mod render;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use detect::{EventDetector, NoopDetector, PixelMatchDetector, SidecarDetector};
pub use energy::{rms, EnergySampler, FfmpegEnergySampler, PcmAudio, DEFAULT_SAMPLE_RATE};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{remove_if_exists, write_atomic};
pub use probe::{probe_recording, Recording, RecordingInfo};
pub use progress::FfmpegProgress;
pub use render::{render_highlights, RenderOptions, SourceClip, Watermark};
