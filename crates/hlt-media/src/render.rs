//! Highlight rendering.
//!
//! Turns an ordered list of source clips into one video:
//! 1. Extract each clip with frame-accurate seeking (re-encoded)
//! 2. Join the pieces with the concat demuxer (stream copy)
//! 3. Final pass: fade in/out and an optional text watermark
//!
//! The final file is written to a `.partial` sibling and renamed into place,
//! so an interrupted render never leaves a playable-looking output behind.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::partial_path;

/// A span of a source recording to include in the output.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceClip {
    pub path: PathBuf,
    pub start: f64,
    pub end: f64,
}

impl SourceClip {
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// On-screen text drawn over the whole output.
#[derive(Debug, Clone)]
pub struct Watermark {
    pub text: String,
    pub font: String,
    pub font_size: u32,
    pub color: String,
    pub x: u32,
    pub y: u32,
}

/// Encoding and finishing options.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Fade-in length at the start of the output, seconds.
    pub fade_in: f64,
    /// Fade-out length at the end of the output, seconds.
    pub fade_out: f64,
    pub watermark: Option<Watermark>,
    pub threads: usize,
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            fade_in: 0.4,
            fade_out: 0.4,
            watermark: None,
            threads: 6,
            video_codec: "libx264".to_string(),
            preset: "veryfast".to_string(),
            crf: 20,
            audio_codec: "aac".to_string(),
            audio_bitrate: "160k".to_string(),
        }
    }
}

/// Escape text for use inside an FFmpeg filter argument.
fn escape_filter_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | ':' | '\'' | ',' | ';' | '[' | ']' | '%') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Build the video and audio filters of the finishing pass.
fn finishing_filters(total: f64, options: &RenderOptions) -> (String, String) {
    let mut video = Vec::new();
    let mut audio = Vec::new();

    if options.fade_in > 0.0 {
        video.push(format!("fade=t=in:st=0:d={:.3}", options.fade_in));
        audio.push(format!("afade=t=in:st=0:d={:.3}", options.fade_in));
    }
    if options.fade_out > 0.0 {
        let start = (total - options.fade_out).max(0.0);
        video.push(format!("fade=t=out:st={:.3}:d={:.3}", start, options.fade_out));
        audio.push(format!("afade=t=out:st={:.3}:d={:.3}", start, options.fade_out));
    }
    if let Some(w) = &options.watermark {
        video.push(format!(
            "drawtext=text='{}':font='{}':fontsize={}:fontcolor={}:x={}:y={}",
            escape_filter_text(&w.text),
            escape_filter_text(&w.font),
            w.font_size,
            w.color,
            w.x,
            w.y
        ));
    }

    if video.is_empty() {
        video.push("null".to_string());
    }
    if audio.is_empty() {
        audio.push("anull".to_string());
    }

    (video.join(","), audio.join(","))
}

/// Concat demuxer list for the extracted pieces.
fn concat_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("file '{}'\n", p.display().to_string().replace('\'', "'\\''")))
        .collect()
}

/// Render `clips` into a single highlights video at `output`.
pub async fn render_highlights(
    clips: &[SourceClip],
    output: &Path,
    options: &RenderOptions,
) -> MediaResult<()> {
    if clips.is_empty() {
        return Err(MediaError::internal("no clips to render"));
    }

    let total: f64 = clips.iter().map(SourceClip::duration).sum();
    info!(
        clips = clips.len(),
        total_secs = format!("{:.1}", total),
        output = %output.display(),
        "Rendering highlights"
    );

    let temp_dir = tempfile::tempdir()?;
    let runner = FfmpegRunner::new();
    let mut pieces = Vec::with_capacity(clips.len());

    for (i, clip) in clips.iter().enumerate() {
        let piece = temp_dir.path().join(format!("piece_{:04}.mp4", i));

        // Fast input seek to get close, accurate output seek for the cut itself
        let fast_seek = (clip.start - 5.0).max(0.0);
        let accurate_seek = clip.start - fast_seek;

        debug!(
            piece = i,
            start = clip.start,
            duration = clip.duration(),
            source = %clip.path.display(),
            "Extracting piece"
        );

        let cmd = FfmpegCommand::new(&clip.path, &piece)
            .seek(fast_seek)
            .output_seek(accurate_seek)
            .output_duration(clip.duration())
            .video_codec(&options.video_codec)
            .preset(&options.preset)
            .crf(options.crf)
            .audio_codec(&options.audio_codec)
            .audio_bitrate(&options.audio_bitrate)
            .threads(options.threads)
            .output_args(["-avoid_negative_ts", "make_zero"]);

        runner.run(&cmd).await?;
        pieces.push(piece);
    }

    let list_path = temp_dir.path().join("concat.txt");
    tokio::fs::write(&list_path, concat_list(&pieces)).await?;

    let joined = temp_dir.path().join("joined.mp4");
    let concat = FfmpegCommand::new(&list_path, &joined)
        .input_args(["-f", "concat", "-safe", "0"])
        .codec_copy();
    runner.run(&concat).await?;

    let (video_filter, audio_filter) = finishing_filters(total, options);
    let partial = partial_path(output);
    let finish = FfmpegCommand::new(&joined, &partial)
        .video_filter(video_filter)
        .audio_filter(audio_filter)
        .video_codec(&options.video_codec)
        .preset(&options.preset)
        .crf(options.crf)
        .audio_codec(&options.audio_codec)
        .audio_bitrate(&options.audio_bitrate)
        .threads(options.threads)
        .output_args(["-movflags", "+faststart"])
        .format("mp4");

    let last_logged = AtomicU64::new(0);
    runner
        .run_with_progress(&finish, move |progress| {
            let pct = progress.percentage(total) as u64;
            if pct >= last_logged.load(Ordering::Relaxed) + 10 || progress.is_complete {
                last_logged.store(pct, Ordering::Relaxed);
                debug!(percent = pct, speed = progress.speed, "Render progress");
            }
        })
        .await?;

    tokio::fs::rename(&partial, output).await?;

    info!(output = %output.display(), "Highlights rendered");
    Ok(())
}
