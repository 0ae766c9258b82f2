//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use hlt_models::PrivacyStatus;

/// Which event detector runs during the detection phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorKind {
    /// No detector; highlights come from audio gap-filling only.
    #[default]
    None,
    /// Events from a JSON file next to each recording.
    Sidecar,
    /// Single-pixel colour match on sampled frames.
    Pixel,
}

impl std::str::FromStr for DetectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "noop" => Ok(Self::None),
            "sidecar" => Ok(Self::Sidecar),
            "pixel" | "pixel_match" => Ok(Self::Pixel),
            other => Err(format!("unknown detector: {}", other)),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Work directory for state, outputs and the ledger
    pub work_dir: PathBuf,
    /// Where recordings are downloaded to when a broadcast has no explicit path
    pub recordings_dir: PathBuf,
    /// JSON list of candidate broadcasts
    pub manifest_path: PathBuf,
    /// Append-only list of processed broadcast ids
    pub ledger_path: PathBuf,

    /// Channel name used in titles, descriptions and the channel playlist lookup
    pub channel_name: String,
    /// JSON object mapping channel name / label to playlist id
    pub playlists_path: Option<PathBuf>,
    pub privacy_status: PrivacyStatus,
    pub category_id: String,
    pub language: String,
    /// Tags every video starts with
    pub base_tags: Vec<String>,

    /// External command that downloads a recording (`{id}` and `{path}` are substituted)
    pub fetch_command: Option<String>,
    /// External command that uploads a video (`{video}` and `{metadata}` are substituted)
    pub upload_command: Option<String>,
    /// Fetch attempts per recording before it is skipped
    pub max_acquire_tries: u32,
    /// Base delay between fetch attempts (doubles each attempt)
    pub acquire_retry_delay: Duration,
    /// Keep source recordings after the batch completes
    pub keep_sources: bool,

    pub detector: DetectorKind,
    /// Label attached to pixel-match events
    pub pixel_label: String,
    /// Decode whole recordings into memory instead of per-window decodes
    pub preload_audio: bool,

    pub watermark_font: String,
    pub watermark_font_size: u32,
    pub watermark_color: String,
    /// Encoder threads for the final render
    pub render_threads: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        let work_dir = PathBuf::from("/tmp/hlt");
        Self {
            recordings_dir: work_dir.join("recordings"),
            manifest_path: work_dir.join("broadcasts.json"),
            ledger_path: work_dir.join("processed_broadcasts.txt"),
            work_dir,
            channel_name: "TwitchChannelName".to_string(),
            playlists_path: None,
            privacy_status: PrivacyStatus::Public,
            category_id: "20".to_string(), // gaming
            language: "en".to_string(),
            base_tags: vec!["highlights".to_string(), "twitch".to_string()],
            fetch_command: None,
            upload_command: None,
            max_acquire_tries: 3,
            acquire_retry_delay: Duration::from_secs(2),
            keep_sources: false,
            detector: DetectorKind::None,
            pixel_label: "Game".to_string(),
            preload_audio: false,
            watermark_font: "Titillium-WebBold".to_string(),
            watermark_font_size: 28,
            watermark_color: "white".to_string(),
            render_threads: 6,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let d = Self::default();
        let work_dir = env_opt("HLT_WORK_DIR").map(PathBuf::from).unwrap_or(d.work_dir);

        Self {
            recordings_dir: env_opt("HLT_RECORDINGS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| work_dir.join("recordings")),
            manifest_path: env_opt("HLT_MANIFEST")
                .map(PathBuf::from)
                .unwrap_or_else(|| work_dir.join("broadcasts.json")),
            ledger_path: env_opt("HLT_LEDGER")
                .map(PathBuf::from)
                .unwrap_or_else(|| work_dir.join("processed_broadcasts.txt")),
            work_dir,
            channel_name: env_opt("HLT_CHANNEL").unwrap_or(d.channel_name),
            playlists_path: env_opt("HLT_PLAYLISTS").map(PathBuf::from),
            privacy_status: env_or("HLT_PRIVACY_STATUS", d.privacy_status),
            category_id: env_opt("HLT_CATEGORY_ID").unwrap_or(d.category_id),
            language: env_opt("HLT_LANGUAGE").unwrap_or(d.language),
            base_tags: env_opt("HLT_BASE_TAGS")
                .map(|s| parse_list(&s))
                .unwrap_or(d.base_tags),
            fetch_command: env_opt("HLT_FETCH_COMMAND"),
            upload_command: env_opt("HLT_UPLOAD_COMMAND"),
            max_acquire_tries: env_or("HLT_MAX_ACQUIRE_TRIES", d.max_acquire_tries),
            acquire_retry_delay: Duration::from_millis(env_or(
                "HLT_ACQUIRE_RETRY_DELAY_MS",
                d.acquire_retry_delay.as_millis() as u64,
            )),
            keep_sources: env_or("HLT_KEEP_SOURCES", d.keep_sources),
            detector: env_or("HLT_DETECTOR", d.detector),
            pixel_label: env_opt("HLT_PIXEL_LABEL").unwrap_or(d.pixel_label),
            preload_audio: env_or("HLT_PRELOAD_AUDIO", d.preload_audio),
            watermark_font: env_opt("HLT_WATERMARK_FONT").unwrap_or(d.watermark_font),
            watermark_font_size: env_or("HLT_WATERMARK_FONT_SIZE", d.watermark_font_size),
            watermark_color: env_opt("HLT_WATERMARK_COLOR").unwrap_or(d.watermark_color),
            render_threads: env_or("HLT_RENDER_THREADS", d.render_threads),
        }
    }

    /// Directory of persisted detection state.
    pub fn state_dir(&self) -> PathBuf {
        self.work_dir.join("state")
    }

    /// Default location of a downloaded recording.
    pub fn recording_path(&self, id: &str) -> PathBuf {
        self.recordings_dir.join(format!("{}.mp4", id))
    }

    /// Final clip and metadata paths for a batch date (`dd.mm.yyyy`).
    pub fn output_paths(&self, formatted_date: &str) -> (PathBuf, PathBuf) {
        (
            self.work_dir.join(format!("edit_{}.mp4", formatted_date)),
            self.work_dir.join(format!("edit_{}.json", formatted_date)),
        )
    }
}

fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths() {
        let config = WorkerConfig {
            work_dir: PathBuf::from("/w"),
            ..Default::default()
        };
        let (video, metadata) = config.output_paths("07.03.2024");
        assert_eq!(video, PathBuf::from("/w/edit_07.03.2024.mp4"));
        assert_eq!(metadata, PathBuf::from("/w/edit_07.03.2024.json"));
        assert_eq!(config.state_dir(), PathBuf::from("/w/state"));
    }

    #[test]
    fn test_detector_kind_from_str() {
        assert_eq!("".parse::<DetectorKind>().unwrap(), DetectorKind::None);
        assert_eq!("Sidecar".parse::<DetectorKind>().unwrap(), DetectorKind::Sidecar);
        assert_eq!("pixel_match".parse::<DetectorKind>().unwrap(), DetectorKind::Pixel);
        assert!("ocr".parse::<DetectorKind>().is_err());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("highlights, twitch,,gaming "), ["highlights", "twitch", "gaming"]);
    }

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.max_acquire_tries, 3);
        assert_eq!(config.base_tags, ["highlights", "twitch"]);
        assert_eq!(config.recording_path("123"), PathBuf::from("/tmp/hlt/recordings/123.mp4"));
    }
}
