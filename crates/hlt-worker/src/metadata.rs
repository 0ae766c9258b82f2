//! Upload metadata for a batch video.

use std::collections::HashMap;
use std::path::Path;

use hlt_engine::Timeline;
use hlt_media::write_atomic;
use hlt_models::{BatchMetadata, PrivacyStatus};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::selection::Batch;

/// Playlist id per channel name or label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaylistMap(HashMap<String, String>);

impl PlaylistMap {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self(entries)
    }

    /// Load a JSON object `{ "name": "playlist id" }`. No path means no playlists.
    pub async fn load(path: Option<&Path>) -> WorkerResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let bytes = tokio::fs::read(path).await?;
        Ok(Self(serde_json::from_slice(&bytes)?))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Channel playlist first, then one per label, without duplicates.
    pub fn playlists_for(&self, channel: &str, labels: &[String]) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        let names = std::iter::once(channel).chain(labels.iter().map(String::as_str));
        for name in names {
            if let Some(id) = self.get(name) {
                if !ids.iter().any(|existing| existing == id) {
                    ids.push(id.to_string());
                }
            }
        }
        ids
    }
}

/// Channel and platform settings that shape the metadata record.
#[derive(Debug, Clone)]
pub struct MetadataSettings {
    pub channel_name: String,
    pub privacy_status: PrivacyStatus,
    pub category_id: String,
    pub language: String,
}

impl From<&WorkerConfig> for MetadataSettings {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            channel_name: config.channel_name.clone(),
            privacy_status: config.privacy_status,
            category_id: config.category_id.clone(),
            language: config.language.clone(),
        }
    }
}

pub fn video_title(channel: &str, batch: &Batch) -> String {
    format!(
        "{} Highlights {}: {}",
        channel,
        batch.formatted_date(),
        batch.primary().title
    )
}

/// Header, one line per chapter, and the channel footer.
pub fn video_description(channel: &str, batch: &Batch, timeline: &Timeline) -> String {
    let mut description = format!(
        "Live stream highlights from {} on {}: {}\n\n",
        channel,
        batch.formatted_date(),
        batch.primary().title
    );
    for line in timeline.chapter_lines() {
        description.push_str(&line);
        description.push('\n');
    }
    description.push_str(&format!(
        "\nVisit {0} on Twitch: https://twitch.tv/{0}",
        channel
    ));
    description
}

pub fn build_metadata(
    settings: &MetadataSettings,
    playlists: &PlaylistMap,
    batch: &Batch,
    timeline: &Timeline,
) -> BatchMetadata {
    BatchMetadata {
        title: video_title(&settings.channel_name, batch),
        description: video_description(&settings.channel_name, batch, timeline),
        tags: timeline.tags().to_vec(),
        privacy_status: settings.privacy_status,
        embeddable: true,
        category_id: settings.category_id.clone(),
        playlist_ids: playlists.playlists_for(&settings.channel_name, timeline.labels()),
        language: settings.language.clone(),
    }
}

/// Write the metadata record as a whole file.
pub async fn write_metadata(path: &Path, metadata: &BatchMetadata) -> WorkerResult<()> {
    let json = serde_json::to_vec_pretty(metadata)?;
    write_atomic(path, json).await?;
    Ok(())
}
