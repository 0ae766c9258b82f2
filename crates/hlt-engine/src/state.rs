//! Per-recording detection state on disk.
//!
//! One JSON file per recording under the store directory. Reads never fail:
//! a missing, unreadable or invalid file means "not processed yet".

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use hlt_media::write_atomic;
use hlt_models::{DetectionState, DetectionStateFile};

use crate::error::EngineResult;

const STATE_SUFFIX: &str = "events.json";

/// Directory of persisted [`DetectionState`] records.
#[derive(Debug, Clone)]
pub struct DetectionStore {
    dir: PathBuf,
}

impl DetectionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the state of `recording_id`.
    pub fn path_for(&self, recording_id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", sanitize_id(recording_id), STATE_SUFFIX))
    }

    /// Load the state of `recording_id`, falling back to an empty state.
    pub async fn load(&self, recording_id: &str) -> DetectionState {
        let path = self.path_for(recording_id);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(recording_id, "No detection state yet");
                return DetectionState::empty();
            }
            Err(e) => {
                warn!(recording_id, path = %path.display(), error = %e, "Unreadable detection state, treating as not processed");
                return DetectionState::empty();
            }
        };

        let file: DetectionStateFile = match serde_json::from_slice(&bytes) {
            Ok(file) => file,
            Err(e) => {
                warn!(recording_id, path = %path.display(), error = %e, "Corrupt detection state, treating as not processed");
                return DetectionState::empty();
            }
        };

        match DetectionState::try_from(file) {
            Ok(state) => {
                debug!(
                    recording_id,
                    events = state.events.len(),
                    fully_scanned = state.fully_scanned,
                    "Loaded detection state"
                );
                state
            }
            Err(e) => {
                warn!(recording_id, path = %path.display(), error = %e, "Invalid detection state, treating as not processed");
                DetectionState::empty()
            }
        }
    }

    /// Replace the state of `recording_id` as a whole file.
    pub async fn save(&self, recording_id: &str, state: &DetectionState) -> EngineResult<()> {
        let path = self.path_for(recording_id);
        let json = serde_json::to_vec_pretty(&DetectionStateFile::from(state))?;
        write_atomic(&path, json).await?;
        debug!(recording_id, path = %path.display(), "Saved detection state");
        Ok(())
    }
}

/// Keep ids usable as file names.
fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlt_models::Event;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = DetectionStore::new(dir.path());

        let state = store.load("v1").await;
        assert!(!state.fully_scanned);
        assert!(state.events.is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = DetectionStore::new(dir.path().join("state"));

        let state = DetectionState::scanned(vec![Event::new(12.5, "Chess"), Event::unlabeled(40.0)]);
        store.save("v1", &state).await.unwrap();

        assert_eq!(store.load("v1").await, state);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = DetectionStore::new(dir.path());
        tokio::fs::write(store.path_for("v1"), b"{not json").await.unwrap();

        assert_eq!(store.load("v1").await, DetectionState::empty());
    }

    #[tokio::test]
    async fn test_mismatched_arrays_are_empty() {
        let dir = TempDir::new().unwrap();
        let store = DetectionStore::new(dir.path());
        tokio::fs::write(
            store.path_for("v1"),
            br#"{"event_times":[1.0,2.0],"event_times_games":["a"],"visually_processed":true}"#,
        )
        .await
        .unwrap();

        assert!(!store.load("v1").await.fully_scanned);
    }

    #[tokio::test]
    async fn test_legacy_file_without_version_loads() {
        let dir = TempDir::new().unwrap();
        let store = DetectionStore::new(dir.path());
        tokio::fs::write(
            store.path_for("v1"),
            br#"{"event_times":[5.0],"event_times_games":["Chess"],"visually_processed":true}"#,
        )
        .await
        .unwrap();

        let state = store.load("v1").await;
        assert!(state.fully_scanned);
        assert_eq!(state.events, vec![Event::new(5.0, "Chess")]);
    }

    #[test]
    fn test_path_for_sanitizes() {
        let store = DetectionStore::new("/w/state");
        assert_eq!(
            store.path_for("../v 1"),
            PathBuf::from("/w/state/.._v_1.events.json")
        );
    }
}
