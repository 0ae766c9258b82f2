//! Processed-broadcast ledger.
//!
//! A plain text file with one broadcast id per line, only ever appended to.
//! A last line without its newline is the remainder of an interrupted append:
//! it does not count, and the next append cuts it off before writing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::WorkerResult;

#[derive(Debug, Clone)]
pub struct ProcessedLedger {
    path: PathBuf,
    ids: HashSet<String>,
}

impl ProcessedLedger {
    /// Read the ledger at `path`. A missing file is an empty ledger.
    pub async fn load(path: impl Into<PathBuf>) -> WorkerResult<Self> {
        let path = path.into();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let ids = parse_ledger(&content);
        debug!(path = %path.display(), ids = ids.len(), "Loaded processed ledger");
        Ok(Self { path, ids })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_processed(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Append `ids` that are not yet recorded.
    pub async fn mark_processed<I, S>(&mut self, ids: I) -> WorkerResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pending = String::new();
        for id in ids {
            let id = id.as_ref().trim();
            if id.is_empty() || self.ids.contains(id) || id.contains('\n') {
                continue;
            }
            pending.push_str(id);
            pending.push('\n');
            self.ids.insert(id.to_string());
        }

        if pending.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        drop_torn_tail(&self.path).await?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(pending.as_bytes()).await?;
        file.sync_all().await?;

        Ok(())
    }
}

fn parse_ledger(content: &str) -> HashSet<String> {
    let complete = match content.rfind('\n') {
        Some(end) => &content[..end],
        None => "",
    };

    complete
        .split('\n')
        .map(|line| line.trim_end_matches('\r').trim())
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Truncate the file after its last newline, discarding a partial final line.
async fn drop_torn_tail(path: &Path) -> WorkerResult<()> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    if bytes.last().map_or(true, |b| *b == b'\n') {
        return Ok(());
    }

    let keep = bytes.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1);
    warn!(
        path = %path.display(),
        dropped = bytes.len() - keep,
        "Ledger ends with a partial line, dropping it"
    );
    let file = OpenOptions::new().write(true).open(path).await?;
    file.set_len(keep as u64).await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_ignores_torn_tail() {
        let ids = parse_ledger("111\r\n222\n33");
        assert!(ids.contains("111"));
        assert!(ids.contains("222"));
        assert!(!ids.contains("33"));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_parse_without_newline_is_empty() {
        assert!(parse_ledger("12345").is_empty());
        assert!(parse_ledger("").is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let ledger = ProcessedLedger::load(dir.path().join("processed.txt")).await.unwrap();
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_mark_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed.txt");

        let mut ledger = ProcessedLedger::load(&path).await.unwrap();
        ledger.mark_processed(["111", "222", "111"]).await.unwrap();
        assert!(ledger.is_processed("111"));

        let reloaded = ProcessedLedger::load(&path).await.unwrap();
        assert!(reloaded.is_processed("111"));
        assert!(reloaded.is_processed("222"));
        assert_eq!(reloaded.len(), 2);
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "111\n222\n");
    }

    #[tokio::test]
    async fn test_append_after_torn_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed.txt");
        tokio::fs::write(&path, "111\r\n22").await.unwrap();

        let mut ledger = ProcessedLedger::load(&path).await.unwrap();
        assert!(!ledger.is_processed("22"));
        ledger.mark_processed(["333"]).await.unwrap();

        let reloaded = ProcessedLedger::load(&path).await.unwrap();
        assert!(reloaded.is_processed("111"));
        assert!(reloaded.is_processed("333"));
        assert!(!reloaded.is_processed("22"));
        assert_eq!(reloaded.len(), 2);
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "111\r\n333\n");
    }

    #[tokio::test]
    async fn test_append_after_torn_first_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed.txt");
        tokio::fs::write(&path, "22").await.unwrap();

        let mut ledger = ProcessedLedger::load(&path).await.unwrap();
        ledger.mark_processed(["222"]).await.unwrap();

        let reloaded = ProcessedLedger::load(&path).await.unwrap();
        assert!(reloaded.is_processed("222"));
        assert!(!reloaded.is_processed("22"));
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "222\n");
    }
}
