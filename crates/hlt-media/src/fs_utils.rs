//! Filesystem helpers for whole-file replacement.
//!
//! Persisted records are never written in place: content goes to a temporary
//! sibling first and is renamed over the destination, so a crash leaves
//! either the old file or the new one.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::MediaResult;

/// Temporary sibling used while replacing `dst`.
pub fn partial_path(dst: &Path) -> PathBuf {
    let mut name = dst.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Atomically replace `dst` with `contents`.
pub async fn write_atomic(dst: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> MediaResult<()> {
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let tmp = partial_path(dst);
    let mut file = fs::File::create(&tmp).await?;
    file.write_all(contents.as_ref()).await?;
    file.sync_all().await?;
    drop(file);

    if let Err(e) = fs::rename(&tmp, dst).await {
        let _ = fs::remove_file(&tmp).await;
        tracing::error!(
            "Failed to move {} into place at {}: {}",
            tmp.display(),
            dst.display(),
            e
        );
        return Err(e.into());
    }

    Ok(())
}

/// Remove a file, treating "already gone" as success.
pub async fn remove_if_exists(path: impl AsRef<Path>) -> MediaResult<bool> {
    match fs::remove_file(path.as_ref()).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let dst = dir.path().join("state.json");

        write_atomic(&dst, b"old").await.unwrap();
        write_atomic(&dst, b"new").await.unwrap();

        assert_eq!(fs::read_to_string(&dst).await.unwrap(), "new");
        assert!(!partial_path(&dst).exists(), "temp file should be renamed away");
    }

    #[tokio::test]
    async fn test_write_atomic_creates_parent() {
        let dir = TempDir::new().unwrap();
        let dst = dir.path().join("nested").join("a.json");

        write_atomic(&dst, b"{}").await.unwrap();
        assert!(dst.exists());
    }

    #[tokio::test]
    async fn test_remove_if_exists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vod.mp4");
        fs::write(&path, b"x").await.unwrap();

        assert!(remove_if_exists(&path).await.unwrap());
        assert!(!remove_if_exists(&path).await.unwrap());
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/w/edit_01.02.2024.json")),
            PathBuf::from("/w/edit_01.02.2024.json.partial")
        );
    }
}
