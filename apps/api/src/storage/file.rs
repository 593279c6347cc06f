use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::SnapshotStore;
use crate::errors::AppError;

/// One `<key>.json` file per snapshot under a directory.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    /// Creates the directory if needed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Storage(format!("cannot create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            // Non-UTF-8 bytes are a corrupt snapshot, not a storage failure.
            Err(e) if e.kind() == ErrorKind::InvalidData => Ok(Some(String::new())),
            Err(e) => Err(AppError::Storage(format!("read {key}: {e}"))),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), AppError> {
        let path = self.path_for(key);
        // Each writer gets its own temp file; the rename decides who wins.
        let tmp = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| AppError::Storage(format!("write {key}: {e}")))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AppError::Storage(format!("rename {key}: {e}")));
        }
        debug!("Snapshot written to {}", path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("remove {key}: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path()).await.unwrap();

        assert_eq!(store.get("alevel-explorer-save:abc").await.unwrap(), None);

        store.put("alevel-explorer-save:abc", "{\"a\":1}").await.unwrap();
        assert_eq!(
            store.get("alevel-explorer-save:abc").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        store.remove("alevel-explorer-save:abc").await.unwrap();
        assert_eq!(store.get("alevel-explorer-save:abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path()).await.unwrap();
        assert!(store.remove("nothing-here").await.is_ok());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path().join("nested")).await.unwrap();
        store.put("k", "first").await.unwrap();
        store.put("k", "second").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_concurrent_puts_leave_one_whole_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path()).await.unwrap();
        let first = "a".repeat(64 * 1024);
        let second = "b".repeat(64 * 1024);

        let (a, b) = tokio::join!(store.put("k", &first), store.put("k", &second));
        a.unwrap();
        b.unwrap();

        let stored = store.get("k").await.unwrap().unwrap();
        assert!(stored == first || stored == second);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
    }

    #[test]
    fn test_keys_are_sanitised_into_file_names() {
        let store = FileSnapshotStore {
            dir: PathBuf::from("/tmp/snapshots"),
        };
        let path = store.path_for("alevel-explorer-save:../../etc");
        assert_eq!(
            path,
            PathBuf::from("/tmp/snapshots/alevel-explorer-save_______etc.json")
        );
    }
}
