//! Local directory storage backend

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::storage::{error::StorageResult, traits::ArtifactStore};

/// Writes each artifact as a new file inside `base_dir`.
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    /// Create a new file backend rooted at `base_dir`
    pub async fn new(base_dir: &Path) -> StorageResult<Self> {
        // Ensure base directory exists
        fs::create_dir_all(base_dir).await?;

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
        })
    }

    /// Path of the artifact called `name`
    fn artifact_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }
}

#[async_trait]
impl ArtifactStore for FileStorage {
    async fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.artifact_path(name);
        debug!("Creating artifact file {}", path.display());

        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.base_dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_new_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("logs");

        let storage = FileStorage::new(&dir).await.unwrap();

        assert!(dir.is_dir());
        assert_eq!(storage.describe(), format!("file:{}", dir.display()));
    }

    #[tokio::test]
    async fn test_write_creates_artifact_in_base_dir() {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::new(temp.path()).await.unwrap();

        storage.write("host-1.txt", b"one\ntwo\n").await.unwrap();

        let path = temp.path().join("host-1.txt");
        assert_eq!(std::fs::read(&path).unwrap(), b"one\ntwo\n");
    }

    #[tokio::test]
    async fn test_trailing_slash_directory() {
        let temp = TempDir::new().unwrap();
        let dir = format!("{}/logs/", temp.path().display());
        let storage = FileStorage::new(Path::new(&dir)).await.unwrap();

        storage.write("host-1.txt", b"x\n").await.unwrap();

        assert_eq!(
            std::fs::read(temp.path().join("logs").join("host-1.txt")).unwrap(),
            b"x\n"
        );
    }

    #[test]
    fn test_root_directory_paths_stay_absolute() {
        let storage = FileStorage {
            base_dir: PathBuf::from("/"),
        };

        let path = storage.artifact_path("h-2024-03-09T17:04:05.000000000Z.txt");

        assert!(path.is_absolute());
        assert_eq!(path, Path::new("/h-2024-03-09T17:04:05.000000000Z.txt"));
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::new(temp.path()).await.unwrap();

        let result = storage.write("gone/host-1.txt", b"data\n").await;

        assert!(matches!(result, Err(StorageError::Io(_))));
    }
}
