//! In-memory storage backend for testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::storage::{
    error::{StorageError, StorageResult},
    traits::ArtifactStore,
};

/// A committed artifact held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub name: String,
    pub data: Vec<u8>,
}

/// In-memory storage backend for testing.
///
/// Clones share the same artifact list, so a test can keep one handle and
/// give another to the commit chain.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    artifacts: Arc<RwLock<Vec<StoredArtifact>>>,
    fail_writes: Arc<AtomicBool>,
    write_delay: Option<Duration>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every write by `delay` to emulate a slow backing store
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Make subsequent writes fail (or succeed again)
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// All artifacts written so far, in completion order
    pub async fn artifacts(&self) -> Vec<StoredArtifact> {
        self.artifacts.read().await.clone()
    }

    /// Concatenation of every artifact's bytes, in completion order
    pub async fn contents(&self) -> Vec<u8> {
        self.artifacts
            .read()
            .await
            .iter()
            .flat_map(|a| a.data.iter().copied())
            .collect()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStorage {
    async fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable("memory storage set to fail"));
        }

        self.artifacts.write().await.push(StoredArtifact {
            name: name.to_string(),
            data: data.to_vec(),
        });
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
