//! Storage trait for committed artifacts

use super::error::StorageResult;
use async_trait::async_trait;

/// A durable destination for committed batches.
///
/// Every call creates a new artifact named `name`; artifacts are never
/// reopened or appended to. An error means nothing was durably stored.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write `data` as a new artifact called `name`
    async fn write(&self, name: &str, data: &[u8]) -> StorageResult<()>;

    /// Short backend description for log messages
    fn describe(&self) -> String;
}
