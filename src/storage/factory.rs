//! Storage factory for creating storage instances

use super::backends::FileStorage;
#[cfg(feature = "s3")]
use super::backends::S3Storage;
use super::config::Destination;
use super::error::StorageResult;
use super::traits::ArtifactStore;

/// Factory for creating storage instances
pub struct StorageFactory;

impl StorageFactory {
    /// Create storage for the configured destination
    pub async fn from_destination(destination: &Destination) -> StorageResult<Box<dyn ArtifactStore>> {
        match destination {
            Destination::File { dir } => {
                let backend = FileStorage::new(dir).await?;
                Ok(Box::new(backend))
            }
            #[cfg(feature = "s3")]
            Destination::S3 {
                bucket, endpoint, ..
            } => {
                let backend = S3Storage::new(bucket, endpoint.as_deref()).await?;
                Ok(Box::new(backend))
            }
            #[cfg(not(feature = "s3"))]
            Destination::S3 { .. } => Err(super::error::StorageError::configuration(
                "S3 backend not enabled. Enable with --features s3",
            )),
        }
    }
}
