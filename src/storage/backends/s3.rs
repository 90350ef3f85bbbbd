//! S3 storage backend implementation

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::storage::{
    error::{StorageError, StorageResult},
    traits::ArtifactStore,
};

/// S3 storage backend
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    /// Create new S3 backend
    pub async fn new(bucket: &str, endpoint: Option<&str>) -> StorageResult<Self> {
        info!("Initializing S3 backend for bucket {}", bucket);

        // Create AWS config
        let aws_config = if let Some(endpoint) = endpoint {
            aws_config::from_env().endpoint_url(endpoint).load().await
        } else {
            aws_config::load_from_env().await
        };

        // Create S3 client
        let client = Client::new(&aws_config);

        // Test connection
        client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| StorageError::connection(format!("Failed to access S3 bucket: {}", e)))?;

        Ok(Self {
            client,
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl ArtifactStore for S3Storage {
    async fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        debug!("PutObject: {:?} {:?}", self.bucket, name);

        let length = i64::try_from(data.len())
            .map_err(|_| StorageError::backend("artifact too large for PutObject"))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .content_length(length)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|e| StorageError::backend(format!("Failed to put to S3: {}", e)))?;

        Ok(())
    }

    fn describe(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}
