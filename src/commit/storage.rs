//! Terminal commit policy: write the batch as a new artifact

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{error, info};

use super::Committer;
use crate::storage::ArtifactStore;

/// Derives artifact names from hostname and commit time:
/// `<prefix>/<hostname>-<RFC3339 timestamp with nanoseconds>.txt`
#[derive(Debug, Clone)]
pub struct ArtifactNamer {
    prefix: String,
    hostname: String,
}

impl ArtifactNamer {
    pub fn new(prefix: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            hostname: hostname.into(),
        }
    }

    /// Name for an artifact committed at `at`
    pub fn name_at(&self, at: DateTime<Utc>) -> String {
        let timestamp = at.to_rfc3339_opts(SecondsFormat::Nanos, true);
        if self.prefix.is_empty() {
            format!("{}-{}.txt", self.hostname, timestamp)
        } else {
            format!("{}/{}-{}.txt", self.prefix, self.hostname, timestamp)
        }
    }

    /// Name for an artifact committed now
    pub fn next_name(&self) -> String {
        self.name_at(Utc::now())
    }
}

/// Writes every batch it is given to a freshly named artifact.
///
/// A failed write is logged and reported as the whole batch unprocessed;
/// it is not retried.
pub struct StorageCommitter {
    store: Box<dyn ArtifactStore>,
    namer: ArtifactNamer,
}

impl StorageCommitter {
    pub fn new(store: Box<dyn ArtifactStore>, namer: ArtifactNamer) -> Self {
        Self { store, namer }
    }
}

#[async_trait]
impl Committer for StorageCommitter {
    async fn commit(&self, buf: &[u8]) -> usize {
        let name = self.namer.next_name();
        info!("Committing {} bytes to {:?}", buf.len(), name);

        match self.store.write(&name, buf).await {
            Ok(()) => 0,
            Err(e) => {
                error!(
                    "Error committing {:?} to {}: {}",
                    name,
                    self.store.describe(),
                    e
                );
                buf.len()
            }
        }
    }
}
