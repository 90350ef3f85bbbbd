//! Bounded-concurrency asynchronous dispatch

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::AcquireError;
use tracing::{error, trace};

use super::{CommitStats, Committer};
use crate::sync::CommitSemaphore;

/// Copies each batch and commits it on a separate task.
///
/// At most `concurrency` writes are in flight; further commits wait for a
/// permit, which is where a slow backing store pushes back on the reader.
/// The whole batch is always taken, so this reports zero unprocessed bytes.
/// What the inner committer leaves unprocessed is recorded as dropped.
pub struct BoundedAsyncCommitter<C> {
    inner: Arc<C>,
    semaphore: CommitSemaphore,
    stats: Arc<CommitStats>,
}

/// Waits for every in-flight commit to finish
#[derive(Debug, Clone)]
pub struct DrainHandle {
    semaphore: CommitSemaphore,
}

impl DrainHandle {
    /// Block until all outstanding writes have completed.
    ///
    /// Call once, after the last commit has been issued.
    pub async fn wait(&self) {
        if let Err(e) = self.semaphore.drain().await {
            error!("Failed to drain in-flight commits: {}", e);
        }
    }

    /// Number of writes currently in flight
    pub fn in_flight(&self) -> usize {
        self.semaphore.in_use()
    }
}

impl<C> BoundedAsyncCommitter<C>
where
    C: Committer + 'static,
{
    pub fn new(inner: C, concurrency: usize, stats: Arc<CommitStats>) -> Self {
        Self {
            inner: Arc::new(inner),
            semaphore: CommitSemaphore::new(concurrency),
            stats,
        }
    }

    pub fn drain_handle(&self) -> DrainHandle {
        DrainHandle {
            semaphore: self.semaphore.clone(),
        }
    }

    fn drop_batch(&self, len: usize, err: AcquireError) {
        error!("Dropping {} bytes, no commit slot available: {}", len, err);
        self.stats.record(0, len);
    }
}

#[async_trait]
impl<C> Committer for BoundedAsyncCommitter<C>
where
    C: Committer + 'static,
{
    async fn commit(&self, buf: &[u8]) -> usize {
        if buf.is_empty() {
            return 0;
        }

        // The caller reuses `buf` as soon as we return.
        let batch = buf.to_vec();

        let permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                self.drop_batch(batch.len(), e);
                return 0;
            }
        };
        trace!(
            "Dispatching {} bytes ({} commits in flight)",
            batch.len(),
            self.semaphore.in_use()
        );

        let inner = Arc::clone(&self.inner);
        let stats = Arc::clone(&self.stats);
        tokio::spawn(async move {
            let _permit = permit;
            let len = batch.len();
            let unprocessed = inner.commit(&batch).await.min(len);
            stats.record(len - unprocessed, unprocessed);
        });

        0
    }
}
