//! Composable commit policies
//!
//! A commit hands a byte range to durable storage and gets back the number of
//! trailing bytes that were *not* processed. Policies wrap an inner
//! committer and are stacked once at startup:
//!
//! ```text
//! NewlineCommitter -> DeadlineMetCommitter -> BoundedAsyncCommitter -> StorageCommitter
//! ```
//!
//! - `newline` - split at the last newline, report the rest as trailer
//! - `deadline` - mark the flush deadline as met on every commit
//! - `bounded` - copy the batch and write it on a separate task, bounded by a semaphore
//! - `storage` - name the artifact and write it to an [`ArtifactStore`](crate::storage::ArtifactStore)
//! - `stats` - byte counters for diagnostics

pub mod bounded;
pub mod deadline;
pub mod newline;
pub mod stats;
pub mod storage;

pub use bounded::{BoundedAsyncCommitter, DrainHandle};
pub use deadline::DeadlineMetCommitter;
pub use newline::NewlineCommitter;
pub use stats::{CommitStats, StatsSnapshot};
pub use storage::{ArtifactNamer, StorageCommitter};

use async_trait::async_trait;
use std::sync::Arc;

use crate::sync::Deadliner;

/// Hands a batch of bytes onward.
///
/// Returns the number of trailing bytes of `buf` that were not processed and
/// must be kept for the next round. Never more than `buf.len()`.
#[async_trait]
pub trait Committer: Send + Sync {
    async fn commit(&self, buf: &[u8]) -> usize;
}

#[async_trait]
impl<C: Committer + ?Sized> Committer for Box<C> {
    async fn commit(&self, buf: &[u8]) -> usize {
        (**self).commit(buf).await
    }
}

#[async_trait]
impl<C: Committer + ?Sized> Committer for Arc<C> {
    async fn commit(&self, buf: &[u8]) -> usize {
        (**self).commit(buf).await
    }
}

/// Adapts a plain function into a [`Committer`]
pub struct CommitterFn<F>(pub F);

#[async_trait]
impl<F> Committer for CommitterFn<F>
where
    F: Fn(&[u8]) -> usize + Send + Sync,
{
    async fn commit(&self, buf: &[u8]) -> usize {
        (self.0)(buf)
    }
}

/// The production pipeline on top of a terminal committer
pub type CommitChain<C> = NewlineCommitter<DeadlineMetCommitter<BoundedAsyncCommitter<C>>>;

/// Assemble the commit chain above `terminal`.
///
/// Returns the head of the chain and the drain handle that must be waited on
/// once at shutdown, after the last commit has been issued.
pub fn build_chain<C>(
    terminal: C,
    deadliner: Arc<Deadliner>,
    concurrency: usize,
    stats: Arc<CommitStats>,
) -> (CommitChain<C>, DrainHandle)
where
    C: Committer + 'static,
{
    let dispatch = BoundedAsyncCommitter::new(terminal, concurrency, stats);
    let drain = dispatch.drain_handle();
    let chain = NewlineCommitter::new(DeadlineMetCommitter::new(deadliner, dispatch));
    (chain, drain)
}
