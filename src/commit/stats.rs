//! Commit counters for diagnostics

use std::sync::atomic::{AtomicU64, Ordering};

/// Totals over the lifetime of the process.
///
/// Owned by the runtime and shared by `Arc` with the committers that update it.
#[derive(Debug, Default)]
pub struct CommitStats {
    bytes_committed: AtomicU64,
    bytes_dropped: AtomicU64,
    batches_committed: AtomicU64,
    batches_failed: AtomicU64,
}

/// Point-in-time copy of [`CommitStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub bytes_committed: u64,
    pub bytes_dropped: u64,
    pub batches_committed: u64,
    pub batches_failed: u64,
}

impl CommitStats {
    /// Record the outcome of one batch
    pub fn record(&self, committed: usize, dropped: usize) {
        self.bytes_committed
            .fetch_add(committed as u64, Ordering::Relaxed);
        self.bytes_dropped.fetch_add(dropped as u64, Ordering::Relaxed);
        if dropped == 0 {
            self.batches_committed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.batches_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            bytes_committed: self.bytes_committed.load(Ordering::Relaxed),
            bytes_dropped: self.bytes_dropped.load(Ordering::Relaxed),
            batches_committed: self.batches_committed.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
        }
    }
}
