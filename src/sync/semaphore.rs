//! Counting concurrency limiter for in-flight commits

use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Bounded permit pool with a full-drain wait for shutdown.
///
/// Permits are released by dropping the [`CommitPermit`], so a permit is
/// returned whether the work holding it succeeded, failed or panicked.
#[derive(Debug, Clone)]
pub struct CommitSemaphore {
    inner: Arc<Semaphore>,
    capacity: usize,
}

/// A held permit; dropping it releases the slot
#[derive(Debug)]
pub struct CommitPermit {
    _permit: OwnedSemaphorePermit,
}

impl CommitSemaphore {
    /// Create a semaphore allowing `capacity` concurrent holders
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Acquire one permit, waiting while all permits are in use
    pub async fn acquire(&self) -> Result<CommitPermit, AcquireError> {
        let permit = Arc::clone(&self.inner).acquire_owned().await?;
        Ok(CommitPermit { _permit: permit })
    }

    /// Number of permits currently held
    pub fn in_use(&self) -> usize {
        self.capacity - self.inner.available_permits()
    }

    /// Wait until every outstanding permit has been released.
    ///
    /// Only meaningful once no new acquisitions are being issued; a concurrent
    /// acquirer could otherwise take a permit right after the drain returns.
    pub async fn drain(&self) -> Result<(), AcquireError> {
        let all = u32::try_from(self.capacity).unwrap_or(u32::MAX);
        let _all = self.inner.acquire_many(all).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_excess_acquirers_block_until_release() {
        let semaphore = CommitSemaphore::new(2);
        let first = semaphore.acquire().await.unwrap();
        let _second = semaphore.acquire().await.unwrap();
        assert_eq!(semaphore.in_use(), 2);

        let blocked = {
            let semaphore = semaphore.clone();
            tokio::spawn(async move { semaphore.acquire().await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!blocked.is_finished());

        drop(first);
        tokio::time::timeout(Duration::from_secs(1), blocked)
            .await
            .expect("acquirer should be released")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_drain_waits_for_all_permits() {
        let semaphore = CommitSemaphore::new(3);
        let permits = vec![
            semaphore.acquire().await.unwrap(),
            semaphore.acquire().await.unwrap(),
        ];

        let drain = {
            let semaphore = semaphore.clone();
            tokio::spawn(async move { semaphore.drain().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!drain.is_finished());

        drop(permits);
        drain.await.unwrap().unwrap();
        assert_eq!(semaphore.in_use(), 0);
    }

    #[tokio::test]
    async fn test_drain_on_idle_semaphore_returns_immediately() {
        let semaphore = CommitSemaphore::new(4);
        semaphore.drain().await.unwrap();
        assert_eq!(semaphore.in_use(), 0);
    }
}
