//! Deadline-reset commit policy

use async_trait::async_trait;
use std::sync::Arc;

use super::Committer;
use crate::sync::Deadliner;

/// Marks the flush deadline as met before delegating.
///
/// Any commit, whether caused by a full buffer or by the timer, resets the
/// cadence so the timer does not flush again right after a size-driven flush.
pub struct DeadlineMetCommitter<C> {
    deadliner: Arc<Deadliner>,
    inner: C,
}

impl<C> DeadlineMetCommitter<C> {
    pub fn new(deadliner: Arc<Deadliner>, inner: C) -> Self {
        Self { deadliner, inner }
    }
}

#[async_trait]
impl<C: Committer> Committer for DeadlineMetCommitter<C> {
    async fn commit(&self, buf: &[u8]) -> usize {
        self.deadliner.met();
        self.inner.commit(buf).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::CommitterFn;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_commit_advances_deadline() {
        let deadliner = Arc::new(Deadliner::new(Duration::from_secs(2)));
        let first = deadliner.deadline();
        let committer = DeadlineMetCommitter::new(Arc::clone(&deadliner), CommitterFn(|_: &[u8]| 0));

        tokio::time::advance(Duration::from_secs(1)).await;
        committer.commit(b"x\n").await;

        assert_eq!(deadliner.deadline(), first + Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inner_result_is_passed_through() {
        let deadliner = Arc::new(Deadliner::new(Duration::from_secs(2)));
        let committer = DeadlineMetCommitter::new(deadliner, CommitterFn(|buf: &[u8]| buf.len()));

        assert_eq!(committer.commit(b"abc").await, 3);
    }
}
