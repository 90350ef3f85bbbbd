//! Newline-boundary commit policy

use async_trait::async_trait;

use super::Committer;

/// Commits up to and including the last newline; the rest is trailer.
///
/// A batch without any newline is committed whole (it can only happen when a
/// single line outgrows the buffer or a deadline fires mid-line), so the
/// buffer always makes progress.
pub struct NewlineCommitter<C> {
    inner: C,
}

impl<C> NewlineCommitter<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

/// Length of the prefix of `buf` that ends with its last newline, or the
/// whole of `buf` when it contains none
pub fn split_point(buf: &[u8]) -> usize {
    match buf.iter().rposition(|&b| b == b'\n') {
        Some(idx) => idx + 1,
        None => buf.len(),
    }
}

#[async_trait]
impl<C: Committer> Committer for NewlineCommitter<C> {
    async fn commit(&self, buf: &[u8]) -> usize {
        if buf.is_empty() {
            return 0;
        }

        let (ready, trailer) = buf.split_at(split_point(buf));
        let leftover = self.inner.commit(ready).await;
        assert_eq!(
            leftover, 0,
            "committer below the newline boundary left {} of {} bytes unprocessed",
            leftover,
            ready.len()
        );

        trailer.len()
    }
}
