//! Deadline-bounded reads from the child's output stream
//!
//! Reads never block past the [`Deadliner`]'s current deadline. Reaching the
//! deadline is reported as [`ReadError::Timeout`], which is distinct from end
//! of stream and from a hard read failure.

use async_trait::async_trait;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::subprocess::{ChildProcess, ExitStatus, ProcessError};
use crate::sync::Deadliner;

/// Outcome of a read that did not produce data
#[derive(Debug, Error)]
pub enum ReadError {
    /// The deadline was reached before any data arrived
    #[error("read deadline reached")]
    Timeout,

    /// The stream ended
    #[error("end of stream")]
    Eof,

    /// Any other read failure
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}

impl ReadError {
    /// Timeouts are expected and only mean "flush now"
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// A source that can be read with an enforced deadline
#[async_trait]
pub trait DeadlineRead: Send {
    /// Read into `buf`. `Ok(0)` is only returned for an empty `buf`.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError>;

    /// Called after the consumer handled a timeout, so the next read is not
    /// issued against a deadline that has already expired.
    fn rearm(&self) {}
}

/// Wraps a readable stream and bounds each read by the deadliner's deadline
pub struct DeadlineReader<R> {
    inner: R,
    deadliner: Arc<Deadliner>,
    process: Option<ChildProcess>,
}

impl<R> DeadlineReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(inner: R, deadliner: Arc<Deadliner>) -> Self {
        Self {
            inner,
            deadliner,
            process: None,
        }
    }

    /// Attach the process producing the stream; [`close`](Self::close) reaps it
    pub fn with_process(mut self, process: ChildProcess) -> Self {
        self.process = Some(process);
        self
    }

    /// Close the stream, then wait for the producing process to exit.
    ///
    /// The read end is dropped first so a child blocked on a full pipe is not
    /// left waiting forever. Returns `None` when no process is attached.
    pub async fn close(self) -> Result<Option<ExitStatus>, ProcessError> {
        let Self { inner, process, .. } = self;
        drop(inner);

        match process {
            Some(process) => process.wait().await.map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<R> DeadlineRead for DeadlineReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        if buf.is_empty() {
            return Ok(0);
        }

        let deadline = self.deadliner.deadline();
        match tokio::time::timeout_at(deadline, self.inner.read(buf)).await {
            Err(_elapsed) => Err(ReadError::Timeout),
            Ok(Ok(0)) => Err(ReadError::Eof),
            Ok(Ok(n)) => Ok(n),
            Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => Ok(0),
            Ok(Err(e)) => Err(ReadError::Io(e)),
        }
    }

    fn rearm(&self) {
        self.deadliner.catch_up();
    }
}
