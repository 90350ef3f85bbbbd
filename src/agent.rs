//! The drive loop
//!
//! A dedicated reader task fills the [`FlushBuffer`] from the deadline-bounded
//! stream, while the calling task watches the [`Deadliner`] and flushes when
//! a deadline passes without a size-triggered commit. Both sides go through
//! one mutex around the buffer. When the stream ends the remaining data is
//! flushed and every in-flight commit is waited for.

use std::io;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::Mutex;
use tracing::{debug, error, info, trace};

use crate::buffer::{FillStatus, FlushBuffer};
use crate::commit::{CommitStats, Committer, DrainHandle, StatsSnapshot};
use crate::error::{AgentError, Result};
use crate::input::{DeadlineRead, DeadlineReader, ReadError};
use crate::subprocess::ExitStatus;
use crate::sync::Deadliner;

/// States of the reader side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveState {
    Filling,
    Flushing(FlushReason),
    Draining,
    Stopped,
}

/// Why a flush was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// The buffer has no free space left
    Full,
    /// A read hit the flush deadline
    Deadline,
}

/// How the stream ended
#[derive(Debug)]
pub enum StreamEnd {
    Eof,
    Failed(io::Error),
}

impl StreamEnd {
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Eof)
    }
}

/// Summary of a completed run
#[derive(Debug)]
pub struct RunReport {
    pub stream_end: StreamEnd,
    /// Exit status of the producing process, if one was attached
    pub exit_status: Option<ExitStatus>,
    pub stats: StatsSnapshot,
}

type SharedBuffer<C> = Arc<Mutex<FlushBuffer<C>>>;

/// Composes buffer, deadline-bounded reader and deadliner
pub struct Agent<C> {
    buffer: SharedBuffer<C>,
    deadliner: Arc<Deadliner>,
    drain: DrainHandle,
    stats: Arc<CommitStats>,
}

impl<C> Agent<C>
where
    C: Committer + 'static,
{
    pub fn new(
        buffer: FlushBuffer<C>,
        deadliner: Arc<Deadliner>,
        drain: DrainHandle,
        stats: Arc<CommitStats>,
    ) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(buffer)),
            deadliner,
            drain,
            stats,
        }
    }

    /// Ship the stream until it ends, then flush and wait for every commit.
    pub async fn run<R>(self, reader: DeadlineReader<R>) -> Result<RunReport>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let mut reader_task = {
            let buffer = Arc::clone(&self.buffer);
            let deadliner = Arc::clone(&self.deadliner);
            tokio::spawn(async move {
                let mut reader = reader;
                let end = drive(&buffer, &mut reader, &deadliner).await;
                let exit = reader.close().await;
                (end, exit)
            })
        };

        let joined = loop {
            tokio::select! {
                joined = &mut reader_task => break joined,
                _ = self.deadliner.wait() => {
                    let mut buffer = self.buffer.lock().await;
                    if deadline_flush(&mut buffer, &self.deadliner).await {
                        debug!("Deadline commit");
                    }
                }
            }
        };

        // Draining: whatever happened to the reader, try one last flush.
        trace!("Drive state: {:?}", DriveState::Draining);
        let committed = self.buffer.lock().await.flush_all().await;
        debug!("Final flush committed {} bytes", committed);
        self.drain.wait().await;
        trace!("Drive state: {:?}", DriveState::Stopped);

        let stats = self.stats.snapshot();
        info!(
            "Exiting, total bytes committed: {}, dropped: {}, artifacts: {}",
            stats.bytes_committed, stats.bytes_dropped, stats.batches_committed
        );

        let (stream_end, exit) = match joined {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => return Err(AgentError::Join(e)),
        };
        let exit_status = exit?;

        Ok(RunReport {
            stream_end,
            exit_status,
            stats,
        })
    }
}

/// Reader side: fill until the stream ends, flushing when needed
async fn drive<C, R>(buffer: &SharedBuffer<C>, reader: &mut R, deadliner: &Deadliner) -> StreamEnd
where
    C: Committer,
    R: DeadlineRead + ?Sized,
{
    let mut state = DriveState::Filling;
    let mut end = StreamEnd::Eof;

    loop {
        state = match state {
            DriveState::Filling => {
                let status = buffer.lock().await.fill(reader).await;
                match status {
                    Ok(FillStatus::Progress(_)) => DriveState::Filling,
                    Ok(FillStatus::NeedsFlush) => DriveState::Flushing(FlushReason::Full),
                    Err(ReadError::Timeout) => DriveState::Flushing(FlushReason::Deadline),
                    Err(ReadError::Eof) => {
                        info!("EOF");
                        DriveState::Draining
                    }
                    Err(ReadError::Io(e)) => {
                        error!("Error during read: {}", e);
                        end = StreamEnd::Failed(e);
                        DriveState::Draining
                    }
                }
            }
            DriveState::Flushing(FlushReason::Full) => {
                buffer.lock().await.flush().await;
                reader.rearm();
                DriveState::Filling
            }
            DriveState::Flushing(FlushReason::Deadline) => {
                let mut guard = buffer.lock().await;
                deadline_flush(&mut guard, deadliner).await;
                drop(guard);
                reader.rearm();
                DriveState::Filling
            }
            DriveState::Draining | DriveState::Stopped => return end,
        };
    }
}

/// Flush if the deadline has passed; the other side may already have done it.
///
/// Returns whether a flush was attempted.
async fn deadline_flush<C: Committer>(buffer: &mut FlushBuffer<C>, deadliner: &Deadliner) -> bool {
    if !deadliner.passed() {
        return false;
    }
    buffer.flush().await;
    // Nothing to commit still counts as meeting the deadline.
    deadliner.catch_up();
    true
}
