//! Fixed-capacity flush buffer
//!
//! [`FlushBuffer`] behaves like a bounded byte buffer: reads land in its free
//! region, and a flush hands the filled region to a [`Committer`]. Whatever
//! the committer declines (the trailer after the last newline) is moved to
//! the front and kept for the next round.

use tracing::{debug, trace};

use crate::commit::Committer;
use crate::input::{DeadlineRead, ReadError};

/// Result of a single successful [`FlushBuffer::fill`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStatus {
    /// Bytes were read and there is still room
    Progress(usize),
    /// The buffer is full and must be flushed before the next fill
    NeedsFlush,
}

/// Bounded buffer in front of a commit chain
pub struct FlushBuffer<C> {
    // Allocated once; `filled` marks the boundary between data and free space.
    buf: Box<[u8]>,
    filled: usize,
    committer: C,
}

impl<C: Committer> FlushBuffer<C> {
    /// Allocate a buffer of `capacity` bytes in front of `committer`
    pub fn new(capacity: usize, committer: C) -> Self {
        Self {
            buf: vec![0; capacity].into_boxed_slice(),
            filled: 0,
            committer,
        }
    }

    /// Amount of data currently in the buffer waiting to be flushed
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Bytes accumulated since the last flush
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.filled]
    }

    /// Issue exactly one read into the free region.
    ///
    /// Read failures (timeout, end of stream, I/O) are returned untouched and
    /// leave the buffered data as it was.
    pub async fn fill<R>(&mut self, reader: &mut R) -> Result<FillStatus, ReadError>
    where
        R: DeadlineRead + ?Sized,
    {
        if self.filled == self.buf.len() {
            return Ok(FillStatus::NeedsFlush);
        }

        let n = reader.read(&mut self.buf[self.filled..]).await?;
        self.filled += n;
        trace!("Read {} bytes ({}/{} buffered)", n, self.filled, self.buf.len());

        if self.filled == self.buf.len() {
            Ok(FillStatus::NeedsFlush)
        } else {
            Ok(FillStatus::Progress(n))
        }
    }

    /// Hand the buffered data to the committer and keep its trailer.
    ///
    /// Does nothing (and does not call the committer) when the buffer is
    /// empty. Returns the number of bytes that were committed.
    pub async fn flush(&mut self) -> usize {
        if self.filled == 0 {
            return 0;
        }

        let len = self.filled;
        let trailer = self.committer.commit(&self.buf[..len]).await;
        assert!(
            trailer <= len,
            "committer reported {} trailing bytes for a {} byte batch",
            trailer,
            len
        );

        self.move_trailer(trailer);
        self.filled = trailer;
        len - trailer
    }

    /// Flush until the buffer is empty or the committer stops making progress.
    ///
    /// Used when the stream is over: a trailer left behind by the first
    /// flush is committed instead of being lost with the process.
    pub async fn flush_all(&mut self) -> usize {
        let mut committed = 0;
        while !self.is_empty() {
            let n = self.flush().await;
            if n == 0 {
                break;
            }
            committed += n;
        }
        committed
    }

    /// Keep reading, flushing whenever the buffer fills up or a read times out.
    ///
    /// Returns once the stream ends (`Ok`) or fails (`Err`); either way the
    /// remaining data is flushed first.
    pub async fn read_from<R>(&mut self, reader: &mut R) -> Result<(), ReadError>
    where
        R: DeadlineRead + ?Sized,
    {
        let result = loop {
            match self.fill(reader).await {
                Ok(FillStatus::Progress(_)) => {}
                Ok(FillStatus::NeedsFlush) => {
                    self.flush().await;
                }
                Err(ReadError::Timeout) => {
                    self.flush().await;
                    reader.rearm();
                }
                Err(ReadError::Eof) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        // Do a final commit
        let committed = self.flush_all().await;
        debug!("Final flush committed {} bytes", committed);
        result
    }

    /// Move the last `n` filled bytes to the start of the buffer
    fn move_trailer(&mut self, n: usize) {
        let start = self.filled - n;
        self.buf.copy_within(start..self.filled, 0);
    }
}
