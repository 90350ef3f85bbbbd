//! Periodic deadline tracking
//!
//! A [`Deadliner`] makes sure an event (here: a flush) happens at least once
//! per period. Consumers read the current [`Deadliner::deadline`] to bound
//! their reads and call [`Deadliner::met`] whenever the event happens, which
//! issues the next deadline. All methods are safe to call from any task.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::trace;

/// Thread-safe periodic deadline tracker
#[derive(Debug)]
pub struct Deadliner {
    period: Duration,
    next: Mutex<Instant>,
    met: Notify,
}

impl Deadliner {
    /// Create a deadliner whose first deadline is one period from now
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next: Mutex::new(Instant::now() + period),
            met: Notify::new(),
        }
    }

    /// Timestamp of the next deadline
    pub fn deadline(&self) -> Instant {
        *self.lock()
    }

    /// Signal that the deadline was met and issue the next one.
    ///
    /// On time (or up to one period late) the deadline advances by exactly one
    /// period so the cadence stays stable. When the caller is more than a full
    /// period late the next deadline is re-derived from now, so missed
    /// deadlines never fire back-to-back. A deadline that is already a full
    /// period ahead is left alone. `next` never moves backwards.
    pub fn met(&self) {
        let now = Instant::now();
        {
            let mut next = self.lock();
            if now > *next + self.period {
                *next = now + self.period;
            } else if next.saturating_duration_since(now) < self.period {
                *next += self.period;
            }
            trace!("Next deadline in {:?}", next.saturating_duration_since(now));
        }
        self.met.notify_waiters();
    }

    /// Call [`met`](Self::met) only if the deadline has already passed.
    ///
    /// Used after handling a timeout that had nothing to commit, so the next
    /// read is not issued against an expired deadline.
    pub fn catch_up(&self) {
        if self.passed() {
            self.met();
        }
    }

    /// Time remaining until the deadline, zero once it has passed
    pub fn until(&self) -> Duration {
        self.deadline().saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has been reached
    pub fn passed(&self) -> bool {
        Instant::now() >= self.deadline()
    }

    /// Wait until the deadline has passed.
    ///
    /// Every call to [`met`](Self::met) wakes the waiter so it re-evaluates
    /// the moved deadline instead of firing on a stale one.
    pub async fn wait(&self) {
        loop {
            let notified = self.met.notified();
            tokio::pin!(notified);
            // Register before reading the deadline so a concurrent `met` is not lost.
            notified.as_mut().enable();

            if self.passed() {
                return;
            }
            let deadline = self.deadline();

            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {}
                _ = notified => {}
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Instant> {
        self.next.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
