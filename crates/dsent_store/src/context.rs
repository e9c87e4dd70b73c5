//! Caller-supplied deadline and cancellation.

use crate::error::{StoreError, StoreResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Granularity at which [`Context::sleep`] re-checks cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Deadline and cancellation for one operation.
///
/// Every store round-trip checks the context first. Clones share the
/// cancellation flag, so cancelling any clone cancels them all.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// A context that never expires.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Limits the context to `timeout` from now.
    ///
    /// An earlier existing deadline is kept. A timeout too large to
    /// represent adds no deadline.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Limits the context to `deadline`.
    ///
    /// An earlier existing deadline is kept.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the time left before the deadline.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Cancels this context and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true if [`cancel`](Self::cancel) was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fails if the context was cancelled or its deadline has passed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cancelled`] or [`StoreError::DeadlineExceeded`].
    pub fn check(&self) -> StoreResult<()> {
        if self.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(StoreError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Blocks for `duration`, waking early if the context ends.
    ///
    /// # Errors
    ///
    /// Returns the context's error if it ends before `duration` elapses.
    pub fn sleep(&self, duration: Duration) -> StoreResult<()> {
        let until = Instant::now() + duration;
        loop {
            self.check()?;
            let now = Instant::now();
            if now >= until {
                return Ok(());
            }
            let mut step = (until - now).min(POLL_INTERVAL);
            if let Some(remaining) = self.remaining() {
                step = step.min(remaining);
            }
            std::thread::sleep(step);
        }
    }
}
