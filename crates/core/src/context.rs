//! Deadlines and cancellation
//!
//! Every operation that talks to a store accepts a [`Context`]. A context
//! carries an optional deadline and a cancellation flag shared by all of its
//! clones, so one thread can cancel work another thread is blocked on.
//!
//! Stores check the context before committing anything. An aborted call has
//! no side effect beyond writes that already committed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Why a context stopped allowing work
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ContextError {
    /// The context was cancelled explicitly
    #[error("operation cancelled")]
    Cancelled,

    /// The context deadline passed
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Deadline and cancellation scope for store operations
///
/// # Example
///
/// ```
/// use eventkeel_core::{Context, ContextError};
/// use std::time::Duration;
///
/// let ctx = Context::with_timeout(Duration::from_secs(5));
/// assert!(ctx.check().is_ok());
///
/// ctx.clone().cancel();
/// assert_eq!(ctx.check(), Err(ContextError::Cancelled));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// A context with no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// A context expiring `timeout` from now
    ///
    /// A timeout too large to represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            cancelled: Arc::default(),
        }
    }

    /// A context expiring at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::default(),
        }
    }

    /// Derive a context sharing this one's cancellation flag, whose deadline
    /// is the earlier of this context's deadline and `now + timeout`
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let deadline = match (self.deadline, Instant::now().checked_add(timeout)) {
            (Some(existing), Some(candidate)) => Some(existing.min(candidate)),
            (existing, candidate) => existing.or(candidate),
        };
        Self {
            deadline,
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// The deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline (`None` when there is no deadline)
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Cancel this context and every clone of it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check if the context was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fail if the context was cancelled or its deadline passed
    pub fn check(&self) -> Result<(), ContextError> {
        if self.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ContextError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
