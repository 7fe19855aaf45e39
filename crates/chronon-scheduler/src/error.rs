//! Scheduler error types.

use crate::EventKey;

/// Errors returned by [`Scheduler`](crate::Scheduler) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// `peek_next` or `remove_next` on an empty queue.
    #[error("scheduler queue is empty")]
    EmptyQueue,

    /// Explicit removal of an entry the queue does not hold.
    #[error("no scheduled event with key {key}")]
    NotFound { key: EventKey },
}
