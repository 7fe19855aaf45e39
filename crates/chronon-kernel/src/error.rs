//! Kernel error types.

use chronon_scheduler::SchedulerError;
use chronon_time::{Time, TimeError, Unit};

/// Errors surfaced by simulator operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
    /// A schedule call passed a negative delay.
    #[error("cannot schedule with negative delay {delay}")]
    NegativeTime { delay: Time },

    /// `now + delay` is beyond the last tick the kernel can represent.
    #[error("scheduled time is beyond the representable range")]
    TimeOutOfRange,

    /// The simulator is being, or has been, destroyed.
    #[error("simulator used after teardown")]
    UseAfterTeardown,

    /// Realtime execution drifted past the configured hard limit.
    #[error("hard realtime limit exceeded: jitter {jitter} > limit {limit}")]
    HardLimitExceeded { jitter: Time, limit: Time },

    /// The event already ran, was cancelled, or was removed.
    #[error("event has expired")]
    Expired,

    /// Every event uid has been handed out.
    #[error("event uid space exhausted")]
    UidExhausted,

    /// `run` was called while the simulator was already running.
    #[error("simulator is already running")]
    AlreadyRunning,

    /// A timer was scheduled while its previous event is still pending.
    #[error("timer is already running")]
    TimerRunning,

    /// The unit cannot serve as a kernel resolution.
    #[error("{unit} is not a valid resolution (expected s, ms, us, ns, ps or fs)")]
    InvalidResolution { unit: Unit },

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Time(#[from] TimeError),
}
