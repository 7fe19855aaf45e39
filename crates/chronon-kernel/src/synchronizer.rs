//! Wall-clock synchronizer for the realtime driver.
//!
//! Maps virtual time onto the wall clock: [`Synchronizer::set_origin`]
//! pins a virtual timestamp to "now", after which
//! [`Synchronizer::current_realtime`] reads the wall clock as virtual
//! time. [`Synchronizer::synchronize`] blocks until the wall clock reaches
//! a target, sleeping on a condition variable for the bulk of the wait and
//! spinning for the last `spin_threshold`. The wait is interruptible:
//! [`Synchronizer::signal`] sets the guarded condition and wakes the
//! waiter, which then returns [`SyncOutcome::Interrupted`].

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chronon_time::Time;

use crate::{KernelError, RealtimeConfig, SyncMode};

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The wall clock reached the target.
    Synchronized,
    /// [`Synchronizer::signal`] cut the wait short.
    Interrupted,
}

#[derive(Debug)]
struct SyncState {
    origin_instant: Instant,
    origin_ts: Time,
    /// Set by `signal`, cleared by the driver before each wait.
    condition: bool,
    mode: SyncMode,
    hard_limit: Time,
    event_started: Option<Instant>,
}

impl SyncState {
    fn realtime(&self) -> Time {
        self.origin_ts + Time::from_duration(self.origin_instant.elapsed())
    }
}

#[derive(Debug)]
pub struct Synchronizer {
    state: Mutex<SyncState>,
    wakeup: Condvar,
    spin_threshold: Time,
}

impl Default for Synchronizer {
    fn default() -> Self {
        Self::new(&RealtimeConfig::default())
    }
}

impl Synchronizer {
    pub fn new(config: &RealtimeConfig) -> Self {
        Self {
            state: Mutex::new(SyncState {
                origin_instant: Instant::now(),
                origin_ts: Time::ZERO,
                condition: false,
                mode: config.mode,
                hard_limit: config.hard_limit,
                event_started: None,
            }),
            wakeup: Condvar::new(),
            spin_threshold: config.spin_threshold,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        // The state stays consistent across a panicking holder: every
        // critical section is a handful of field writes.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Always true: this synchronizer tracks a real clock.
    pub fn is_realtime(&self) -> bool {
        true
    }

    /// Anchors virtual time `ts` to the current wall-clock instant.
    pub fn set_origin(&self, ts: Time) {
        let mut state = self.lock();
        state.origin_instant = Instant::now();
        state.origin_ts = ts;
    }

    /// The wall clock, expressed as virtual time.
    pub fn current_realtime(&self) -> Time {
        self.lock().realtime()
    }

    /// How far the wall clock is ahead of `ts`. Positive means behind
    /// schedule.
    pub fn drift(&self, ts: Time) -> Time {
        self.current_realtime() - ts
    }

    pub fn mode(&self) -> SyncMode {
        self.lock().mode
    }

    pub fn set_mode(&self, mode: SyncMode) {
        self.lock().mode = mode;
    }

    pub fn hard_limit(&self) -> Time {
        self.lock().hard_limit
    }

    pub fn set_hard_limit(&self, limit: Time) {
        self.lock().hard_limit = limit;
    }

    pub fn spin_threshold(&self) -> Time {
        self.spin_threshold
    }

    /// Wakes a pending wait and makes the next one return immediately
    /// until [`set_condition(false)`](Self::set_condition).
    pub fn signal(&self) {
        self.lock().condition = true;
        self.wakeup.notify_all();
    }

    pub fn set_condition(&self, condition: bool) {
        self.lock().condition = condition;
        if condition {
            self.wakeup.notify_all();
        }
    }

    /// Blocks until the wall clock reaches `current + delay`, or until
    /// signalled.
    ///
    /// After an uninterrupted wait the jitter between the wall clock and
    /// the target is checked against the hard limit: in
    /// [`SyncMode::HardLimit`] exceeding it fails with
    /// [`KernelError::HardLimitExceeded`], in best-effort mode it is logged.
    pub fn synchronize(&self, current: Time, delay: Time) -> Result<SyncOutcome, KernelError> {
        let target = current
            .checked_add(delay)
            .ok_or(KernelError::TimeOutOfRange)?;
        let mut state = self.lock();
        loop {
            if state.condition {
                return Ok(SyncOutcome::Interrupted);
            }
            let remaining = target - state.realtime();
            if remaining.is_negative() {
                break;
            }
            if remaining > self.spin_threshold {
                let sleep = (remaining - self.spin_threshold)
                    .to_duration()
                    .unwrap_or(Duration::ZERO);
                state = self
                    .wakeup
                    .wait_timeout(state, sleep)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
            } else {
                drop(state);
                let interrupted = self.spin_until(target);
                state = self.lock();
                if interrupted {
                    return Ok(SyncOutcome::Interrupted);
                }
                break;
            }
        }

        let jitter = (state.realtime() - target).abs();
        if jitter > state.hard_limit {
            match state.mode {
                SyncMode::HardLimit => {
                    return Err(KernelError::HardLimitExceeded {
                        jitter,
                        limit: state.hard_limit,
                    });
                }
                SyncMode::BestEffort => {
                    tracing::warn!(%jitter, limit = %state.hard_limit, %target, "falling behind wall clock");
                }
            }
        }
        Ok(SyncOutcome::Synchronized)
    }

    /// Busy-waits until `target`. Returns `true` if signalled first.
    fn spin_until(&self, target: Time) -> bool {
        loop {
            let state = self.lock();
            if state.condition {
                return true;
            }
            if state.realtime() >= target {
                return false;
            }
            drop(state);
            std::hint::spin_loop();
        }
    }

    /// Sleeps until signalled or `timeout` passes, for an idle driver.
    pub fn wait_for_signal(&self, timeout: Duration) -> SyncOutcome {
        let state = self.lock();
        let (state, result) = self
            .wakeup
            .wait_timeout_while(state, timeout, |s| !s.condition)
            .unwrap_or_else(PoisonError::into_inner);
        drop(state);
        if result.timed_out() {
            SyncOutcome::Synchronized
        } else {
            SyncOutcome::Interrupted
        }
    }

    /// Marks the start of an event's execution.
    pub fn event_start(&self) {
        self.lock().event_started = Some(Instant::now());
    }

    /// Marks the end of an event's execution and returns how much wall
    /// time it took.
    pub fn event_end(&self) -> Time {
        self.lock()
            .event_started
            .take()
            .map_or(Time::ZERO, |start| Time::from_duration(start.elapsed()))
    }
}
