//! Wall-clock paced driver.
//!
//! [`RealtimeSimulator`] runs the same event loop as the default driver
//! but waits in its [`Synchronizer`] until the wall clock reaches each
//! event's timestamp. Other threads feed it through [`RealtimeHandle`]:
//! the handle pushes into a mutex-guarded inbox and signals the
//! synchronizer, and the driving thread moves inbox entries into the
//! scheduler, assigning uids in inbox order.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chronon_scheduler::EventId;
use chronon_time::{Time, Unit};

use crate::event_core::EventCore;
use crate::simulator::{NO_CONTEXT, SimulatorState, delegate_to_core};
use crate::synchronizer::{SyncOutcome, Synchronizer};
use crate::{EventFn, KernelError, SimulatorConfig, SimulatorImpl, SyncMode};

/// An event callback that may be created on another thread.
pub type SendEventFn = Box<dyn FnOnce(&mut dyn SimulatorImpl) + Send>;

/// How long an idle driver sleeps between checks for live handles.
const IDLE_WAIT: Duration = Duration::from_secs(1);

struct InboxEntry {
    ts: u64,
    context: u32,
    event: SendEventFn,
}

/// State reachable from other threads.
struct Shared {
    synchronizer: Synchronizer,
    inbox: Mutex<Vec<InboxEntry>>,
    resolution: Unit,
    running: AtomicBool,
    stop_requested: AtomicBool,
    torn_down: AtomicBool,
    /// Mirror of the driver's current tick for handles.
    current_ts: AtomicU64,
}

impl Shared {
    fn lock_inbox(&self) -> MutexGuard<'_, Vec<InboxEntry>> {
        self.inbox.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True when a handle has posted work or a stop since the driver last
    /// looked. Checked after clearing the synchronizer condition, so a
    /// signal that raced the clear is not slept through.
    fn has_pending_signal(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire) || !self.lock_inbox().is_empty()
    }
}

// ============================================================================
// RealtimeHandle
// ============================================================================

/// Thread-safe entry point into a [`RealtimeSimulator`].
///
/// While any handle is alive, a running simulator with an empty queue
/// waits for more work instead of finishing.
#[derive(Clone)]
pub struct RealtimeHandle {
    shared: Arc<Shared>,
}

impl RealtimeHandle {
    /// Schedules `event` `delay` after the current wall-clock time (or the
    /// last executed timestamp when the simulator is not running).
    pub fn schedule_realtime<F>(&self, delay: Time, event: F) -> Result<(), KernelError>
    where
        F: FnOnce(&mut dyn SimulatorImpl) + Send + 'static,
    {
        self.schedule_realtime_with_context(NO_CONTEXT, delay, event)
    }

    pub fn schedule_realtime_now<F>(&self, event: F) -> Result<(), KernelError>
    where
        F: FnOnce(&mut dyn SimulatorImpl) + Send + 'static,
    {
        self.schedule_realtime(Time::ZERO, event)
    }

    pub fn schedule_realtime_with_context<F>(
        &self,
        context: u32,
        delay: Time,
        event: F,
    ) -> Result<(), KernelError>
    where
        F: FnOnce(&mut dyn SimulatorImpl) + Send + 'static,
    {
        if delay.is_strictly_negative() {
            return Err(KernelError::NegativeTime { delay });
        }
        let base = if self.shared.running.load(Ordering::Acquire) {
            self.shared.synchronizer.current_realtime()
        } else {
            Time::from_ticks(
                self.shared.current_ts.load(Ordering::Acquire),
                self.shared.resolution,
            )
        };
        let ts = base
            .checked_add(delay)
            .ok_or(KernelError::TimeOutOfRange)?
            .to_ticks(self.shared.resolution)
            .map_err(|_| KernelError::TimeOutOfRange)?;
        {
            // `destroy` flips `torn_down` under this lock, so an accepted
            // entry is always seen by the teardown that clears the inbox.
            let mut inbox = self.shared.lock_inbox();
            if self.shared.torn_down.load(Ordering::Acquire) {
                return Err(KernelError::UseAfterTeardown);
            }
            inbox.push(InboxEntry {
                ts,
                context,
                event: Box::new(event),
            });
        }
        self.shared.synchronizer.signal();
        Ok(())
    }

    /// Asks the driver to return from `run` after the current event.
    pub fn stop(&self) {
        self.shared.stop_requested.store(true, Ordering::Release);
        self.shared.synchronizer.signal();
    }

    /// The simulator's wall clock as virtual time.
    pub fn realtime_now(&self) -> Time {
        self.shared.synchronizer.current_realtime()
    }
}

impl std::fmt::Debug for RealtimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeHandle")
            .field("running", &self.shared.running.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

// ============================================================================
// RealtimeSimulator
// ============================================================================

pub struct RealtimeSimulator {
    core: EventCore,
    shared: Arc<Shared>,
}

impl RealtimeSimulator {
    pub fn with_config(config: &SimulatorConfig) -> Result<Self, KernelError> {
        let core = EventCore::new(config.scheduler, config.resolution)?;
        let shared = Arc::new(Shared {
            synchronizer: Synchronizer::new(&config.realtime),
            inbox: Mutex::new(Vec::new()),
            resolution: config.resolution,
            running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            torn_down: AtomicBool::new(false),
            current_ts: AtomicU64::new(0),
        });
        Ok(Self { core, shared })
    }

    /// A new handle for scheduling from other threads.
    pub fn handle(&self) -> RealtimeHandle {
        RealtimeHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn synchronizer(&self) -> &Synchronizer {
        &self.shared.synchronizer
    }

    pub fn set_synchronization_mode(&mut self, mode: SyncMode) {
        self.shared.synchronizer.set_mode(mode);
    }

    pub fn synchronization_mode(&self) -> SyncMode {
        self.shared.synchronizer.mode()
    }

    pub fn set_hard_limit(&mut self, limit: Time) {
        self.shared.synchronizer.set_hard_limit(limit);
    }

    pub fn hard_limit(&self) -> Time {
        self.shared.synchronizer.hard_limit()
    }

    /// The wall clock as virtual time.
    pub fn realtime_now(&self) -> Time {
        self.shared.synchronizer.current_realtime()
    }

    /// Schedules `event` `delay` after the wall-clock "now" rather than the
    /// virtual one, never earlier than the current virtual time.
    pub fn schedule_realtime(&mut self, delay: Time, event: EventFn) -> Result<EventId, KernelError> {
        let context = self.core.current_context;
        self.schedule_realtime_with_context(context, delay, event)
    }

    pub fn schedule_realtime_now(&mut self, event: EventFn) -> Result<EventId, KernelError> {
        self.schedule_realtime(Time::ZERO, event)
    }

    pub fn schedule_realtime_with_context(
        &mut self,
        context: u32,
        delay: Time,
        event: EventFn,
    ) -> Result<EventId, KernelError> {
        self.core.ensure_alive()?;
        if delay.is_strictly_negative() {
            return Err(KernelError::NegativeTime { delay });
        }
        let ts = self
            .realtime_now()
            .checked_add(delay)
            .ok_or(KernelError::TimeOutOfRange)?
            .to_ticks(self.core.resolution)
            .map_err(|_| KernelError::TimeOutOfRange)?
            .max(self.core.current_ts);
        let id = self.core.insert(ts, context, event)?;
        self.shared.synchronizer.signal();
        Ok(id)
    }

    /// Moves handle-scheduled events into the scheduler.
    fn drain_inbox(&mut self) -> Result<(), KernelError> {
        let entries = std::mem::take(&mut *self.shared.lock_inbox());
        if self.core.state == SimulatorState::Destroyed {
            return Ok(());
        }
        for entry in entries {
            let ts = entry.ts.max(self.core.current_ts);
            self.core.insert(ts, entry.context, entry.event)?;
        }
        Ok(())
    }

    fn stop_requested(&mut self) -> bool {
        if self.shared.stop_requested.swap(false, Ordering::AcqRel) {
            self.core.stop = true;
        }
        self.core.stop
    }

    fn has_external_handles(&self) -> bool {
        Arc::strong_count(&self.shared) > 1
    }

    /// Waits for the head event to come due. Returns `false` if the wait
    /// was interrupted and the queue must be re-examined.
    fn wait_for_next(&mut self, next_ts: u64) -> Result<bool, KernelError> {
        let sync = &self.shared.synchronizer;
        sync.set_condition(false);
        if self.shared.has_pending_signal() {
            return Ok(false);
        }
        let now = self.core.now();
        let next = Time::from_ticks(next_ts, self.core.resolution);
        let outcome = sync.synchronize(now, next - now)?;
        Ok(outcome == SyncOutcome::Synchronized)
    }

    /// Sleeps until a handle posts work or a stop, or `IDLE_WAIT` passes.
    fn wait_idle(&self) {
        let sync = &self.shared.synchronizer;
        sync.set_condition(false);
        if !self.shared.has_pending_signal() {
            sync.wait_for_signal(IDLE_WAIT);
        }
    }

    fn process_one_event(&mut self) -> Result<(), KernelError> {
        let popped = self.core.pop_next()?;
        self.shared
            .current_ts
            .store(self.core.current_ts, Ordering::Release);
        if let Some(event) = popped {
            self.shared.synchronizer.event_start();
            event.invoke(|callback| callback(self));
            let elapsed = self.shared.synchronizer.event_end();
            tracing::trace!(%elapsed, "realtime event finished");
        }
        self.core.current_context = NO_CONTEXT;
        Ok(())
    }

    /// One iteration of the run loop. `Ok(false)` means the loop is done.
    fn step(&mut self) -> Result<bool, KernelError> {
        self.drain_inbox()?;
        if self.stop_requested() || self.core.state == SimulatorState::Destroyed {
            return Ok(false);
        }
        match self.core.next_ts() {
            None => {
                if !self.has_external_handles() {
                    return Ok(false);
                }
                self.wait_idle();
            }
            Some(next_ts) => {
                if self.wait_for_next(next_ts)? {
                    self.drain_inbox()?;
                    self.process_one_event()?;
                }
            }
        }
        Ok(true)
    }
}

impl std::fmt::Debug for RealtimeSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeSimulator")
            .field("now", &self.core.now())
            .field("state", &self.core.state)
            .field("mode", &self.synchronization_mode())
            .finish_non_exhaustive()
    }
}

impl SimulatorImpl for RealtimeSimulator {
    delegate_to_core!();

    fn run(&mut self) -> Result<(), KernelError> {
        match self.core.state {
            SimulatorState::Destroyed => return Err(KernelError::UseAfterTeardown),
            SimulatorState::Running => return Err(KernelError::AlreadyRunning),
            _ => {}
        }
        self.core.stop = false;
        self.core.state = SimulatorState::Running;
        self.shared.synchronizer.set_origin(self.core.now());
        self.shared.running.store(true, Ordering::Release);
        tracing::debug!(
            now = %self.core.now(),
            mode = ?self.synchronization_mode(),
            "realtime run started"
        );

        let result = loop {
            match self.step() {
                Ok(true) => {}
                Ok(false) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        self.shared.running.store(false, Ordering::Release);
        if self.core.state == SimulatorState::Destroyed {
            return result;
        }
        self.core.state = if result.is_err() || self.core.stop {
            SimulatorState::Stopped
        } else {
            SimulatorState::Finished
        };
        tracing::debug!(
            now = %self.core.now(),
            events = self.core.event_count,
            state = ?self.core.state,
            "realtime run returned"
        );
        result
    }

    fn run_one_event(&mut self) -> Result<bool, KernelError> {
        self.core.ensure_alive()?;
        // Outside `run` nothing pins the wall clock to virtual time, and
        // the caller's idle time between steps is not drift.
        if self.core.state != SimulatorState::Running {
            self.shared.synchronizer.set_origin(self.core.now());
        }
        loop {
            if self.shared.stop_requested.swap(false, Ordering::AcqRel) {
                self.core.stop = true;
                return Ok(false);
            }
            self.drain_inbox()?;
            let Some(next_ts) = self.core.next_ts() else {
                return Ok(false);
            };
            if self.wait_for_next(next_ts)? {
                self.drain_inbox()?;
                self.process_one_event()?;
                return Ok(true);
            }
        }
    }

    fn stop(&mut self) {
        self.core.stop = true;
    }

    fn destroy(&mut self) {
        {
            let mut inbox = self.shared.lock_inbox();
            self.shared.torn_down.store(true, Ordering::Release);
            inbox.clear();
        }
        let Some(ids) = self.core.begin_destroy() else {
            return;
        };
        for id in ids {
            if let Some(event) = self.core.arena.take(id.handle()) {
                self.core.current_context = event.context();
                event.invoke(|callback| callback(self));
            }
        }
        self.core.current_context = NO_CONTEXT;
    }

    fn is_finished(&self) -> bool {
        self.core.is_finished()
    }

    fn as_realtime(&mut self) -> Option<&mut RealtimeSimulator> {
        Some(self)
    }
}
