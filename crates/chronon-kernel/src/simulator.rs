//! The simulator interface and the default, as-fast-as-possible driver.

use chronon_scheduler::{EventId, Scheduler, SchedulerKind};
use chronon_time::{Time, Unit};

use crate::event_core::EventCore;
use crate::realtime::RealtimeSimulator;
use crate::{KernelError, SimulatorConfig};

/// Context reported outside of any event.
pub const NO_CONTEXT: u32 = u32::MAX;

/// A scheduled callback. It receives the simulator that runs it, so it can
/// read the clock and schedule follow-up events.
pub type EventFn = Box<dyn FnOnce(&mut dyn SimulatorImpl)>;

/// Boxes a closure as an [`EventFn`], fixing its argument type for
/// inference.
pub fn make_event<F>(f: F) -> EventFn
where
    F: FnOnce(&mut dyn SimulatorImpl) + 'static,
{
    Box::new(f)
}

/// Lifecycle of a simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorState {
    NotStarted,
    Running,
    /// `run` returned because of `stop` or `stop_at`.
    Stopped,
    /// `run` returned because the queue drained.
    Finished,
    /// `destroy` has begun. Terminal.
    Destroyed,
}

// ============================================================================
// SimulatorImpl
// ============================================================================

/// Operations every simulation driver provides.
///
/// A simulator owns its clock, scheduler and pending events. Nothing is
/// global: independent simulators can coexist in one process.
pub trait SimulatorImpl {
    /// Schedules `event` to run `delay` after now, under the current
    /// context.
    fn schedule(&mut self, delay: Time, event: EventFn) -> Result<EventId, KernelError>;

    /// Schedules `event` to run `delay` after now under `context`.
    fn schedule_with_context(
        &mut self,
        context: u32,
        delay: Time,
        event: EventFn,
    ) -> Result<EventId, KernelError>;

    /// Schedules `event` at the current time, after every event already
    /// queued for it.
    fn schedule_now(&mut self, event: EventFn) -> Result<EventId, KernelError> {
        self.schedule(Time::ZERO, event)
    }

    /// Registers `event` to run during [`destroy`](Self::destroy). Destroy
    /// events run in reverse registration order.
    fn schedule_destroy(&mut self, event: EventFn) -> Result<EventId, KernelError>;

    /// Flags the event so it is skipped when popped. O(1); a no-op for
    /// expired ids.
    fn cancel(&mut self, id: &EventId);

    /// Takes the event out of the queue and frees it. A no-op for ids that
    /// have already run or been removed.
    fn remove(&mut self, id: &EventId) -> Result<(), KernelError>;

    fn is_expired(&self, id: &EventId) -> bool;

    /// Time until the event runs. Destroy events report [`Time::MAX`].
    fn delay_left(&self, id: &EventId) -> Result<Time, KernelError>;

    fn now(&self) -> Time;

    /// Runs events until the queue drains or the simulator is stopped.
    fn run(&mut self) -> Result<(), KernelError>;

    /// Pops and executes a single entry. Returns `false` if there was
    /// nothing to pop.
    fn run_one_event(&mut self) -> Result<bool, KernelError>;

    /// Stops `run` after the current event.
    fn stop(&mut self);

    /// Schedules a stop `delay` from now.
    fn stop_at(&mut self, delay: Time) -> Result<EventId, KernelError> {
        self.schedule(delay, make_event(|sim| sim.stop()))
    }

    /// Discards pending events, then runs destroy events. Idempotent.
    fn destroy(&mut self);

    fn is_finished(&self) -> bool;

    /// Moves every pending event into a new scheduler of `kind`.
    fn set_scheduler(&mut self, kind: SchedulerKind);

    fn scheduler_kind(&self) -> SchedulerKind;

    /// Context of the running event, or [`NO_CONTEXT`].
    fn context(&self) -> u32;

    /// Number of events executed so far. Cancelled events do not count.
    fn event_count(&self) -> u64;

    fn pending_count(&self) -> usize;

    /// The latest time this simulator can schedule at.
    fn maximum_simulation_time(&self) -> Time;

    fn resolution(&self) -> Unit;

    fn state(&self) -> SimulatorState;

    fn as_realtime(&mut self) -> Option<&mut RealtimeSimulator> {
        None
    }
}

/// Builds the driver selected by `config`.
pub fn build_simulator(config: &SimulatorConfig) -> Result<Box<dyn SimulatorImpl>, KernelError> {
    Ok(match config.driver {
        crate::DriverKind::Default => Box::new(DefaultSimulator::with_config(config)?),
        crate::DriverKind::Realtime => Box::new(RealtimeSimulator::with_config(config)?),
    })
}

/// Trait methods whose behaviour is the same for every driver holding an
/// `EventCore` in `self.core`.
macro_rules! delegate_to_core {
    () => {
        fn schedule(
            &mut self,
            delay: chronon_time::Time,
            event: $crate::EventFn,
        ) -> Result<chronon_scheduler::EventId, $crate::KernelError> {
            let context = self.core.current_context;
            self.core.schedule(context, delay, event)
        }

        fn schedule_with_context(
            &mut self,
            context: u32,
            delay: chronon_time::Time,
            event: $crate::EventFn,
        ) -> Result<chronon_scheduler::EventId, $crate::KernelError> {
            self.core.schedule(context, delay, event)
        }

        fn schedule_destroy(
            &mut self,
            event: $crate::EventFn,
        ) -> Result<chronon_scheduler::EventId, $crate::KernelError> {
            self.core.schedule_destroy(event)
        }

        fn cancel(&mut self, id: &chronon_scheduler::EventId) {
            self.core.cancel(id);
        }

        fn remove(&mut self, id: &chronon_scheduler::EventId) -> Result<(), $crate::KernelError> {
            self.core.remove(id)
        }

        fn is_expired(&self, id: &chronon_scheduler::EventId) -> bool {
            self.core.is_expired(id)
        }

        fn delay_left(
            &self,
            id: &chronon_scheduler::EventId,
        ) -> Result<chronon_time::Time, $crate::KernelError> {
            self.core.delay_left(id)
        }

        fn now(&self) -> chronon_time::Time {
            self.core.now()
        }

        fn set_scheduler(&mut self, kind: chronon_scheduler::SchedulerKind) {
            self.core.set_scheduler(kind);
        }

        fn scheduler_kind(&self) -> chronon_scheduler::SchedulerKind {
            chronon_scheduler::Scheduler::kind(&self.core.scheduler)
        }

        fn context(&self) -> u32 {
            self.core.current_context
        }

        fn event_count(&self) -> u64 {
            self.core.event_count
        }

        fn pending_count(&self) -> usize {
            chronon_scheduler::Scheduler::len(&self.core.scheduler)
        }

        fn maximum_simulation_time(&self) -> chronon_time::Time {
            self.core.maximum_simulation_time()
        }

        fn resolution(&self) -> chronon_time::Unit {
            self.core.resolution
        }

        fn state(&self) -> $crate::SimulatorState {
            self.core.state
        }
    };
}

pub(crate) use delegate_to_core;

// ============================================================================
// DefaultSimulator
// ============================================================================

/// Runs events back to back in virtual time, with no wall-clock pacing.
pub struct DefaultSimulator {
    core: EventCore,
}

impl DefaultSimulator {
    /// A simulator with the default scheduler and nanosecond resolution.
    pub fn new() -> Self {
        Self {
            core: EventCore::new(SchedulerKind::default(), Unit::Ns)
                .expect("nanoseconds are a valid resolution"),
        }
    }

    pub fn with_config(config: &SimulatorConfig) -> Result<Self, KernelError> {
        Ok(Self {
            core: EventCore::new(config.scheduler, config.resolution)?,
        })
    }

    fn process_one_event(&mut self) -> Result<(), KernelError> {
        if let Some(event) = self.core.pop_next()? {
            event.invoke(|callback| callback(self));
        }
        self.core.current_context = NO_CONTEXT;
        Ok(())
    }
}

impl Default for DefaultSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DefaultSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultSimulator")
            .field("now", &self.core.now())
            .field("state", &self.core.state)
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

impl SimulatorImpl for DefaultSimulator {
    delegate_to_core!();

    fn run(&mut self) -> Result<(), KernelError> {
        match self.core.state {
            SimulatorState::Destroyed => return Err(KernelError::UseAfterTeardown),
            SimulatorState::Running => return Err(KernelError::AlreadyRunning),
            _ => {}
        }
        self.core.stop = false;
        self.core.state = SimulatorState::Running;
        tracing::debug!(now = %self.core.now(), pending = self.pending_count(), "run started");

        while !self.core.is_finished() {
            if let Err(e) = self.process_one_event() {
                self.core.state = SimulatorState::Stopped;
                return Err(e);
            }
            // An event may have destroyed the simulator.
            if self.core.state == SimulatorState::Destroyed {
                return Ok(());
            }
        }

        self.core.state = if self.core.stop {
            SimulatorState::Stopped
        } else {
            SimulatorState::Finished
        };
        tracing::debug!(
            now = %self.core.now(),
            events = self.core.event_count,
            state = ?self.core.state,
            "run returned"
        );
        Ok(())
    }

    fn run_one_event(&mut self) -> Result<bool, KernelError> {
        self.core.ensure_alive()?;
        if self.core.scheduler.is_empty() {
            return Ok(false);
        }
        self.process_one_event()?;
        Ok(true)
    }

    fn stop(&mut self) {
        self.core.stop = true;
    }

    fn destroy(&mut self) {
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
}
