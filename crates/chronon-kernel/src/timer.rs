//! A re-armable timer over a simulator.

use std::rc::Rc;

use chronon_scheduler::EventId;
use chronon_time::Time;

use crate::{KernelError, SimulatorImpl, make_event};

type TimerFn = Rc<dyn Fn(&mut dyn SimulatorImpl)>;

/// Runs the same callback each time it is armed.
///
/// The timer does not own a simulator; every operation that touches the
/// queue takes one. A timer may be suspended, which removes its pending
/// event and remembers the remaining delay for [`resume`](Self::resume).
pub struct Timer {
    callback: TimerFn,
    delay: Time,
    event: EventId,
    /// Remaining delay captured by `suspend`.
    suspended: Option<Time>,
}

impl Timer {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&mut dyn SimulatorImpl) + 'static,
    {
        Self {
            callback: Rc::new(callback),
            delay: Time::ZERO,
            event: EventId::default(),
            suspended: None,
        }
    }

    /// Default delay used by [`schedule`](Self::schedule).
    pub fn set_delay(&mut self, delay: Time) {
        self.delay = delay;
    }

    pub fn delay(&self) -> Time {
        self.delay
    }

    /// Arms the timer with its default delay.
    pub fn schedule(&mut self, sim: &mut dyn SimulatorImpl) -> Result<(), KernelError> {
        self.schedule_in(sim, self.delay)
    }

    /// Arms the timer to fire `delay` from now. Fails with
    /// [`KernelError::TimerRunning`] while a previous arming is pending.
    pub fn schedule_in(
        &mut self,
        sim: &mut dyn SimulatorImpl,
        delay: Time,
    ) -> Result<(), KernelError> {
        if !sim.is_expired(&self.event) {
            return Err(KernelError::TimerRunning);
        }
        let callback = Rc::clone(&self.callback);
        self.event = sim.schedule(delay, make_event(move |sim| callback(sim)))?;
        self.suspended = None;
        Ok(())
    }

    /// Cancels the pending event in place.
    pub fn cancel(&mut self, sim: &mut dyn SimulatorImpl) {
        sim.cancel(&self.event);
        self.suspended = None;
    }

    /// Removes the pending event from the queue.
    pub fn remove(&mut self, sim: &mut dyn SimulatorImpl) -> Result<(), KernelError> {
        self.suspended = None;
        sim.remove(&self.event)
    }

    pub fn is_expired(&self, sim: &dyn SimulatorImpl) -> bool {
        self.suspended.is_none() && sim.is_expired(&self.event)
    }

    pub fn is_running(&self, sim: &dyn SimulatorImpl) -> bool {
        self.suspended.is_none() && !sim.is_expired(&self.event)
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.is_some()
    }

    /// Time until the timer fires: the remaining delay while suspended,
    /// zero once expired.
    pub fn delay_left(&self, sim: &dyn SimulatorImpl) -> Time {
        if let Some(left) = self.suspended {
            return left;
        }
        sim.delay_left(&self.event).unwrap_or(Time::ZERO)
    }

    /// Removes the pending event and remembers how long it had left.
    pub fn suspend(&mut self, sim: &mut dyn SimulatorImpl) -> Result<(), KernelError> {
        let left = sim.delay_left(&self.event)?;
        sim.remove(&self.event)?;
        self.suspended = Some(left);
        Ok(())
    }

    /// Re-arms a suspended timer with the delay it had left.
    pub fn resume(&mut self, sim: &mut dyn SimulatorImpl) -> Result<(), KernelError> {
        let Some(left) = self.suspended else {
            return Ok(());
        };
        self.schedule_in(sim, left)
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("delay", &self.delay)
            .field("event", &self.event)
            .field("suspended", &self.suspended)
            .finish_non_exhaustive()
    }
}
