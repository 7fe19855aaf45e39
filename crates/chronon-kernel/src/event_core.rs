//! Bookkeeping shared by both drivers: arena, scheduler, clock and uids.

use chronon_scheduler::{
    DESTROY_UID, EventArena, EventId, EventImpl, EventKey, FIRST_UID, ScheduledEvent, Scheduler,
    SchedulerImpl, SchedulerKind,
};
use chronon_time::{Time, Unit};

use crate::simulator::{EventFn, NO_CONTEXT, SimulatorState};
use crate::KernelError;

pub(crate) struct EventCore {
    pub(crate) arena: EventArena<EventFn>,
    pub(crate) scheduler: SchedulerImpl,
    /// Destroy-phase events in registration order.
    pub(crate) destroy_events: Vec<EventId>,
    pub(crate) resolution: Unit,
    /// Timestamp of the last popped event, in resolution ticks.
    pub(crate) current_ts: u64,
    pub(crate) current_uid: u32,
    pub(crate) current_context: u32,
    next_uid: u32,
    pub(crate) stop: bool,
    pub(crate) state: SimulatorState,
    pub(crate) event_count: u64,
}

impl EventCore {
    pub(crate) fn new(scheduler: SchedulerKind, resolution: Unit) -> Result<Self, KernelError> {
        if !resolution.is_resolution() {
            return Err(KernelError::InvalidResolution { unit: resolution });
        }
        Ok(Self {
            arena: EventArena::new(),
            scheduler: scheduler.build(),
            destroy_events: Vec::new(),
            resolution,
            current_ts: 0,
            current_uid: 0,
            current_context: NO_CONTEXT,
            next_uid: FIRST_UID,
            stop: false,
            state: SimulatorState::NotStarted,
            event_count: 0,
        })
    }

    pub(crate) fn now(&self) -> Time {
        Time::from_ticks(self.current_ts, self.resolution)
    }

    pub(crate) fn ensure_alive(&self) -> Result<(), KernelError> {
        if self.state == SimulatorState::Destroyed {
            return Err(KernelError::UseAfterTeardown);
        }
        Ok(())
    }

    /// Absolute tick for `now + delay`.
    pub(crate) fn absolute_ts(&self, delay: Time) -> Result<u64, KernelError> {
        if delay.is_strictly_negative() {
            return Err(KernelError::NegativeTime { delay });
        }
        let ticks = delay
            .to_ticks(self.resolution)
            .map_err(|_| KernelError::TimeOutOfRange)?;
        self.current_ts
            .checked_add(ticks)
            .ok_or(KernelError::TimeOutOfRange)
    }

    fn allocate_uid(&mut self) -> Result<u32, KernelError> {
        let uid = self.next_uid;
        self.next_uid = uid.checked_add(1).ok_or(KernelError::UidExhausted)?;
        Ok(uid)
    }

    /// Stores `event` and queues it at absolute tick `ts`.
    pub(crate) fn insert(
        &mut self,
        ts: u64,
        context: u32,
        event: EventFn,
    ) -> Result<EventId, KernelError> {
        self.ensure_alive()?;
        let uid = self.allocate_uid()?;
        let handle = self.arena.insert(EventImpl::new(event, context));
        self.scheduler
            .insert(ScheduledEvent::new(EventKey::new(ts, uid), handle));
        tracing::trace!(ts, uid, context, "event scheduled");
        Ok(EventId::new(handle, ts, uid))
    }

    pub(crate) fn schedule(
        &mut self,
        context: u32,
        delay: Time,
        event: EventFn,
    ) -> Result<EventId, KernelError> {
        self.ensure_alive()?;
        let ts = self.absolute_ts(delay)?;
        self.insert(ts, context, event)
    }

    pub(crate) fn schedule_destroy(&mut self, event: EventFn) -> Result<EventId, KernelError> {
        self.ensure_alive()?;
        let handle = self
            .arena
            .insert(EventImpl::new(event, self.current_context));
        let id = EventId::new(handle, self.current_ts, DESTROY_UID);
        self.destroy_events.push(id);
        Ok(id)
    }

    pub(crate) fn cancel(&mut self, id: &EventId) {
        self.arena.cancel(id.handle());
    }

    pub(crate) fn remove(&mut self, id: &EventId) -> Result<(), KernelError> {
        if id.is_destroy() {
            self.destroy_events.retain(|d| d != id);
            self.arena.take(id.handle());
            return Ok(());
        }
        if !self.arena.contains(id.handle()) {
            return Ok(());
        }
        self.scheduler.remove(&id.entry())?;
        self.arena.take(id.handle());
        Ok(())
    }

    pub(crate) fn is_expired(&self, id: &EventId) -> bool {
        self.arena.is_expired(id)
    }

    pub(crate) fn delay_left(&self, id: &EventId) -> Result<Time, KernelError> {
        if self.is_expired(id) {
            return Err(KernelError::Expired);
        }
        if id.is_destroy() {
            return Ok(Time::MAX);
        }
        Ok(Time::from_ticks(
            id.ts().saturating_sub(self.current_ts),
            self.resolution,
        ))
    }

    /// Pops the earliest entry, advances the clock to it, and hands back
    /// its event. Cancelled events are returned too; `invoke` skips them.
    pub(crate) fn pop_next(&mut self) -> Result<Option<EventImpl<EventFn>>, KernelError> {
        let next = self.scheduler.remove_next()?;
        assert!(
            next.key.ts >= self.current_ts,
            "scheduler returned ts {} earlier than now {}",
            next.key.ts,
            self.current_ts
        );
        self.current_ts = next.key.ts;
        self.current_uid = next.key.uid;
        let event = self.arena.take(next.event);
        if let Some(event) = &event {
            self.current_context = event.context();
            if !event.is_cancelled() {
                self.event_count += 1;
            }
        }
        tracing::trace!(ts = next.key.ts, uid = next.key.uid, "event popped");
        Ok(event)
    }

    pub(crate) fn next_ts(&self) -> Option<u64> {
        self.scheduler.peek_next().ok().map(|e| e.key.ts)
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.scheduler.is_empty() || self.stop
    }

    pub(crate) fn set_scheduler(&mut self, kind: SchedulerKind) {
        let mut replacement = kind.build();
        let moved = self.scheduler.len();
        while let Ok(entry) = self.scheduler.remove_next() {
            replacement.insert(entry);
        }
        let previous = self.scheduler.kind();
        self.scheduler = replacement;
        tracing::debug!(%previous, next = %kind, moved, "scheduler replaced");
    }

    pub(crate) fn maximum_simulation_time(&self) -> Time {
        Time::from_ticks(u64::MAX, self.resolution)
    }

    /// Starts teardown: discards pending events and returns the destroy
    /// event ids in the order they must run. `None` if already destroyed.
    pub(crate) fn begin_destroy(&mut self) -> Option<Vec<EventId>> {
        if self.state == SimulatorState::Destroyed {
            return None;
        }
        self.state = SimulatorState::Destroyed;
        let mut discarded = 0usize;
        while let Ok(entry) = self.scheduler.remove_next() {
            if self.arena.take(entry.event).is_some() {
                discarded += 1;
            }
        }
        let mut ids = std::mem::take(&mut self.destroy_events);
        ids.reverse();
        tracing::info!(discarded, destroy_events = ids.len(), "simulator teardown");
        Some(ids)
    }
}
