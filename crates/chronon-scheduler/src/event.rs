//! Events, their arena, and the handles that refer to them.
//!
//! An event lives in an [`EventArena`] slot from the moment it is
//! scheduled until it runs, is removed, or is popped after cancellation.
//! Scheduler entries and [`EventId`]s refer to the slot through an
//! [`EventHandle`], an `(index, generation)` pair. Freeing a slot bumps its
//! generation, so stale handles simply stop resolving instead of dangling.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Uid that no event ever carries.
pub const INVALID_UID: u32 = 0;
/// Uid shared by every destroy-phase event.
pub const DESTROY_UID: u32 = 2;
/// First uid handed to an ordinary event.
pub const FIRST_UID: u32 = 4;

// ============================================================================
// Keys and handles
// ============================================================================

/// Ordering key of a scheduled event: timestamp first, uid as tie-break.
///
/// `ts` is a tick count at the owning kernel's resolution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct EventKey {
    pub ts: u64,
    pub uid: u32,
}

impl EventKey {
    pub const fn new(ts: u64, uid: u32) -> Self {
        Self { ts, uid }
    }
}

impl Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ts={} uid={}", self.ts, self.uid)
    }
}

/// Generational index of an arena slot.
///
/// The default handle never resolves: live slots start at generation 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventHandle {
    index: u32,
    generation: u32,
}

impl EventHandle {
    pub const fn index(self) -> u32 {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

/// A scheduler entry: the ordering key plus the arena slot it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduledEvent {
    pub key: EventKey,
    pub event: EventHandle,
}

impl ScheduledEvent {
    pub const fn new(key: EventKey, event: EventHandle) -> Self {
        Self { key, event }
    }
}

// ============================================================================
// EventImpl
// ============================================================================

/// A single-shot callback with a cancellation flag and a context.
#[derive(Debug)]
pub struct EventImpl<F> {
    callback: F,
    cancelled: bool,
    context: u32,
}

impl<F> EventImpl<F> {
    pub fn new(callback: F, context: u32) -> Self {
        Self {
            callback,
            cancelled: false,
            context,
        }
    }

    /// Marks the event so that [`invoke`](Self::invoke) skips it.
    /// Idempotent.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Context the callback runs under.
    pub fn context(&self) -> u32 {
        self.context
    }

    /// Consumes the event and hands the callback to `notify`.
    ///
    /// A cancelled event is dropped without calling `notify` and yields
    /// `None`. Taking `self` by value means an event can run at most once.
    pub fn invoke<R>(self, notify: impl FnOnce(F) -> R) -> Option<R> {
        if self.cancelled {
            return None;
        }
        Some(notify(self.callback))
    }
}

// ============================================================================
// EventArena
// ============================================================================

#[derive(Debug)]
struct Slot<F> {
    generation: u32,
    event: Option<EventImpl<F>>,
}

/// Slot storage for pending events.
#[derive(Debug)]
pub struct EventArena<F> {
    slots: Vec<Slot<F>>,
    free: Vec<u32>,
    live: usize,
}

impl<F> Default for EventArena<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> EventArena<F> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Stores an event and returns its handle.
    pub fn insert(&mut self, event: EventImpl<F>) -> EventHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.event = Some(event);
            return EventHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).expect("event arena exceeds u32 slots");
        self.slots.push(Slot {
            generation: 1,
            event: Some(event),
        });
        EventHandle {
            index,
            generation: 1,
        }
    }

    pub fn get(&self, handle: EventHandle) -> Option<&EventImpl<F>> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.event.as_ref())
    }

    pub fn get_mut(&mut self, handle: EventHandle) -> Option<&mut EventImpl<F>> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.event.as_mut())
    }

    pub fn contains(&self, handle: EventHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Removes the event and frees its slot. Every outstanding handle to
    /// the slot stops resolving.
    pub fn take(&mut self, handle: EventHandle) -> Option<EventImpl<F>> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)?;
        let event = slot.event.take()?;
        slot.generation = match slot.generation.wrapping_add(1) {
            0 => 1,
            g => g,
        };
        self.free.push(handle.index);
        self.live -= 1;
        Some(event)
    }

    /// Cancels the event if it is still stored. Returns whether it was.
    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        match self.get_mut(handle) {
            Some(event) => {
                event.cancel();
                true
            }
            None => false,
        }
    }

    /// True if the id no longer refers to a runnable event.
    pub fn is_expired(&self, id: &EventId) -> bool {
        self.get(id.handle).is_none_or(EventImpl::is_cancelled)
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Drops every stored event and invalidates all handles.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.event.take().is_some() {
                slot.generation = match slot.generation.wrapping_add(1) {
                    0 => 1,
                    g => g,
                };
                self.free.push(index as u32);
            }
        }
        self.live = 0;
    }
}

// ============================================================================
// EventId
// ============================================================================

/// Caller-facing handle to a scheduled event.
///
/// Holding an `EventId` never keeps the event alive. The default id refers
/// to nothing and is always expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventId {
    handle: EventHandle,
    ts: u64,
    uid: u32,
}

impl EventId {
    pub const fn new(handle: EventHandle, ts: u64, uid: u32) -> Self {
        Self { handle, ts, uid }
    }

    pub const fn handle(&self) -> EventHandle {
        self.handle
    }

    /// Scheduled timestamp in resolution ticks.
    pub const fn ts(&self) -> u64 {
        self.ts
    }

    pub const fn uid(&self) -> u32 {
        self.uid
    }

    pub const fn key(&self) -> EventKey {
        EventKey::new(self.ts, self.uid)
    }

    /// The scheduler entry this id was created for.
    pub const fn entry(&self) -> ScheduledEvent {
        ScheduledEvent::new(self.key(), self.handle)
    }

    pub const fn is_destroy(&self) -> bool {
        self.uid == DESTROY_UID
    }
}
