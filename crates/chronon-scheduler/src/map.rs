//! Ordered-map scheduler.

use std::collections::BTreeMap;

use crate::{EventHandle, EventKey, ScheduledEvent, Scheduler, SchedulerError, SchedulerKind};

/// A `BTreeMap` keyed by `(ts, uid)`. O(log n) for every operation and the
/// default choice.
#[derive(Debug, Default, Clone)]
pub struct MapScheduler {
    entries: BTreeMap<EventKey, EventHandle>,
}

impl MapScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for MapScheduler {
    fn insert(&mut self, entry: ScheduledEvent) {
        let previous = self.entries.insert(entry.key, entry.event);
        debug_assert!(previous.is_none(), "duplicate event key {}", entry.key);
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn peek_next(&self) -> Result<ScheduledEvent, SchedulerError> {
        self.entries
            .first_key_value()
            .map(|(key, event)| ScheduledEvent::new(*key, *event))
            .ok_or(SchedulerError::EmptyQueue)
    }

    fn remove_next(&mut self) -> Result<ScheduledEvent, SchedulerError> {
        self.entries
            .pop_first()
            .map(|(key, event)| ScheduledEvent::new(key, event))
            .ok_or(SchedulerError::EmptyQueue)
    }

    fn remove(&mut self, entry: &ScheduledEvent) -> Result<ScheduledEvent, SchedulerError> {
        self.entries
            .remove(&entry.key)
            .map(|event| ScheduledEvent::new(entry.key, event))
            .ok_or(SchedulerError::NotFound { key: entry.key })
    }

    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Map
    }
}
