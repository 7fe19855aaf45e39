//! Unsorted vector scheduler.

use crate::{ScheduledEvent, Scheduler, SchedulerError, SchedulerKind};

/// Keeps entries unsorted: O(1) insertion, O(n) scan for the minimum.
///
/// Suits tiny queues and serves as the reference ordering in tests.
#[derive(Debug, Default, Clone)]
pub struct ListScheduler {
    entries: Vec<ScheduledEvent>,
}

impl ListScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn min_position(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.key)
            .map(|(i, _)| i)
    }
}

impl Scheduler for ListScheduler {
    fn insert(&mut self, entry: ScheduledEvent) {
        self.entries.push(entry);
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn peek_next(&self) -> Result<ScheduledEvent, SchedulerError> {
        self.min_position()
            .map(|i| self.entries[i])
            .ok_or(SchedulerError::EmptyQueue)
    }

    fn remove_next(&mut self) -> Result<ScheduledEvent, SchedulerError> {
        let i = self.min_position().ok_or(SchedulerError::EmptyQueue)?;
        Ok(self.entries.swap_remove(i))
    }

    fn remove(&mut self, entry: &ScheduledEvent) -> Result<ScheduledEvent, SchedulerError> {
        let i = self
            .entries
            .iter()
            .position(|e| e.key == entry.key)
            .ok_or(SchedulerError::NotFound { key: entry.key })?;
        Ok(self.entries.swap_remove(i))
    }

    fn kind(&self) -> SchedulerKind {
        SchedulerKind::List
    }
}
