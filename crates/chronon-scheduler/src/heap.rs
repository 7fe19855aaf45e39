//! Binary min-heap scheduler.

use std::collections::HashMap;

use crate::{EventKey, ScheduledEvent, Scheduler, SchedulerError, SchedulerKind};

/// An array-backed binary min-heap.
///
/// A key→position index makes arbitrary removal O(log n) instead of the
/// O(n) search a plain `BinaryHeap` would need.
#[derive(Debug, Default, Clone)]
pub struct HeapScheduler {
    heap: Vec<ScheduledEvent>,
    positions: HashMap<EventKey, usize>,
}

impl HeapScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions.insert(self.heap[a].key, a);
        self.positions.insert(self.heap[b].key, b);
    }

    fn sift_up(&mut self, mut i: usize) -> usize {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.heap[i].key >= self.heap[parent].key {
                break;
            }
            self.swap(i, parent);
            i = parent;
        }
        i
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut smallest = i;
            if left < len && self.heap[left].key < self.heap[smallest].key {
                smallest = left;
            }
            if right < len && self.heap[right].key < self.heap[smallest].key {
                smallest = right;
            }
            if smallest == i {
                return;
            }
            self.swap(i, smallest);
            i = smallest;
        }
    }

    fn remove_at(&mut self, i: usize) -> ScheduledEvent {
        let last = self.heap.len() - 1;
        if i != last {
            self.swap(i, last);
        }
        let removed = self.heap.pop().expect("heap holds the removed entry");
        self.positions.remove(&removed.key);
        if i < self.heap.len() {
            let i = self.sift_up(i);
            self.sift_down(i);
        }
        removed
    }
}

impl Scheduler for HeapScheduler {
    fn insert(&mut self, entry: ScheduledEvent) {
        let i = self.heap.len();
        self.heap.push(entry);
        self.positions.insert(entry.key, i);
        self.sift_up(i);
    }

    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn peek_next(&self) -> Result<ScheduledEvent, SchedulerError> {
        self.heap.first().copied().ok_or(SchedulerError::EmptyQueue)
    }

    fn remove_next(&mut self) -> Result<ScheduledEvent, SchedulerError> {
        if self.heap.is_empty() {
            return Err(SchedulerError::EmptyQueue);
        }
        Ok(self.remove_at(0))
    }

    fn remove(&mut self, entry: &ScheduledEvent) -> Result<ScheduledEvent, SchedulerError> {
        let i = *self
            .positions
            .get(&entry.key)
            .ok_or(SchedulerError::NotFound { key: entry.key })?;
        Ok(self.remove_at(i))
    }

    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Heap
    }
}
