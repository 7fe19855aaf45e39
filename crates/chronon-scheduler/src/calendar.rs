//! Calendar queue scheduler (R. Brown, "Calendar Queues", CACM 1988).
//!
//! Entries hash into a ring of buckets by `(ts / width) % buckets`; each
//! bucket is kept sorted. Removal walks the ring one "day" at a time from
//! the bucket of the last removed event, and falls back to a direct search
//! of the bucket heads when a whole "year" passes without a hit.
//!
//! The ring doubles when the queue holds more than two entries per bucket
//! and halves when it holds fewer than one per two buckets, never shrinking
//! below [`MIN_BUCKETS`]. Every resize re-estimates the bucket width from
//! the gaps between the earliest entries.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{ScheduledEvent, Scheduler, SchedulerError, SchedulerKind};

/// Bucket count of a fresh queue, and the floor for shrinking.
pub const MIN_BUCKETS: usize = 2;
/// Bucket width of a fresh queue, in ticks.
pub const INITIAL_WIDTH: u64 = 1;
/// Upper bound on entries sampled when estimating the width.
pub const MAX_WIDTH_SAMPLES: usize = 25;

/// Width-estimation heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalendarFlavor {
    /// Samples up to [`MAX_WIDTH_SAMPLES`] of the earliest entries.
    #[default]
    Standard,
    /// The ns-2 rule: all entries below five, else `5 + len / 10`, capped
    /// at [`MAX_WIDTH_SAMPLES`].
    Ns2,
}

impl CalendarFlavor {
    fn sample_size(self, len: usize) -> usize {
        let n = match self {
            CalendarFlavor::Standard => len,
            CalendarFlavor::Ns2 if len < 5 => len,
            CalendarFlavor::Ns2 => 5 + len / 10,
        };
        n.min(MAX_WIDTH_SAMPLES)
    }
}

/// Cursor into the ring: where the previous removal happened.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    /// Timestamp of the last removed entry.
    last_ts: u64,
    /// Bucket the last removed entry came from.
    bucket: usize,
    /// Exclusive upper bound of that bucket's current day.
    top: u64,
}

#[derive(Debug, Clone)]
pub struct CalendarScheduler {
    flavor: CalendarFlavor,
    buckets: Vec<VecDeque<ScheduledEvent>>,
    width: u64,
    len: usize,
    cursor: Cursor,
}

impl Default for CalendarScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl CalendarScheduler {
    pub fn new() -> Self {
        Self::with_flavor(CalendarFlavor::Standard)
    }

    /// A calendar queue using the ns-2 width heuristic.
    pub fn ns2() -> Self {
        Self::with_flavor(CalendarFlavor::Ns2)
    }

    pub fn with_flavor(flavor: CalendarFlavor) -> Self {
        let mut s = Self {
            flavor,
            buckets: Vec::new(),
            width: INITIAL_WIDTH,
            len: 0,
            cursor: Cursor {
                last_ts: 0,
                bucket: 0,
                top: 0,
            },
        };
        s.reset(MIN_BUCKETS, INITIAL_WIDTH, 0);
        s
    }

    pub fn flavor(&self) -> CalendarFlavor {
        self.flavor
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Bucket width in ticks.
    pub fn bucket_width(&self) -> u64 {
        self.width
    }

    fn hash(&self, ts: u64) -> usize {
        ((ts / self.width) % self.buckets.len() as u64) as usize
    }

    fn day_top(&self, ts: u64) -> u64 {
        (ts / self.width).saturating_add(1).saturating_mul(self.width)
    }

    fn set_cursor(&mut self, ts: u64) {
        self.cursor = Cursor {
            last_ts: ts,
            bucket: self.hash(ts),
            top: self.day_top(ts),
        };
    }

    /// Replaces the ring with `buckets` empty buckets of `width` and parks
    /// the cursor at `start`.
    fn reset(&mut self, buckets: usize, width: u64, start: u64) {
        self.buckets = (0..buckets).map(|_| VecDeque::new()).collect();
        self.width = width.max(1);
        self.set_cursor(start);
    }

    fn insert_sorted(&mut self, entry: ScheduledEvent) {
        let index = self.hash(entry.key.ts);
        let bucket = &mut self.buckets[index];
        let at = bucket.partition_point(|e| e.key < entry.key);
        bucket.insert(at, entry);
    }

    /// Locates the minimum entry: `(bucket, day top)`.
    fn find_next(&self) -> Option<(usize, u64)> {
        if self.len == 0 {
            return None;
        }
        let n = self.buckets.len();
        let mut bucket = self.cursor.bucket;
        let mut top = self.cursor.top;
        for _ in 0..n {
            if let Some(head) = self.buckets[bucket].front()
                && head.key.ts < top
            {
                return Some((bucket, top));
            }
            bucket = (bucket + 1) % n;
            top = top.saturating_add(self.width);
        }

        // A whole year without a hit: the queue is sparse, search directly.
        let (bucket, head) = self
            .buckets
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.front().map(|head| (i, head)))
            .min_by_key(|(_, head)| head.key)?;
        Some((bucket, self.day_top(head.key.ts)))
    }

    /// Width estimate: three times the mean of the "close" gaps between
    /// the earliest entries, where close means at most twice the mean gap.
    fn estimate_width(&self) -> u64 {
        let samples = self.flavor.sample_size(self.len);
        if samples < 2 {
            return INITIAL_WIDTH;
        }
        let mut times: Vec<u64> = self.buckets.iter().flatten().map(|e| e.key.ts).collect();
        times.select_nth_unstable(samples - 1);
        times.truncate(samples);
        times.sort_unstable();

        let gaps: Vec<u64> = times.windows(2).map(|w| w[1] - w[0]).collect();
        let total: u128 = gaps.iter().map(|&g| u128::from(g)).sum();
        let twice_avg = 2 * total / gaps.len() as u128;
        let (close_total, close_count) = gaps
            .iter()
            .map(|&g| u128::from(g))
            .filter(|&g| g <= twice_avg)
            .fold((0u128, 0u128), |(sum, n), g| (sum + g, n + 1));
        if close_count == 0 || close_total == 0 {
            return INITIAL_WIDTH;
        }
        u64::try_from(3 * close_total / close_count)
            .unwrap_or(u64::MAX)
            .max(1)
    }

    fn resize(&mut self, buckets: usize) {
        let width = self.estimate_width();
        let entries: Vec<ScheduledEvent> = self.buckets.drain(..).flatten().collect();
        self.reset(buckets, width, self.cursor.last_ts);
        for entry in entries {
            self.insert_sorted(entry);
        }
        tracing::trace!(buckets, width = self.width, len = self.len, "calendar resized");
    }

    fn grow_if_needed(&mut self) {
        if self.len > 2 * self.buckets.len() {
            self.resize(2 * self.buckets.len());
        }
    }

    fn shrink_if_needed(&mut self) {
        let n = self.buckets.len();
        if n > MIN_BUCKETS && self.len < n / 2 {
            self.resize((n / 2).max(MIN_BUCKETS));
        }
    }

    /// Sum of bucket lengths; always equal to `len()`.
    pub fn bucket_total(&self) -> usize {
        self.buckets.iter().map(VecDeque::len).sum()
    }
}

impl Scheduler for CalendarScheduler {
    fn insert(&mut self, entry: ScheduledEvent) {
        // Entries earlier than the last removal would be skipped by the
        // day walk; move the cursor back to them.
        if entry.key.ts < self.cursor.last_ts {
            self.set_cursor(entry.key.ts);
        }
        self.insert_sorted(entry);
        self.len += 1;
        self.grow_if_needed();
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn len(&self) -> usize {
        self.len
    }

    fn peek_next(&self) -> Result<ScheduledEvent, SchedulerError> {
        let (bucket, _) = self.find_next().ok_or(SchedulerError::EmptyQueue)?;
        self.buckets[bucket]
            .front()
            .copied()
            .ok_or(SchedulerError::EmptyQueue)
    }

    fn remove_next(&mut self) -> Result<ScheduledEvent, SchedulerError> {
        let (bucket, top) = self.find_next().ok_or(SchedulerError::EmptyQueue)?;
        let entry = self.buckets[bucket]
            .pop_front()
            .ok_or(SchedulerError::EmptyQueue)?;
        self.cursor = Cursor {
            last_ts: entry.key.ts,
            bucket,
            top,
        };
        self.len -= 1;
        self.shrink_if_needed();
        Ok(entry)
    }

    fn remove(&mut self, entry: &ScheduledEvent) -> Result<ScheduledEvent, SchedulerError> {
        let not_found = SchedulerError::NotFound { key: entry.key };
        let bucket = self.hash(entry.key.ts);
        let at = self.buckets[bucket]
            .binary_search_by(|e| e.key.cmp(&entry.key))
            .map_err(|_| not_found)?;
        let removed = self.buckets[bucket].remove(at).ok_or(not_found)?;
        self.len -= 1;
        self.shrink_if_needed();
        Ok(removed)
    }

    fn kind(&self) -> SchedulerKind {
        match self.flavor {
            CalendarFlavor::Standard => SchedulerKind::Calendar,
            CalendarFlavor::Ns2 => SchedulerKind::Ns2Calendar,
        }
    }
}
