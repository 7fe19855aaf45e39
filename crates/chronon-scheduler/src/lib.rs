//! # chronon-scheduler: Pending-event storage for the chronon kernel
//!
//! Two halves:
//!
//! - [`EventArena`] owns every pending event; [`EventId`] and scheduler
//!   entries refer to events through generational [`EventHandle`]s.
//! - [`Scheduler`] orders entries by [`EventKey`] `(ts, uid)`. Four
//!   implementations trade insertion cost against removal cost; all of
//!   them produce the same order for the same input.
//!
//! | Kind | Insert | Remove next | Remove arbitrary |
//! |------|--------|-------------|------------------|
//! | [`ListScheduler`] | O(1) | O(n) | O(n) |
//! | [`MapScheduler`] | O(log n) | O(log n) | O(log n) |
//! | [`HeapScheduler`] | O(log n) | O(log n) | O(log n) |
//! | [`CalendarScheduler`] | O(1) amortized | O(1) amortized | O(bucket) |

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

mod calendar;
mod error;
mod event;
mod heap;
mod list;
mod map;

pub use calendar::{CalendarFlavor, CalendarScheduler, INITIAL_WIDTH, MAX_WIDTH_SAMPLES, MIN_BUCKETS};
pub use error::SchedulerError;
pub use event::{
    DESTROY_UID, EventArena, EventHandle, EventId, EventImpl, EventKey, FIRST_UID, INVALID_UID,
    ScheduledEvent,
};
pub use heap::HeapScheduler;
pub use list::ListScheduler;
pub use map::MapScheduler;

// ============================================================================
// Scheduler trait
// ============================================================================

/// A priority queue of [`ScheduledEvent`]s ordered by [`EventKey`].
///
/// Keys are unique; the kernel guarantees this by assigning a fresh uid to
/// every insertion.
pub trait Scheduler {
    fn insert(&mut self, entry: ScheduledEvent);

    fn is_empty(&self) -> bool;

    fn len(&self) -> usize;

    /// Returns the entry with the smallest key without removing it.
    fn peek_next(&self) -> Result<ScheduledEvent, SchedulerError>;

    /// Removes and returns the entry with the smallest key.
    fn remove_next(&mut self) -> Result<ScheduledEvent, SchedulerError>;

    /// Removes the entry whose key matches `entry.key`.
    fn remove(&mut self, entry: &ScheduledEvent) -> Result<ScheduledEvent, SchedulerError>;

    fn kind(&self) -> SchedulerKind;
}

// ============================================================================
// SchedulerKind
// ============================================================================

/// Selects a scheduler implementation. Parsed from configuration files and
/// the command line as `list`, `map`, `heap`, `calendar` or `ns2-calendar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulerKind {
    List,
    #[default]
    Map,
    Heap,
    Calendar,
    Ns2Calendar,
}

impl SchedulerKind {
    pub const ALL: [SchedulerKind; 5] = [
        SchedulerKind::List,
        SchedulerKind::Map,
        SchedulerKind::Heap,
        SchedulerKind::Calendar,
        SchedulerKind::Ns2Calendar,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SchedulerKind::List => "list",
            SchedulerKind::Map => "map",
            SchedulerKind::Heap => "heap",
            SchedulerKind::Calendar => "calendar",
            SchedulerKind::Ns2Calendar => "ns2-calendar",
        }
    }

    /// Creates an empty scheduler of this kind.
    pub fn build(self) -> SchedulerImpl {
        match self {
            SchedulerKind::List => SchedulerImpl::List(ListScheduler::new()),
            SchedulerKind::Map => SchedulerImpl::Map(MapScheduler::new()),
            SchedulerKind::Heap => SchedulerImpl::Heap(HeapScheduler::new()),
            SchedulerKind::Calendar => SchedulerImpl::Calendar(CalendarScheduler::new()),
            SchedulerKind::Ns2Calendar => SchedulerImpl::Calendar(CalendarScheduler::ns2()),
        }
    }
}

impl Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised scheduler name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scheduler {0:?} (expected list, map, heap, calendar or ns2-calendar)")]
pub struct ParseSchedulerKindError(pub String);

impl FromStr for SchedulerKind {
    type Err = ParseSchedulerKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == needle)
            .ok_or_else(|| ParseSchedulerKindError(s.to_string()))
    }
}

// ============================================================================
// SchedulerImpl
// ============================================================================

/// Closed set of scheduler implementations, dispatched without boxing.
#[derive(Debug, Clone)]
pub enum SchedulerImpl {
    List(ListScheduler),
    Map(MapScheduler),
    Heap(HeapScheduler),
    Calendar(CalendarScheduler),
}

impl Default for SchedulerImpl {
    fn default() -> Self {
        SchedulerKind::default().build()
    }
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            SchedulerImpl::List($s) => $body,
            SchedulerImpl::Map($s) => $body,
            SchedulerImpl::Heap($s) => $body,
            SchedulerImpl::Calendar($s) => $body,
        }
    };
}

impl Scheduler for SchedulerImpl {
    fn insert(&mut self, entry: ScheduledEvent) {
        dispatch!(self, s => s.insert(entry));
    }

    fn is_empty(&self) -> bool {
        dispatch!(self, s => s.is_empty())
    }

    fn len(&self) -> usize {
        dispatch!(self, s => s.len())
    }

    fn peek_next(&self) -> Result<ScheduledEvent, SchedulerError> {
        dispatch!(self, s => s.peek_next())
    }

    fn remove_next(&mut self) -> Result<ScheduledEvent, SchedulerError> {
        dispatch!(self, s => s.remove_next())
    }

    fn remove(&mut self, entry: &ScheduledEvent) -> Result<ScheduledEvent, SchedulerError> {
        dispatch!(self, s => s.remove(entry))
    }

    fn kind(&self) -> SchedulerKind {
        dispatch!(self, s => s.kind())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn entry(ts: u64, uid: u32) -> ScheduledEvent {
        ScheduledEvent::new(EventKey::new(ts, uid), EventHandle::default())
    }

    fn drain(s: &mut impl Scheduler) -> Vec<EventKey> {
        std::iter::from_fn(|| s.remove_next().ok())
            .map(|e| e.key)
            .collect()
    }

    #[test_case(SchedulerKind::List)]
    #[test_case(SchedulerKind::Map)]
    #[test_case(SchedulerKind::Heap)]
    #[test_case(SchedulerKind::Calendar)]
    #[test_case(SchedulerKind::Ns2Calendar)]
    fn empty_queue_errors(kind: SchedulerKind) {
        let mut s = kind.build();
        assert!(s.is_empty());
        assert_eq!(s.peek_next(), Err(SchedulerError::EmptyQueue));
        assert_eq!(s.remove_next(), Err(SchedulerError::EmptyQueue));
        assert_eq!(
            s.remove(&entry(1, 4)),
            Err(SchedulerError::NotFound {
                key: EventKey::new(1, 4)
            })
        );
        assert_eq!(s.kind(), kind);
    }

    #[test_case(SchedulerKind::List)]
    #[test_case(SchedulerKind::Map)]
    #[test_case(SchedulerKind::Heap)]
    #[test_case(SchedulerKind::Calendar)]
    #[test_case(SchedulerKind::Ns2Calendar)]
    fn equal_timestamps_pop_in_uid_order(kind: SchedulerKind) {
        let mut s = kind.build();
        s.insert(entry(10, 6));
        s.insert(entry(10, 4));
        s.insert(entry(5, 7));
        s.insert(entry(10, 5));
        assert_eq!(s.len(), 4);
        assert_eq!(s.peek_next().unwrap().key, EventKey::new(5, 7));
        assert_eq!(
            drain(&mut s),
            vec![
                EventKey::new(5, 7),
                EventKey::new(10, 4),
                EventKey::new(10, 5),
                EventKey::new(10, 6),
            ]
        );
    }

    #[test_case(SchedulerKind::List)]
    #[test_case(SchedulerKind::Map)]
    #[test_case(SchedulerKind::Heap)]
    #[test_case(SchedulerKind::Calendar)]
    #[test_case(SchedulerKind::Ns2Calendar)]
    fn remove_excises_one_entry(kind: SchedulerKind) {
        let mut s = kind.build();
        for uid in 4..10 {
            s.insert(entry(u64::from(uid) % 3, uid));
        }
        let removed = s.remove(&entry(1, 7)).unwrap();
        assert_eq!(removed.key, EventKey::new(1, 7));
        assert!(s.remove(&entry(1, 7)).is_err());
        assert!(!drain(&mut s).contains(&EventKey::new(1, 7)));
    }

    #[test_case("list", SchedulerKind::List)]
    #[test_case("MAP", SchedulerKind::Map)]
    #[test_case(" heap ", SchedulerKind::Heap)]
    #[test_case("calendar", SchedulerKind::Calendar)]
    #[test_case("ns2-calendar", SchedulerKind::Ns2Calendar)]
    fn kind_parses(input: &str, expected: SchedulerKind) {
        assert_eq!(input.parse::<SchedulerKind>().unwrap(), expected);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!("splay".parse::<SchedulerKind>().is_err());
    }

    #[test]
    fn kind_display_roundtrips() {
        for kind in SchedulerKind::ALL {
            assert_eq!(kind.to_string().parse::<SchedulerKind>().unwrap(), kind);
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Insert(u64),
            RemoveNext,
            Remove(usize),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                4 => (0u64..500).prop_map(Op::Insert),
                2 => Just(Op::RemoveNext),
                1 => any::<usize>().prop_map(Op::Remove),
            ]
        }

        /// Replays `ops` and returns every key observed, in order.
        fn replay(kind: SchedulerKind, ops: &[Op]) -> Vec<EventKey> {
            let mut s = kind.build();
            let mut live: Vec<ScheduledEvent> = Vec::new();
            let mut out = Vec::new();
            let mut uid = FIRST_UID;
            for op in ops {
                match op {
                    Op::Insert(ts) => {
                        let e = entry(*ts, uid);
                        uid += 1;
                        s.insert(e);
                        live.push(e);
                    }
                    Op::RemoveNext => {
                        if let Ok(e) = s.remove_next() {
                            live.retain(|l| l.key != e.key);
                            out.push(e.key);
                        }
                    }
                    Op::Remove(i) => {
                        if !live.is_empty() {
                            let e = live.remove(i % live.len());
                            s.remove(&e).unwrap();
                        }
                    }
                }
                assert_eq!(s.len(), live.len());
            }
            out.extend(drain(&mut s));
            out
        }

        proptest! {
            #[test]
            fn all_kinds_agree(ops in proptest::collection::vec(op(), 0..300)) {
                let reference = replay(SchedulerKind::List, &ops);
                for kind in SchedulerKind::ALL {
                    prop_assert_eq!(&replay(kind, &ops), &reference, "kind {}", kind);
                }
            }

            #[test]
            fn drained_order_is_sorted(times in proptest::collection::vec(0u64..10_000, 0..400)) {
                for kind in SchedulerKind::ALL {
                    let mut s = kind.build();
                    for (i, ts) in times.iter().enumerate() {
                        s.insert(entry(*ts, FIRST_UID + i as u32));
                    }
                    let keys = drain(&mut s);
                    prop_assert_eq!(keys.len(), times.len());
                    prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
                }
            }
        }
    }
}
