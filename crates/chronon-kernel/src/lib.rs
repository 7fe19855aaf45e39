//! # chronon-kernel: Simulation drivers
//!
//! A simulator owns a clock, a [`Scheduler`](chronon_scheduler::Scheduler)
//! and the pending events, and executes events in `(time, uid)` order.
//!
//! - [`DefaultSimulator`] runs events back to back.
//! - [`RealtimeSimulator`] waits for the wall clock to reach each event's
//!   timestamp, and accepts work from other threads via [`RealtimeHandle`].
//!
//! Both implement [`SimulatorImpl`]; [`build_simulator`] picks one from a
//! [`SimulatorConfig`].
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use chronon_kernel::{DefaultSimulator, SimulatorImpl, make_event};
//! use chronon_time::Time;
//!
//! let order = Rc::new(RefCell::new(Vec::new()));
//! let mut sim = DefaultSimulator::new();
//! for (delay, name) in [(10, "A"), (10, "B"), (5, "C")] {
//!     let order = Rc::clone(&order);
//!     sim.schedule(Time::from_nanos(delay), make_event(move |_| order.borrow_mut().push(name)))
//!         .unwrap();
//! }
//! sim.run().unwrap();
//! assert_eq!(*order.borrow(), ["C", "A", "B"]);
//! ```

mod config;
mod error;
mod event_core;
mod realtime;
mod simulator;
mod synchronizer;
mod timer;

pub use config::{DriverKind, RealtimeConfig, SimulatorConfig, SyncMode};
pub use error::KernelError;
pub use realtime::{RealtimeHandle, RealtimeSimulator, SendEventFn};
pub use simulator::{
    DefaultSimulator, EventFn, NO_CONTEXT, SimulatorImpl, SimulatorState, build_simulator,
    make_event,
};
pub use synchronizer::{SyncOutcome, Synchronizer};
pub use timer::Timer;
