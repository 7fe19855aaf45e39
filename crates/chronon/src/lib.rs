//! # chronon
//!
//! A discrete-event simulation kernel. Callbacks ("events") are executed
//! in strictly increasing virtual-time order; events with equal
//! timestamps run in the order they were scheduled.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           chronon                            │
//! │  ┌──────────┐   ┌─────────────┐   ┌────────────────────────┐ │
//! │  │   Time   │ → │  Scheduler  │ → │       Simulator        │ │
//! │  │ (i128 fs)│   │ list / map /│   │ default │ realtime     │ │
//! │  │          │   │ heap / cal. │   │         │ + synchronizer│ │
//! │  └──────────┘   └─────────────┘   └────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use chronon::prelude::*;
//!
//! let mut sim = DefaultSimulator::new();
//! sim.schedule(Time::from_millis(5), make_event(|sim| {
//!     assert_eq!(sim.now(), Time::from_millis(5));
//! }))?;
//! sim.run()?;
//! assert_eq!(sim.event_count(), 1);
//! # Ok::<(), KernelError>(())
//! ```
//!
//! # Modules
//!
//! - **Time**: [`Time`], [`Unit`] - exact femtosecond arithmetic
//! - **Scheduling**: [`Scheduler`], [`SchedulerKind`] and the four queues
//! - **Simulation**: [`DefaultSimulator`], [`RealtimeSimulator`], [`Timer`]
//! - **Configuration**: [`ChrononConfig`], [`ConfigLoader`]

// Time
pub use chronon_time::{Time, TimeError, TimeWithUnit, Unit};

// Scheduling
pub use chronon_scheduler::{
    CalendarFlavor, CalendarScheduler, EventId, EventKey, HeapScheduler, ListScheduler,
    MapScheduler, ParseSchedulerKindError, ScheduledEvent, Scheduler, SchedulerError,
    SchedulerImpl, SchedulerKind,
};

// Simulation
pub use chronon_kernel::{
    DefaultSimulator, DriverKind, EventFn, KernelError, NO_CONTEXT, RealtimeConfig,
    RealtimeHandle, RealtimeSimulator, SendEventFn, SimulatorConfig, SimulatorImpl,
    SimulatorState, SyncMode, SyncOutcome, Synchronizer, Timer, build_simulator, make_event,
};

// Configuration
pub use chronon_config::{ChrononConfig, ConfigError, ConfigLoader, LoggingConfig, WorkloadConfig};

/// The types most simulations need.
pub mod prelude {
    pub use crate::{
        DefaultSimulator, EventId, KernelError, NO_CONTEXT, RealtimeHandle, RealtimeSimulator,
        SchedulerKind, SimulatorConfig, SimulatorImpl, SyncMode, Time, Timer, Unit,
        build_simulator, make_event,
    };
}
