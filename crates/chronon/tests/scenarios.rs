//! End-to-end simulation scenarios across crates.

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use chronon::prelude::*;
use chronon::{DriverKind, SimulatorState};
use test_case::test_case;

type Log = Rc<RefCell<Vec<&'static str>>>;

fn push(log: &Log, name: &'static str) -> chronon::EventFn {
    let log = Rc::clone(log);
    make_event(move |_| log.borrow_mut().push(name))
}

fn simulator(kind: SchedulerKind) -> Box<dyn SimulatorImpl> {
    build_simulator(&SimulatorConfig::default().with_scheduler(kind)).unwrap()
}

#[test_case(SchedulerKind::List)]
#[test_case(SchedulerKind::Map)]
#[test_case(SchedulerKind::Heap)]
#[test_case(SchedulerKind::Calendar)]
#[test_case(SchedulerKind::Ns2Calendar)]
fn ties_break_by_insertion_order(kind: SchedulerKind) {
    let log = Log::default();
    let mut sim = simulator(kind);
    sim.schedule(Time::from_nanos(10), push(&log, "A")).unwrap();
    sim.schedule(Time::from_nanos(10), push(&log, "B")).unwrap();
    sim.schedule(Time::from_nanos(5), push(&log, "C")).unwrap();

    sim.run().unwrap();

    assert_eq!(*log.borrow(), ["C", "A", "B"]);
    assert_eq!(sim.now(), Time::from_nanos(10));
    assert!(sim.is_finished());
}

#[test]
fn negative_delay_leaves_queue_untouched() {
    let mut sim = DefaultSimulator::new();
    let err = sim
        .schedule(Time::from_nanos(-1), make_event(|_| {}))
        .unwrap_err();
    assert!(matches!(err, KernelError::NegativeTime { .. }));
    assert_eq!(sim.pending_count(), 0);
}

#[test]
fn cancelled_event_is_skipped_and_expires() {
    let log = Log::default();
    let mut sim = DefaultSimulator::new();
    let id = sim.schedule(Time::from_micros(1), push(&log, "x")).unwrap();
    sim.schedule(Time::from_micros(2), push(&log, "y")).unwrap();

    assert!(!sim.is_expired(&id));
    sim.cancel(&id);
    sim.cancel(&id);
    sim.run().unwrap();

    assert_eq!(*log.borrow(), ["y"]);
    assert!(sim.is_expired(&id));
    assert_eq!(sim.event_count(), 1);
}

#[test]
fn teardown_runs_destroy_events_last_first() {
    let log = Log::default();
    let mut sim = DefaultSimulator::new();
    sim.schedule(Time::from_secs(1), push(&log, "never")).unwrap();
    sim.schedule_destroy(push(&log, "first")).unwrap();
    sim.schedule_destroy(push(&log, "second")).unwrap();

    sim.destroy();
    sim.destroy();

    assert_eq!(*log.borrow(), ["second", "first"]);
    assert_eq!(sim.state(), SimulatorState::Destroyed);
    assert_eq!(
        sim.schedule_now(make_event(|_| {})).unwrap_err(),
        KernelError::UseAfterTeardown
    );
}

#[test]
fn timer_drives_periodic_work() {
    let ticks = Rc::new(RefCell::new(Vec::new()));
    let timer = Rc::new(RefCell::new(None::<Timer>));

    let t = Rc::clone(&ticks);
    let handle = Rc::clone(&timer);
    let mut periodic = Timer::new(move |sim| {
        t.borrow_mut().push(sim.now());
        if t.borrow().len() < 3
            && let Some(timer) = handle.borrow_mut().as_mut()
        {
            timer.schedule(sim).unwrap();
        }
    });
    periodic.set_delay(Time::from_millis(2));

    let mut sim = DefaultSimulator::new();
    periodic.schedule(&mut sim).unwrap();
    *timer.borrow_mut() = Some(periodic);
    sim.run().unwrap();

    assert_eq!(
        *ticks.borrow(),
        [
            Time::from_millis(2),
            Time::from_millis(4),
            Time::from_millis(6)
        ]
    );
}

#[test]
fn context_follows_scheduled_events() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut sim = DefaultSimulator::new();
    let s = Rc::clone(&seen);
    sim.schedule_with_context(
        7,
        Time::from_nanos(1),
        make_event(move |sim| {
            s.borrow_mut().push(sim.context());
            let s = Rc::clone(&s);
            sim.schedule(Time::from_nanos(1), make_event(move |sim| {
                s.borrow_mut().push(sim.context());
            }))
            .unwrap();
        }),
    )
    .unwrap();

    assert_eq!(sim.context(), NO_CONTEXT);
    sim.run().unwrap();
    assert_eq!(*seen.borrow(), [7, 7]);
}

#[test]
fn realtime_hard_limit_fails_behind_wall_clock() {
    let config = SimulatorConfig::default()
        .with_driver(DriverKind::Realtime)
        .with_sync_mode(SyncMode::HardLimit)
        .with_hard_limit(Time::from_millis(1));
    let mut sim = build_simulator(&config).unwrap();

    sim.schedule_now(make_event(|_| thread::sleep(Duration::from_millis(10))))
        .unwrap();
    sim.schedule(Time::from_micros(100), make_event(|_| {}))
        .unwrap();

    let err = sim.run().unwrap_err();
    assert!(matches!(err, KernelError::HardLimitExceeded { .. }));
}

#[test]
fn realtime_driver_is_reachable_through_trait_object() {
    let config = SimulatorConfig::default().with_driver(DriverKind::Realtime);
    let mut sim = build_simulator(&config).unwrap();
    let rt = sim.as_realtime().expect("realtime driver");
    assert_eq!(rt.synchronization_mode(), SyncMode::BestEffort);
    assert_eq!(rt.hard_limit(), Time::from_millis(100));

    assert!(DefaultSimulator::new().as_realtime().is_none());
}
