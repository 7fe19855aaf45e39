//! Every scheduler must produce the same execution order for the same
//! sequence of operations.

use std::cell::RefCell;
use std::rc::Rc;

use chronon::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Schedule { delay_ns: i64 },
    Cancel { index: usize },
    Remove { index: usize },
    Step,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0i64..50).prop_map(|delay_ns| Op::Schedule { delay_ns }),
        1 => any::<usize>().prop_map(|index| Op::Cancel { index }),
        1 => any::<usize>().prop_map(|index| Op::Remove { index }),
        2 => Just(Op::Step),
    ]
}

/// Applies `ops`, then runs to completion. Returns `(label, time)` for
/// every executed event.
fn execute(kind: SchedulerKind, ops: &[Op]) -> Vec<(usize, Time)> {
    let trace = Rc::new(RefCell::new(Vec::new()));
    let mut ids: Vec<EventId> = Vec::new();
    let mut sim = build_simulator(&SimulatorConfig::default().with_scheduler(kind)).unwrap();

    for op in ops {
        match *op {
            Op::Schedule { delay_ns } => {
                let label = ids.len();
                let t = Rc::clone(&trace);
                let id = sim
                    .schedule(
                        Time::from_nanos(delay_ns),
                        make_event(move |sim| t.borrow_mut().push((label, sim.now()))),
                    )
                    .unwrap();
                ids.push(id);
            }
            Op::Cancel { index } if !ids.is_empty() => {
                sim.cancel(&ids[index % ids.len()]);
            }
            Op::Remove { index } if !ids.is_empty() => {
                sim.remove(&ids[index % ids.len()]).unwrap();
            }
            Op::Step => {
                sim.run_one_event().unwrap();
            }
            _ => {}
        }
    }
    sim.run().unwrap();
    trace.take()
}

proptest! {
    #[test]
    fn schedulers_agree(ops in proptest::collection::vec(op(), 0..120)) {
        let reference = execute(SchedulerKind::Map, &ops);
        prop_assert!(reference.windows(2).all(|w| w[0].1 <= w[1].1));
        for kind in SchedulerKind::ALL {
            prop_assert_eq!(&execute(kind, &ops), &reference, "scheduler {}", kind);
        }
    }

    #[test]
    fn switching_scheduler_mid_run_preserves_order(
        delays in proptest::collection::vec(0i64..1_000, 1..200),
        switch_after in 0usize..200,
    ) {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut sim = DefaultSimulator::new();
        for (label, delay) in delays.iter().enumerate() {
            let o = Rc::clone(&order);
            sim.schedule(Time::from_nanos(*delay), make_event(move |_| o.borrow_mut().push(label)))
                .unwrap();
        }
        for _ in 0..switch_after {
            sim.run_one_event().unwrap();
        }
        sim.set_scheduler(SchedulerKind::Calendar);
        sim.run().unwrap();

        let mut expected: Vec<usize> = (0..delays.len()).collect();
        expected.sort_by_key(|&label| (delays[label], label));
        prop_assert_eq!(&*order.borrow(), &expected);
    }
}
