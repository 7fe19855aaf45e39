//! Simulator throughput benchmarks.
//!
//! Runs the hold model end to end through `DefaultSimulator` on each
//! scheduler, and measures the per-event cost of cancellation.

use chronon_bench::HoldModel;
use chronon_kernel::{DefaultSimulator, SimulatorConfig, SimulatorImpl, make_event};
use chronon_scheduler::SchedulerKind;
use chronon_time::Time;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

const EVENTS: u64 = 20_000;

fn simulator(kind: SchedulerKind) -> DefaultSimulator {
    DefaultSimulator::with_config(&SimulatorConfig::default().with_scheduler(kind))
        .expect("nanosecond resolution is valid")
}

// ============================================================================
// Hold Model
// ============================================================================

fn bench_hold_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulator_hold_model");
    group.throughput(Throughput::Elements(EVENTS));
    group.sample_size(20);

    for population in [10, 1_000] {
        let model = HoldModel::default()
            .with_events(EVENTS)
            .with_population(population);
        for kind in SchedulerKind::ALL {
            group.bench_with_input(
                BenchmarkId::new(kind.as_str(), population),
                &model,
                |b, model| {
                    b.iter_batched(
                        || simulator(kind),
                        |mut sim| {
                            let report = model.run(&mut sim).expect("hold model runs");
                            black_box(report.digest)
                        },
                        criterion::BatchSize::SmallInput,
                    );
                },
            );
        }
    }

    group.finish();
}

// ============================================================================
// Cancellation
// ============================================================================

fn bench_schedule_cancel(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulator_schedule_cancel");
    group.throughput(Throughput::Elements(EVENTS));

    group.bench_function("schedule_cancel_run", |b| {
        b.iter_batched(
            || simulator(SchedulerKind::Map),
            |mut sim| {
                for i in 0..EVENTS {
                    let id = sim
                        .schedule(Time::from_nanos(i as i64), make_event(|_| {}))
                        .expect("delay in range");
                    if i % 2 == 0 {
                        sim.cancel(&id);
                    }
                }
                sim.run().expect("run completes");
                black_box(sim.event_count())
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_hold_model, bench_schedule_cancel);
criterion_main!(benches);
