//! Scheduler benchmarks.
//!
//! Measures the hold operation (remove the earliest entry, insert a
//! replacement) at several queue sizes for every scheduler.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use chronon_scheduler::{
    EventHandle, EventKey, ScheduledEvent, Scheduler, SchedulerImpl, SchedulerKind,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const QUEUE_SIZES: [usize; 3] = [100, 1_000, 10_000];
const HOLD_OPS: u64 = 1_000;

fn entry(ts: u64, uid: u32) -> ScheduledEvent {
    ScheduledEvent::new(EventKey { ts, uid }, EventHandle::default())
}

/// A scheduler of `kind` holding `size` entries spread over `[0, 2 * size)`.
fn filled(kind: SchedulerKind, size: usize, rng: &mut StdRng) -> (SchedulerImpl, u32) {
    let mut scheduler = kind.build();
    let mut uid = 0;
    for _ in 0..size {
        uid += 1;
        scheduler.insert(entry(rng.gen_range(0..2 * size as u64), uid));
    }
    (scheduler, uid)
}

// ============================================================================
// Insert
// ============================================================================

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler_insert");

    for size in QUEUE_SIZES {
        group.throughput(Throughput::Elements(size as u64));
        for kind in SchedulerKind::ALL {
            group.bench_with_input(BenchmarkId::new(kind.as_str(), size), &size, |b, &size| {
                b.iter(|| {
                    let mut rng = StdRng::seed_from_u64(1);
                    let (scheduler, _) = filled(kind, size, &mut rng);
                    black_box(scheduler.len())
                });
            });
        }
    }

    group.finish();
}

// ============================================================================
// Hold
// ============================================================================

fn bench_hold(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler_hold");
    group.throughput(Throughput::Elements(HOLD_OPS));

    for size in QUEUE_SIZES {
        for kind in SchedulerKind::ALL {
            group.bench_with_input(BenchmarkId::new(kind.as_str(), size), &size, |b, &size| {
                b.iter_batched(
                    || {
                        let mut rng = StdRng::seed_from_u64(2);
                        let (scheduler, uid) = filled(kind, size, &mut rng);
                        (scheduler, uid, rng)
                    },
                    |(mut scheduler, mut uid, mut rng)| {
                        for _ in 0..HOLD_OPS {
                            let next = scheduler.remove_next().expect("queue is never empty");
                            uid += 1;
                            let ts = next.key.ts + rng.gen_range(0..2 * size as u64);
                            scheduler.insert(entry(ts, uid));
                        }
                        black_box(scheduler.len())
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_hold);
criterion_main!(benches);
