//! Hold-model workload.
//!
//! A fixed population of events is kept pending: every event, when it
//! runs, schedules one replacement at a uniformly random delay in
//! `[0, 2 * mean_delay]`. The run stops after a fixed number of events.
//! Each execution is folded into an order digest, so runs over different
//! schedulers can be compared for identical behaviour.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use chronon_config::WorkloadConfig;
use chronon_kernel::{KernelError, SimulatorConfig, SimulatorImpl, build_simulator, make_event};
use chronon_scheduler::SchedulerKind;
use chronon_time::{Time, Unit};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::LatencyTracker;

/// Parameters of a hold-model run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldModel {
    pub population: usize,
    pub events: u64,
    pub mean_delay: Time,
    pub seed: u64,
}

impl Default for HoldModel {
    fn default() -> Self {
        Self::from(&WorkloadConfig::default())
    }
}

impl From<&WorkloadConfig> for HoldModel {
    fn from(config: &WorkloadConfig) -> Self {
        Self {
            population: config.population,
            events: config.events,
            mean_delay: config.mean_delay,
            seed: config.seed,
        }
    }
}

/// Outcome of one hold-model run.
#[derive(Debug, Clone)]
pub struct HoldReport {
    pub scheduler: SchedulerKind,
    pub executed: u64,
    /// Simulation time when the run stopped.
    pub final_time: Time,
    /// FNV-1a over `(label, timestamp)` of every executed event.
    pub digest: u64,
    /// Wall time spent inside `run`.
    pub elapsed: Duration,
    /// How far the wall clock was past each event's timestamp. Only
    /// populated by the realtime driver.
    pub lateness: LatencyTracker,
}

impl HoldReport {
    pub fn events_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.executed as f64 / secs
    }
}

struct HoldState {
    rng: StdRng,
    resolution: Unit,
    max_ticks: u64,
    next_label: u64,
    executed: u64,
    target: u64,
    digest: Fnv1a,
    lateness: LatencyTracker,
    error: Option<KernelError>,
}

impl HoldModel {
    pub fn with_events(mut self, events: u64) -> Self {
        self.events = events;
        self
    }

    pub fn with_population(mut self, population: usize) -> Self {
        self.population = population;
        self
    }

    /// Seeds `sim` with the population and runs it until `events` events
    /// have executed.
    pub fn run(&self, sim: &mut dyn SimulatorImpl) -> Result<HoldReport, KernelError> {
        let resolution = sim.resolution();
        let max_ticks = self.mean_delay.to_ticks(resolution)?.saturating_mul(2);
        let state = Rc::new(RefCell::new(HoldState {
            rng: StdRng::seed_from_u64(self.seed),
            resolution,
            max_ticks,
            next_label: 0,
            executed: 0,
            target: self.events,
            digest: Fnv1a::new(),
            lateness: LatencyTracker::new(),
            error: None,
        }));

        if self.events > 0 {
            for _ in 0..self.population {
                schedule_next(sim, &state)?;
            }
        }

        tracing::debug!(
            scheduler = %sim.scheduler_kind(),
            population = self.population,
            events = self.events,
            "starting hold model"
        );
        let start = Instant::now();
        sim.run()?;
        let elapsed = start.elapsed();

        let mut state = state.borrow_mut();
        if let Some(err) = state.error.take() {
            return Err(err);
        }
        Ok(HoldReport {
            scheduler: sim.scheduler_kind(),
            executed: state.executed,
            final_time: sim.now(),
            digest: state.digest.finish(),
            elapsed,
            lateness: std::mem::take(&mut state.lateness),
        })
    }
}

fn schedule_next(
    sim: &mut dyn SimulatorImpl,
    state: &Rc<RefCell<HoldState>>,
) -> Result<(), KernelError> {
    let (delay, label) = {
        let mut guard = state.borrow_mut();
        let s = &mut *guard;
        let ticks = s.rng.gen_range(0..=s.max_ticks);
        let label = s.next_label;
        s.next_label += 1;
        (Time::from_ticks(ticks, s.resolution), label)
    };
    let state = Rc::clone(state);
    sim.schedule(delay, make_event(move |sim| on_event(sim, &state, label)))?;
    Ok(())
}

fn on_event(sim: &mut dyn SimulatorImpl, state: &Rc<RefCell<HoldState>>, label: u64) {
    let now = sim.now();
    let lateness = sim.as_realtime().map(|rt| rt.realtime_now() - now);

    let done = {
        let mut s = state.borrow_mut();
        s.executed += 1;
        s.digest.write_u64(label);
        s.digest.write_u128(now.as_femtos().cast_unsigned());
        if let Some(lateness) = lateness {
            s.lateness.record_time(lateness);
        }
        s.executed >= s.target
    };
    if done {
        sim.stop();
        return;
    }
    if let Err(err) = schedule_next(sim, state) {
        state.borrow_mut().error = Some(err);
        sim.stop();
    }
}

/// Runs `model` once per scheduler kind, each on a fresh simulator built
/// from `config`.
pub fn compare_schedulers(
    config: &SimulatorConfig,
    model: &HoldModel,
) -> Result<Vec<HoldReport>, KernelError> {
    SchedulerKind::ALL
        .iter()
        .map(|&kind| {
            let mut sim = build_simulator(&config.clone().with_scheduler(kind))?;
            let report = model.run(sim.as_mut());
            sim.destroy();
            report
        })
        .collect()
}

/// True when every report executed the same events in the same order.
pub fn digests_agree(reports: &[HoldReport]) -> bool {
    reports
        .windows(2)
        .all(|pair| pair[0].digest == pair[1].digest && pair[0].executed == pair[1].executed)
}

// ============================================================================
// Digest
// ============================================================================

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

struct Fnv1a(u64);

impl Fnv1a {
    fn new() -> Self {
        Self(FNV_OFFSET)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= u64::from(b);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    fn write_u128(&mut self, v: u128) {
        self.write(&v.to_le_bytes());
    }

    fn finish(&self) -> u64 {
        self.0
    }
}
