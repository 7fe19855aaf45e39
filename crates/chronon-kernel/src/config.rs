//! Simulator construction parameters.

use chronon_scheduler::SchedulerKind;
use chronon_time::{Time, Unit};
use serde::{Deserialize, Serialize};

/// Which driver runs the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriverKind {
    /// Executes events as fast as possible.
    #[default]
    Default,
    /// Paces execution against the wall clock.
    Realtime,
}

/// How the realtime driver reacts to falling behind the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// Fall behind silently (logged at `warn` past the hard limit).
    #[default]
    BestEffort,
    /// Fail with `HardLimitExceeded` once jitter exceeds the hard limit.
    HardLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    pub mode: SyncMode,
    /// Maximum tolerated jitter between an event's timestamp and the wall
    /// clock when it starts.
    pub hard_limit: Time,
    /// Remaining waits shorter than this are spun instead of slept.
    pub spin_threshold: Time,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            mode: SyncMode::BestEffort,
            hard_limit: Time::from_millis(100),
            spin_threshold: Time::from_micros(100),
        }
    }
}

/// Everything needed to build a simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub driver: DriverKind,
    pub scheduler: SchedulerKind,
    /// Tick unit of scheduler timestamps. Fixed for the simulator's life.
    pub resolution: Unit,
    pub realtime: RealtimeConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            driver: DriverKind::Default,
            scheduler: SchedulerKind::Map,
            resolution: Unit::Ns,
            realtime: RealtimeConfig::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn with_driver(mut self, driver: DriverKind) -> Self {
        self.driver = driver;
        self
    }

    pub fn with_scheduler(mut self, scheduler: SchedulerKind) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_resolution(mut self, resolution: Unit) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_sync_mode(mut self, mode: SyncMode) -> Self {
        self.realtime.mode = mode;
        self
    }

    pub fn with_hard_limit(mut self, limit: Time) -> Self {
        self.realtime.hard_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SimulatorConfig::default();
        assert_eq!(config.scheduler, SchedulerKind::Map);
        assert_eq!(config.resolution, Unit::Ns);
        assert_eq!(config.realtime.hard_limit, Time::from_millis(100));
        assert_eq!(config.realtime.mode, SyncMode::BestEffort);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: SimulatorConfig = toml::from_str(
            r#"
            scheduler = "ns2-calendar"
            resolution = "us"

            [realtime]
            mode = "hard-limit"
            hard_limit = "1ms"
            "#,
        )
        .unwrap();
        assert_eq!(config.driver, DriverKind::Default);
        assert_eq!(config.scheduler, SchedulerKind::Ns2Calendar);
        assert_eq!(config.resolution, Unit::Us);
        assert_eq!(config.realtime.mode, SyncMode::HardLimit);
        assert_eq!(config.realtime.hard_limit, Time::from_millis(1));
        assert_eq!(config.realtime.spin_threshold, Time::from_micros(100));
    }
}
