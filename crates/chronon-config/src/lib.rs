//! Configuration management for chronon
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. CLI arguments (highest precedence, applied by the binary)
//! 2. Environment variables (CHRONON_* prefix, `__` between sections)
//! 3. chronon.local.toml (gitignored, local overrides)
//! 4. chronon.toml (git-tracked, project config)
//! 5. ~/.config/chronon/config.toml (user defaults)
//! 6. Built-in defaults (lowest precedence)

use anyhow::Result;
use chronon_kernel::SimulatorConfig;
use chronon_time::Time;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::{LOCAL_CONFIG_FILE, PROJECT_CONFIG_FILE, Paths};

/// Main chronon configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChrononConfig {
    pub simulator: SimulatorConfig,
    pub workload: WorkloadConfig,
    pub logging: LoggingConfig,
}

/// Parameters of the hold-model workload run by `chronon run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Events kept pending at all times.
    pub population: usize,
    /// Events executed before the run stops.
    pub events: u64,
    /// Mean of the uniform delay each event reschedules itself with.
    pub mean_delay: Time,
    pub seed: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            population: 1_000,
            events: 100_000,
            mean_delay: Time::from_micros(100),
            seed: 0x00c0_ffee,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl ChrononConfig {
    /// Load configuration from all sources
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from a specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Checks constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let resolution = self.simulator.resolution;
        if !resolution.is_resolution() {
            return Err(ConfigError::ValidationError(format!(
                "simulator.resolution must be s or finer, got {resolution}"
            )));
        }
        if self.workload.population == 0 {
            return Err(ConfigError::ValidationError(
                "workload.population must be at least 1".to_string(),
            ));
        }
        if self.workload.mean_delay.is_strictly_negative() {
            return Err(ConfigError::ValidationError(format!(
                "workload.mean_delay must not be negative, got {}",
                self.workload.mean_delay
            )));
        }
        if self.simulator.realtime.hard_limit.is_strictly_negative() {
            return Err(ConfigError::ValidationError(
                "simulator.realtime.hard_limit must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Renders the configuration as it would appear in `chronon.toml`.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
