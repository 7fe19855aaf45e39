//! Configuration loader with multi-source merging

use crate::{ChrononConfig, Paths};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    user_config: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "CHRONON".to_string(),
            user_config: true,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "CHRONON")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip ~/.config/chronon/config.toml
    pub fn without_user_config(mut self) -> Self {
        self.user_config = false;
        self
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<ChrononConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = ChrononConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. User config (~/.config/chronon/config.toml)
        if self.user_config {
            if let Ok(user_config_file) = Paths::new().user_config_file() {
                if user_config_file.exists() {
                    builder = builder.add_source(
                        config::File::from(user_config_file)
                            .required(false)
                            .format(config::FileFormat::Toml),
                    );
                }
            }
        }

        // 3. Project config (chronon.toml)
        let project_config_file = Paths::project_config_file(&self.project_dir);
        if project_config_file.exists() {
            builder = builder.add_source(
                config::File::from(project_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 4. Local config (chronon.local.toml)
        let local_config_file = Paths::local_config_file(&self.project_dir);
        if local_config_file.exists() {
            builder = builder.add_source(
                config::File::from(local_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Environment variables (CHRONON_SIMULATOR__SCHEDULER=heap).
        // Field names contain underscores, so nesting uses a double one.
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let chronon_config: ChrononConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        chronon_config
            .validate()
            .context("Configuration failed validation")?;

        Ok(chronon_config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default(self) -> ChrononConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronon_kernel::{DriverKind, SyncMode};
    use chronon_scheduler::SchedulerKind;
    use chronon_time::{Time, Unit};
    use std::fs;
    use tempfile::tempdir;

    fn loader(dir: &Path) -> ConfigLoader {
        ConfigLoader::new()
            .with_project_dir(dir)
            .with_env_prefix("CHRONON_LOADER_TEST_UNSET")
            .without_user_config()
    }

    #[test]
    fn test_load_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = loader(temp_dir.path())
            .load()
            .expect("Failed to load config");

        assert_eq!(config.simulator.scheduler, SchedulerKind::Map);
        assert_eq!(config.simulator.resolution, Unit::Ns);
        assert_eq!(config.workload.population, 1_000);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config_content = r#"
[simulator]
driver = "realtime"
scheduler = "calendar"
resolution = "ps"

[simulator.realtime]
mode = "hard-limit"
hard_limit = "5ms"

[workload]
population = 64
events = 10000
mean_delay = "250us"
seed = 7
"#;
        fs::write(project_dir.join("chronon.toml"), config_content)
            .expect("Failed to write config");

        let config = loader(project_dir).load().expect("Failed to load config");

        assert_eq!(config.simulator.driver, DriverKind::Realtime);
        assert_eq!(config.simulator.scheduler, SchedulerKind::Calendar);
        assert_eq!(config.simulator.resolution, Unit::Ps);
        assert_eq!(config.simulator.realtime.mode, SyncMode::HardLimit);
        assert_eq!(config.simulator.realtime.hard_limit, Time::from_millis(5));
        assert_eq!(config.workload.population, 64);
        assert_eq!(config.workload.events, 10_000);
        assert_eq!(config.workload.mean_delay, Time::from_micros(250));
        assert_eq!(config.workload.seed, 7);
    }

    #[test]
    fn test_local_overrides() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("chronon.toml"),
            r#"
[simulator]
scheduler = "heap"
"#,
        )
        .expect("Failed to write project config");

        fs::write(
            project_dir.join("chronon.local.toml"),
            r#"
[simulator]
scheduler = "ns2-calendar"
"#,
        )
        .expect("Failed to write local config");

        let config = loader(project_dir).load().expect("Failed to load config");

        assert_eq!(config.simulator.scheduler, SchedulerKind::Ns2Calendar);
    }

    #[test]
    fn test_invalid_resolution_is_rejected() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("chronon.toml"),
            "[simulator]\nresolution = \"min\"\n",
        )
        .expect("Failed to write config");

        assert!(loader(project_dir).load().is_err());
        assert_eq!(
            loader(project_dir).load_or_default().simulator.resolution,
            Unit::Ns
        );
    }

    // Environment overrides are not exercised here: variables are process
    // global and tests run in parallel. In use:
    //
    // CHRONON_SIMULATOR__SCHEDULER=heap
    // CHRONON_WORKLOAD__SEED=42
}
