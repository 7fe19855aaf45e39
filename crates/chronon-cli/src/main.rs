//! chronon command-line driver.
//!
//! # Quick Start
//!
//! ```bash
//! # Run the hold-model workload with the configured scheduler
//! chronon run
//!
//! # Same workload on the heap scheduler, paced against the wall clock
//! chronon run --scheduler heap --driver realtime --events 10000
//!
//! # Verify every scheduler executes the workload identically
//! chronon compare
//!
//! # Print the merged configuration
//! chronon config show
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chronon_config::{ChrononConfig, ConfigLoader};
use chronon_kernel::{DriverKind, SyncMode};
use chronon_scheduler::SchedulerKind;
use chronon_time::Time;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// chronon - a discrete-event simulation kernel.
#[derive(Parser)]
#[command(name = "chronon")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory holding chronon.toml.
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the hold-model workload once.
    Run {
        #[command(flatten)]
        overrides: Overrides,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run the workload on every scheduler and check they agree.
    Compare {
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the merged configuration.
    Show {
        /// Output format.
        #[arg(short, long, value_enum, default_value = "toml")]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Toml,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum DriverArg {
    Default,
    Realtime,
}

impl From<DriverArg> for DriverKind {
    fn from(arg: DriverArg) -> Self {
        match arg {
            DriverArg::Default => DriverKind::Default,
            DriverArg::Realtime => DriverKind::Realtime,
        }
    }
}

/// Flags layered over the loaded configuration.
#[derive(Args)]
struct Overrides {
    /// Scheduler (list, map, heap, calendar, ns2-calendar).
    #[arg(short, long)]
    scheduler: Option<SchedulerKind>,

    /// Simulator driver.
    #[arg(short, long, value_enum)]
    driver: Option<DriverArg>,

    /// Events to execute.
    #[arg(short, long)]
    events: Option<u64>,

    /// Events kept pending.
    #[arg(long)]
    population: Option<usize>,

    /// Mean reschedule delay (e.g. 100us).
    #[arg(long)]
    mean_delay: Option<Time>,

    /// Workload RNG seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Fail when the realtime driver falls further behind than this.
    #[arg(long)]
    hard_limit: Option<Time>,
}

impl Overrides {
    fn apply(self, config: &mut ChrononConfig) {
        if let Some(scheduler) = self.scheduler {
            config.simulator.scheduler = scheduler;
        }
        if let Some(driver) = self.driver {
            config.simulator.driver = driver.into();
        }
        if let Some(events) = self.events {
            config.workload.events = events;
        }
        if let Some(population) = self.population {
            config.workload.population = population;
        }
        if let Some(mean_delay) = self.mean_delay {
            config.workload.mean_delay = mean_delay;
        }
        if let Some(seed) = self.seed {
            config.workload.seed = seed;
        }
        if let Some(limit) = self.hard_limit {
            config.simulator.realtime.hard_limit = limit;
            config.simulator.realtime.mode = SyncMode::HardLimit;
        }
    }
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::new()
        .with_project_dir(&cli.project)
        .load()
        .context("Failed to load configuration")?;

    init_logging(&config.logging.filter);

    match cli.command {
        Commands::Run { overrides, json } => {
            overrides.apply(&mut config);
            config.validate()?;
            commands::run::run(&config, json)
        }
        Commands::Compare { overrides } => {
            overrides.apply(&mut config);
            config.validate()?;
            commands::compare::run(&config)
        }
        Commands::Config(ConfigCommands::Show { format }) => match format {
            Format::Toml => commands::config::show_toml(&config),
            Format::Json => commands::config::show_json(&config),
        },
    }
}
