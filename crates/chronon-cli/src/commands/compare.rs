//! Cross-scheduler comparison.

use anyhow::{Context, Result, bail};
use chronon_bench::{HoldModel, compare_schedulers, digests_agree};
use chronon_config::ChrononConfig;

pub fn run(config: &ChrononConfig) -> Result<()> {
    let model = HoldModel::from(&config.workload);
    let reports =
        compare_schedulers(&config.simulator, &model).context("Simulation failed")?;

    println!(
        "{:<14} {:>10} {:>14} {:>16}",
        "scheduler", "events", "events/s", "digest"
    );
    for report in &reports {
        println!(
            "{:<14} {:>10} {:>14.0} {:>16x}",
            report.scheduler.as_str(),
            report.executed,
            report.events_per_sec(),
            report.digest
        );
    }

    if !digests_agree(&reports) {
        bail!("schedulers disagree on execution order");
    }
    println!("\nAll {} schedulers agree.", reports.len());
    Ok(())
}
