//! Single workload run.

use anyhow::{Context, Result};
use chronon_bench::{HoldModel, HoldReport};
use chronon_config::ChrononConfig;
use chronon_kernel::{SimulatorImpl, build_simulator};

pub fn run(config: &ChrononConfig, json: bool) -> Result<()> {
    let model = HoldModel::from(&config.workload);
    let mut sim = build_simulator(&config.simulator).context("Failed to build simulator")?;

    tracing::info!(
        driver = ?config.simulator.driver,
        scheduler = %config.simulator.scheduler,
        events = model.events,
        "running hold model"
    );
    let result = model.run(sim.as_mut());
    sim.destroy();
    let report = result.context("Simulation failed")?;

    if json {
        println!("{}", to_json(&report));
    } else {
        print_report(&report);
    }
    Ok(())
}

fn to_json(report: &HoldReport) -> serde_json::Value {
    let mut value = serde_json::json!({
        "scheduler": report.scheduler.as_str(),
        "executed": report.executed,
        "final_time": report.final_time.to_string(),
        "digest": format!("{:016x}", report.digest),
        "elapsed_ms": report.elapsed.as_secs_f64() * 1000.0,
        "events_per_sec": report.events_per_sec(),
    });
    if !report.lateness.is_empty() {
        value["lateness"] = serde_json::from_str(&report.lateness.to_json("lateness"))
            .unwrap_or(serde_json::Value::Null);
    }
    value
}

fn print_report(report: &HoldReport) {
    println!("Scheduler:      {}", report.scheduler);
    println!("Events:         {}", report.executed);
    println!("Simulated time: {}", report.final_time);
    println!("Wall time:      {:.3} ms", report.elapsed.as_secs_f64() * 1000.0);
    println!("Throughput:     {:.0} events/s", report.events_per_sec());
    println!("Digest:         {:016x}", report.digest);
    if !report.lateness.is_empty() {
        println!();
        report.lateness.print_summary("Realtime");
    }
}
