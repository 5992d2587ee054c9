//! A/B Simulation Example
//!
//! Simulates ten null-effect experiments, runs the sequential Bayesian test
//! on each, and reports how many resolved and how quickly.
//!
//! Run with: RUST_LOG=trueno_ab=info cargo run --example ab_simulation

use anyhow::Context;
use chrono::NaiveDate;
use tracing_subscriber::EnvFilter;
use trueno_ab::batch::{BatchRunner, DEFAULT_SIMULATION_RUNS};
use trueno_ab::config::ExperimentConfig;
use trueno_ab::synthetic::SyntheticExperiment;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Trueno-AB Sequential Simulation ===\n");

    // Inputs as a front end would collect them (percentages).
    let baseline_cr = 10.0;
    let mde = 1.0;
    let daily_traffic = 100;
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).context("invalid start date")?;

    // -------------------------------------------------------------------------
    // 1. Configure the test: ROPE = +/- MDE
    // -------------------------------------------------------------------------
    let config = ExperimentConfig::builder()
        .rope(-mde / 100.0, mde / 100.0)
        .seed(2024)
        .build()?;
    println!("1. Config: {}", config.to_json()?);

    // -------------------------------------------------------------------------
    // 2. Simulate and run
    // -------------------------------------------------------------------------
    let sim = SyntheticExperiment::null_effect(baseline_cr / 100.0, daily_traffic, start)
        .with_seed(7);
    let outcome = BatchRunner::new(config)?.simulate(&sim, DEFAULT_SIMULATION_RUNS);

    println!("\n2. Runs:");
    for entry in outcome.entries() {
        match &entry.log {
            Some(log) => println!(
                "   {} {:?}: {} days, ROPE {:.3}, sample size {:.0}",
                entry.record.run_id(),
                log.decision().reason,
                log.len(),
                log.last().map_or(f64::NAN, |r| r.region_fraction()),
                log.total_sample_size()
            ),
            None => println!(
                "   {} failed: {}",
                entry.record.run_id(),
                entry.record.error().unwrap_or("unknown error")
            ),
        }
    }

    // -------------------------------------------------------------------------
    // 3. Summary
    // -------------------------------------------------------------------------
    let summary = outcome.summary();
    println!("\n3. Summary:");
    match (summary.average_sample_size, summary.average_days) {
        (Some(size), Some(days)) => {
            println!("   Average sample size to resolve: {size:.0}");
            println!("   Average days to resolve: {days:.1}");
        }
        _ => println!(
            "   No experiment reached statistical significance within the given parameters."
        ),
    }
    println!("   {}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
