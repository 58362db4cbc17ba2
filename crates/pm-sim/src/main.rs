//! pocketmix scenario runner
//!
//! Usage:
//!   pocketmix-sim --scenario scenarios/demo.json
//!   pocketmix-sim --scenario scenarios/demo.json --dt 0.02 --duration 30 --seed 7
//!   pocketmix-sim --scenario scenarios/demo.json --json

mod scenario;
mod simulation;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pm_core::SoundCategory;

use crate::scenario::Scenario;
use crate::simulation::{Report, Simulation};

#[derive(Parser)]
#[command(name = "pocketmix-sim", about = "Run a pocketmix playback scenario headlessly")]
struct Cli {
    /// Scenario JSON file
    #[arg(short, long)]
    scenario: PathBuf,

    /// Frame delta in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Override the scenario duration (seconds)
    #[arg(short, long)]
    duration: Option<f32>,

    /// Seed for random clip and pitch selection
    #[arg(long)]
    seed: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging (RUST_LOG still takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let scenario = Scenario::from_file(&cli.scenario)?;
    log::info!("Loaded scenario {}", cli.scenario.display());

    let report = Simulation::new(&scenario, cli.seed)?.run(cli.dt, cli.duration)?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
        println!("{}", json);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn print_report(report: &Report) {
    let stats = &report.final_stats;

    println!("Simulated {:.2}s in {} frames", report.simulated_seconds, report.frames);
    println!("Events applied: {}", report.events_applied);
    println!();
    println!("{:<10} {:>6} {:>6}", "category", "peak", "active");
    for category in SoundCategory::ALL {
        println!(
            "{:<10} {:>6} {:>6}",
            category.name(),
            report.peak(category),
            stats.active(category)
        );
    }
    println!();
    println!(
        "Instances: {} created, {} reused, {} pooled",
        stats.instances_created, stats.instances_reused, stats.pooled_instances
    );
    println!(
        "Outputs:   {} created, {} reused, {} pooled, {} live, {} destroyed",
        stats.outputs_created,
        stats.outputs_reused,
        stats.pooled_outputs,
        report.outputs_live,
        report.outputs_destroyed
    );

    if !report.sequencers.is_empty() {
        println!();
        for s in &report.sequencers {
            println!(
                "sequencer '{}': {:?}, next {}, tracking {}",
                s.name, s.state, s.next_index, s.tracked
            );
        }
    }

    if !report.errors.is_empty() {
        println!();
        println!("{} command(s) failed:", report.errors.len());
        for e in &report.errors {
            println!("  {}", e);
        }
    }
}
