//! peak_hour — run one warehouse scenario end to end.
//!
//! Loads a scenario from JSON (or picks a built-in preset), launches it on a
//! `ScenarioEngine`, prints a line per emitted tick, and records packages,
//! claims, and timeline events as CSV under `--output`.
//!
//! ```text
//! cargo run -p peak_hour -- --preset "Robot Outage" --output ./out
//! RUST_LOG=wh_sim=debug cargo run -p peak_hour -- --scenario my_floor.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wh_engine::ScenarioEngine;
use wh_output::{CsvRecorder, RecorderHooks};
use wh_sim::{RunTick, ScenarioConfig};

#[derive(Parser, Debug)]
#[command(name = "peak_hour", about = "Run a warehouse AGV scenario and record it")]
struct Args {
    /// Scenario JSON file; overrides `--preset`.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Built-in preset name (case-insensitive).
    #[arg(long, default_value = "Peak Hour")]
    preset: String,

    /// Directory for packages.csv, reservations.csv, events.csv.
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Override the run horizon in minutes.
    #[arg(long)]
    minutes: Option<f64>,

    /// Fix the scenario seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
}

fn load_scenario(path: &Path) -> Result<ScenarioConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn print_tick(tick: &RunTick) {
    let m = &tick.metrics;
    println!(
        "[{:>7.1}s] {:<10} delivered {:>4}/{:<4} queue {:>3}  active {:>2}  util {:>5.1}%  faults {:>4.1}%  tput {:>6.1}/h  sla {:>3}",
        tick.elapsed_seconds,
        tick.stage.as_str(),
        m.delivered,
        m.spawned,
        m.queue_depth,
        m.active_robots,
        m.utilization * 100.0,
        m.fault_ratio * 100.0,
        m.throughput_per_hour,
        m.sla_breaches,
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let engine = ScenarioEngine::default();

    // 1. Resolve the scenario.
    let mut config = match &args.scenario {
        Some(path) => load_scenario(path)?,
        None => {
            engine
                .find_scenario(&args.preset)
                .ok_or_else(|| anyhow!("unknown preset {:?}", args.preset))?
                .config
        }
    };
    if let Some(minutes) = args.minutes {
        config.horizon.duration_minutes = minutes;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    let scenario = engine.create_scenario(config)?;

    println!("=== peak_hour — warehouse fleet simulation ===");
    println!(
        "Scenario: {}  |  {}x{} grid  |  {} robots  |  {:.1} min horizon",
        scenario.config.name,
        scenario.config.layout.width,
        scenario.config.layout.height,
        scenario.config.fleet.total_robots,
        scenario.config.horizon.duration_minutes,
    );
    println!();

    // 2. Launch with CSV recording.
    let hooks = RecorderHooks::new(CsvRecorder::new(&args.output)?);
    let errors = hooks.error_slot();
    let run = engine.launch_run_with_hooks(scenario.id, Box::new(hooks))?;
    let mut ticks = engine.subscribe(run.id)?;

    // 3. Stream until the run ends; Ctrl-C cancels cooperatively.
    loop {
        tokio::select! {
            tick = ticks.next_tick() => match tick {
                Some(tick) => print_tick(&tick),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!("Cancelling…");
                engine.cancel_run(run.id).await?;
            }
        }
    }

    // 4. Summary.
    let finished = engine.get_run(run.id)?;
    let timeline = engine.get_timeline(run.id)?;
    println!();
    println!("Run {}: {}", finished.id, finished.stage);
    if let Some(error) = &finished.error {
        println!("  error: {error}");
    }
    println!(
        "  delivered {}  |  SLA breaches {}  |  avg cycle {:.1}s  |  {} timeline events",
        finished.metrics.delivered,
        finished.metrics.sla_breaches,
        finished.metrics.average_cycle_time_seconds,
        timeline.len(),
    );
    let hottest = finished.heatmap.iter().max_by_key(|(_, visits)| *visits);
    if let Some((cell, visits)) = hottest {
        println!("  busiest cell {cell} ({visits} visits)");
    }

    if let Some(e) = errors.take() {
        eprintln!("output error: {e}");
    }
    println!("Output written to {}", args.output.display());
    Ok(())
}
