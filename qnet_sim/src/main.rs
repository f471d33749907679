//! qnet simulator CLI
//!
//! Run queueing network scenarios over one or more seeds and print the
//! per-system metrics.

use anyhow::{bail, Context};
use clap::Parser;
use qnet_sim::scenarios::ScenarioId;
use qnet_sim::{summarize, ScenarioReport, ScenarioRunner};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Queueing network simulator
#[derive(Parser, Debug)]
#[command(name = "qnet-sim")]
#[command(about = "Simulate queueing networks and estimate N, U, R, X", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (loss_system, tandem, multi_server, split, feedback, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of replications, seeded seed, seed+1, ...
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Override the scenario's clock end
    #[arg(short, long)]
    duration: Option<f64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log every arrival, service start, departure and hand-off
    #[arg(long)]
    trace: bool,

    /// JSON output for scripting
    #[arg(long)]
    json: bool,
}

/// Level used when `RUST_LOG` is unset.
fn default_log_level(args: &Args) -> &'static str {
    if args.verbose || args.trace {
        "debug"
    } else {
        "info"
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging; RUST_LOG overrides the flag-derived level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(&args)));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    if args.seeds == 0 {
        bail!("--seeds must be at least 1");
    }

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().map_err(anyhow::Error::msg)?]
    };

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .context("System clock before UNIX epoch")?
            .as_nanos() as u64
    } else {
        args.seed
    };

    if !args.json {
        info!("qnet simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let mut summary = Vec::new();
    let mut failed_count = 0;

    for scenario in &scenarios {
        let mut reports: Vec<ScenarioReport> = Vec::new();

        for seed_offset in 0..args.seeds {
            let seed = base_seed.wrapping_add(seed_offset as u64);

            let mut runner = ScenarioRunner::new(seed).with_trace(args.trace);
            if let Some(duration) = args.duration {
                runner = runner.with_duration(duration);
            }

            match runner.run(*scenario) {
                Ok(report) => {
                    if !args.json {
                        for result in &report.results {
                            info!("  {}", result);
                        }
                    }
                    reports.push(report);
                }
                Err(e) => {
                    error!("✗ {} (seed={}) FAILED: {}", scenario.name(), seed, e);
                    failed_count += 1;
                }
            }
        }

        let averaged = summarize(&reports);
        if !args.json && reports.len() > 1 {
            info!("  mean over {} replications:", reports.len());
            for m in &averaged {
                info!(
                    "    {}: N={:?} U={:?} R={:?} X={:?} rejected={:?}",
                    m.name, m.n, m.u, m.r, m.x, m.rejection_rate
                );
            }
        }

        summary.push(serde_json::json!({
            "scenario": scenario.name(),
            "description": scenario.description(),
            "replications": reports.iter().map(|r| {
                serde_json::json!({
                    "seed": r.seed,
                    "stats": r.stats,
                    "results": r.results,
                })
            }).collect::<Vec<_>>(),
            "mean": averaged,
        }));
    }

    if args.json {
        let output = serde_json::json!({
            "base_seed": base_seed,
            "failed": failed_count,
            "scenarios": summary,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        if failed_count == 0 {
            info!("✅ All {} runs completed", scenarios.len() * args.seeds);
        } else {
            error!("❌ {} runs failed", failed_count);
        }
    }

    if failed_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}
