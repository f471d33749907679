//! Scenario runner - builds a topology, runs it for a seed, and collects
//! per-replication reports.

use crate::scenarios::ScenarioId;
use qnet_core::{RunStats, SimResult, SimulationResult, Simulator, TracingSink};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Results from running a scenario with one seed.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// One entry per tracked system
    pub results: Vec<SimulationResult>,

    /// Run-wide counters
    pub stats: RunStats,
}

/// Mean of each metric for one system across replications.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub name: String,
    pub replications: usize,
    pub n: Option<f64>,
    pub u: Option<f64>,
    pub r: Option<f64>,
    pub x: Option<f64>,
    pub rejection_rate: Option<f64>,
}

/// Runs scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Clock end override
    duration: Option<f64>,

    /// Forward per-event records to `tracing`
    trace: bool,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            duration: None,
            trace: false,
        }
    }

    /// Overrides the scenario's clock end.
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Enables per-event tracing.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Runs a scenario and returns the report.
    pub fn run(&self, scenario: ScenarioId) -> SimResult<ScenarioReport> {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        debug!("  {}", scenario.description());

        let built = scenario.build(self.duration)?;
        for system in built.network.iter() {
            debug!(
                "  {}: {} processor(s), capacity {}, service {}, {} route(s)",
                system.name(),
                system.processors(),
                system
                    .capacity()
                    .map_or_else(|| "unbounded".to_string(), |c| c.to_string()),
                system.mean_service_time(),
                system.routes().len()
            );
        }
        let mut config = built.config;
        if self.trace {
            config = config.with_trace_sink(Arc::new(TracingSink));
        }

        let mut simulator = Simulator::seeded(built.network, config, self.seed)?;
        let results = simulator.run()?;
        let stats = simulator.stats().clone();

        info!(
            "✓ {} complete: clock={:.2}, {} events, {} external arrivals",
            scenario.name(),
            stats.final_clock,
            stats.events_processed,
            stats.external_arrivals
        );

        Ok(ScenarioReport {
            scenario,
            seed: self.seed,
            results,
            stats,
        })
    }
}

fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let defined: Vec<f64> = values.flatten().collect();
    if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    }
}

/// Averages each tracked system's metrics over replications of one scenario.
///
/// Reports are matched by position in their result lists. Undefined metrics
/// are skipped; a metric undefined in every replication stays undefined.
pub fn summarize(reports: &[ScenarioReport]) -> Vec<MetricSummary> {
    let Some(first) = reports.first() else {
        return Vec::new();
    };

    (0..first.results.len())
        .map(|i| {
            let column = || reports.iter().filter_map(move |rep| rep.results.get(i));
            MetricSummary {
                name: first.results[i].name.clone(),
                replications: column().count(),
                n: mean(column().map(|r| r.n)),
                u: mean(column().map(|r| r.u)),
                r: mean(column().map(|r| r.r)),
                x: mean(column().map(|r| r.x)),
                rejection_rate: mean(column().map(|r| r.rejection_rate)),
            }
        })
        .collect()
}
