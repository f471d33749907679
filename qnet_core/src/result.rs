//! Performance metrics derived at the end of a run.

use crate::system::QueueingSystem;
use crate::types::SystemId;
use serde::{Deserialize, Serialize};

/// Steady-state estimates for one tracked system.
///
/// A metric is `None` when its denominator is zero, e.g. `r` before any job
/// completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub system: SystemId,
    pub name: String,

    /// Mean jobs in system.
    pub n: Option<f64>,

    /// Utilization: busy time over aggregate processor time.
    pub u: Option<f64>,

    /// Mean residence time.
    pub r: Option<f64>,

    /// Throughput: completed jobs per unit time.
    pub x: Option<f64>,

    /// Fraction of arrivals that were rejected.
    pub rejection_rate: Option<f64>,

    pub completed_jobs: u64,
    pub rejected_jobs: u64,
    pub busy_time: f64,
    pub jobs_integral: f64,

    /// Length of the realized observation window.
    pub observation_time: f64,
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

impl SimulationResult {
    /// Derives metrics from a system's accumulated counters.
    pub fn derive(system: &QueueingSystem, observation_time: f64) -> Self {
        let completed = system.completed_jobs() as f64;
        let rejected = system.rejected_jobs() as f64;
        let integral = system.jobs_integral();
        let busy = system.busy_time();

        Self {
            system: system.id(),
            name: system.name().to_string(),
            n: ratio(integral, observation_time),
            u: ratio(busy, observation_time * system.processors() as f64),
            r: ratio(integral, completed),
            x: ratio(completed, observation_time),
            rejection_rate: ratio(rejected, completed + rejected),
            completed_jobs: system.completed_jobs(),
            rejected_jobs: system.rejected_jobs(),
            busy_time: busy,
            jobs_integral: integral,
            observation_time,
        }
    }
}

impl std::fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn metric(value: Option<f64>) -> String {
            value.map_or_else(|| "undefined".to_string(), |v| format!("{:.6}", v))
        }
        write!(
            f,
            "{}: N={} U={} R={} X={} rejected={}",
            self.name,
            metric(self.n),
            metric(self.u),
            metric(self.r),
            metric(self.x),
            metric(self.rejection_rate),
        )
    }
}
