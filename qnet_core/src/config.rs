//! Run parameters for a simulation.

use crate::error::{SimError, SimResult};
use crate::network::Network;
use crate::trace::TraceSink;
use crate::types::SystemId;
use std::sync::Arc;

/// Configuration for one simulation run.
#[derive(Clone)]
pub struct SimulationConfig {
    /// Clock value at which the run starts and the first arrival fires.
    pub clock_start: f64,

    /// The loop stops once the clock reaches this value.
    pub clock_end: f64,

    /// Mean of the exponential interarrival time of external jobs.
    pub mean_interarrival_time: f64,

    /// System receiving external arrivals.
    pub entry_point: SystemId,

    /// Systems whose statistics are accrued and reported, in result order.
    pub tracked_systems: Vec<SystemId>,

    /// Optional receiver of per-event trace records.
    pub trace_sink: Option<Arc<dyn TraceSink>>,
}

impl SimulationConfig {
    /// Creates a config with default clock window `[0, 1000)`, mean
    /// interarrival time 1, tracking only the entry point.
    pub fn new(entry_point: SystemId) -> Self {
        Self {
            clock_start: 0.0,
            clock_end: 1000.0,
            mean_interarrival_time: 1.0,
            entry_point,
            tracked_systems: vec![entry_point],
            trace_sink: None,
        }
    }

    /// Sets the clock window.
    pub fn with_clock(mut self, start: f64, end: f64) -> Self {
        self.clock_start = start;
        self.clock_end = end;
        self
    }

    /// Sets the end of the clock window.
    pub fn with_clock_end(mut self, end: f64) -> Self {
        self.clock_end = end;
        self
    }

    /// Sets the mean interarrival time of external jobs.
    pub fn with_mean_interarrival_time(mut self, mean: f64) -> Self {
        self.mean_interarrival_time = mean;
        self
    }

    /// Replaces the tracked systems.
    pub fn with_tracked(mut self, systems: Vec<SystemId>) -> Self {
        self.tracked_systems = systems;
        self
    }

    /// Installs a trace sink.
    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = Some(sink);
        self
    }

    /// Checks the parameters against the network they will run on.
    pub fn validate(&self, network: &Network) -> SimResult<()> {
        if !self.clock_start.is_finite() || self.clock_start < 0.0 {
            return Err(SimError::config(format!(
                "clock start {} must be finite and non-negative",
                self.clock_start
            )));
        }
        if !self.clock_end.is_finite() || self.clock_end <= self.clock_start {
            return Err(SimError::config(format!(
                "clock end {} must be finite and after clock start {}",
                self.clock_end, self.clock_start
            )));
        }
        if !self.mean_interarrival_time.is_finite() || self.mean_interarrival_time <= 0.0 {
            return Err(SimError::config(format!(
                "mean interarrival time {} must be positive",
                self.mean_interarrival_time
            )));
        }
        if !network.contains(self.entry_point) {
            return Err(SimError::config(format!(
                "entry point {} is not in the network",
                self.entry_point
            )));
        }
        if let Some(missing) = self
            .tracked_systems
            .iter()
            .find(|id| !network.contains(**id))
        {
            return Err(SimError::config(format!(
                "tracked system {} is not in the network",
                missing
            )));
        }
        for (i, id) in self.tracked_systems.iter().enumerate() {
            if self.tracked_systems[..i].contains(id) {
                return Err(SimError::config(format!("system {} is tracked twice", id)));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for SimulationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationConfig")
            .field("clock_start", &self.clock_start)
            .field("clock_end", &self.clock_end)
            .field("mean_interarrival_time", &self.mean_interarrival_time)
            .field("entry_point", &self.entry_point)
            .field("tracked_systems", &self.tracked_systems)
            .field("trace_sink", &self.trace_sink.is_some())
            .finish()
    }
}
