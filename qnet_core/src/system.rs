//! A single queueing system: processors, buffer, statistics and routing.

use crate::error::{SimError, SimResult};
use crate::rng::RandomStream;
use crate::types::SystemId;

/// Slack allowed when checking that routing probabilities sum to at most 1.
pub const ROUTING_TOLERANCE: f64 = 1e-9;

/// Parameters for declaring a system.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSpec {
    /// Label used in traces and results. Defaults to the handle (`S0`, `S1`, ...).
    pub name: Option<String>,

    /// Number of parallel processors (at least 1).
    pub processors: usize,

    /// Maximum jobs held, queued plus in service. `None` is unbounded.
    pub capacity: Option<u64>,

    /// Mean of the exponential service time.
    pub mean_service_time: f64,
}

impl Default for SystemSpec {
    fn default() -> Self {
        Self {
            name: None,
            processors: 1,
            capacity: None,
            mean_service_time: 1.0,
        }
    }
}

impl SystemSpec {
    /// Creates a single-processor, unbounded spec with the given mean service time.
    pub fn new(mean_service_time: f64) -> Self {
        Self {
            mean_service_time,
            ..Default::default()
        }
    }

    /// Sets the label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the processor count.
    pub fn with_processors(mut self, processors: usize) -> Self {
        self.processors = processors;
        self
    }

    /// Bounds the number of jobs the system may hold.
    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

/// One entry of a routing table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route {
    /// Downstream system.
    pub target: SystemId,

    /// Probability that a completed job goes to `target`.
    pub probability: f64,
}

/// Checks that probabilities are finite, non-negative, and sum to at most 1.
pub(crate) fn validate_routes(system: SystemId, routes: &[Route]) -> SimResult<()> {
    let mut total = 0.0;
    for route in routes {
        if !route.probability.is_finite() || route.probability < 0.0 {
            return Err(SimError::invalid_routing(
                system,
                format!("probability {} to {} is not in [0, 1]", route.probability, route.target),
            ));
        }
        total += route.probability;
    }
    if total > 1.0 + ROUTING_TOLERANCE {
        return Err(SimError::invalid_routing(
            system,
            format!("probabilities sum to {} which exceeds 1", total),
        ));
    }
    Ok(())
}

/// A service stage with finite processors and an optional buffer limit.
#[derive(Debug, Clone)]
pub struct QueueingSystem {
    id: SystemId,
    name: String,
    capacity: Option<u64>,
    mean_service_time: f64,

    /// Scheduled departure time per processor; `None` when the processor is free.
    departures: Vec<Option<f64>>,

    routes: Vec<Route>,

    jobs: u64,
    jobs_integral: f64,
    busy_time: f64,
    completed_jobs: u64,
    rejected_jobs: u64,
}

impl QueueingSystem {
    /// Builds a system from its spec, rejecting invalid parameters.
    pub fn new(id: SystemId, spec: SystemSpec) -> SimResult<Self> {
        let name = spec.name.unwrap_or_else(|| id.to_string());

        if spec.processors == 0 {
            return Err(SimError::invalid_system(name, "needs at least one processor"));
        }
        if !spec.mean_service_time.is_finite() || spec.mean_service_time <= 0.0 {
            return Err(SimError::invalid_system(
                name,
                format!("mean service time {} must be positive", spec.mean_service_time),
            ));
        }
        if spec.capacity == Some(0) {
            return Err(SimError::invalid_system(name, "capacity must be at least 1"));
        }

        Ok(Self {
            id,
            name,
            capacity: spec.capacity,
            mean_service_time: spec.mean_service_time,
            departures: vec![None; spec.processors],
            routes: Vec::new(),
            jobs: 0,
            jobs_integral: 0.0,
            busy_time: 0.0,
            completed_jobs: 0,
            rejected_jobs: 0,
        })
    }

    pub fn id(&self) -> SystemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn processors(&self) -> usize {
        self.departures.len()
    }

    pub fn capacity(&self) -> Option<u64> {
        self.capacity
    }

    pub fn mean_service_time(&self) -> f64 {
        self.mean_service_time
    }

    /// Jobs currently held, waiting or in service.
    pub fn jobs(&self) -> u64 {
        self.jobs
    }

    /// Number of processors currently serving a job.
    pub fn busy_processors(&self) -> usize {
        self.departures.iter().filter(|d| d.is_some()).count()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Time integral of the job count over the observed window.
    pub fn jobs_integral(&self) -> f64 {
        self.jobs_integral
    }

    /// Sum of all sampled service durations.
    pub fn busy_time(&self) -> f64 {
        self.busy_time
    }

    pub fn completed_jobs(&self) -> u64 {
        self.completed_jobs
    }

    pub fn rejected_jobs(&self) -> u64 {
        self.rejected_jobs
    }

    pub(crate) fn set_routes(&mut self, routes: Vec<Route>) {
        self.routes = routes;
    }

    /// Adds `jobs * elapsed` to the running integral.
    pub(crate) fn accrue(&mut self, elapsed: f64) {
        self.jobs_integral += self.jobs as f64 * elapsed;
    }

    /// Admits an arriving job if there is room, otherwise counts a rejection.
    pub fn try_admit(&mut self) -> bool {
        match self.capacity {
            Some(capacity) if self.jobs >= capacity => {
                self.rejected_jobs += 1;
                false
            }
            _ => {
                self.jobs += 1;
                true
            }
        }
    }

    /// Returns the lowest-index free processor.
    pub fn find_free_processor(&self) -> Option<usize> {
        self.departures.iter().position(|d| d.is_none())
    }

    /// Starts serving a job on a free processor.
    ///
    /// Samples an exponential service duration, marks the processor busy until
    /// `clock + duration`, and returns the processor index with that departure
    /// time.
    pub fn begin_service<R: RandomStream>(
        &mut self,
        clock: f64,
        rng: &mut R,
    ) -> SimResult<(usize, f64)> {
        let processor = self
            .find_free_processor()
            .ok_or(SimError::NoFreeProcessor(self.id))?;

        let duration = rng.exponential(self.mean_service_time);
        let departure = clock + duration;

        self.departures[processor] = Some(departure);
        self.busy_time += duration;

        Ok((processor, departure))
    }

    /// Finishes the job on `processor` and frees it.
    pub fn complete_service(&mut self, processor: usize) -> SimResult<()> {
        let slot = self
            .departures
            .get_mut(processor)
            .ok_or(SimError::ProcessorOutOfRange {
                system: self.id,
                processor,
            })?;
        if slot.take().is_none() {
            return Err(SimError::ProcessorIdle {
                system: self.id,
                processor,
            });
        }

        self.jobs -= 1;
        self.completed_jobs += 1;
        Ok(())
    }

    /// Picks the next system for a completed job.
    ///
    /// Walks the table consuming probability mass: with `u` uniform and
    /// `remaining` starting at 1, entry `(target, p)` is chosen when
    /// `u * remaining < p`, otherwise `p` is subtracted from `remaining`. If
    /// no entry is chosen the last entry is used, so a table whose mass is
    /// below 1 never lets jobs leave the network. An empty table returns
    /// `None` without drawing.
    pub fn select_route<R: RandomStream>(&self, rng: &mut R) -> Option<SystemId> {
        let last = self.routes.last()?;
        let u = rng.next_open01();
        let mut remaining = 1.0;

        for route in &self.routes {
            if u * remaining < route.probability {
                return Some(route.target);
            }
            remaining -= route.probability;
        }

        Some(last.target)
    }
}
