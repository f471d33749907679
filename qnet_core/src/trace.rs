//! Structured trace records emitted while a simulation runs.

use crate::types::SystemId;
use tracing::debug;

/// What happened at a system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceKind {
    /// A job was admitted.
    Arrival,

    /// A job was turned away because the system was full.
    Rejection,

    /// A processor started serving a job that will leave at `departure_time`.
    ServiceStart { departure_time: f64 },

    /// A processor finished serving a job.
    Departure,

    /// A completed job was handed to another system.
    Routed { to: SystemId },
}

/// One traced occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    /// Simulation clock.
    pub time: f64,
    pub kind: TraceKind,
    pub system: SystemId,
    pub name: String,
    /// Jobs held by the system after the occurrence.
    pub jobs: u64,
    /// Processor involved, for service starts and departures.
    pub processor: Option<usize>,
}

/// Receiver for trace records.
///
/// Called synchronously from the event loop. A sink observes the run and has
/// no way to influence it.
pub trait TraceSink: Send + Sync {
    fn record(&self, record: &TraceRecord);
}

impl<F> TraceSink for F
where
    F: Fn(&TraceRecord) + Send + Sync,
{
    fn record(&self, record: &TraceRecord) {
        self(record)
    }
}

/// Sink that forwards every record to `tracing` at DEBUG level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&self, r: &TraceRecord) {
        match r.kind {
            TraceKind::Arrival => {
                debug!("Arrival    system={} clock={:.4} jobs={}", r.name, r.time, r.jobs)
            }
            TraceKind::Rejection => {
                debug!("Rejected   system={} clock={:.4} jobs={}", r.name, r.time, r.jobs)
            }
            TraceKind::ServiceStart { departure_time } => debug!(
                "Start      system={} processor={:?} clock={:.4} end={:.4}",
                r.name, r.processor, r.time, departure_time
            ),
            TraceKind::Departure => debug!(
                "Departure  system={} processor={:?} clock={:.4} jobs={}",
                r.name, r.processor, r.time, r.jobs
            ),
            TraceKind::Routed { to } => {
                debug!("  passed to {} clock={:.4}", to, r.time)
            }
        }
    }
}
