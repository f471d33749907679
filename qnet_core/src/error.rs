//! Error types for the queueing network simulator.

use crate::types::SystemId;
use thiserror::Error;

/// Errors that can occur while building or running a simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A system was declared with invalid parameters.
    #[error("Invalid system {name}: {reason}")]
    InvalidSystem { name: String, reason: String },

    /// A routing table is malformed (negative, non-finite, or summing above 1).
    #[error("Invalid routing table on {system}: {reason}")]
    InvalidRouting { system: SystemId, reason: String },

    /// Run parameters are inconsistent or refer to unknown systems.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A handle does not refer to any system in the network.
    #[error("Unknown system: {0}")]
    UnknownSystem(SystemId),

    /// The event queue drained before the clock reached its end.
    #[error("Simulation starved before completion at clock {clock}")]
    Starved { clock: f64 },

    /// Service was requested on a system whose processors are all busy.
    #[error("No free processor on {0}")]
    NoFreeProcessor(SystemId),

    /// A departure referenced a processor index outside the system.
    #[error("Processor {processor} out of range on {system}")]
    ProcessorOutOfRange { system: SystemId, processor: usize },

    /// A departure referenced a processor that was not serving a job.
    #[error("Processor {processor} on {system} is idle")]
    ProcessorIdle { system: SystemId, processor: usize },

    /// `run` was called on a simulator that already completed a run.
    #[error("Simulation already ran")]
    AlreadyRun,
}

impl SimError {
    /// Creates an invalid system error.
    pub fn invalid_system(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSystem {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid routing error.
    pub fn invalid_routing(system: SystemId, reason: impl Into<String>) -> Self {
        Self::InvalidRouting {
            system,
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result alias used throughout the engine.
pub type SimResult<T> = Result<T, SimError>;
