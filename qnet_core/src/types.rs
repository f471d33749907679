//! Common types for the queueing network: system handles and events.

use serde::{Deserialize, Serialize};

/// Stable handle to a queueing system inside a [`Network`](crate::Network).
///
/// Handles are plain indices into the network arena, so routing tables and
/// events can refer to systems (including cyclic references) without owning
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SystemId(usize);

impl SystemId {
    /// Creates a handle from an arena index.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for SystemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Where an arrival came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalSource {
    /// Generated by the external arrival process at the entry point.
    External,

    /// Handed over by an upstream system after a departure.
    Routed { from: SystemId },
}

/// Kind-specific payload of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A job arrives at the target system.
    Arrival { source: ArrivalSource },

    /// A job finishes service on the given processor of the target system.
    Departure { processor: usize },
}

/// A scheduled occurrence in the simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// Simulation time at which the event fires.
    pub time: f64,

    /// System that processes the event.
    pub target: SystemId,

    /// What happens.
    pub kind: EventKind,
}

impl Event {
    /// Creates an external arrival at `target`.
    pub fn external_arrival(time: f64, target: SystemId) -> Self {
        Self {
            time,
            target,
            kind: EventKind::Arrival {
                source: ArrivalSource::External,
            },
        }
    }

    /// Creates an arrival handed over from `from` to `target`.
    pub fn routed_arrival(time: f64, from: SystemId, target: SystemId) -> Self {
        Self {
            time,
            target,
            kind: EventKind::Arrival {
                source: ArrivalSource::Routed { from },
            },
        }
    }

    /// Creates a departure from `processor` of `target`.
    pub fn departure(time: f64, target: SystemId, processor: usize) -> Self {
        Self {
            time,
            target,
            kind: EventKind::Departure { processor },
        }
    }
}
