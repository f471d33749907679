//! Arena of queueing systems addressed by [`SystemId`].

use crate::error::{SimError, SimResult};
use crate::system::{validate_routes, QueueingSystem, Route, SystemSpec};
use crate::types::SystemId;

/// Owns every system of a topology.
///
/// Systems are never removed, so a [`SystemId`] handed out by
/// [`Network::add_system`] stays valid for the network's lifetime. Routing
/// tables refer to systems by handle, which permits self-loops and cycles.
#[derive(Debug, Clone, Default)]
pub struct Network {
    systems: Vec<QueueingSystem>,
}

impl Network {
    /// Creates an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a system and returns its handle.
    pub fn add_system(&mut self, spec: SystemSpec) -> SimResult<SystemId> {
        let id = SystemId::from_index(self.systems.len());
        let system = QueueingSystem::new(id, spec)?;
        self.systems.push(system);
        Ok(id)
    }

    /// Replaces the routing table of `from`.
    ///
    /// Every target must exist and the probabilities must be non-negative and
    /// sum to at most 1. Malformed tables are rejected, never renormalized.
    pub fn set_routes(&mut self, from: SystemId, routes: &[(SystemId, f64)]) -> SimResult<()> {
        self.system(from)?;
        let routes: Vec<Route> = routes
            .iter()
            .map(|&(target, probability)| Route { target, probability })
            .collect();

        for route in &routes {
            if !self.contains(route.target) {
                return Err(SimError::invalid_routing(
                    from,
                    format!("target {} does not exist", route.target),
                ));
            }
        }
        validate_routes(from, &routes)?;

        self.system_mut(from)?.set_routes(routes);
        Ok(())
    }

    /// Appends one entry to the routing table of `from`.
    pub fn add_route(&mut self, from: SystemId, to: SystemId, probability: f64) -> SimResult<()> {
        let mut routes: Vec<(SystemId, f64)> = self
            .system(from)?
            .routes()
            .iter()
            .map(|r| (r.target, r.probability))
            .collect();
        routes.push((to, probability));
        self.set_routes(from, &routes)
    }

    /// Returns true if the handle belongs to this network.
    pub fn contains(&self, id: SystemId) -> bool {
        id.index() < self.systems.len()
    }

    pub fn system(&self, id: SystemId) -> SimResult<&QueueingSystem> {
        self.systems.get(id.index()).ok_or(SimError::UnknownSystem(id))
    }

    pub(crate) fn system_mut(&mut self, id: SystemId) -> SimResult<&mut QueueingSystem> {
        self.systems
            .get_mut(id.index())
            .ok_or(SimError::UnknownSystem(id))
    }

    /// Systems in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &QueueingSystem> {
        self.systems.iter()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}
