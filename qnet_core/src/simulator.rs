//! The event loop: advances the clock, accrues statistics and dispatches
//! arrivals and departures.
//!
//! # Loop discipline
//!
//! The continuation check `clock < clock_end` runs *before* the next event is
//! extracted, so the last processed event may lie past `clock_end`. The
//! observation window used for the final metrics is `clock - clock_start`
//! with the clock of that last event, not the configured end.

use crate::config::SimulationConfig;
use crate::error::{SimError, SimResult};
use crate::event_queue::EventQueue;
use crate::network::Network;
use crate::result::SimulationResult;
use crate::rng::{RandomStream, SeededStream};
use crate::trace::{TraceKind, TraceRecord};
use crate::types::{ArrivalSource, Event, EventKind, SystemId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Counters describing a run as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Events extracted and executed.
    pub events_processed: u64,

    /// External arrivals executed at the entry point.
    pub external_arrivals: u64,

    /// External arrivals put on the queue, the initial one included.
    pub external_scheduled: u64,

    /// Hand-offs enqueued after departures.
    pub routed_scheduled: u64,

    /// Hand-offs executed at their target.
    pub routed_processed: u64,

    /// Completed jobs that left the network (departures with an empty routing table).
    pub exits: u64,

    /// Clock of the last processed event.
    pub final_clock: f64,
}

impl RunStats {
    /// Hand-offs enqueued but not yet executed.
    pub fn in_transit(&self) -> u64 {
        self.routed_scheduled - self.routed_processed
    }
}

/// Discrete-event simulator over a [`Network`].
///
/// The simulator owns the network for the duration of the run and draws
/// every sample from the injected [`RandomStream`]. Two simulators built from
/// identical networks, configs and seeds produce identical results.
pub struct Simulator<R: RandomStream = SeededStream> {
    config: SimulationConfig,
    network: Network,
    rng: R,
    queue: EventQueue,
    clock: f64,
    last_event_time: f64,
    stats: RunStats,
    completed: bool,
}

impl Simulator<SeededStream> {
    /// Creates a simulator drawing from a ChaCha8 stream seeded with `seed`.
    pub fn seeded(network: Network, config: SimulationConfig, seed: u64) -> SimResult<Self> {
        Self::new(network, config, SeededStream::new(seed))
    }
}

impl<R: RandomStream> Simulator<R> {
    /// Validates the config and seeds the queue with the first external
    /// arrival at `clock_start`.
    pub fn new(network: Network, config: SimulationConfig, rng: R) -> SimResult<Self> {
        config.validate(&network)?;

        let mut queue = EventQueue::new();
        queue.insert(Event::external_arrival(config.clock_start, config.entry_point));

        Ok(Self {
            clock: config.clock_start,
            last_event_time: config.clock_start,
            stats: RunStats {
                external_scheduled: 1,
                final_clock: config.clock_start,
                ..Default::default()
            },
            config,
            network,
            rng,
            queue,
            completed: false,
        })
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// True once the clock has reached the configured end.
    pub fn is_finished(&self) -> bool {
        self.clock >= self.config.clock_end
    }

    /// Consumes the simulator and returns the network with its final state.
    pub fn into_network(self) -> Network {
        self.network
    }

    /// Runs until the clock reaches `clock_end` and derives the results, one
    /// per tracked system in config order.
    pub fn run(&mut self) -> SimResult<Vec<SimulationResult>> {
        if self.completed {
            return Err(SimError::AlreadyRun);
        }

        debug!(
            "Starting simulation: {} systems, clock [{}, {}), entry={}",
            self.network.len(),
            self.config.clock_start,
            self.config.clock_end,
            self.config.entry_point
        );

        while !self.is_finished() {
            if let Err(e) = self.step() {
                warn!("Simulation aborted at clock {:.4}: {}", self.clock, e);
                return Err(e);
            }
        }
        self.completed = true;

        debug!(
            "Simulation finished at clock {:.4} after {} events ({} external arrivals, {} pending)",
            self.clock,
            self.stats.events_processed,
            self.stats.external_arrivals,
            self.queue.len()
        );

        self.results()
    }

    /// Processes exactly one event and returns it.
    ///
    /// Advances the clock to the event time, accrues `jobs * elapsed` into
    /// every tracked system, then executes the event.
    pub fn step(&mut self) -> SimResult<Event> {
        let event = self
            .queue
            .extract_min()
            .ok_or(SimError::Starved { clock: self.clock })?;

        self.clock = event.time;
        let elapsed = self.clock - self.last_event_time;
        for &id in &self.config.tracked_systems {
            self.network.system_mut(id)?.accrue(elapsed);
        }

        match event.kind {
            EventKind::Arrival { source } => self.execute_arrival(event.target, source)?,
            EventKind::Departure { processor } => {
                self.execute_departure(event.target, processor)?
            }
        }

        self.last_event_time = self.clock;
        self.stats.events_processed += 1;
        self.stats.final_clock = self.clock;
        Ok(event)
    }

    /// Derives metrics from the current counters over `clock - clock_start`.
    pub fn results(&self) -> SimResult<Vec<SimulationResult>> {
        let observation_time = self.clock - self.config.clock_start;
        self.config
            .tracked_systems
            .iter()
            .map(|&id| {
                self.network
                    .system(id)
                    .map(|system| SimulationResult::derive(system, observation_time))
            })
            .collect()
    }

    fn execute_arrival(&mut self, target: SystemId, source: ArrivalSource) -> SimResult<()> {
        let admitted = self.network.system_mut(target)?.try_admit();
        let kind = if admitted {
            TraceKind::Arrival
        } else {
            TraceKind::Rejection
        };
        self.emit(target, kind, None);

        match source {
            ArrivalSource::External => self.stats.external_arrivals += 1,
            ArrivalSource::Routed { .. } => self.stats.routed_processed += 1,
        }
        // Any job reaching the entry point, admitted or not, draws the next
        // external arrival.
        if target == self.config.entry_point {
            self.schedule_next_arrival();
        }

        if admitted {
            let system = self.network.system(target)?;
            if system.jobs() <= system.processors() as u64 {
                self.start_service(target)?;
            }
        }
        Ok(())
    }

    fn execute_departure(&mut self, target: SystemId, processor: usize) -> SimResult<()> {
        self.network.system_mut(target)?.complete_service(processor)?;
        self.emit(target, TraceKind::Departure, Some(processor));

        match self.network.system(target)?.select_route(&mut self.rng) {
            Some(to) => {
                // Hand-off is instantaneous.
                self.queue
                    .insert(Event::routed_arrival(self.clock, target, to));
                self.stats.routed_scheduled += 1;
                self.emit(target, TraceKind::Routed { to }, None);
            }
            None => self.stats.exits += 1,
        }

        let system = self.network.system(target)?;
        if system.jobs() >= system.processors() as u64 {
            self.start_service(target)?;
        }
        Ok(())
    }

    fn start_service(&mut self, target: SystemId) -> SimResult<()> {
        let (processor, departure_time) = self
            .network
            .system_mut(target)?
            .begin_service(self.clock, &mut self.rng)?;

        self.queue
            .insert(Event::departure(departure_time, target, processor));
        self.emit(
            target,
            TraceKind::ServiceStart { departure_time },
            Some(processor),
        );
        Ok(())
    }

    fn schedule_next_arrival(&mut self) {
        let time = self.clock + self.rng.exponential(self.config.mean_interarrival_time);
        self.queue
            .insert(Event::external_arrival(time, self.config.entry_point));
        self.stats.external_scheduled += 1;
    }

    fn emit(&self, id: SystemId, kind: TraceKind, processor: Option<usize>) {
        let Some(sink) = &self.config.trace_sink else {
            return;
        };
        if let Ok(system) = self.network.system(id) {
            sink.record(&TraceRecord {
                time: self.clock,
                kind,
                system: id,
                name: system.name().to_string(),
                jobs: system.jobs(),
                processor,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ReplayStream;
    use crate::system::SystemSpec;
    use approx::assert_relative_eq;
    use std::sync::{Arc, Mutex};

    fn single(spec: SystemSpec) -> (Network, SystemId) {
        let mut net = Network::new();
        let id = net.add_system(spec).unwrap();
        (net, id)
    }

    #[test]
    fn test_replayed_run_matches_hand_computation() {
        // Draws alternate: interarrival 2.0, service 0.5.
        let (net, a) = single(SystemSpec::new(1.0));
        let config = SimulationConfig::new(a).with_clock(0.0, 3.0);
        let rng = ReplayStream::new(vec![(-2.0f64).exp(), (-0.5f64).exp()]);

        let mut sim = Simulator::new(net, config, rng).unwrap();
        let results = sim.run().unwrap();
        let r = &results[0];

        // Arrivals at 0, 2, 4; departures at 0.5, 2.5. The event at 4 is past
        // the configured end and still widens the window.
        assert_relative_eq!(sim.clock(), 4.0, epsilon = 1e-9);
        assert_relative_eq!(r.observation_time, 4.0, epsilon = 1e-9);
        assert_relative_eq!(r.jobs_integral, 1.0, epsilon = 1e-9);
        assert_relative_eq!(r.busy_time, 1.5, epsilon = 1e-9);
        assert_eq!(r.completed_jobs, 2);
        assert_relative_eq!(r.n.unwrap(), 0.25, epsilon = 1e-9);
        assert_relative_eq!(r.u.unwrap(), 0.375, epsilon = 1e-9);
        assert_relative_eq!(r.r.unwrap(), 0.5, epsilon = 1e-9);
        assert_relative_eq!(r.x.unwrap(), 0.5, epsilon = 1e-9);
        assert_eq!(r.rejection_rate, Some(0.0));

        assert_eq!(sim.stats().events_processed, 5);
        assert_eq!(sim.stats().external_arrivals, 3);
        assert_eq!(sim.stats().exits, 2);
    }

    #[test]
    fn test_loss_system() {
        let (net, a) = single(SystemSpec::new(0.5).with_capacity(1));
        let config = SimulationConfig::new(a)
            .with_clock_end(1000.0)
            .with_mean_interarrival_time(1.0);

        let mut sim = Simulator::seeded(net, config, 42).unwrap();
        let r = sim.run().unwrap().remove(0);

        assert!(r.rejected_jobs > 0);
        assert!(r.u.unwrap() <= 1.0);
        // Erlang loss with rho = 0.5 blocks a third of arrivals.
        assert_relative_eq!(r.rejection_rate.unwrap(), 1.0 / 3.0, epsilon = 0.06);
    }

    #[test]
    fn test_multi_server_uses_every_processor() {
        let (net, a) = single(SystemSpec::new(3.0).with_processors(3));
        let config = SimulationConfig::new(a)
            .with_clock_end(2000.0)
            .with_mean_interarrival_time(1.5);

        let mut sim = Simulator::seeded(net, config, 5).unwrap();
        let mut used = [false; 3];
        while !sim.is_finished() {
            let event = sim.step().unwrap();
            if let EventKind::Departure { processor } = event.kind {
                used[processor] = true;
            }
            let sys = sim.network().system(a).unwrap();
            assert_eq!(sys.busy_processors() as u64, sys.jobs().min(3));
        }
        assert_eq!(used, [true; 3]);

        let r = sim.results().unwrap().remove(0);
        // rho = 3.0 / (1.5 * 3)
        assert_relative_eq!(r.u.unwrap(), 2.0 / 3.0, epsilon = 0.08);
    }

    #[test]
    fn test_tandem_residence_times_add() {
        let mut net = Network::new();
        let a = net.add_system(SystemSpec::new(0.5).with_name("A")).unwrap();
        let b = net.add_system(SystemSpec::new(1.0).with_name("B")).unwrap();
        net.set_routes(a, &[(b, 1.0)]).unwrap();

        let config = SimulationConfig::new(a)
            .with_clock_end(100_000.0)
            .with_mean_interarrival_time(10.0)
            .with_tracked(vec![a, b]);

        let mut sim = Simulator::seeded(net, config, 7).unwrap();
        let results = sim.run().unwrap();
        let (ra, rb) = (&results[0], &results[1]);

        assert_eq!(ra.rejected_jobs + rb.rejected_jobs, 0);
        // M/M/1: R = S / (1 - rho)
        assert_relative_eq!(ra.r.unwrap(), 0.5 / 0.95, max_relative = 0.1);
        assert_relative_eq!(rb.r.unwrap(), 1.0 / 0.9, max_relative = 0.1);

        let r_total = (ra.jobs_integral + rb.jobs_integral) / rb.completed_jobs as f64;
        assert_relative_eq!(r_total, ra.r.unwrap() + rb.r.unwrap(), max_relative = 0.01);
    }

    #[test]
    fn test_determinism() {
        let build = || {
            let mut net = Network::new();
            let a = net.add_system(SystemSpec::new(0.8).with_processors(2).with_capacity(5)).unwrap();
            let b = net.add_system(SystemSpec::new(0.6)).unwrap();
            let c = net.add_system(SystemSpec::new(0.4)).unwrap();
            net.set_routes(a, &[(b, 0.7), (c, 0.3)]).unwrap();
            net.set_routes(b, &[(b, 0.2), (c, 0.8)]).unwrap();
            let config = SimulationConfig::new(a)
                .with_clock_end(5_000.0)
                .with_tracked(vec![a, b, c]);
            (net, config)
        };

        let (n1, c1) = build();
        let (n2, c2) = build();
        let r1 = Simulator::seeded(n1, c1, 99).unwrap().run().unwrap();
        let r2 = Simulator::seeded(n2, c2, 99).unwrap().run().unwrap();
        assert_eq!(r1, r2);

        let (n3, c3) = build();
        let r3 = Simulator::seeded(n3, c3, 100).unwrap().run().unwrap();
        assert_ne!(r1, r3);
    }

    #[test]
    fn test_untracked_systems_accrue_nothing() {
        let mut net = Network::new();
        let a = net.add_system(SystemSpec::new(0.5)).unwrap();
        let b = net.add_system(SystemSpec::new(0.5)).unwrap();
        net.set_routes(a, &[(b, 1.0)]).unwrap();

        let config = SimulationConfig::new(a).with_clock_end(500.0);
        let mut sim = Simulator::seeded(net, config, 3).unwrap();
        let results = sim.run().unwrap();

        assert_eq!(results.len(), 1);
        let b_state = sim.network().system(b).unwrap();
        assert!(b_state.completed_jobs() > 0);
        assert_eq!(b_state.jobs_integral(), 0.0);
    }

    #[test]
    fn test_trace_sink_observes_without_changing_results() {
        let (net, a) = single(SystemSpec::new(0.5).with_capacity(2));
        let records: Arc<Mutex<Vec<TraceRecord>>> = Arc::default();
        let sink_records = Arc::clone(&records);

        let plain = SimulationConfig::new(a).with_clock_end(200.0);
        let traced = plain
            .clone()
            .with_trace_sink(Arc::new(move |r: &TraceRecord| {
                sink_records.lock().unwrap().push(r.clone());
            }));

        let expected = Simulator::seeded(net.clone(), plain, 11).unwrap().run().unwrap();
        let mut sim = Simulator::seeded(net, traced, 11).unwrap();
        let actual = sim.run().unwrap();
        assert_eq!(expected, actual);

        let records = records.lock().unwrap();
        let count = |pred: fn(&TraceKind) -> bool| records.iter().filter(|r| pred(&r.kind)).count() as u64;

        let r = &actual[0];
        assert_eq!(count(|k| matches!(k, TraceKind::Departure)), r.completed_jobs);
        assert_eq!(count(|k| matches!(k, TraceKind::Rejection)), r.rejected_jobs);
        assert_eq!(
            count(|k| matches!(k, TraceKind::Arrival)) + r.rejected_jobs,
            sim.stats().external_arrivals
        );
        assert!(records.iter().all(|r| r.name == "S0" && r.jobs <= 2));
        assert!(records
            .iter()
            .filter(|r| matches!(r.kind, TraceKind::ServiceStart { .. }))
            .all(|r| r.processor == Some(0)));
    }

    #[test]
    fn test_routed_return_to_entry_schedules_external_arrival() {
        let (mut net, a) = single(SystemSpec::new(1.0));
        net.set_routes(a, &[(a, 1.0)]).unwrap();
        let config = SimulationConfig::new(a).with_clock_end(20.0);
        let rng = ReplayStream::new(vec![0.3, 0.6, 0.9]);

        let mut sim = Simulator::new(net, config, rng).unwrap();
        let mut entry_arrivals = 0u64;
        while !sim.is_finished() {
            let event = sim.step().unwrap();
            if let EventKind::Arrival { .. } = event.kind {
                assert_eq!(event.target, a);
                entry_arrivals += 1;
            }
        }

        let stats = sim.stats();
        assert!(stats.routed_processed > 0);
        assert_eq!(stats.external_arrivals + stats.routed_processed, entry_arrivals);
        // One per arrival at the entry, plus the initial arrival.
        assert_eq!(stats.external_scheduled, entry_arrivals + 1);
    }

    #[test]
    fn test_routed_arrival_elsewhere_schedules_nothing() {
        // Draws cycle 4.0, 0.5: the next external arrival lands at 4, A serves
        // [0, 0.5) and hands the job to B, which serves [0.5, 1.0).
        let mut net = Network::new();
        let a = net.add_system(SystemSpec::new(1.0)).unwrap();
        let b = net.add_system(SystemSpec::new(1.0)).unwrap();
        net.set_routes(a, &[(b, 1.0)]).unwrap();
        let config = SimulationConfig::new(a).with_clock_end(2.0);
        let rng = ReplayStream::new(vec![(-4.0f64).exp(), (-0.5f64).exp()]);

        let mut sim = Simulator::new(net, config, rng).unwrap();
        let times: Vec<f64> = (0..4).map(|_| sim.step().unwrap().time).collect();

        // Arrival at A, departure from A, hand-off to B, departure from B.
        assert_eq!(sim.stats().routed_processed, 1);
        assert_eq!(sim.stats().external_scheduled, 2);
        assert_relative_eq!(times[2], 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_run_twice_fails() {
        let (net, a) = single(SystemSpec::new(1.0));
        let mut sim = Simulator::seeded(net, SimulationConfig::new(a).with_clock_end(10.0), 1).unwrap();
        sim.run().unwrap();
        assert_eq!(sim.run().unwrap_err(), SimError::AlreadyRun);
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let (net, a) = single(SystemSpec::new(1.0));
        let config = SimulationConfig::new(a).with_mean_interarrival_time(0.0);
        assert!(matches!(
            Simulator::seeded(net, config, 1),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_clock_start_offsets_window() {
        let (net, a) = single(SystemSpec::new(0.5));
        let config = SimulationConfig::new(a).with_clock(100.0, 600.0);

        let mut sim = Simulator::seeded(net, config, 8).unwrap();
        let r = sim.run().unwrap().remove(0);

        assert!(sim.clock() >= 600.0);
        assert_relative_eq!(r.observation_time, sim.clock() - 100.0);
        assert_eq!(sim.stats().final_clock, sim.clock());
    }
}
