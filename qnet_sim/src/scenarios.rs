//! Named queueing topologies.

use qnet_core::{Network, SimResult, SimulationConfig, SystemSpec};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// Single-server loss system: no waiting room
    LossSystem,

    /// Light-load tandem: A feeds B, then jobs leave
    Tandem,

    /// Six processors sharing a buffer of 40
    MultiServer,

    /// One front stage splitting 60/40 between two back stages
    Split,

    /// Middle stage sending 30% of its jobs back to itself
    Feedback,
}

/// A built topology ready to simulate.
#[derive(Debug)]
pub struct Scenario {
    pub network: Network,
    pub config: SimulationConfig,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::LossSystem,
            ScenarioId::Tandem,
            ScenarioId::MultiServer,
            ScenarioId::Split,
            ScenarioId::Feedback,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::LossSystem => "loss_system",
            ScenarioId::Tandem => "tandem",
            ScenarioId::MultiServer => "multi_server",
            ScenarioId::Split => "split",
            ScenarioId::Feedback => "feedback",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::LossSystem => "1 processor, capacity 1, interarrival 1, service 0.5",
            ScenarioId::Tandem => "A (service 0.5) -> B (service 1.0), interarrival 10",
            ScenarioId::MultiServer => "6 processors, capacity 40, service 2.5, interarrival 5.5",
            ScenarioId::Split => "A -> 60% B / 40% C, service 1/15, 1/12, 1/7, interarrival 0.1",
            ScenarioId::Feedback => {
                "In -> A -> 30% A / 70% Out, service 0.05, 0.2, 0.05, interarrival 1"
            }
        }
    }

    /// Clock end used when no duration override is given.
    pub fn default_duration(&self) -> f64 {
        match self {
            ScenarioId::LossSystem => 1_000.0,
            ScenarioId::Tandem => 100_000.0,
            ScenarioId::MultiServer => 10_000_000.0,
            ScenarioId::Split => 100_000.0,
            ScenarioId::Feedback => 10_000.0,
        }
    }

    /// Builds the topology, tracking every system in declaration order.
    pub fn build(&self, duration: Option<f64>) -> SimResult<Scenario> {
        let mut network = Network::new();
        let clock_end = duration.unwrap_or_else(|| self.default_duration());

        let config = match self {
            ScenarioId::LossSystem => {
                let a = network.add_system(SystemSpec::new(0.5).with_name("A").with_capacity(1))?;
                SimulationConfig::new(a).with_mean_interarrival_time(1.0)
            }
            ScenarioId::Tandem => {
                let a = network.add_system(SystemSpec::new(0.5).with_name("A"))?;
                let b = network.add_system(SystemSpec::new(1.0).with_name("B"))?;
                network.set_routes(a, &[(b, 1.0)])?;
                SimulationConfig::new(a)
                    .with_mean_interarrival_time(10.0)
                    .with_tracked(vec![a, b])
            }
            ScenarioId::MultiServer => {
                let a = network.add_system(
                    SystemSpec::new(2.5)
                        .with_name("A")
                        .with_processors(6)
                        .with_capacity(40),
                )?;
                SimulationConfig::new(a).with_mean_interarrival_time(5.5)
            }
            ScenarioId::Split => {
                let b = network.add_system(SystemSpec::new(1.0 / 12.0).with_name("B"))?;
                let c = network.add_system(SystemSpec::new(1.0 / 7.0).with_name("C"))?;
                let a = network.add_system(SystemSpec::new(1.0 / 15.0).with_name("A"))?;
                network.set_routes(a, &[(b, 0.6), (c, 0.4)])?;
                SimulationConfig::new(a)
                    .with_mean_interarrival_time(1.0 / 10.0)
                    .with_tracked(vec![a, b, c])
            }
            ScenarioId::Feedback => {
                // The loop sits behind the entry point: every return to the
                // entry would start another external arrival stream.
                let input = network.add_system(SystemSpec::new(0.05).with_name("In"))?;
                let a = network.add_system(SystemSpec::new(0.2).with_name("A"))?;
                let out = network.add_system(SystemSpec::new(0.05).with_name("Out"))?;
                network.set_routes(input, &[(a, 1.0)])?;
                network.set_routes(a, &[(a, 0.3), (out, 0.7)])?;
                SimulationConfig::new(input)
                    .with_mean_interarrival_time(1.0)
                    .with_tracked(vec![input, a, out])
            }
        };

        let config = config.with_clock_end(clock_end);
        config.validate(&network)?;
        Ok(Scenario { network, config })
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "loss_system" | "loss" | "a" => Ok(ScenarioId::LossSystem),
            "tandem" | "b" => Ok(ScenarioId::Tandem),
            "multi_server" | "multiserver" => Ok(ScenarioId::MultiServer),
            "split" => Ok(ScenarioId::Split),
            "feedback" => Ok(ScenarioId::Feedback),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
