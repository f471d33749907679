//! qnet: discrete-event simulation of queueing networks
//!
//! Jobs arrive at an entry system, wait for one of its processors, are
//! served for an exponential time and are then routed probabilistically to
//! downstream systems or out of the network. The simulator estimates, per
//! tracked system:
//!
//! - **N**: mean jobs in system
//! - **U**: utilization
//! - **R**: mean residence time
//! - **X**: throughput
//! - **rejection rate**: share of arrivals turned away at capacity
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                      Simulator                        │
//! │  ┌─────────────────────────────────────────────────┐  │
//! │  │  EventQueue (min-heap on time, FIFO on ties)    │  │
//! │  └───────────────────────┬─────────────────────────┘  │
//! │                          │ extract_min                │
//! │                          ▼                            │
//! │  ┌─────────────────────────────────────────────────┐  │
//! │  │  Network: Vec<QueueingSystem> by SystemId       │  │
//! │  │  admit / serve / depart / route                 │  │
//! │  └───────────────────────┬─────────────────────────┘  │
//! │                          │ samples                    │
//! │                          ▼                            │
//! │  ┌─────────────────────────────────────────────────┐  │
//! │  │  RandomStream (seeded ChaCha8)                  │  │
//! │  └─────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use qnet_core::{Network, SimulationConfig, Simulator, SystemSpec};
//!
//! let mut network = Network::new();
//! let a = network.add_system(SystemSpec::new(1.0 / 15.0).with_name("A")).unwrap();
//! let b = network.add_system(SystemSpec::new(1.0 / 12.0).with_name("B")).unwrap();
//! let c = network.add_system(SystemSpec::new(1.0 / 7.0).with_name("C")).unwrap();
//! network.set_routes(a, &[(b, 0.6), (c, 0.4)]).unwrap();
//!
//! let config = SimulationConfig::new(a)
//!     .with_mean_interarrival_time(0.1)
//!     .with_clock_end(1_000.0)
//!     .with_tracked(vec![a, b, c]);
//!
//! let results = Simulator::seeded(network, config, 42).unwrap().run().unwrap();
//! assert_eq!(results.len(), 3);
//! ```

mod config;
mod error;
mod event_queue;
mod network;
mod result;
mod rng;
mod simulator;
mod system;
mod trace;
mod types;

pub use config::SimulationConfig;
pub use error::{SimError, SimResult};
pub use event_queue::EventQueue;
pub use network::Network;
pub use result::SimulationResult;
pub use rng::{RandomStream, ReplayStream, SeededStream};
pub use simulator::{RunStats, Simulator};
pub use system::{QueueingSystem, Route, SystemSpec, ROUTING_TOLERANCE};
pub use trace::{TraceKind, TraceRecord, TraceSink, TracingSink};
pub use types::{ArrivalSource, Event, EventKind, SystemId};
