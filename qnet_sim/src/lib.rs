//! qnet scenario harness
//!
//! Builds the named queueing topologies, runs them through the
//! `qnet_core` simulator with explicit seeds, and aggregates replications.
//!
//! # Usage
//!
//! ```ignore
//! use qnet_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let report = ScenarioRunner::new(42)
//!     .with_duration(10_000.0)
//!     .run(ScenarioId::Split)?;
//!
//! for result in &report.results {
//!     println!("{}", result);
//! }
//! ```

mod runner;
pub mod scenarios;

pub use runner::{summarize, MetricSummary, ScenarioReport, ScenarioRunner};
