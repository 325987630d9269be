//! Simulation orchestration and control
//!
//! This module contains the main simulation orchestrator, statistics collection,
//! logging setup, and error handling.
//!
//! # Overview
//!
//! - **SimulationOrchestrator**: runs the arrival generators against one stop
//! - **SimulationStatistics**: counters folded from the stop event stream
//! - **LoggingConfig**: tracing subscriber setup
//! - **SimulationError**: error handling for simulation operations
//!
//! # Usage Example
//!
//! ```rust
//! use bus_stop_simulator::simulation::*;
//! use bus_stop_simulator::types::*;
//!
//! # let runtime = tokio::runtime::Runtime::new().unwrap();
//! # runtime.block_on(async {
//! let config = SimulationConfig {
//!     capacity: 5,
//!     time_scale: 10_000.0,
//!     duration_secs: Some(1),
//!     seed: Some(1),
//!     ..Default::default()
//! };
//!
//! let orchestrator = SimulationOrchestrator::new(config).unwrap();
//! let stats = orchestrator.run().await.unwrap();
//! assert!(stats.riders_boarded <= stats.riders_arrived);
//! # });
//! ```

pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod statistics;

// Re-export all public types for convenience
pub use error::*;
pub use logging::*;
pub use orchestrator::*;
pub use statistics::*;
