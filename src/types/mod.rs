//! Core types and identifiers for the bus stop simulator
//!
//! This module contains fundamental types, identifiers, and configuration structures
//! used throughout the simulation system.
//!
//! # Overview
//!
//! - **Identifiers**: generator-assigned rider and bus indices, UUID run identifiers
//! - **Enums**: participant state machines, gates, and departure outcomes
//! - **Configuration**: simulation configuration with validation and CLI support
//!
//! # Usage Example
//!
//! ```rust
//! use bus_stop_simulator::types::*;
//!
//! let rider = RiderId::new(1);
//! let bus = BusId::new(1);
//! assert_eq!(rider.to_string(), "Rider #1");
//! assert_eq!(bus.to_string(), "Bus #1");
//!
//! let config = SimulationConfig {
//!     capacity: 2,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod enums;
pub mod identifiers;

// Re-export all public types for convenience
pub use config::*;
pub use enums::*;
pub use identifiers::*;
