//! Bus Stop Simulator
//!
//! A concurrent simulation of a bus stop where riders and buses arrive
//! independently and meet under a capacity limit and an all-or-nothing boarding
//! rule.
//!
//! # Overview
//!
//! Riders arrive at exponentially distributed intervals and wait at the stop. A
//! bus takes exactly the riders that were waiting at the instant it arrived and
//! cannot leave until every one of them has boarded. Riders arriving while a bus
//! is boarding wait for the next one. At most `capacity` riders are admitted to
//! the stop at once.
//!
//! ## Key Features
//!
//! - **Rendezvous Protocol**: lock-serialized registration, single-permit
//!   boarding hand-off, and a one-shot completion barrier per batch
//! - **Arrival Processes**: seeded exponential inter-arrival sampling with time
//!   acceleration
//! - **Observable Events**: every protocol step is published as a serializable
//!   [`StopEvent`]
//! - **Cancellable Runs**: generators stop on a cancellation token without
//!   aborting participants mid-protocol
//!
//! ## Quick Start
//!
//! ```rust
//! use bus_stop_simulator::*;
//!
//! let config = SimulationConfig {
//!     capacity: 2,
//!     ..Default::default()
//! };
//!
//! let orchestrator = SimulationOrchestrator::new(config)?;
//! assert_eq!(orchestrator.controller().capacity(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: identifiers, state enums, and configuration
//! - [`rendezvous`]: the controller and the rider and bus protocols
//! - [`arrivals`]: exponential arrival generators
//! - [`events`]: stop events and their delivery
//! - [`simulation`]: orchestrator, statistics, logging, and errors
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  spawn   ┌─────────────┐   events   ┌─────────────┐
//! │  Arrivals   │─────────►│ Rendezvous  │───────────►│   Events    │
//! │             │          │             │            │             │
//! │ Riders      │          │ Controller  │            │ Sink        │
//! │ Buses       │          │ Rider / Bus │            │ StopEvent   │
//! └─────────────┘          └─────────────┘            └─────────────┘
//!        ▲                        ▲                          │
//!        │                        │                          ▼
//!        │                 ┌─────────────────────────────────────────┐
//!        └─────────────────│ Simulation: Orchestrator, Statistics    │
//!                          └─────────────────────────────────────────┘
//! ```
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

pub mod arrivals;
pub mod events;
pub mod rendezvous;
pub mod simulation;
pub mod types;

// Core types and identifiers
pub use types::{
    BusId, BusPhase, ConfigValidationError, Departure, Gate, ParticipantId, ParticipantKind,
    RiderId, RiderPhase, RunId, SimulationConfig,
};

// Rendezvous protocol
pub use rendezvous::{Advance, Bus, RendezvousController, Rider};

// Arrival generation
pub use arrivals::{inter_arrival_millis, ArrivalGenerator, ExponentialSampler};

// Stop events
pub use events::{EventSink, StopEvent, StopEventKind};

// Simulation types and functionality
pub use simulation::{
    LoggingConfig, SimulationError, SimulationOrchestrator, SimulationResult,
    SimulationStatistics,
};
