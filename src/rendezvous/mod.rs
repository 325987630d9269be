//! The rider/bus rendezvous protocol
//!
//! This module contains the shared [`RendezvousController`] and the two
//! participant protocols that run against it.
//!
//! # Overview
//!
//! - A bus takes exactly the riders registered when it took the stop lock.
//! - At most `capacity` riders are admitted at once.
//! - Riders board one at a time; the last one of a batch releases the bus.
//! - A bus that finds nobody waiting leaves without opening boarding.
//!
//! # Usage Example
//!
//! ```rust
//! use bus_stop_simulator::rendezvous::{Bus, RendezvousController, Rider};
//! use bus_stop_simulator::types::{BusId, Departure, RiderId, RiderPhase};
//! use std::sync::Arc;
//!
//! # let runtime = tokio::runtime::Runtime::new().unwrap();
//! # runtime.block_on(async {
//! let controller = Arc::new(RendezvousController::new(2));
//!
//! let rider = {
//!     let controller = controller.clone();
//!     tokio::spawn(async move { Rider::new(RiderId::new(1)).run(&controller).await })
//! };
//! while controller.waiting() < 1 {
//!     tokio::task::yield_now().await;
//! }
//!
//! let departure = Bus::new(BusId::new(1)).run(&controller).await.unwrap();
//! assert_eq!(departure, Departure::BatchBoarded { riders: 1 });
//! assert_eq!(rider.await.unwrap().unwrap(), RiderPhase::Departed);
//! # });
//! ```

pub mod bus;
pub mod controller;
pub mod rider;

pub use bus::Bus;
pub use controller::{AdmissionPermit, Advance, BusTurn, RendezvousController};
pub use rider::Rider;
