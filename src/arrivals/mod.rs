//! Arrival processes for riders and buses
//!
//! Two independent generators feed the stop: one creates riders, one creates
//! buses, each spaced by exponentially distributed delays.

pub mod generator;
pub mod sampler;

pub use generator::ArrivalGenerator;
pub use sampler::{inter_arrival_millis, ExponentialSampler};
