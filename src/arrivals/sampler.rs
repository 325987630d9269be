//! Exponential inter-arrival sampling
//!
//! Arrivals at the stop form a Poisson process: the time between two arrivals is
//! exponentially distributed with the configured mean, drawn by inverse transform
//! from a fresh uniform value per arrival.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::debug;

/// Inter-arrival time in milliseconds for a uniform draw `uniform` in [0, 1)
///
/// Computes `round(-ln(1 - u) / λ)` with `λ = 1 / mean_millis`.
pub fn inter_arrival_millis(mean_millis: f64, uniform: f64) -> u64 {
    debug_assert!((0.0..1.0).contains(&uniform), "uniform draw out of [0, 1): {}", uniform);
    let lambda = 1.0 / mean_millis;
    (-(1.0 - uniform).ln() / lambda).round() as u64
}

/// Exponentially distributed delays with a fixed mean
#[derive(Debug, Clone)]
pub struct ExponentialSampler {
    mean_millis: f64,
    time_scale: f64,
    rng: StdRng,
}

impl ExponentialSampler {
    /// Create a sampler, seeded for reproducibility when `seed` is given
    pub fn new(mean_millis: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => {
                debug!(seed, mean_millis, "Using deterministic arrival seed");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };
        Self { mean_millis, time_scale: 1.0, rng }
    }

    /// Divide every real delay by `time_scale`
    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// Configured mean in simulated milliseconds
    pub fn mean_millis(&self) -> f64 {
        self.mean_millis
    }

    /// Next inter-arrival time in simulated milliseconds
    pub fn next_millis(&mut self) -> u64 {
        let uniform: f64 = self.rng.gen();
        inter_arrival_millis(self.mean_millis, uniform)
    }

    /// Next inter-arrival time as a real-time delay
    ///
    /// Saturates at [`Duration::MAX`] when a tiny time scale stretches the delay
    /// beyond what a `Duration` holds.
    pub fn next_delay(&mut self) -> Duration {
        let millis = self.next_millis();
        scaled_delay(millis, self.time_scale)
    }
}

fn scaled_delay(millis: u64, time_scale: f64) -> Duration {
    Duration::try_from_secs_f64(millis as f64 / 1000.0 / time_scale).unwrap_or(Duration::MAX)
}
