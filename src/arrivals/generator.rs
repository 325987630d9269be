//! Arrival generators
//!
//! A generator creates one participant, sleeps for a sampled inter-arrival time,
//! and repeats until its cancellation token fires. Cancellation only stops the
//! spawning; participants already created keep running.

use super::sampler::ExponentialSampler;
use crate::types::{ParticipantKind, SimulationConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Offset between the rider and bus seeds derived from one configured seed
const BUS_SEED_OFFSET: u64 = 0x9E37_79B9_7F4A_7C15;

/// Source of participant creation events for one kind of participant
#[derive(Debug)]
pub struct ArrivalGenerator {
    kind: ParticipantKind,
    sampler: ExponentialSampler,
    spawned: u64,
}

impl ArrivalGenerator {
    /// Create a generator for `kind` with the given delay sampler
    pub fn new(kind: ParticipantKind, sampler: ExponentialSampler) -> Self {
        Self { kind, sampler, spawned: 0 }
    }

    /// Rider generator for a simulation configuration
    pub fn riders(config: &SimulationConfig) -> Self {
        let sampler = ExponentialSampler::new(config.rider_arrival_mean_ms, config.seed)
            .with_time_scale(config.time_scale);
        Self::new(ParticipantKind::Rider, sampler)
    }

    /// Bus generator for a simulation configuration
    pub fn buses(config: &SimulationConfig) -> Self {
        let seed = config.seed.map(|seed| seed ^ BUS_SEED_OFFSET);
        let sampler = ExponentialSampler::new(config.bus_arrival_mean_ms, seed)
            .with_time_scale(config.time_scale);
        Self::new(ParticipantKind::Bus, sampler)
    }

    /// Which participants this generator creates
    pub fn kind(&self) -> ParticipantKind {
        self.kind
    }

    /// Participants created so far
    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    /// Create participants until `shutdown` is cancelled
    ///
    /// `spawn` receives the 1-based index of each new participant. Returns the
    /// number of participants created.
    #[instrument(name = "arrivals", skip_all, fields(kind = %self.kind))]
    pub async fn run<F>(mut self, shutdown: CancellationToken, mut spawn: F) -> u64
    where
        F: FnMut(u64),
    {
        info!(mean_ms = self.sampler.mean_millis(), "Arrival generator started");

        while !shutdown.is_cancelled() {
            self.spawned += 1;
            spawn(self.spawned);

            let delay = self.sampler.next_delay();
            debug!(index = self.spawned, delay_ms = delay.as_millis() as u64, "Next arrival scheduled");

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(spawned = self.spawned, "Arrival generator stopped");
        self.spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_generator_spawns_until_cancelled() {
        let sampler = ExponentialSampler::new(1000.0, Some(11));
        let generator = ArrivalGenerator::new(ParticipantKind::Rider, sampler);
        let shutdown = CancellationToken::new();

        let stopper = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                shutdown.cancel();
            })
        };

        let mut indices = Vec::new();
        let spawned = generator.run(shutdown, |index| indices.push(index)).await;
        stopper.await.unwrap();

        assert_eq!(spawned as usize, indices.len());
        assert!(indices.iter().copied().eq(1..=spawned));
        // About 60 arrivals expected in 60 simulated seconds with a 1s mean
        assert!(spawned > 20 && spawned < 120, "unexpected arrival count {}", spawned);
    }

    #[tokio::test]
    async fn test_cancelled_generator_spawns_nothing() {
        let generator = ArrivalGenerator::riders(&SimulationConfig::default());
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let spawned = generator.run(shutdown, |_| panic!("spawned after cancellation")).await;
        assert_eq!(spawned, 0);
    }

    #[test]
    fn test_rider_and_bus_streams_use_distinct_seeds() {
        let config = SimulationConfig {
            seed: Some(5),
            rider_arrival_mean_ms: 1000.0,
            bus_arrival_mean_ms: 1000.0,
            ..Default::default()
        };
        let mut riders = ArrivalGenerator::riders(&config);
        let mut buses = ArrivalGenerator::buses(&config);
        let rider_draws: Vec<u64> = (0..10).map(|_| riders.sampler.next_millis()).collect();
        let bus_draws: Vec<u64> = (0..10).map(|_| buses.sampler.next_millis()).collect();
        assert_ne!(rider_draws, bus_draws);
        assert_eq!(riders.kind(), ParticipantKind::Rider);
        assert_eq!(buses.kind(), ParticipantKind::Bus);
    }
}
