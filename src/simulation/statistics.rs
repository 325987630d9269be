//! Statistics collection and reporting
//!
//! Statistics are derived entirely from the stop event stream, so they describe
//! what participants observably did rather than the controller's internals.

use crate::events::{StopEvent, StopEventKind};
use crate::types::{Departure, ParticipantId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Counters describing one simulation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationStatistics {
    /// Riders admitted to the stop
    pub riders_arrived: usize,
    /// Riders that joined the waiting count
    pub riders_registered: usize,
    /// Riders that finished boarding
    pub riders_boarded: usize,
    /// Riders whose wait was interrupted
    pub riders_interrupted: usize,
    /// Buses that took the stop and read the waiting count
    pub buses_arrived: usize,
    /// Buses that left without riders
    pub buses_departed_empty: usize,
    /// Buses that left with a full batch aboard
    pub buses_departed_with_riders: usize,
    /// Buses whose wait was interrupted
    pub buses_interrupted: usize,
    /// Riders carried away by all departed buses
    pub batch_riders_total: usize,
    /// Largest batch carried by a single bus
    pub largest_batch: usize,
    /// Waiting count at the most recent registration or bus arrival
    pub last_observed_waiting: usize,
    /// Wall-clock length of the run
    pub simulation_duration: Duration,
}

impl SimulationStatistics {
    /// Empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the counters
    pub fn record(&mut self, event: &StopEvent) {
        match &event.kind {
            StopEventKind::RiderArrived { .. } => self.riders_arrived += 1,
            StopEventKind::RiderRegistered { waiting, .. } => {
                self.riders_registered += 1;
                self.last_observed_waiting = *waiting;
            }
            StopEventKind::RiderBoarded { .. } => self.riders_boarded += 1,
            StopEventKind::AllAboard { .. } => {}
            StopEventKind::BusArrived { waiting, .. } => {
                self.buses_arrived += 1;
                self.last_observed_waiting = *waiting;
            }
            StopEventKind::BusDeparted { departure, .. } => match departure {
                Departure::Empty => self.buses_departed_empty += 1,
                Departure::BatchBoarded { riders } => {
                    self.buses_departed_with_riders += 1;
                    self.batch_riders_total += riders;
                    self.largest_batch = self.largest_batch.max(*riders);
                    self.last_observed_waiting = 0;
                }
            },
            StopEventKind::ParticipantInterrupted { participant, .. } => match participant {
                ParticipantId::Rider(_) => self.riders_interrupted += 1,
                ParticipantId::Bus(_) => self.buses_interrupted += 1,
            },
        }
    }

    /// Buses that have left the stop
    pub fn buses_departed(&self) -> usize {
        self.buses_departed_empty + self.buses_departed_with_riders
    }

    /// Mean batch size over buses that carried riders
    pub fn average_batch_size(&self) -> f64 {
        if self.buses_departed_with_riders == 0 {
            0.0
        } else {
            self.batch_riders_total as f64 / self.buses_departed_with_riders as f64
        }
    }

    /// Admitted riders that have neither boarded nor been interrupted
    pub fn riders_at_stop(&self) -> usize {
        self.riders_arrived.saturating_sub(self.riders_boarded + self.riders_interrupted)
    }

    /// Set the run length
    pub fn set_simulation_duration(&mut self, duration: Duration) {
        self.simulation_duration = duration;
    }
}

impl fmt::Display for SimulationStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulation Statistics:")?;
        writeln!(f, "  Duration: {:.1}s", self.simulation_duration.as_secs_f64())?;
        writeln!(f, "  Riders Arrived: {}", self.riders_arrived)?;
        writeln!(f, "  Riders Boarded: {}", self.riders_boarded)?;
        writeln!(f, "  Riders Still At Stop: {}", self.riders_at_stop())?;
        writeln!(f, "  Buses Arrived: {}", self.buses_arrived)?;
        writeln!(
            f,
            "  Buses Departed: {} ({} empty, {} with riders)",
            self.buses_departed(),
            self.buses_departed_empty,
            self.buses_departed_with_riders
        )?;
        writeln!(
            f,
            "  Batch Size: avg {:.1}, max {}",
            self.average_batch_size(),
            self.largest_batch
        )?;
        if self.riders_interrupted + self.buses_interrupted > 0 {
            writeln!(
                f,
                "  Interrupted: {} riders, {} buses",
                self.riders_interrupted, self.buses_interrupted
            )?;
        }
        Ok(())
    }
}
