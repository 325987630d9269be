//! Observable stop events
//!
//! Every externally visible step of the rendezvous protocol is described by a
//! [`StopEvent`]. Events are ordered only as far as the protocol orders them: a
//! bus's arrival is recorded under the stop lock, rider events are recorded by the
//! rider that owns the step.

use crate::types::{BusId, Departure, Gate, ParticipantId, RiderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A timestamped stop event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopEvent {
    /// Wall-clock time the event was recorded
    pub timestamp: DateTime<Utc>,
    /// What happened
    #[serde(flatten)]
    pub kind: StopEventKind,
}

impl StopEvent {
    /// Stamp an event with the current time
    pub fn now(kind: StopEventKind) -> Self {
        Self { timestamp: Utc::now(), kind }
    }
}

impl fmt::Display for StopEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S%.3f"), self.kind)
    }
}

/// The kinds of events the stop produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StopEventKind {
    /// A rider was admitted to the stop
    RiderArrived {
        /// The rider
        rider: RiderId,
    },
    /// A rider joined the waiting count
    RiderRegistered {
        /// The rider
        rider: RiderId,
        /// Waiting count after registration
        waiting: usize,
    },
    /// A rider finished the physical boarding step
    RiderBoarded {
        /// The rider
        rider: RiderId,
    },
    /// The last rider of a batch boarded and signalled the bus
    AllAboard {
        /// The rider that closed the batch
        rider: RiderId,
    },
    /// A bus took the stop lock and read the waiting count
    BusArrived {
        /// The bus
        bus: BusId,
        /// Riders waiting at that instant
        waiting: usize,
    },
    /// A bus left the stop
    BusDeparted {
        /// The bus
        bus: BusId,
        /// How it left
        departure: Departure,
    },
    /// A participant's wait was cut short
    ParticipantInterrupted {
        /// The participant
        participant: ParticipantId,
        /// Where it was blocked
        gate: Gate,
    },
}

impl StopEventKind {
    /// The bus involved, if any
    pub fn bus(&self) -> Option<BusId> {
        match self {
            StopEventKind::BusArrived { bus, .. } | StopEventKind::BusDeparted { bus, .. } => {
                Some(*bus)
            }
            StopEventKind::ParticipantInterrupted { participant: ParticipantId::Bus(bus), .. } => {
                Some(*bus)
            }
            _ => None,
        }
    }

    /// The rider involved, if any
    pub fn rider(&self) -> Option<RiderId> {
        match self {
            StopEventKind::RiderArrived { rider }
            | StopEventKind::RiderRegistered { rider, .. }
            | StopEventKind::RiderBoarded { rider }
            | StopEventKind::AllAboard { rider } => Some(*rider),
            StopEventKind::ParticipantInterrupted {
                participant: ParticipantId::Rider(rider), ..
            } => Some(*rider),
            _ => None,
        }
    }
}

impl fmt::Display for StopEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopEventKind::RiderArrived { rider } => {
                write!(f, "{} has arrived at the bus stop", rider)
            }
            StopEventKind::RiderRegistered { rider, waiting } => {
                write!(f, "{} is waiting ({} riders waiting)", rider, waiting)
            }
            StopEventKind::RiderBoarded { rider } => write!(f, "{} boarded", rider),
            StopEventKind::AllAboard { .. } => {
                write!(f, "All riders have boarded. The bus is now preparing to depart")
            }
            StopEventKind::BusArrived { bus, waiting } => write!(
                f,
                "{} has arrived at the station. {} riders waiting to board",
                bus, waiting
            ),
            StopEventKind::BusDeparted { bus, departure } => {
                write!(f, "{} departed ({})", bus, departure)
            }
            StopEventKind::ParticipantInterrupted { participant, gate } => {
                write!(f, "{} was interrupted while waiting on the {}", participant, gate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_flat() {
        let event = StopEvent::now(StopEventKind::BusArrived { bus: BusId::new(2), waiting: 3 });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "bus_arrived");
        assert_eq!(value["bus"], 2);
        assert_eq!(value["waiting"], 3);
        assert!(value["timestamp"].is_string());

        let back: StopEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_departure_is_nested() {
        let kind = StopEventKind::BusDeparted {
            bus: BusId::new(1),
            departure: Departure::BatchBoarded { riders: 2 },
        };
        let value = serde_json::to_value(&kind).unwrap();
        assert_eq!(value["departure"]["type"], "batch_boarded");
        assert_eq!(value["departure"]["riders"], 2);
    }

    #[test]
    fn test_participant_accessors() {
        let kind = StopEventKind::RiderBoarded { rider: RiderId::new(5) };
        assert_eq!(kind.rider(), Some(RiderId::new(5)));
        assert_eq!(kind.bus(), None);

        let kind = StopEventKind::ParticipantInterrupted {
            participant: BusId::new(9).into(),
            gate: Gate::CompletionBarrier,
        };
        assert_eq!(kind.bus(), Some(BusId::new(9)));
        assert!(kind.to_string().contains("Bus #9"));
    }

    #[test]
    fn test_event_display() {
        let kind = StopEventKind::BusArrived { bus: BusId::new(1), waiting: 0 };
        assert_eq!(kind.to_string(), "Bus #1 has arrived at the station. 0 riders waiting to board");
    }
}
