//! Enumeration types for the bus stop simulator
//!
//! This module contains the participant state machines, the gates a participant
//! can block on, and the ways a bus can leave the stop.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a rider at the stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiderPhase {
    /// Rider has been created by the generator
    Arrived,
    /// Rider holds an admission permit
    Admitted,
    /// Rider is counted in the waiting count
    Registered,
    /// Rider received its boarding turn
    Released,
    /// Rider finished the physical boarding step
    Boarded,
    /// Rider deregistered and handed the turn on (terminal)
    Departed,
}

impl RiderPhase {
    /// Whether this is the terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, RiderPhase::Departed)
    }

    /// The only phase a rider may move to from this one
    pub fn next(&self) -> Option<RiderPhase> {
        match self {
            RiderPhase::Arrived => Some(RiderPhase::Admitted),
            RiderPhase::Admitted => Some(RiderPhase::Registered),
            RiderPhase::Registered => Some(RiderPhase::Released),
            RiderPhase::Released => Some(RiderPhase::Boarded),
            RiderPhase::Boarded => Some(RiderPhase::Departed),
            RiderPhase::Departed => None,
        }
    }
}

impl fmt::Display for RiderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiderPhase::Arrived => write!(f, "Arrived"),
            RiderPhase::Admitted => write!(f, "Admitted"),
            RiderPhase::Registered => write!(f, "Registered"),
            RiderPhase::Released => write!(f, "Released"),
            RiderPhase::Boarded => write!(f, "Boarded"),
            RiderPhase::Departed => write!(f, "Departed from stop"),
        }
    }
}

/// Lifecycle of a bus at the stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusPhase {
    /// Bus has been created by the generator
    Arrived,
    /// Bus holds the stop lock and is reading the waiting count
    DecisionPending,
    /// Boarding was opened for a non-empty batch
    BoardingOpen,
    /// Nobody was waiting
    ImmediateDeparture,
    /// Bus left the stop (terminal)
    Departed,
}

impl BusPhase {
    /// Whether `to` is a legal successor of this phase
    pub fn can_transition_to(&self, to: BusPhase) -> bool {
        matches!(
            (self, to),
            (BusPhase::Arrived, BusPhase::DecisionPending)
                | (BusPhase::DecisionPending, BusPhase::BoardingOpen)
                | (BusPhase::DecisionPending, BusPhase::ImmediateDeparture)
                | (BusPhase::BoardingOpen, BusPhase::Departed)
                | (BusPhase::ImmediateDeparture, BusPhase::Departed)
        )
    }
}

impl fmt::Display for BusPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusPhase::Arrived => write!(f, "Arrived"),
            BusPhase::DecisionPending => write!(f, "Decision Pending"),
            BusPhase::BoardingOpen => write!(f, "Boarding Open"),
            BusPhase::ImmediateDeparture => write!(f, "Immediate Departure"),
            BusPhase::Departed => write!(f, "Departed"),
        }
    }
}

/// How a bus left the stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Departure {
    /// No riders were waiting when the bus took the lock
    Empty,
    /// The whole batch boarded
    BatchBoarded {
        /// Size of the batch snapshot
        riders: usize,
    },
}

impl Departure {
    /// Number of riders that left with the bus
    pub fn riders(&self) -> usize {
        match self {
            Departure::Empty => 0,
            Departure::BatchBoarded { riders } => *riders,
        }
    }
}

impl fmt::Display for Departure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Departure::Empty => write!(f, "no riders"),
            Departure::BatchBoarded { riders } => write!(f, "batch of {} boarded", riders),
        }
    }
}

/// Synchronization points a participant can be blocked on when interrupted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    /// Capacity-bounded admission
    Admission,
    /// Single-permit boarding turn
    Boarding,
    /// One-shot "batch complete" signal awaited by the bus
    CompletionBarrier,
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::Admission => write!(f, "admission gate"),
            Gate::Boarding => write!(f, "boarding gate"),
            Gate::CompletionBarrier => write!(f, "completion barrier"),
        }
    }
}

/// Kinds of participants created by the arrival generators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    /// Rider generator
    Rider,
    /// Bus generator
    Bus,
}

impl fmt::Display for ParticipantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantKind::Rider => write!(f, "rider"),
            ParticipantKind::Bus => write!(f, "bus"),
        }
    }
}

impl FromStr for ParticipantKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rider" | "riders" => Ok(ParticipantKind::Rider),
            "bus" | "buses" => Ok(ParticipantKind::Bus),
            _ => Err(format!("Unknown participant kind: {}", s)),
        }
    }
}
