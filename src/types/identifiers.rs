//! Identifier types for the bus stop simulator
//!
//! Riders and buses are identity-only entities numbered by the generator that
//! created them. Each simulation run additionally carries a UUID-based run
//! identifier used to correlate log lines and event output.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Identifier of a rider, assigned by the rider generator (1-based, increasing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiderId(pub u64);

impl RiderId {
    /// Create a rider identifier from its arrival index
    pub fn new(index: u64) -> Self {
        Self(index)
    }

    /// The arrival index of this rider
    pub fn index(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RiderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rider #{}", self.0)
    }
}

/// Identifier of a bus, assigned by the bus generator (1-based, increasing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusId(pub u64);

impl BusId {
    /// Create a bus identifier from its arrival index
    pub fn new(index: u64) -> Self {
        Self(index)
    }

    /// The arrival index of this bus
    pub fn index(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bus #{}", self.0)
    }
}

/// Unique identifier for one simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new random run ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RUN_{}", self.0.simple())
    }
}

impl Serialize for RunId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("RUN_{}", self.0.simple()))
    }
}

impl<'de> Deserialize<'de> for RunId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let raw = s.strip_prefix("RUN_").unwrap_or(&s);
        let uuid = Uuid::parse_str(raw).map_err(serde::de::Error::custom)?;
        Ok(RunId(uuid))
    }
}

/// Either kind of participant, for log lines and error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ParticipantId {
    /// A rider
    Rider(RiderId),
    /// A bus
    Bus(BusId),
}

impl From<RiderId> for ParticipantId {
    fn from(id: RiderId) -> Self {
        ParticipantId::Rider(id)
    }
}

impl From<BusId> for ParticipantId {
    fn from(id: BusId) -> Self {
        ParticipantId::Bus(id)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantId::Rider(id) => id.fmt(f),
            ParticipantId::Bus(id) => id.fmt(f),
        }
    }
}
