//! Error types and handling
//!
//! This module contains error types and error handling for the simulation.
//! The rendezvous protocol itself has a single failure mode, an interrupted
//! wait; everything else here belongs to setup and output.

use crate::types::{ConfigError, ConfigValidationError, Gate, ParticipantId};
use thiserror::Error;
use tracing::error;

/// Errors that can occur during simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A participant blocked on a gate was woken without the expected signal
    #[error("{participant} was interrupted while waiting on the {gate}")]
    InterruptedWait {
        /// The participant whose wait was cut short
        participant: ParticipantId,
        /// Where it was blocked
        gate: Gate,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ConfigurationError(String),

    /// Logging could not be initialized
    #[error("Logging setup failed: {0}")]
    LoggingError(String),

    /// Async runtime error (task join, timer)
    #[error("Runtime error: {0}")]
    RuntimeError(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<ConfigError> for SimulationError {
    fn from(error: ConfigError) -> Self {
        SimulationError::ConfigurationError(error.to_string())
    }
}

impl From<ConfigValidationError> for SimulationError {
    fn from(error: ConfigValidationError) -> Self {
        SimulationError::ConfigurationError(error.to_string())
    }
}

impl From<tokio::task::JoinError> for SimulationError {
    fn from(error: tokio::task::JoinError) -> Self {
        SimulationError::RuntimeError(error.to_string())
    }
}

impl SimulationError {
    /// Create an interrupted-wait error
    pub fn interrupted(participant: impl Into<ParticipantId>, gate: Gate) -> Self {
        Self::InterruptedWait { participant: participant.into(), gate }
    }

    /// Create a configuration error
    pub fn configuration_error(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create a runtime error
    pub fn runtime_error(msg: impl Into<String>) -> Self {
        Self::RuntimeError(msg.into())
    }

    /// Check if this is a recoverable error
    ///
    /// An interrupted participant is never retried: it terminates where it stood.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SimulationError::InterruptedWait { .. } => false,
            SimulationError::ConfigurationError(_) => false,
            SimulationError::LoggingError(_) => true,
            SimulationError::RuntimeError(_) => false,
            SimulationError::IoError(_) => true,
            SimulationError::SerializationError(_) => true,
        }
    }

    /// Get the error category
    pub fn category(&self) -> &'static str {
        match self {
            SimulationError::InterruptedWait { .. } => "Interrupted Wait",
            SimulationError::ConfigurationError(_) => "Configuration",
            SimulationError::LoggingError(_) => "Logging",
            SimulationError::RuntimeError(_) => "Runtime",
            SimulationError::IoError(_) => "IO",
            SimulationError::SerializationError(_) => "Serialization",
        }
    }

    /// The gate involved, for interrupted waits
    pub fn gate(&self) -> Option<Gate> {
        match self {
            SimulationError::InterruptedWait { gate, .. } => Some(*gate),
            _ => None,
        }
    }

    /// Log this error with its category
    pub fn log(&self) {
        error!(category = self.category(), recoverable = self.is_recoverable(), "{}", self);
    }
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;
