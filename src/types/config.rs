//! Configuration structures for the bus stop simulator
//!
//! This module contains the simulation configuration structure and validation logic
//! used to control the stop capacity, the arrival processes, and the run itself.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default values for the stop and its arrival processes
pub mod defaults {
    /// Maximum number of simultaneously admitted riders
    pub const CAPACITY: usize = 50;

    /// Mean time between rider arrivals (30 seconds)
    pub const RIDER_ARRIVAL_MEAN_MS: f64 = 30.0 * 1000.0;

    /// Mean time between bus arrivals (20 minutes)
    pub const BUS_ARRIVAL_MEAN_MS: f64 = 20.0 * 60.0 * 1000.0;

    /// Real time runs at simulated speed
    pub const TIME_SCALE: f64 = 1.0;

    /// Grace period for in-flight participants after spawning stops
    pub const SHUTDOWN_GRACE_MS: u64 = 1000;
}

/// Command line arguments structure
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bus-stop-simulator",
    version,
    about = "Bus Stop Simulator - riders and buses meet under an all-or-nothing boarding rule",
    long_about = "Simulates a bus stop where riders and buses arrive with exponentially distributed inter-arrival times. A bus takes exactly the riders waiting when it arrived, up to the stop capacity, and departs once all of them have boarded.

EXAMPLES:
    # Run with default settings (rider every 30s, bus every 20min on average)
    bus-stop-simulator

    # Watch an hour of traffic in a minute
    bus-stop-simulator --time-scale 60 --duration-secs 60

    # Use a configuration file
    bus-stop-simulator --config stop.json

    # Generate configuration template
    bus-stop-simulator --print-config > stop.json

    # Record every stop event as JSON lines
    bus-stop-simulator --event-output events.jsonl --verbose

CONFIGURATION:
    Configuration can be provided via:
    1. Command line arguments (highest priority)
    2. Configuration file (--config flag)
    3. Default values (lowest priority)

    Supported configuration file formats: JSON (.json)"
)]
pub struct CliArgs {
    /// Configuration file path (JSON format)
    #[arg(
        short,
        long,
        help = "Configuration file path (JSON format)",
        long_help = "Path to a JSON configuration file. CLI arguments will override file settings."
    )]
    pub config: Option<String>,

    /// Maximum number of simultaneously admitted riders
    #[arg(
        long,
        help = "Stop capacity",
        long_help = "Maximum number of riders admitted to the stop at once. Must be greater than 0. Default: 50"
    )]
    pub capacity: Option<usize>,

    /// Mean rider inter-arrival time in milliseconds
    #[arg(long, help = "Mean rider inter-arrival time (ms)")]
    pub rider_arrival_mean_ms: Option<f64>,

    /// Mean bus inter-arrival time in milliseconds
    #[arg(long, help = "Mean bus inter-arrival time (ms)")]
    pub bus_arrival_mean_ms: Option<f64>,

    /// Simulated milliseconds per real millisecond
    #[arg(
        long,
        help = "Time acceleration factor",
        long_help = "Sampled inter-arrival times are divided by this factor before sleeping. Must be positive. Default: 1.0"
    )]
    pub time_scale: Option<f64>,

    /// Duration of the physical boarding step in milliseconds
    #[arg(long, help = "Boarding time per rider (ms)")]
    pub boarding_time_ms: Option<u64>,

    /// Stop spawning participants after this many seconds
    #[arg(long, help = "Run for this many seconds, then stop (default: until Ctrl-C)")]
    pub duration_secs: Option<u64>,

    /// Grace period for in-flight participants
    #[arg(long, help = "Grace period for in-flight participants after stopping (ms)")]
    pub shutdown_grace_ms: Option<u64>,

    /// Random seed for reproducible results
    #[arg(long, help = "Random seed for reproducible arrival times")]
    pub seed: Option<u64>,

    /// Output path for stop events
    #[arg(long, help = "Output path for stop events (JSON lines)")]
    pub event_output: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    /// Emit logs as JSON
    #[arg(long, help = "Format log output as JSON")]
    pub json_logs: bool,

    /// Directory for rolling log files
    #[arg(long, help = "Also write logs to daily rolling files in this directory")]
    pub log_dir: Option<String>,

    /// Dry run mode - validate configuration without running simulation
    #[arg(long, help = "Validate configuration without running simulation")]
    pub dry_run: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in JSON format and exit")]
    pub print_config: bool,
}

/// Configuration file structure (allows partial configuration)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Maximum number of simultaneously admitted riders
    pub capacity: Option<usize>,

    /// Mean rider inter-arrival time in milliseconds
    pub rider_arrival_mean_ms: Option<f64>,

    /// Mean bus inter-arrival time in milliseconds
    pub bus_arrival_mean_ms: Option<f64>,

    /// Simulated milliseconds per real millisecond
    pub time_scale: Option<f64>,

    /// Duration of the physical boarding step in milliseconds
    pub boarding_time_ms: Option<u64>,

    /// Stop spawning participants after this many seconds
    pub duration_secs: Option<u64>,

    /// Grace period for in-flight participants in milliseconds
    pub shutdown_grace_ms: Option<u64>,

    /// Random seed for reproducible results
    pub seed: Option<u64>,

    /// Output path for stop events
    pub event_output: Option<String>,
}

/// Configuration for the bus stop simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Maximum number of simultaneously admitted riders
    pub capacity: usize,

    /// Mean rider inter-arrival time in milliseconds
    pub rider_arrival_mean_ms: f64,

    /// Mean bus inter-arrival time in milliseconds
    pub bus_arrival_mean_ms: f64,

    /// Simulated milliseconds per real millisecond
    pub time_scale: f64,

    /// Duration of the physical boarding step in milliseconds
    pub boarding_time_ms: u64,

    /// Stop spawning participants after this many seconds (None = run until stopped)
    pub duration_secs: Option<u64>,

    /// Grace period for in-flight participants in milliseconds
    pub shutdown_grace_ms: u64,

    /// Random seed for reproducible results
    pub seed: Option<u64>,

    /// Output path for stop events
    pub event_output: Option<String>,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Configuration file read error
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported configuration file format
    #[error("Unsupported configuration file format: {0} (supported: .json)")]
    UnsupportedFormat(String),
}

/// Validation errors for simulation configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    /// Capacity is invalid
    #[error("Capacity must be greater than 0, got {0}")]
    InvalidCapacity(usize),

    /// An arrival mean is not a positive finite number
    #[error("Invalid arrival mean for {field}: {value} (must be a positive number of milliseconds)")]
    InvalidArrivalMean {
        /// Name of the field with the invalid mean
        field: String,
        /// The invalid value
        value: f64,
    },

    /// Time scale is not a positive finite number
    #[error("Time scale must be a positive number, got {0}")]
    InvalidTimeScale(f64),

    /// Run duration is zero
    #[error("Duration must be greater than 0 seconds when set")]
    InvalidDuration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::CAPACITY,
            rider_arrival_mean_ms: defaults::RIDER_ARRIVAL_MEAN_MS,
            bus_arrival_mean_ms: defaults::BUS_ARRIVAL_MEAN_MS,
            time_scale: defaults::TIME_SCALE,
            boarding_time_ms: 0,
            duration_secs: None,
            shutdown_grace_ms: defaults::SHUTDOWN_GRACE_MS,
            seed: None,
            event_output: None,
        }
    }
}

impl SimulationConfig {
    /// Create configuration from parsed CLI arguments
    pub fn from_cli_args(args: CliArgs) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(config_path) = &args.config {
            config = Self::from_file(config_path)?;
        }

        // CLI takes precedence over the file
        Self::apply_cli_overrides(&mut config, args);

        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let content = fs::read_to_string(path)?;
                let config_file: ConfigFile = serde_json::from_str(&content)?;
                Ok(Self::from_config_file(config_file))
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }

    /// Create configuration from a config file, merging with defaults
    fn from_config_file(config_file: ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            capacity: config_file.capacity.unwrap_or(defaults.capacity),
            rider_arrival_mean_ms: config_file
                .rider_arrival_mean_ms
                .unwrap_or(defaults.rider_arrival_mean_ms),
            bus_arrival_mean_ms: config_file
                .bus_arrival_mean_ms
                .unwrap_or(defaults.bus_arrival_mean_ms),
            time_scale: config_file.time_scale.unwrap_or(defaults.time_scale),
            boarding_time_ms: config_file.boarding_time_ms.unwrap_or(defaults.boarding_time_ms),
            duration_secs: config_file.duration_secs.or(defaults.duration_secs),
            shutdown_grace_ms: config_file
                .shutdown_grace_ms
                .unwrap_or(defaults.shutdown_grace_ms),
            seed: config_file.seed.or(defaults.seed),
            event_output: config_file.event_output.or(defaults.event_output),
        }
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(config: &mut Self, args: CliArgs) {
        if let Some(value) = args.capacity {
            config.capacity = value;
        }
        if let Some(value) = args.rider_arrival_mean_ms {
            config.rider_arrival_mean_ms = value;
        }
        if let Some(value) = args.bus_arrival_mean_ms {
            config.bus_arrival_mean_ms = value;
        }
        if let Some(value) = args.time_scale {
            config.time_scale = value;
        }
        if let Some(value) = args.boarding_time_ms {
            config.boarding_time_ms = value;
        }
        if let Some(value) = args.duration_secs {
            config.duration_secs = Some(value);
        }
        if let Some(value) = args.shutdown_grace_ms {
            config.shutdown_grace_ms = value;
        }
        if let Some(value) = args.seed {
            config.seed = Some(value);
        }
        if let Some(value) = args.event_output {
            config.event_output = Some(value);
        }
    }

    /// Print configuration as JSON
    pub fn print_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.capacity == 0 {
            return Err(ConfigValidationError::InvalidCapacity(self.capacity));
        }

        Self::validate_mean("rider_arrival_mean_ms", self.rider_arrival_mean_ms)?;
        Self::validate_mean("bus_arrival_mean_ms", self.bus_arrival_mean_ms)?;

        if !(self.time_scale.is_finite() && self.time_scale > 0.0) {
            return Err(ConfigValidationError::InvalidTimeScale(self.time_scale));
        }

        if self.duration_secs == Some(0) {
            return Err(ConfigValidationError::InvalidDuration);
        }

        Ok(())
    }

    fn validate_mean(field: &str, value: f64) -> Result<(), ConfigValidationError> {
        if !(value.is_finite() && value > 0.0) {
            return Err(ConfigValidationError::InvalidArrivalMean {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }

    /// Physical boarding time per rider
    pub fn boarding_time(&self) -> Duration {
        Duration::from_millis(self.boarding_time_ms)
    }

    /// Configured run length, if any
    pub fn run_duration(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::from_secs)
    }

    /// Grace period for in-flight participants
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn empty_args() -> CliArgs {
        CliArgs::try_parse_from(["test"]).unwrap()
    }

    #[test]
    fn test_simulation_config_default() {
        let config = SimulationConfig::default();
        assert_eq!(config.capacity, 50);
        assert_eq!(config.rider_arrival_mean_ms, 30_000.0);
        assert_eq!(config.bus_arrival_mean_ms, 1_200_000.0);
        assert_eq!(config.time_scale, 1.0);
        assert_eq!(config.boarding_time_ms, 0);
        assert!(config.duration_secs.is_none());
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_loading() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, r#"{{ "capacity": 2, "seed": 42, "time_scale": 100.0 }}"#).unwrap();

        let config = SimulationConfig::from_file(file.path()).unwrap();
        assert_eq!(config.capacity, 2);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.time_scale, 100.0);
        // Unspecified fields fall back to defaults
        assert_eq!(config.rider_arrival_mean_ms, defaults::RIDER_ARRIVAL_MEAN_MS);
    }

    #[test]
    fn test_config_file_errors() {
        let missing = SimulationConfig::from_file("/definitely/not/here.json");
        assert!(matches!(missing, Err(ConfigError::FileNotFound(_))));

        let file = NamedTempFile::with_suffix(".yaml").unwrap();
        let unsupported = SimulationConfig::from_file(file.path());
        assert!(matches!(unsupported, Err(ConfigError::UnsupportedFormat(_))));

        let mut bad = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(bad, "{{ not json").unwrap();
        assert!(matches!(SimulationConfig::from_file(bad.path()), Err(ConfigError::JsonError(_))));
    }

    #[test]
    fn test_cli_overrides() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, r#"{{ "capacity": 10, "boarding_time_ms": 5 }}"#).unwrap();

        let mut args = empty_args();
        args.config = Some(file.path().display().to_string());
        args.capacity = Some(3);
        args.seed = Some(7);

        let config = SimulationConfig::from_cli_args(args).unwrap();
        assert_eq!(config.capacity, 3);
        assert_eq!(config.boarding_time_ms, 5);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_simulation_config_validation_capacity() {
        let config = SimulationConfig { capacity: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidCapacity(0))));
    }

    #[test]
    fn test_simulation_config_validation_means() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = SimulationConfig { bus_arrival_mean_ms: bad, ..Default::default() };
            match config.validate() {
                Err(ConfigValidationError::InvalidArrivalMean { field, .. }) => {
                    assert_eq!(field, "bus_arrival_mean_ms")
                }
                other => panic!("expected invalid mean, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_simulation_config_validation_time_scale_and_duration() {
        let config = SimulationConfig { time_scale: 0.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidTimeScale(_))));

        let config = SimulationConfig { duration_secs: Some(0), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidDuration)));
    }

    #[test]
    fn test_simulation_config_serialization() {
        let config = SimulationConfig { seed: Some(9), ..Default::default() };
        let json = config.print_json().unwrap();
        let back: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_simulation_config_helper_methods() {
        let config = SimulationConfig {
            boarding_time_ms: 250,
            duration_secs: Some(3),
            shutdown_grace_ms: 10,
            ..Default::default()
        };
        assert_eq!(config.boarding_time(), Duration::from_millis(250));
        assert_eq!(config.run_duration(), Some(Duration::from_secs(3)));
        assert_eq!(config.shutdown_grace(), Duration::from_millis(10));
    }
}
