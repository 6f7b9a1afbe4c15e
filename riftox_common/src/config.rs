//! Configuration loading traits and types.
//!
//! A single TOML file configures the winch controller. Every section is
//! deserialized through [`ConfigLoader`] and checked by
//! [`WinctlConfig::validate`] before any hardware is touched.
//!
//! # Usage
//!
//! ```rust,no_run
//! use riftox_common::config::{load_config, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = load_config(Path::new("winctl.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::consts::DEFAULT_PULSES_PER_REVOLUTION;
use crate::pins::PinSet;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// TOML parsing failed (includes missing required keys).
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_filter(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Fields shared by every RIFT-OX service.
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "winctl"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// Implemented for every `DeserializeOwned` type.
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid or a required key is absent
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.to_path_buf())
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

// ─── DIO link ───────────────────────────────────────────────────────

/// Serial link to the DIO controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DioConfig {
    /// TTY device path, e.g. `/dev/ttyACM0`.
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Per-exchange read timeout [ms].
    #[serde(default = "default_dio_timeout_ms")]
    pub timeout_ms: u64,

    /// Use the simulated controller instead of the TTY.
    #[serde(default)]
    pub simulation: bool,
}

impl DioConfig {
    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_baud_rate() -> u32 {
    115_200
}
fn default_dio_timeout_ms() -> u64 {
    100
}

// ─── Winch physics & timings ────────────────────────────────────────

/// Depth limits, pause durations, sheave geometry and actuator timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinchConfig {
    /// Depth of the initial pause of every downcast [m].
    pub staging_depth: f64,
    /// Closest allowed approach to the seafloor [m].
    pub min_altitude: f64,
    /// Absolute depth limit [m].
    pub max_depth: f64,

    pub pause_duration_secs: u64,
    pub bottle_pause_duration_secs: u64,

    pub sheave_radius_inch: f64,
    pub sea_cable_diameter_inch: f64,
    #[serde(default = "default_pulses_per_revolution")]
    pub pulses_per_revolution: f64,

    #[serde(default = "default_unparking_upcast_ms")]
    pub unparking_upcast_ms: u64,
    #[serde(default = "default_unparking_downcast_ms")]
    pub unparking_downcast_ms: u64,
    #[serde(default = "default_unparking_latch_hold_ms")]
    pub unparking_latch_hold_ms: u64,
    #[serde(default = "default_unparking_settle_ms")]
    pub unparking_settle_ms: u64,

    /// Blind up-cast before homing starts [ms].
    #[serde(default = "default_parking_approach_ms")]
    pub parking_approach_ms: u64,
    /// Latch sensor poll interval while homing [ms].
    #[serde(default = "default_parking_poll_ms")]
    pub parking_poll_ms: u64,
    /// Homing deadline [s]. The motor is stopped when it expires.
    #[serde(default = "default_parking_timeout_secs")]
    pub parking_timeout_secs: u64,
    #[serde(default = "default_parking_settle_ms")]
    pub parking_settle_ms: u64,
    #[serde(default = "default_parking_downcast_ms")]
    pub parking_downcast_ms: u64,

    /// Stop at the surface instead of homing against the latch.
    #[serde(default)]
    pub no_parking: bool,

    /// Simulated payout pulse rate [pulses/s].
    #[serde(default = "default_sim_pulse_rate_hz")]
    pub sim_pulse_rate_hz: f64,
}

impl WinchConfig {
    pub fn pause_duration(&self) -> Duration {
        Duration::from_secs(self.pause_duration_secs)
    }

    pub fn bottle_pause_duration(&self) -> Duration {
        Duration::from_secs(self.bottle_pause_duration_secs)
    }

    pub fn parking_timeout(&self) -> Duration {
        Duration::from_secs(self.parking_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("staging_depth", self.staging_depth),
            ("min_altitude", self.min_altitude),
            ("max_depth", self.max_depth),
            ("sheave_radius_inch", self.sheave_radius_inch),
            ("sea_cable_diameter_inch", self.sea_cable_diameter_inch),
            ("pulses_per_revolution", self.pulses_per_revolution),
            ("sim_pulse_rate_hz", self.sim_pulse_rate_hz),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "winch.{key} must be a positive number, got {value}"
                )));
            }
        }

        let non_zero = [
            ("pause_duration_secs", self.pause_duration_secs),
            ("bottle_pause_duration_secs", self.bottle_pause_duration_secs),
            ("parking_poll_ms", self.parking_poll_ms),
            ("parking_timeout_secs", self.parking_timeout_secs),
        ];
        for (key, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "winch.{key} must be greater than zero"
                )));
            }
        }

        if self.max_depth <= self.staging_depth {
            return Err(ConfigError::ValidationError(format!(
                "winch.max_depth ({}) must exceed winch.staging_depth ({})",
                self.max_depth, self.staging_depth
            )));
        }
        Ok(())
    }
}

fn default_pulses_per_revolution() -> f64 {
    DEFAULT_PULSES_PER_REVOLUTION
}
fn default_unparking_upcast_ms() -> u64 {
    500
}
fn default_unparking_downcast_ms() -> u64 {
    2000
}
fn default_unparking_latch_hold_ms() -> u64 {
    2000
}
fn default_unparking_settle_ms() -> u64 {
    5000
}
fn default_parking_approach_ms() -> u64 {
    10_000
}
fn default_parking_poll_ms() -> u64 {
    100
}
fn default_parking_timeout_secs() -> u64 {
    120
}
fn default_parking_settle_ms() -> u64 {
    1000
}
fn default_parking_downcast_ms() -> u64 {
    500
}
fn default_sim_pulse_rate_hz() -> f64 {
    12.0
}

// ─── Loops ──────────────────────────────────────────────────────────

/// Polling periods of the control threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopConfig {
    #[serde(default = "default_command_period_ms")]
    pub command_period_ms: u64,
    #[serde(default = "default_monitor_period_ms")]
    pub monitor_period_ms: u64,
    #[serde(default = "default_pause_period_ms")]
    pub pause_period_ms: u64,
    /// Capacity of every inter-thread queue.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            command_period_ms: default_command_period_ms(),
            monitor_period_ms: default_monitor_period_ms(),
            pause_period_ms: default_pause_period_ms(),
            queue_depth: default_queue_depth(),
        }
    }
}

impl LoopConfig {
    pub fn command_period(&self) -> Duration {
        Duration::from_millis(self.command_period_ms)
    }

    pub fn monitor_period(&self) -> Duration {
        Duration::from_millis(self.monitor_period_ms)
    }

    pub fn pause_period(&self) -> Duration {
        Duration::from_millis(self.pause_period_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_period_ms == 0 || self.monitor_period_ms == 0 || self.pause_period_ms == 0 {
            return Err(ConfigError::ValidationError(
                "loop periods must be greater than zero".to_string(),
            ));
        }
        if self.queue_depth == 0 {
            return Err(ConfigError::ValidationError(
                "loops.queue_depth must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_command_period_ms() -> u64 {
    100
}
fn default_monitor_period_ms() -> u64 {
    100
}
fn default_pause_period_ms() -> u64 {
    250
}
fn default_queue_depth() -> usize {
    64
}

// ─── Operations ─────────────────────────────────────────────────────

/// Files and optional behaviours of a deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpsConfig {
    /// Append-only `(timestamp, depth)` log. Disabled when absent.
    #[serde(default)]
    pub payout_log: Option<PathBuf>,

    /// TOML file with `DEPTHS = [...]`. No scheduled pauses when absent.
    #[serde(default)]
    pub pause_depths_file: Option<PathBuf>,

    /// Cross-check payout depth against live CTD depth.
    #[serde(default)]
    pub realtime_ctd: bool,
}

// ─── Top-level ──────────────────────────────────────────────────────

/// Complete `winctl` configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinctlConfig {
    pub shared: SharedConfig,
    pub dio: DioConfig,
    pub pins: PinSet,
    pub winch: WinchConfig,
    #[serde(default)]
    pub loops: LoopConfig,
    #[serde(default)]
    pub ops: OpsConfig,
}

impl WinctlConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.pins.validate().map_err(ConfigError::ValidationError)?;
        self.winch.validate()?;
        self.loops.validate()?;
        if self.dio.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "dio.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if !self.dio.simulation && self.dio.port.is_empty() {
            return Err(ConfigError::ValidationError(
                "dio.port cannot be empty unless dio.simulation is set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load and validate a `winctl` configuration file.
pub fn load_config(path: &Path) -> Result<WinctlConfig, ConfigError> {
    let config = WinctlConfig::load(path)?;
    config.validate()?;
    tracing::debug!(path = %path.display(), service = %config.shared.service_name, "configuration loaded");
    Ok(config)
}

// ─── Tests ──────────────────────────────────────────────────────────
