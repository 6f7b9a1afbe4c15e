//! Depth and altitude telemetry from the CTD, and directives sent back to it.

use serde::{Deserialize, Serialize};

/// Altitude assumed until the altimeter reports: the top of its range [m].
pub const DEFAULT_ALTITUDE_M: f64 = 100.0;

/// One CTD sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CtdTelemetry {
    /// Pressure depth [m].
    pub depth_m: f64,
    /// Height above the seafloor [m].
    #[serde(alias = "altitude")]
    pub alt_m: f64,
}

/// Logging directive for the CTD collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CtdDirective {
    /// Start acquisition (sent at the staging pause).
    Init,
    /// Stop acquisition (sent at up-stage).
    Stop,
}
