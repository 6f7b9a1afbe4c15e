//! Prelude module for common re-exports.
//!
//! ```rust
//! use riftox_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ConfigError, ConfigLoader, DioConfig, LogLevel, LoopConfig, OpsConfig, SharedConfig,
    WinchConfig, WinctlConfig, load_config,
};

// ─── Pins ───────────────────────────────────────────────────────────
pub use crate::pins::{Level, Pin, PinAssignment, PinSet};

// ─── Winch ──────────────────────────────────────────────────────────
pub use crate::winch::bus::{Inbound, Outbound};
pub use crate::winch::command::{CommandError, CommandMessage, PauseKind, WinchCommand};
pub use crate::winch::state::{Direction, MotionState};
pub use crate::winch::status::WinchStatus;
pub use crate::winch::telemetry::{CtdDirective, CtdTelemetry};
