//! Physical constants and per-signal pin polarity.
//!
//! Polarity is pinned down once per physical signal here. Code that drives or
//! reads a pin refers to these constants instead of writing `high`/`low` or
//! negating a read inline.

use crate::pins::Level;

/// Inches per meter, used by the sheave geometry.
pub const INCHES_PER_METER: f64 = 39.37008;

/// Pulses emitted by a payout sensor per sheave revolution.
pub const DEFAULT_PULSES_PER_REVOLUTION: f64 = 12.0;

/// Output groups present on the DIO controller (`DO_G0`..`DO_G3`).
pub const DIO_GROUP_COUNT: u8 = 4;

/// Pins per DIO group.
pub const DIO_PINS_PER_GROUP: u8 = 4;

// ─── Output polarity ────────────────────────────────────────────────

/// Motor-stop output level that holds the winch stopped.
pub const MOTOR_STOP_ASSERTED: Level = Level::High;

/// Downcast output level that drives the winch down.
pub const DOWNCAST_ENERGIZED: Level = Level::High;

/// Upcast output level that drives the winch up.
pub const UPCAST_ENERGIZED: Level = Level::High;

/// Latch output level that holds the latch open.
pub const LATCH_HELD: Level = Level::High;
