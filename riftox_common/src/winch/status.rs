//! Outbound status snapshot.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use super::state::{Direction, MotionState};

/// Winch status published once per command-loop tick.
///
/// Never cached beyond one tick; a fresh snapshot is taken every time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinchStatus {
    #[serde(alias = "dir")]
    pub direction: Direction,
    /// Payout depth [m], rounded to centimetres.
    pub depth_m: f64,
    pub state: MotionState,
    /// Unix epoch seconds, rounded to hundredths.
    pub ts: f64,
}

impl WinchStatus {
    /// Snapshot stamped with the current wall-clock time.
    pub fn now(direction: Direction, depth_m: f64, state: MotionState) -> Self {
        Self::at(direction, depth_m, state, unix_now())
    }

    pub fn at(direction: Direction, depth_m: f64, state: MotionState, ts: f64) -> Self {
        Self {
            direction,
            depth_m: round2(depth_m),
            state,
            ts: round2(ts),
        }
    }
}

/// Seconds since the Unix epoch. A clock before 1970 reads as zero.
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[inline]
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
