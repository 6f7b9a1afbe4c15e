//! Payout depth from the sheave pulse counter.
//!
//! The controller's edge counter only ever increases. The estimator turns it
//! into per-direction totals by attributing each delta to the direction the
//! winch was commanded to move in when the delta accrued.

use riftox_common::config::WinchConfig;
use riftox_common::consts::INCHES_PER_METER;
use riftox_common::winch::state::MotionState;
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Sheave and cable dimensions that turn pulses into meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheaveGeometry {
    pub sheave_radius_inch: f64,
    pub cable_diameter_inch: f64,
    pub pulses_per_revolution: f64,
}

impl SheaveGeometry {
    pub fn from_config(cfg: &WinchConfig) -> Self {
        Self {
            sheave_radius_inch: cfg.sheave_radius_inch,
            cable_diameter_inch: cfg.sea_cable_diameter_inch,
            pulses_per_revolution: cfg.pulses_per_revolution,
        }
    }

    /// Cable travel per payout pulse [m].
    ///
    /// The cable wraps the sheave at its centerline, so the effective radius
    /// is the sheave radius plus half the cable diameter.
    #[inline]
    pub fn meters_per_pulse(&self) -> f64 {
        let effective_radius = self.sheave_radius_inch + self.cable_diameter_inch / 2.0;
        2.0 * PI * effective_radius / self.pulses_per_revolution / INCHES_PER_METER
    }
}

/// Which total a pulse delta accrues to in `state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Accrual {
    Down,
    Up,
    Ignore,
}

const fn accrual(state: MotionState) -> Accrual {
    match state {
        MotionState::Staging | MotionState::Downcasting => Accrual::Down,
        MotionState::Upcasting => Accrual::Up,
        MotionState::Parked
        | MotionState::DownStaged
        | MotionState::UpStaged
        | MotionState::MaxDepth
        | MotionState::Parking
        | MotionState::DownPaused
        | MotionState::UpPaused => Accrual::Ignore,
    }
}

#[derive(Debug, Clone)]
pub struct PositionEstimator {
    geometry: SheaveGeometry,
    meters_per_pulse: f64,
    down_edges: u64,
    up_edges: u64,
    last_raw: Option<u64>,
}

impl PositionEstimator {
    pub fn new(geometry: SheaveGeometry) -> Self {
        Self {
            geometry,
            meters_per_pulse: geometry.meters_per_pulse(),
            down_edges: 0,
            up_edges: 0,
            last_raw: None,
        }
    }

    /// Fold a raw counter sample in, attributing the delta by `state`.
    ///
    /// The first sample only sets the reference. A counter that went
    /// backwards (controller restart) is re-referenced without accrual.
    pub fn update(&mut self, state: MotionState, raw: u64) {
        let Some(last) = self.last_raw.replace(raw) else {
            debug!(raw, "payout counter referenced");
            return;
        };
        let Some(delta) = raw.checked_sub(last) else {
            warn!(last, raw, "payout counter went backwards, re-referencing");
            return;
        };
        match accrual(state) {
            Accrual::Down => self.down_edges += delta,
            Accrual::Up => self.up_edges += delta,
            Accrual::Ignore => {
                if delta > 0 {
                    debug!(state = %state, delta, "payout pulses while stationary, ignored");
                }
            }
        }
    }

    /// Signed payout depth [m]: cable out minus cable in.
    pub fn depth_m(&self) -> f64 {
        (self.down_edges as f64 - self.up_edges as f64) * self.meters_per_pulse
    }

    /// Zero both totals. The next sample re-references the counter.
    pub fn rezero(&mut self) {
        self.down_edges = 0;
        self.up_edges = 0;
        self.last_raw = None;
    }

    pub fn down_edges(&self) -> u64 {
        self.down_edges
    }

    pub fn up_edges(&self) -> u64 {
        self.up_edges
    }

    pub fn geometry(&self) -> &SheaveGeometry {
        &self.geometry
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
