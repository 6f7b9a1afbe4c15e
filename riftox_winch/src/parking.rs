//! Latch homing.
//!
//! Hauls the package up until the latch sensor counts a new edge, then
//! stops, releases the latch and lowers briefly so the package settles onto
//! it. Any sensor failure stops the motor before the error is returned; the
//! winch never keeps moving without sensor feedback.

use riftox_common::config::WinchConfig;
use riftox_dio::{DioCommander, DioError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParkingError {
    #[error("latch sensor read failed, winch stopped: {0}")]
    SensorError(DioError),

    #[error("actuator command failed during parking: {0}")]
    Actuator(DioError),

    #[error("latch not reached within {timeout:?} ({polls} polls), winch stopped")]
    Timeout { timeout: Duration, polls: u32 },
}

/// Homing timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParkingTimings {
    pub poll: Duration,
    pub timeout: Duration,
    pub settle: Duration,
    pub downcast: Duration,
}

impl ParkingTimings {
    pub fn from_config(cfg: &WinchConfig) -> Self {
        Self {
            poll: Duration::from_millis(cfg.parking_poll_ms),
            timeout: cfg.parking_timeout(),
            settle: Duration::from_millis(cfg.parking_settle_ms),
            downcast: Duration::from_millis(cfg.parking_downcast_ms),
        }
    }
}

/// Sequence progress, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParkingPhase {
    #[default]
    Idle,
    Baseline,
    Hauling,
    Releasing,
    Settling,
    Done,
    Failed,
}

/// What a successful run observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParkingReport {
    pub baseline: u64,
    pub latched_at: u64,
    pub polls: u32,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct ParkingSequencer {
    timings: ParkingTimings,
    phase: ParkingPhase,
}

impl ParkingSequencer {
    pub fn new(timings: ParkingTimings) -> Self {
        Self {
            timings,
            phase: ParkingPhase::Idle,
        }
    }

    pub fn phase(&self) -> ParkingPhase {
        self.phase
    }

    pub fn timings(&self) -> &ParkingTimings {
        &self.timings
    }

    /// Run the homing sequence. Holds the DIO link for its whole duration.
    pub fn run(&mut self, dio: &DioCommander) -> Result<ParkingReport, ParkingError> {
        let result = dio.link().transaction(|_| self.sequence(dio));
        self.phase = match &result {
            Ok(_) => ParkingPhase::Done,
            Err(e) => {
                error!(error = %e, "parking failed");
                ParkingPhase::Failed
            }
        };
        result
    }

    fn sequence(&mut self, dio: &DioCommander) -> Result<ParkingReport, ParkingError> {
        let started = Instant::now();

        self.phase = ParkingPhase::Baseline;
        let baseline = dio.latch_edge_count().map_err(ParkingError::SensorError)?;
        debug!(baseline, "latch baseline");

        self.phase = ParkingPhase::Hauling;
        if let Err(e) = dio.up_cast() {
            halt(dio);
            return Err(ParkingError::Actuator(e));
        }

        let mut polls = 0u32;
        let latched_at = loop {
            thread::sleep(self.timings.poll);
            polls += 1;
            let count = match dio.latch_edge_count() {
                Ok(count) => count,
                Err(e) => {
                    halt(dio);
                    return Err(ParkingError::SensorError(e));
                }
            };
            if count > baseline {
                break count;
            }
            if started.elapsed() >= self.timings.timeout {
                halt(dio);
                return Err(ParkingError::Timeout {
                    timeout: self.timings.timeout,
                    polls,
                });
            }
        };

        self.phase = ParkingPhase::Releasing;
        dio.stop_winch().map_err(ParkingError::Actuator)?;
        info!(baseline, latched_at, polls, "latch reached");
        dio.latch_release().map_err(ParkingError::Actuator)?;

        self.phase = ParkingPhase::Settling;
        thread::sleep(self.timings.settle);
        dio.down_cast_for(self.timings.downcast)
            .map_err(ParkingError::Actuator)?;

        Ok(ParkingReport {
            baseline,
            latched_at,
            polls,
            elapsed: started.elapsed(),
        })
    }
}

fn halt(dio: &DioCommander) {
    if let Err(e) = dio.stop_winch() {
        warn!(error = %e, "stop after parking fault failed");
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
