//! Composite actuator sequences.
//!
//! `DioCommander` knows which pin does what and at which level. Each public
//! sequence runs inside one [`DioLink::transaction`], so status polling from
//! another thread cannot slip in between its steps.

use riftox_common::consts::{
    DIO_GROUP_COUNT, DOWNCAST_ENERGIZED, LATCH_HELD, MOTOR_STOP_ASSERTED, UPCAST_ENERGIZED,
};
use riftox_common::pins::{Level, PinAssignment, PinSet};
use riftox_common::winch::state::Direction;
use static_assertions::assert_impl_all;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::DioError;
use crate::link::DioLink;
use crate::wire::PinCommand;

/// Gap between the individual writes of a sequence.
const DEFAULT_COMMAND_GAP: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct DioCommander {
    link: DioLink,
    pins: PinSet,
    command_gap: Duration,
}

assert_impl_all!(DioCommander: Send, Sync);

impl DioCommander {
    pub fn new(link: DioLink, pins: PinSet) -> Self {
        Self {
            link,
            pins,
            command_gap: DEFAULT_COMMAND_GAP,
        }
    }

    /// Override the pause between writes (tests use zero).
    pub fn with_command_gap(mut self, gap: Duration) -> Self {
        self.command_gap = gap;
        self
    }

    pub fn link(&self) -> &DioLink {
        &self.link
    }

    pub fn pins(&self) -> &PinSet {
        &self.pins
    }

    /// Bring the controller to a known state: all output groups sourcing,
    /// direction outputs off, motor stop asserted, latch released.
    pub fn init(&self) -> Result<(), DioError> {
        self.link.transaction(|link| {
            for group in 0..DIO_GROUP_COUNT {
                link.exchange(&PinCommand::SourceMode { group })?;
            }
            link.set(self.pins.upcast, UPCAST_ENERGIZED.inverted())?;
            link.set(self.pins.downcast, DOWNCAST_ENERGIZED.inverted())?;
            link.set(self.pins.motor_stop, MOTOR_STOP_ASSERTED)?;
            link.set(self.pins.latch_release, LATCH_HELD.inverted())?;
            info!(driver = link.driver(), "DIO controller initialized");
            Ok(())
        })
    }

    fn write_all(&self, steps: &[(PinAssignment, Level)]) -> Result<(), DioError> {
        self.link.transaction(|link| {
            for (i, (addr, level)) in steps.iter().enumerate() {
                if i > 0 && !self.command_gap.is_zero() {
                    thread::sleep(self.command_gap);
                }
                link.set(*addr, *level)?;
            }
            Ok(())
        })
    }

    /// Assert motor stop and drop both direction outputs.
    ///
    /// Every write is attempted even if an earlier one fails; the first
    /// failure is returned.
    pub fn stop_winch(&self) -> Result<(), DioError> {
        self.link.transaction(|link| {
            let steps = [
                (self.pins.motor_stop, MOTOR_STOP_ASSERTED),
                (self.pins.downcast, DOWNCAST_ENERGIZED.inverted()),
                (self.pins.upcast, UPCAST_ENERGIZED.inverted()),
            ];
            let mut first_err = None;
            for (addr, level) in steps {
                if let Err(e) = link.set(addr, level) {
                    warn!(pin = %addr, error = %e, "stop write failed");
                    first_err.get_or_insert(e);
                }
            }
            debug!("winch stopped");
            first_err.map_or(Ok(()), Err)
        })
    }

    /// Start paying out from the staging position.
    pub fn stage(&self) -> Result<(), DioError> {
        self.down_cast()
    }

    pub fn down_cast(&self) -> Result<(), DioError> {
        self.write_all(&[
            (self.pins.upcast, UPCAST_ENERGIZED.inverted()),
            (self.pins.downcast, DOWNCAST_ENERGIZED),
            (self.pins.motor_stop, MOTOR_STOP_ASSERTED.inverted()),
        ])
    }

    pub fn up_cast(&self) -> Result<(), DioError> {
        self.write_all(&[
            (self.pins.upcast, UPCAST_ENERGIZED),
            (self.pins.downcast, DOWNCAST_ENERGIZED.inverted()),
            (self.pins.motor_stop, MOTOR_STOP_ASSERTED.inverted()),
        ])
    }

    /// Pay out for `duration`, then stop.
    pub fn down_cast_for(&self, duration: Duration) -> Result<(), DioError> {
        self.link.transaction(|_| {
            self.down_cast()?;
            thread::sleep(duration);
            self.stop_winch()
        })
    }

    /// Haul in for `duration`, then stop.
    pub fn up_cast_for(&self, duration: Duration) -> Result<(), DioError> {
        self.link.transaction(|_| {
            self.up_cast()?;
            thread::sleep(duration);
            self.stop_winch()
        })
    }

    pub fn latch_hold(&self) -> Result<(), DioError> {
        self.link.set(self.pins.latch_release, LATCH_HELD)
    }

    pub fn latch_release(&self) -> Result<(), DioError> {
        self.link.set(self.pins.latch_release, LATCH_HELD.inverted())
    }

    /// Direction from the output levels. Motor stop wins; otherwise exactly
    /// one energized direction output gives the direction.
    pub fn direction(&self) -> Result<Direction, DioError> {
        self.link.transaction(|link| {
            if link.read_output(self.pins.motor_stop)? == MOTOR_STOP_ASSERTED {
                return Ok(Direction::None);
            }
            let up = link.read_output(self.pins.upcast)? == UPCAST_ENERGIZED;
            let down = link.read_output(self.pins.downcast)? == DOWNCAST_ENERGIZED;
            Ok(match (up, down) {
                (true, false) => Direction::Up,
                (false, true) => Direction::Down,
                (true, true) | (false, false) => Direction::None,
            })
        })
    }

    pub fn latch_edge_count(&self) -> Result<u64, DioError> {
        self.link.edge_count(self.pins.latch_sensor)
    }

    /// Both payout counters; the first drives the depth estimate.
    pub fn payout_edge_counts(&self) -> Result<[u64; 2], DioError> {
        self.link.transaction(|link| {
            let p1 = link.edge_count(self.pins.payout1)?;
            let p2 = link.edge_count(self.pins.payout2)?;
            Ok([p1, p2])
        })
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
