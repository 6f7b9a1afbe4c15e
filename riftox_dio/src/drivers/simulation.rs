//! Simulated DIO controller.
//!
//! Keeps output levels, pays cable in or out at a fixed pulse rate while the
//! direction outputs say the motor runs, and counts two latch-sensor edges
//! when the package is hauled up past the latch. Replies look exactly like
//! the real controller's, so everything above the port is unaware of it.

use riftox_common::consts::{DOWNCAST_ENERGIZED, MOTOR_STOP_ASSERTED, UPCAST_ENERGIZED};
use riftox_common::pins::{Level, PinAssignment, PinSet};
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

use crate::error::DioError;
use crate::port::DioPort;
use crate::wire::PinCommand;

/// Pulses below the latch at which the sensor re-arms.
const LATCH_REARM_PULSES: f64 = 1.0;

/// Edges the latch sensor produces when the package passes it.
const LATCH_PASS_EDGES: u64 = 2;

pub struct SimulatedDio {
    pins: PinSet,
    pulse_rate_hz: f64,
    outputs: HashMap<PinAssignment, Level>,
    /// Cable paid out below the latch, in pulses. Negative above it.
    position: f64,
    /// Monotonic payout counter seen by both payout sensors.
    payout_pulses: f64,
    latch_edges: u64,
    at_latch: bool,
    last_update: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Stopped,
    Up,
    Down,
}

impl SimulatedDio {
    /// Start parked: at the latch, motor stopped.
    pub fn new(pins: PinSet, pulse_rate_hz: f64) -> Self {
        Self::starting_at(pins, pulse_rate_hz, Instant::now())
    }

    fn starting_at(pins: PinSet, pulse_rate_hz: f64, now: Instant) -> Self {
        let mut outputs = HashMap::new();
        outputs.insert(pins.motor_stop, MOTOR_STOP_ASSERTED);
        outputs.insert(pins.downcast, DOWNCAST_ENERGIZED.inverted());
        outputs.insert(pins.upcast, UPCAST_ENERGIZED.inverted());
        Self {
            pins,
            pulse_rate_hz,
            outputs,
            position: 0.0,
            payout_pulses: 0.0,
            latch_edges: 0,
            at_latch: true,
            last_update: now,
        }
    }

    fn level(&self, addr: PinAssignment) -> Level {
        self.outputs.get(&addr).copied().unwrap_or(Level::Low)
    }

    fn motion(&self) -> Motion {
        if self.level(self.pins.motor_stop) == MOTOR_STOP_ASSERTED {
            return Motion::Stopped;
        }
        let up = self.level(self.pins.upcast) == UPCAST_ENERGIZED;
        let down = self.level(self.pins.downcast) == DOWNCAST_ENERGIZED;
        match (up, down) {
            (true, false) => Motion::Up,
            (false, true) => Motion::Down,
            (true, true) | (false, false) => Motion::Stopped,
        }
    }

    fn advance_to(&mut self, now: Instant) {
        let dt = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.last_update = now;
        let pulses = dt * self.pulse_rate_hz;
        match self.motion() {
            Motion::Stopped => {}
            Motion::Down => {
                self.payout_pulses += pulses;
                self.position += pulses;
                if self.position > LATCH_REARM_PULSES {
                    self.at_latch = false;
                }
            }
            Motion::Up => {
                self.payout_pulses += pulses;
                self.position -= pulses;
                if self.position <= 0.0 && !self.at_latch {
                    self.at_latch = true;
                    self.latch_edges += LATCH_PASS_EDGES;
                    debug!(edges = self.latch_edges, "simulated latch crossing");
                }
            }
        }
    }

    pub(crate) fn send_at(&mut self, command: &PinCommand, now: Instant) -> Result<String, DioError> {
        self.advance_to(now);
        let reply = match *command {
            PinCommand::SourceMode { .. } => String::new(),
            PinCommand::Set { addr, level } => {
                self.outputs.insert(addr, level);
                String::new()
            }
            PinCommand::GetOutput { addr } => readback(self.level(addr)),
            PinCommand::GetInput { addr } => {
                let active = addr == self.pins.latch_sensor && self.at_latch;
                readback(if active { Level::High } else { Level::Low })
            }
            PinCommand::EdgeCount { addr } => {
                if addr == self.pins.latch_sensor {
                    self.latch_edges.to_string()
                } else if addr == self.pins.payout1 || addr == self.pins.payout2 {
                    (self.payout_pulses.floor() as u64).to_string()
                } else {
                    "0".to_string()
                }
            }
        };
        Ok(reply)
    }
}

fn readback(level: Level) -> String {
    match level {
        Level::High => "1".to_string(),
        Level::Low => "0".to_string(),
    }
}

impl DioPort for SimulatedDio {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn send(&mut self, command: &PinCommand) -> Result<String, DioError> {
        self.send_at(command, Instant::now())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn pins() -> PinSet {
        PinSet {
            motor_stop: PinAssignment::new(0, 0),
            downcast: PinAssignment::new(0, 1),
            upcast: PinAssignment::new(0, 2),
            latch_release: PinAssignment::new(0, 3),
            latch_sensor: PinAssignment::new(1, 0),
            payout1: PinAssignment::new(1, 1),
            payout2: PinAssignment::new(1, 2),
        }
    }

    fn set(sim: &mut SimulatedDio, addr: PinAssignment, level: Level, now: Instant) {
        sim.send_at(&PinCommand::Set { addr, level }, now).unwrap();
    }

    fn edges(sim: &mut SimulatedDio, addr: PinAssignment, now: Instant) -> u64 {
        sim.send_at(&PinCommand::EdgeCount { addr }, now)
            .unwrap()
            .parse()
            .unwrap()
    }

    fn run(sim: &mut SimulatedDio, up: bool, now: Instant) {
        let p = pins();
        set(sim, p.upcast, if up { Level::High } else { Level::Low }, now);
        set(sim, p.downcast, if up { Level::Low } else { Level::High }, now);
        set(sim, p.motor_stop, Level::Low, now);
    }

    #[test]
    fn stopped_motor_accrues_nothing() {
        let t0 = Instant::now();
        let mut sim = SimulatedDio::starting_at(pins(), 12.0, t0);
        assert_eq!(edges(&mut sim, pins().payout1, t0 + Duration::from_secs(10)), 0);
    }

    #[test]
    fn payout_accrues_at_pulse_rate() {
        let t0 = Instant::now();
        let mut sim = SimulatedDio::starting_at(pins(), 12.0, t0);
        run(&mut sim, false, t0);
        assert_eq!(edges(&mut sim, pins().payout1, t0 + Duration::from_secs(5)), 60);
        assert_eq!(edges(&mut sim, pins().payout2, t0 + Duration::from_secs(5)), 60);
    }

    #[test]
    fn hauling_past_latch_counts_edges() {
        let p = pins();
        let t0 = Instant::now();
        let mut sim = SimulatedDio::starting_at(p, 12.0, t0);
        run(&mut sim, false, t0);
        let t1 = t0 + Duration::from_secs(2);
        run(&mut sim, true, t1);
        assert_eq!(edges(&mut sim, p.latch_sensor, t1 + Duration::from_secs(1)), 0);
        assert_eq!(edges(&mut sim, p.latch_sensor, t1 + Duration::from_secs(3)), 2);
        // counters never run backwards
        assert_eq!(edges(&mut sim, p.payout1, t1 + Duration::from_secs(3)), 60);
    }

    #[test]
    fn output_readback() {
        let p = pins();
        let t0 = Instant::now();
        let mut sim = SimulatedDio::starting_at(p, 12.0, t0);
        let reply = sim.send_at(&PinCommand::GetOutput { addr: p.motor_stop }, t0).unwrap();
        assert_eq!(reply, "1");
        set(&mut sim, p.motor_stop, Level::Low, t0);
        let reply = sim.send_at(&PinCommand::GetOutput { addr: p.motor_stop }, t0).unwrap();
        assert_eq!(reply, "0");
    }
}
