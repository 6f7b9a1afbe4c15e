//! Integration test: homing against the latch.
//!
//! 1. PARK from up-stage approaches, homes, releases and settles
//! 2. A homing failure leaves the winch stopped at up-stage, ready to retry
//! 3. Re-park works from any state

use riftox_common::consts::{DOWNCAST_ENERGIZED, LATCH_HELD, MOTOR_STOP_ASSERTED, UPCAST_ENERGIZED};
use riftox_common::winch::command::WinchCommand;
use riftox_common::winch::state::MotionState;
use riftox_dio::PinCommand;
use riftox_winch::parking::ParkingError;
use riftox_winch::winch::{Outcome, WinchError};

use super::support::{pins, scripted_winch};

#[test]
fn park_stops_on_fourth_poll_then_settles() {
    let (mut winch, script) = scripted_winch();
    let p = pins();
    winch.set_state(MotionState::UpStaged);
    script.queue_edges(p.latch_sensor, [5, 5, 5, 5, 7]);
    script.clear_sent();

    let out = winch.handle(WinchCommand::Park).unwrap();
    assert_eq!(
        out,
        Outcome::Transitioned {
            from: MotionState::UpStaged,
            to: MotionState::Parked
        }
    );

    let sent = script.sent();
    let latch_reads: Vec<usize> = sent
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, PinCommand::EdgeCount { addr } if *addr == p.latch_sensor))
        .map(|(i, _)| i)
        .collect();
    // baseline + four polls
    assert_eq!(latch_reads.len(), 5);

    // After the latching poll: stop, release, short downcast, stop.
    let after: Vec<_> = sent[latch_reads[4] + 1..]
        .iter()
        .filter_map(|c| match c {
            PinCommand::Set { addr, level } => Some((*addr, *level)),
            _ => None,
        })
        .collect();
    assert_eq!(after[0], (p.motor_stop, MOTOR_STOP_ASSERTED));
    assert_eq!(after[3], (p.latch_release, LATCH_HELD.inverted()));
    assert_eq!(after[5], (p.downcast, DOWNCAST_ENERGIZED));
    assert_eq!(script.output(p.motor_stop), Some(MOTOR_STOP_ASSERTED));
    assert_eq!(winch.depth_m(), 0.0);
}

#[test]
fn homing_timeout_returns_to_up_stage() {
    let (mut winch, script) = scripted_winch();
    let p = pins();
    winch.set_state(MotionState::UpStaged);
    script.queue_edges(p.latch_sensor, [2]);

    let err = winch.handle(WinchCommand::Park).unwrap_err();
    assert!(matches!(
        err,
        WinchError::Parking(ParkingError::Timeout { .. })
    ));
    assert_eq!(winch.state(), MotionState::UpStaged);
    assert_eq!(script.output(p.motor_stop), Some(MOTOR_STOP_ASSERTED));
    assert_eq!(script.output(p.upcast), Some(UPCAST_ENERGIZED.inverted()));

    // The sensor recovers and a second PARK succeeds.
    script.queue_edges(p.latch_sensor, [3]);
    winch.handle(WinchCommand::Park).unwrap();
    assert_eq!(winch.state(), MotionState::Parked);
}

#[test]
fn park_while_parked_is_rejected_but_repark_homes() {
    let (mut winch, script) = scripted_winch();
    let out = winch.handle(WinchCommand::Park).unwrap();
    assert!(matches!(out, Outcome::Rejected(_)));
    assert!(script.sets().is_empty());

    script.queue_edges(pins().latch_sensor, [0, 0, 2]);
    let report = winch.repark().unwrap();
    assert_eq!(report.latched_at, 2);
    assert_eq!(winch.state(), MotionState::Parked);
}
