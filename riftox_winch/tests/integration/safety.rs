//! Integration test: safety limits and the up-stage.
//!
//! The monitor's decisions are fed back into the winch the way the command
//! loop would, and the resulting state and outputs are checked.

use riftox_common::consts::{DOWNCAST_ENERGIZED, MOTOR_STOP_ASSERTED};
use riftox_common::winch::command::WinchCommand;
use riftox_common::winch::state::{Direction, MotionState};
use riftox_common::winch::status::WinchStatus;
use riftox_common::winch::telemetry::CtdTelemetry;
use riftox_winch::monitor::{BreachReason, MonitorLimits, SafetyAction, SafetyMonitor};
use riftox_winch::schedule::PauseDepthSchedule;
use riftox_winch::state::machine::Operation;
use riftox_winch::winch::Winch;

use super::support::{pins, scripted_winch};

fn monitor() -> SafetyMonitor {
    let limits = MonitorLimits {
        staging_depth: 10.0,
        min_altitude: 5.0,
        max_depth: 30.0,
        realtime_ctd: false,
    };
    SafetyMonitor::new(limits, PauseDepthSchedule::empty())
}

/// Apply every command the monitor asked for.
fn apply(winch: &mut Winch, actions: &[SafetyAction]) {
    for action in actions {
        match action {
            SafetyAction::Command(cmd) | SafetyAction::Breach { command: cmd, .. } => {
                winch.handle(*cmd).unwrap();
            }
            SafetyAction::Ctd(_) => {}
        }
    }
}

#[test]
fn low_altitude_stops_at_bottom() {
    let (mut winch, script) = scripted_winch();
    winch.set_state(MotionState::DownStaged);
    winch.apply(Operation::Start).unwrap();
    let mut mon = monitor();

    let status = WinchStatus::at(Direction::Down, 25.0, MotionState::Downcasting, 0.0);
    let actions = mon.evaluate(
        &status,
        Some(CtdTelemetry {
            depth_m: 25.0,
            alt_m: 3.0,
        }),
    );
    assert!(matches!(
        actions.as_slice(),
        [SafetyAction::Breach {
            command: WinchCommand::StopAtMaxDepth,
            reason: BreachReason::Altitude { .. }
        }]
    ));

    apply(&mut winch, &actions);
    assert_eq!(winch.state(), MotionState::MaxDepth);
    assert_eq!(script.output(pins().motor_stop), Some(MOTOR_STOP_ASSERTED));
}

#[test]
fn max_depth_wins_without_altitude() {
    let (mut winch, _script) = scripted_winch();
    winch.set_state(MotionState::DownStaged);
    winch.apply(Operation::Start).unwrap();
    let mut mon = monitor();

    let status = WinchStatus::at(Direction::Down, 30.2, MotionState::Downcasting, 0.0);
    let actions = mon.evaluate(&status, None);
    apply(&mut winch, &actions);
    assert_eq!(winch.state(), MotionState::MaxDepth);
}

#[test]
fn upstage_only_below_staging_depth() {
    let (mut winch, _script) = scripted_winch();
    winch.set_state(MotionState::MaxDepth);
    winch.apply(Operation::Start).unwrap();
    assert_eq!(winch.state(), MotionState::Upcasting);
    let mut mon = monitor();

    let at_12 = WinchStatus::at(Direction::Up, 12.0, MotionState::Upcasting, 0.0);
    let actions = mon.evaluate(&at_12, None);
    assert!(actions.is_empty());
    apply(&mut winch, &actions);
    assert_eq!(winch.state(), MotionState::Upcasting);

    let at_9 = WinchStatus::at(Direction::Up, 9.0, MotionState::Upcasting, 0.0);
    let actions = mon.evaluate(&at_9, None);
    assert!(actions.contains(&SafetyAction::Command(WinchCommand::UpStage)));
    apply(&mut winch, &actions);
    assert_eq!(winch.state(), MotionState::UpStaged);
}

#[test]
fn staging_pause_holds_at_staging_depth() {
    let (mut winch, _script) = scripted_winch();
    winch.handle(WinchCommand::Start).unwrap();
    assert_eq!(winch.state(), MotionState::Staging);
    let mut mon = monitor();

    let status = WinchStatus::at(Direction::Down, 10.3, MotionState::Staging, 0.0);
    let actions = mon.evaluate(&status, None);
    apply(&mut winch, &actions);
    assert_eq!(winch.state(), MotionState::DownStaged);
}

#[test]
fn altitude_breach_while_staging_stops_motor() {
    let (mut winch, script) = scripted_winch();
    winch.handle(WinchCommand::Start).unwrap();
    assert_eq!(winch.state(), MotionState::Staging);
    let mut mon = monitor();

    let status = WinchStatus::at(Direction::Down, 4.0, MotionState::Staging, 0.0);
    let actions = mon.evaluate(
        &status,
        Some(CtdTelemetry {
            depth_m: 4.0,
            alt_m: 1.0,
        }),
    );
    assert!(matches!(
        actions.as_slice(),
        [SafetyAction::Breach {
            command: WinchCommand::Stop,
            reason: BreachReason::Altitude { .. }
        }]
    ));

    apply(&mut winch, &actions);
    assert_eq!(winch.state(), MotionState::DownStaged);
    let p = pins();
    assert_eq!(script.output(p.motor_stop), Some(MOTOR_STOP_ASSERTED));
    assert_eq!(script.output(p.downcast), Some(DOWNCAST_ENERGIZED.inverted()));
}
