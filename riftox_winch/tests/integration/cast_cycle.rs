//! Integration test: unpark and a complete autonomous cast.
//!
//! 1. START while parked runs the unpark sequence and stages
//! 2. On the simulated controller the threads take the winch through
//!    staging pause, bottom stop, ascent, up-stage and parking unattended

use riftox_common::consts::{DOWNCAST_ENERGIZED, LATCH_HELD, MOTOR_STOP_ASSERTED, UPCAST_ENERGIZED};
use riftox_common::winch::command::{CommandMessage, WinchCommand};
use riftox_common::winch::state::MotionState;
use riftox_dio::{drivers, DioCommander, DioLink};
use riftox_winch::runtime;
use riftox_winch::winch::Outcome;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::support::{pins, scripted_winch, simulated_config};

#[test]
fn start_while_parked_unparks_then_stages() {
    let (mut winch, script) = scripted_winch();
    let p = pins();

    let out = winch.handle(WinchCommand::Start).unwrap();
    assert_eq!(
        out,
        Outcome::Transitioned {
            from: MotionState::Parked,
            to: MotionState::Staging
        }
    );

    let up = [
        (p.upcast, UPCAST_ENERGIZED),
        (p.downcast, DOWNCAST_ENERGIZED.inverted()),
        (p.motor_stop, MOTOR_STOP_ASSERTED.inverted()),
    ];
    let down = [
        (p.upcast, UPCAST_ENERGIZED.inverted()),
        (p.downcast, DOWNCAST_ENERGIZED),
        (p.motor_stop, MOTOR_STOP_ASSERTED.inverted()),
    ];
    let stop = [
        (p.motor_stop, MOTOR_STOP_ASSERTED),
        (p.downcast, DOWNCAST_ENERGIZED.inverted()),
        (p.upcast, UPCAST_ENERGIZED.inverted()),
    ];

    let mut expected = Vec::new();
    expected.extend(up);
    expected.extend(stop);
    expected.push((p.latch_release, LATCH_HELD));
    expected.extend(down);
    expected.extend(stop);
    expected.push((p.latch_release, LATCH_HELD.inverted()));
    expected.extend(down);
    assert_eq!(script.sets(), expected);
}

#[test]
fn simulated_cast_runs_unattended() {
    let config = simulated_config();
    let port = drivers::open(&config).unwrap();
    let dio = DioCommander::new(DioLink::new(port), config.pins);
    dio.init().unwrap();

    let shutdown = Arc::new(AtomicBool::new(false));
    let (rt, endpoints) = runtime::spawn(&config, dio, Arc::clone(&shutdown)).unwrap();
    endpoints
        .commands
        .send(CommandMessage::named("START"))
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(20);
    let mut seen = Vec::new();
    let mut deepest: f64 = 0.0;
    while Instant::now() < deadline {
        let Ok(status) = endpoints.status.recv_timeout(Duration::from_millis(100)) else {
            continue;
        };
        deepest = deepest.max(status.depth_m);
        if seen.last() != Some(&status.state) {
            seen.push(status.state);
        }
        if status.state == MotionState::Parked && seen.contains(&MotionState::UpStaged) {
            break;
        }
    }
    shutdown.store(true, Ordering::SeqCst);
    rt.join();

    // Every stage of the cast was observed in order.
    let order = [
        MotionState::Staging,
        MotionState::DownStaged,
        MotionState::Downcasting,
        MotionState::MaxDepth,
        MotionState::Upcasting,
        MotionState::UpStaged,
        MotionState::Parked,
    ];
    let mut cursor = seen.iter();
    for state in order {
        assert!(
            cursor.any(|s| *s == state),
            "{state} missing or out of order in {seen:?}"
        );
    }
    assert!(deepest > config.winch.max_depth, "deepest {deepest}");
    assert!(deepest < config.winch.max_depth + 2.0, "deepest {deepest}");
}
