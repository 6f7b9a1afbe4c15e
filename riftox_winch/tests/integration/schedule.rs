//! Integration test: sampling pauses on the upcast.
//!
//! 1. Depths below the deepest point of the cast are skipped for good
//! 2. The monitor pauses at each reachable depth and the pause coordinator
//!    resumes the ascent
//! 3. The depths file is re-read at the turnaround

use crossbeam_channel::bounded;
use riftox_common::winch::command::{PauseKind, WinchCommand};
use riftox_common::winch::state::{Direction, MotionState};
use riftox_common::winch::status::WinchStatus;
use riftox_winch::monitor::{MonitorLimits, SafetyAction, SafetyMonitor};
use riftox_winch::pause::PauseCoordinator;
use riftox_winch::schedule::{PauseDepthSchedule, StaticDepths, TomlDepthFile};
use std::fs;
use std::time::{Duration, Instant};
use tempfile::tempdir;

use super::support::scripted_winch;

fn limits() -> MonitorLimits {
    MonitorLimits {
        staging_depth: 5.0,
        min_altitude: 2.0,
        max_depth: 100.0,
        realtime_ctd: false,
    }
}

#[test]
fn discarded_depth_never_returns_within_a_cast() {
    let mut schedule = PauseDepthSchedule::new(Box::new(StaticDepths(vec![20.0, 15.0, 10.0]))).unwrap();
    assert_eq!(schedule.get_next(18.0), Some(15.0));
    assert_eq!(schedule.get_next(22.0), Some(15.0));
    schedule.use_next();
    assert_eq!(schedule.get_next(22.0), Some(10.0));
    schedule.use_next();
    assert_eq!(schedule.get_next(22.0), None);

    schedule.refresh().unwrap();
    assert_eq!(schedule.get_next(22.0), Some(20.0));
}

#[test]
fn ascent_pauses_and_resumes_at_each_depth() {
    let (pause_tx, pause_rx) = bounded(8);
    let (winch, _script) = scripted_winch();
    let mut winch = winch.with_pause_notifier(pause_tx);
    let schedule = PauseDepthSchedule::new(Box::new(StaticDepths(vec![15.0, 8.0]))).unwrap();
    let mut monitor = SafetyMonitor::new(limits(), schedule);
    let mut pauses = PauseCoordinator::new(Duration::from_secs(30), Duration::from_secs(90));

    // Bottom of the cast at 18 m.
    winch.set_state(MotionState::Downcasting);
    monitor.evaluate(&WinchStatus::at(Direction::Down, 18.0, MotionState::Downcasting, 0.0), None);
    winch.handle(WinchCommand::StopAtMaxDepth).unwrap();
    assert_eq!(pause_rx.try_recv(), Ok(PauseKind::Default));
    winch.handle(WinchCommand::Start).unwrap();
    assert_eq!(winch.state(), MotionState::Upcasting);

    let mut clock = Instant::now();
    for target in [15.0, 8.0] {
        let status = WinchStatus::at(Direction::Up, target - 0.1, MotionState::Upcasting, 0.0);
        let actions = monitor.evaluate(&status, None);
        assert_eq!(
            actions,
            vec![SafetyAction::Command(WinchCommand::Pause(PauseKind::Bottle))]
        );
        winch.handle(WinchCommand::Pause(PauseKind::Bottle)).unwrap();
        assert_eq!(winch.state(), MotionState::UpPaused);

        let kind = pause_rx.try_recv().unwrap();
        pauses.request(kind, clock);
        assert_eq!(pauses.tick(clock + Duration::from_secs(89)), None);
        clock += Duration::from_secs(91);
        let resume = pauses.tick(clock).unwrap();
        winch.handle(resume).unwrap();
        assert_eq!(winch.state(), MotionState::Upcasting);

        // The monitor sees the state change back to upcasting.
        monitor.evaluate(&WinchStatus::at(Direction::None, target - 0.1, MotionState::UpPaused, 0.0), None);
    }
    assert_eq!(monitor.schedule().completed(), &[15.0, 8.0]);
}

#[test]
fn turnaround_rereads_depths_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("depths.toml");
    fs::write(&path, "DEPTHS = [12.0]\n").unwrap();

    let schedule = PauseDepthSchedule::new(Box::new(TomlDepthFile::new(&path))).unwrap();
    let mut monitor = SafetyMonitor::new(limits(), schedule);
    monitor.evaluate(&WinchStatus::at(Direction::Down, 40.0, MotionState::Downcasting, 0.0), None);
    monitor.evaluate(&WinchStatus::at(Direction::None, 40.0, MotionState::MaxDepth, 0.0), None);

    fs::write(&path, "DEPTHS = [30.0, 12.0]\n").unwrap();
    let actions = monitor.evaluate(&WinchStatus::at(Direction::Up, 29.0, MotionState::Upcasting, 0.0), None);
    assert_eq!(
        actions,
        vec![SafetyAction::Command(WinchCommand::Pause(PauseKind::Bottle))]
    );
    assert_eq!(monitor.schedule().completed(), &[30.0]);
}
