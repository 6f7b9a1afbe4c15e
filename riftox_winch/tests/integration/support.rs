//! Shared rigs for the integration tests.

use riftox_common::config::{WinchConfig, WinctlConfig};
use riftox_common::pins::{PinAssignment, PinSet};
use riftox_dio::drivers::scripted::{self, ScriptHandle};
use riftox_dio::{DioCommander, DioLink};
use riftox_winch::winch::Winch;
use std::time::Duration;

/// Winch section with millisecond actuator timings.
pub const WINCH: &str = r#"
staging_depth = 10.0
min_altitude = 5.0
max_depth = 30.0
pause_duration_secs = 1
bottle_pause_duration_secs = 2
sheave_radius_inch = 6.0
sea_cable_diameter_inch = 0.25
unparking_upcast_ms = 1
unparking_downcast_ms = 1
unparking_latch_hold_ms = 1
unparking_settle_ms = 1
parking_approach_ms = 1
parking_poll_ms = 1
parking_timeout_secs = 1
parking_settle_ms = 1
parking_downcast_ms = 1
"#;

pub fn pins() -> PinSet {
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

pub fn winch_config() -> WinchConfig {
    toml::from_str(WINCH).unwrap()
}

pub fn commander() -> (DioCommander, ScriptHandle) {
    let (port, script) = scripted::scripted();
    let dio = DioCommander::new(DioLink::new(Box::new(port)), pins())
        .with_command_gap(Duration::ZERO);
    (dio, script)
}

/// A parked winch on a scripted controller.
pub fn scripted_winch() -> (Winch, ScriptHandle) {
    let (dio, script) = commander();
    (Winch::new(dio, &winch_config()), script)
}

/// Full configuration on the simulated controller with a fast pulse rate.
pub fn simulated_config() -> WinctlConfig {
    let text = format!(
        r#"
[shared]
service_name = "winctl-it"

[dio]
port = ""
simulation = true

[pins]
motor_stop = {{ group = 0, pin = 0 }}
downcast = {{ group = 0, pin = 1 }}
upcast = {{ group = 0, pin = 2 }}
latch_release = {{ group = 0, pin = 3 }}
latch_sensor = {{ group = 1, pin = 0 }}
payout1 = {{ group = 1, pin = 1 }}
payout2 = {{ group = 1, pin = 2 }}

[winch]
{WINCH}
sim_pulse_rate_hz = 400.0

[loops]
command_period_ms = 5
monitor_period_ms = 5
pause_period_ms = 5
queue_depth = 64
"#
    );
    let mut config: WinctlConfig = toml::from_str(&text).unwrap();
    config.winch.staging_depth = 2.0;
    config.winch.max_depth = 6.0;
    config.validate().unwrap();
    config
}
