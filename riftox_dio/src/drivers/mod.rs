//! DIO port implementations.
//!
//! - [`serial`] - The real controller on a TTY
//! - [`simulation`] - A self-consistent software controller
//! - [`scripted`] - A recording port with queued sensor replies, for tests
//!
//! The driver is chosen once, here, from the configuration.

pub mod scripted;
pub mod serial;
pub mod simulation;

use riftox_common::config::WinctlConfig;
use tracing::info;

use crate::error::DioError;
use crate::port::DioPort;

/// Open the port selected by `dio.simulation`.
pub fn open(config: &WinctlConfig) -> Result<Box<dyn DioPort>, DioError> {
    if config.dio.simulation {
        info!(pulse_rate_hz = config.winch.sim_pulse_rate_hz, "using simulated DIO controller");
        return Ok(Box::new(simulation::SimulatedDio::new(
            config.pins,
            config.winch.sim_pulse_rate_hz,
        )));
    }
    let port = serial::SerialDio::open(&config.dio)?;
    info!(port = %config.dio.port, baud = config.dio.baud_rate, "opened DIO controller");
    Ok(Box::new(port))
}
