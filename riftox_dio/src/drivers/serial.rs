//! The DIO controller on a serial TTY.

use riftox_common::config::DioConfig;
use serialport::{ClearBuffer, SerialPort};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::error::DioError;
use crate::port::DioPort;
use crate::wire::{self, PinCommand};

/// Time for the controller to print its prompt after the wake-up newline.
const WAKE_DELAY: Duration = Duration::from_millis(50);

/// Serial-attached controller.
pub struct SerialDio {
    port: Box<dyn SerialPort>,
    path: String,
}

impl SerialDio {
    /// Open the TTY named in the configuration with its read timeout.
    pub fn open(config: &DioConfig) -> Result<Self, DioError> {
        if !Path::new(&config.port).exists() {
            return Err(DioError::PortUnavailable {
                port: config.port.clone(),
                reason: "no such device".to_string(),
            });
        }
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(config.timeout())
            .open()
            .map_err(|e| DioError::PortUnavailable {
                port: config.port.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            port,
            path: config.port.clone(),
        })
    }

    fn io_error(&self, e: impl std::fmt::Display) -> DioError {
        DioError::LinkFailure(format!("{}: {e}", self.path))
    }

    /// Read until the echo and reply lines are both in, or the port times out.
    fn read_reply(&mut self) -> Result<String, DioError> {
        let mut raw = Vec::with_capacity(128);
        let mut buf = [0u8; 128];
        loop {
            match self.port.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    raw.extend_from_slice(&buf[..n]);
                    if count_line_ends(&raw) >= 2 {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) => return Err(self.io_error(e)),
            }
        }
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

fn count_line_ends(raw: &[u8]) -> usize {
    raw.windows(2).filter(|w| *w == b"\r\n").count()
}

impl DioPort for SerialDio {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn send(&mut self, command: &PinCommand) -> Result<String, DioError> {
        let line = command.to_wire();

        self.port.write_all(b"\r\n").map_err(|e| self.io_error(e))?;
        thread::sleep(WAKE_DELAY);
        self.port
            .clear(ClearBuffer::Input)
            .map_err(|e| self.io_error(e))?;

        self.port
            .write_all(line.as_bytes())
            .map_err(|e| self.io_error(e))?;
        self.port.flush().map_err(|e| self.io_error(e))?;

        let raw = self.read_reply()?;
        wire::extract_reply(&line, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tty_is_reported() {
        let config = DioConfig {
            port: "/dev/riftox-does-not-exist".to_string(),
            baud_rate: 115_200,
            timeout_ms: 100,
            simulation: false,
        };
        assert!(matches!(
            SerialDio::open(&config),
            Err(DioError::PortUnavailable { .. })
        ));
    }

    #[test]
    fn line_end_counting() {
        assert_eq!(count_line_ends(b"dio edge DI_G0 1\r\n12\r\n>"), 2);
        assert_eq!(count_line_ends(b"dio edge"), 0);
    }
}
