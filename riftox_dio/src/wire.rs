//! Controller command encoding and reply extraction.
//!
//! Commands are ASCII lines terminated by `\r`. The controller echoes the
//! command, then prints the reply on the following line.

use riftox_common::pins::{Level, PinAssignment};
use std::fmt;

use crate::error::DioError;

/// One controller request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinCommand {
    /// Put output group `DO_G{group}` in source mode.
    SourceMode { group: u8 },
    /// Drive an output.
    Set { addr: PinAssignment, level: Level },
    /// Read back an output level.
    GetOutput { addr: PinAssignment },
    /// Read an input level.
    GetInput { addr: PinAssignment },
    /// Read an input's edge counter.
    EdgeCount { addr: PinAssignment },
}

impl PinCommand {
    /// Encode as sent on the wire, including the trailing `\r`.
    pub fn to_wire(&self) -> String {
        match self {
            Self::SourceMode { group } => format!("dio mode DO_G{group} source\r"),
            Self::Set { addr, level } => {
                format!("dio set DO_G{} {} {}\r", addr.group, addr.pin, level.as_wire())
            }
            Self::GetOutput { addr } => format!("dio get DO_G{} output {}\r", addr.group, addr.pin),
            Self::GetInput { addr } => format!("dio get DI_G{} input {}\r", addr.group, addr.pin),
            Self::EdgeCount { addr } => format!("dio edge DI_G{} {}\r", addr.group, addr.pin),
        }
    }

    /// Whether the reply carries a value.
    pub const fn is_query(&self) -> bool {
        matches!(
            self,
            Self::GetOutput { .. } | Self::GetInput { .. } | Self::EdgeCount { .. }
        )
    }
}

impl fmt::Display for PinCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_wire().trim_end())
    }
}

/// Pull the reply line out of the raw bytes read after `command` was written.
///
/// The raw text is split on `\r\n`; the first element is the echo and the
/// second is the reply.
pub fn extract_reply(command: &str, raw: &str) -> Result<String, DioError> {
    if raw.is_empty() {
        return Err(DioError::Timeout(command.trim().to_string()));
    }
    raw.split("\r\n")
        .nth(1)
        .map(|line| line.trim().to_string())
        .ok_or_else(|| DioError::malformed(command, raw))
}

/// Decode a level readback.
pub fn parse_level(command: &PinCommand, reply: &str) -> Result<Level, DioError> {
    Level::from_readback(reply).ok_or_else(|| DioError::malformed(&command.to_wire(), reply))
}

/// Decode a decimal edge count.
pub fn parse_count(command: &PinCommand, reply: &str) -> Result<u64, DioError> {
    let digits = reply.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DioError::malformed(&command.to_wire(), reply));
    }
    digits
        .parse()
        .map_err(|_| DioError::malformed(&command.to_wire(), reply))
}

// ─── Tests ──────────────────────────────────────────────────────────
