//! JSON-lines envelope used by the `winctl` bus adapter.
//!
//! Inbound lines are a command object (`{"command": "START"}`), a CTD sample
//! (`{"type": "ctd", "depth_m": 12.0, "alt_m": 40.0}`) or a bare command name.
//! Outbound lines carry a `type` tag.

use serde::{Deserialize, Serialize};

use super::command::{CommandError, CommandMessage, WinchCommand};
use super::status::WinchStatus;
use super::telemetry::{CtdDirective, CtdTelemetry};

/// A decoded inbound line.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Command(WinchCommand),
    Telemetry(CtdTelemetry),
}

/// An outbound line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    Status(WinchStatus),
    CtdCommand { directive: CtdDirective },
}

impl Outbound {
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Decode one inbound line. Blank lines yield `Ok(None)`.
pub fn parse_inbound(line: &str) -> Result<Option<Inbound>, CommandError> {
    let text = line.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if !text.starts_with('{') {
        return text.parse().map(|cmd| Some(Inbound::Command(cmd)));
    }

    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| CommandError::Malformed(e.to_string()))?;
    if value.get("type").and_then(|t| t.as_str()) == Some("ctd") {
        let sample: CtdTelemetry =
            serde_json::from_value(value).map_err(|e| CommandError::Malformed(e.to_string()))?;
        return Ok(Some(Inbound::Telemetry(sample)));
    }
    let msg: CommandMessage =
        serde_json::from_value(value).map_err(|e| CommandError::Malformed(e.to_string()))?;
    WinchCommand::try_from(&msg).map(|cmd| Some(Inbound::Command(cmd)))
}

// ─── Tests ──────────────────────────────────────────────────────────
