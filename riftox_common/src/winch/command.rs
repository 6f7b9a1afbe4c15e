//! Inbound winch commands.
//!
//! Commands arrive as small JSON objects (`{"command": "PAUSE", "pause": "bottle"}`)
//! or bare names. Names are case-normalized and the hyphenated spellings
//! `DOWN-CAST`, `UP-CAST` and `UP-STAGE` are accepted. Unknown names are
//! rejected with [`CommandError::UnknownCommand`] and never queued.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::state::MotionState;

/// Command rejected before it reached the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("SET-STATE requires a 'state' field")]
    MissingState,

    #[error("SET-STATE target invalid: {0}")]
    InvalidState(String),

    #[error("malformed command message: {0}")]
    Malformed(String),
}

/// Which pause duration a pause request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseKind {
    #[default]
    Default,
    /// Longer pause for water-sampling bottles.
    Bottle,
}

/// A validated winch command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WinchCommand {
    Start,
    Pause(PauseKind),
    Stop,
    StopAtMaxDepth,
    Downcast,
    Upcast,
    UpStage,
    Park,
    /// Force the state without touching the actuators.
    SetState(MotionState),
}

impl WinchCommand {
    /// Canonical command name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Pause(_) => "PAUSE",
            Self::Stop => "STOP",
            Self::StopAtMaxDepth => "STOP-AT-MAX-DEPTH",
            Self::Downcast => "DOWNCAST",
            Self::Upcast => "UPCAST",
            Self::UpStage => "UPSTAGE",
            Self::Park => "PARK",
            Self::SetState(_) => "SET-STATE",
        }
    }

    /// Build the wire message for this command.
    pub fn to_message(&self) -> CommandMessage {
        CommandMessage {
            command: self.name().to_string(),
            pause: match self {
                Self::Pause(kind) => Some(*kind),
                _ => None,
            },
            state: match self {
                Self::SetState(state) => Some(state.name().to_string()),
                _ => None,
            },
        }
    }
}

impl fmt::Display for WinchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pause(PauseKind::Bottle) => f.write_str("PAUSE(bottle)"),
            Self::SetState(state) => write!(f, "SET-STATE({state})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Wire form of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMessage {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause: Option<PauseKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl CommandMessage {
    pub fn named(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            pause: None,
            state: None,
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_uppercase().replace('_', "-")
}

impl TryFrom<&CommandMessage> for WinchCommand {
    type Error = CommandError;

    fn try_from(msg: &CommandMessage) -> Result<Self, Self::Error> {
        let cmd = match normalize(&msg.command).as_str() {
            "START" => Self::Start,
            "PAUSE" => Self::Pause(msg.pause.unwrap_or_default()),
            "STOP" => Self::Stop,
            "STOP-AT-MAX-DEPTH" => Self::StopAtMaxDepth,
            "DOWNCAST" | "DOWN-CAST" => Self::Downcast,
            "UPCAST" | "UP-CAST" => Self::Upcast,
            "UPSTAGE" | "UP-STAGE" => Self::UpStage,
            "PARK" => Self::Park,
            "SET-STATE" | "SETSTATE" => {
                let target = msg.state.as_deref().ok_or(CommandError::MissingState)?;
                let state = target
                    .parse::<MotionState>()
                    .map_err(|e| CommandError::InvalidState(e.to_string()))?;
                Self::SetState(state)
            }
            _ => return Err(CommandError::UnknownCommand(msg.command.clone())),
        };
        Ok(cmd)
    }
}

impl TryFrom<CommandMessage> for WinchCommand {
    type Error = CommandError;

    fn try_from(msg: CommandMessage) -> Result<Self, Self::Error> {
        Self::try_from(&msg)
    }
}

impl FromStr for WinchCommand {
    type Err = CommandError;

    /// Parse a bare name or a JSON command object.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.starts_with('{') {
            let msg: CommandMessage =
                serde_json::from_str(text).map_err(|e| CommandError::Malformed(e.to_string()))?;
            return Self::try_from(&msg);
        }
        Self::try_from(&CommandMessage::named(text))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
