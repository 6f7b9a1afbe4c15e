//! Motion states of the winch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating state of the winch. Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MotionState {
    /// Latched at the surface.
    #[default]
    Parked,
    /// Paying out towards the staging depth.
    Staging,
    /// Held at the staging depth.
    DownStaged,
    /// Back at the staging depth after an upcast.
    UpStaged,
    Downcasting,
    Upcasting,
    /// Stopped at the bottom of the cast.
    MaxDepth,
    /// Homing against the latch.
    Parking,
    DownPaused,
    UpPaused,
}

impl MotionState {
    pub const ALL: [MotionState; 10] = [
        Self::Parked,
        Self::Staging,
        Self::DownStaged,
        Self::UpStaged,
        Self::Downcasting,
        Self::Upcasting,
        Self::MaxDepth,
        Self::Parking,
        Self::DownPaused,
        Self::UpPaused,
    ];

    /// Name used in status messages and `SET-STATE` payloads.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Parked => "PARKED",
            Self::Staging => "STAGING",
            Self::DownStaged => "DOWNSTAGED",
            Self::UpStaged => "UPSTAGED",
            Self::Downcasting => "DOWNCASTING",
            Self::Upcasting => "UPCASTING",
            Self::MaxDepth => "MAXDEPTH",
            Self::Parking => "PARKING",
            Self::DownPaused => "DOWNPAUSED",
            Self::UpPaused => "UPPAUSED",
        }
    }
}

impl fmt::Display for MotionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognised state name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown motion state '{0}'")]
pub struct UnknownState(pub String);

impl FromStr for MotionState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace(['-', '_'], "");
        Self::ALL
            .into_iter()
            .find(|state| state.name() == wanted)
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}

impl TryFrom<String> for MotionState {
    type Error = UnknownState;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MotionState> for String {
    fn from(state: MotionState) -> Self {
        state.name().to_string()
    }
}

/// Direction of cable travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    None,
    Up,
    Down,
}

impl Direction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Up => "UP",
            Self::Down => "DOWN",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for state in MotionState::ALL {
            assert_eq!(state.name().parse::<MotionState>().unwrap(), state);
        }
    }

    #[test]
    fn parse_is_lenient_about_case_and_separators() {
        assert_eq!("down-staged".parse::<MotionState>().unwrap(), MotionState::DownStaged);
        assert_eq!("Max_Depth".parse::<MotionState>().unwrap(), MotionState::MaxDepth);
        assert!("SINKING".parse::<MotionState>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&MotionState::UpPaused).unwrap();
        assert_eq!(json, "\"UPPAUSED\"");
        let back: MotionState = serde_json::from_str("\"UPCASTING\"").unwrap();
        assert_eq!(back, MotionState::Upcasting);
        assert_eq!(serde_json::to_string(&Direction::Down).unwrap(), "\"DOWN\"");
    }
}
