//! MotionState transitions.
//!
//! Parked → Staging → DownStaged → Downcasting ⇄ DownPaused → MaxDepth →
//! Upcasting ⇄ UpPaused → UpStaged → Parking → Parked.
//!
//! [`plan`] is pure: it decides the next state and the actuator work for a
//! `(state, operation)` pair and touches nothing. Every pair is spelled out;
//! there is no fallback arm, so adding a state or an operation fails to
//! compile until the table is extended.

use riftox_common::winch::command::{PauseKind, WinchCommand};
use riftox_common::winch::state::MotionState;
use std::fmt;

/// Operations every state answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Stop,
    Start,
    DownCast,
    Pause(PauseKind),
    StopAtBottom,
    UpCast,
    UpStage,
    Park,
}

impl Operation {
    /// Map an inbound command. `SET-STATE` bypasses the table and has no operation.
    pub const fn from_command(cmd: WinchCommand) -> Option<Self> {
        match cmd {
            WinchCommand::Start => Some(Self::Start),
            WinchCommand::Pause(kind) => Some(Self::Pause(kind)),
            WinchCommand::Stop => Some(Self::Stop),
            WinchCommand::StopAtMaxDepth => Some(Self::StopAtBottom),
            WinchCommand::Downcast => Some(Self::DownCast),
            WinchCommand::Upcast => Some(Self::UpCast),
            WinchCommand::UpStage => Some(Self::UpStage),
            WinchCommand::Park => Some(Self::Park),
            WinchCommand::SetState(_) => None,
        }
    }

    /// Pause length a mid-cast stop asks the pause coordinator for.
    const fn pause_kind(&self) -> PauseKind {
        match self {
            Self::Pause(kind) => *kind,
            Self::Stop
            | Self::Start
            | Self::DownCast
            | Self::StopAtBottom
            | Self::UpCast
            | Self::UpStage
            | Self::Park => PauseKind::Default,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => f.write_str("stop"),
            Self::Start => f.write_str("start"),
            Self::DownCast => f.write_str("down_cast"),
            Self::Pause(PauseKind::Default) => f.write_str("pause"),
            Self::Pause(PauseKind::Bottle) => f.write_str("pause(bottle)"),
            Self::StopAtBottom => f.write_str("stop_at_bottom"),
            Self::UpCast => f.write_str("up_cast"),
            Self::UpStage => f.write_str("up_stage"),
            Self::Park => f.write_str("park"),
        }
    }
}

/// Actuator work a transition performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Free the package from the latch and start paying out.
    Unpark,
    /// Release the latch and stop at the staging depth.
    HoldStaged,
    /// Stop the motor.
    Stop,
    /// Energize the downcast output.
    DownCast,
    /// Energize the upcast output.
    UpCast,
    /// Approach the latch and run the parking sequence.
    Park,
}

/// An accepted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub next: MotionState,
    pub action: Action,
    /// Ask the pause coordinator to resume the cast later.
    pub notify_pause: Option<PauseKind>,
}

impl Plan {
    const fn moving(next: MotionState, action: Action) -> Self {
        Self {
            next,
            action,
            notify_pause: None,
        }
    }

    const fn pausing(next: MotionState, action: Action, kind: PauseKind) -> Self {
        Self {
            next,
            action,
            notify_pause: Some(kind),
        }
    }
}

/// Result of a transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    Ok(Plan),
    /// Illegal in the current state; nothing may change.
    Rejected(&'static str),
}

/// Decide what `op` does in `state`.
pub const fn plan(state: MotionState, op: Operation) -> TransitionResult {
    use MotionState::*;
    use Operation as Op;

    let kind = op.pause_kind();
    let plan = match state {
        Parked => match op {
            Op::Start | Op::DownCast => Plan::moving(Staging, Action::Unpark),
            Op::Stop | Op::Pause(_) | Op::StopAtBottom | Op::UpCast | Op::UpStage | Op::Park => {
                return TransitionResult::Rejected("PARKED: only start or down_cast allowed");
            }
        },
        Staging => match op {
            Op::Pause(_) | Op::Stop => Plan::pausing(DownStaged, Action::HoldStaged, kind),
            Op::Start | Op::DownCast | Op::StopAtBottom | Op::UpCast | Op::UpStage | Op::Park => {
                return TransitionResult::Rejected("STAGING: only pause or stop allowed");
            }
        },
        DownStaged => match op {
            Op::Start | Op::DownCast => Plan::moving(Downcasting, Action::DownCast),
            Op::Stop | Op::Pause(_) | Op::StopAtBottom | Op::UpCast | Op::UpStage | Op::Park => {
                return TransitionResult::Rejected("DOWNSTAGED: only start or down_cast allowed");
            }
        },
        Downcasting => match op {
            Op::Pause(_) | Op::Stop => Plan::pausing(DownPaused, Action::Stop, kind),
            Op::StopAtBottom => Plan::pausing(MaxDepth, Action::Stop, kind),
            Op::Start | Op::DownCast | Op::UpCast | Op::UpStage | Op::Park => {
                return TransitionResult::Rejected(
                    "DOWNCASTING: only pause, stop or stop_at_bottom allowed",
                );
            }
        },
        DownPaused => match op {
            Op::Start | Op::DownCast => Plan::moving(Downcasting, Action::DownCast),
            Op::Stop | Op::Pause(_) | Op::StopAtBottom | Op::UpCast | Op::UpStage | Op::Park => {
                return TransitionResult::Rejected("DOWNPAUSED: only start or down_cast allowed");
            }
        },
        MaxDepth => match op {
            Op::Start | Op::UpCast => Plan::moving(Upcasting, Action::UpCast),
            Op::Stop | Op::Pause(_) | Op::StopAtBottom | Op::DownCast | Op::UpStage | Op::Park => {
                return TransitionResult::Rejected("MAXDEPTH: only start or up_cast allowed");
            }
        },
        Upcasting => match op {
            Op::Pause(_) | Op::Stop => Plan::pausing(UpPaused, Action::Stop, kind),
            Op::UpStage => Plan::pausing(UpStaged, Action::Stop, kind),
            Op::Start | Op::DownCast | Op::StopAtBottom | Op::UpCast | Op::Park => {
                return TransitionResult::Rejected(
                    "UPCASTING: only pause, stop or up_stage allowed",
                );
            }
        },
        UpPaused => match op {
            Op::Start | Op::UpCast => Plan::moving(Upcasting, Action::UpCast),
            Op::Stop | Op::Pause(_) | Op::StopAtBottom | Op::DownCast | Op::UpStage | Op::Park => {
                return TransitionResult::Rejected("UPPAUSED: only start or up_cast allowed");
            }
        },
        UpStaged => match op {
            Op::Start | Op::Park => Plan::moving(Parked, Action::Park),
            Op::Stop | Op::Pause(_) | Op::StopAtBottom | Op::DownCast | Op::UpCast | Op::UpStage => {
                return TransitionResult::Rejected("UPSTAGED: only start or park allowed");
            }
        },
        Parking => match op {
            Op::Start
            | Op::Stop
            | Op::Pause(_)
            | Op::StopAtBottom
            | Op::DownCast
            | Op::UpCast
            | Op::UpStage
            | Op::Park => {
                return TransitionResult::Rejected("PARKING: no commands accepted while homing");
            }
        },
    };
    TransitionResult::Ok(plan)
}

// ─── Tests ──────────────────────────────────────────────────────────
