//! Depth and altitude supervision.
//!
//! Each tick the monitor looks at the latest [`WinchStatus`] and CTD sample
//! and decides which commands the cast needs:
//!
//! - going down: the staging pause, then the altitude and absolute depth
//!   limits (a breach stops the winch; mid-descent it ends the cast)
//! - going up: the up-stage at the staging depth, and a bottle pause at each
//!   scheduled depth the package rises past
//!
//! Breaches are returned separately from ordinary commands so the runtime
//! can route them to the priority queue.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use riftox_common::config::{OpsConfig, WinchConfig};
use riftox_common::winch::command::{CommandMessage, PauseKind, WinchCommand};
use riftox_common::winch::state::{Direction, MotionState};
use riftox_common::winch::status::WinchStatus;
use riftox_common::winch::telemetry::{CtdDirective, CtdTelemetry, DEFAULT_ALTITUDE_M};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::schedule::PauseDepthSchedule;

/// Allowed mismatch between payout depth and CTD depth.
const CTD_DEPTH_TOLERANCE: f64 = 0.005;
/// CTD depth below which the mismatch is not checked [m].
const CTD_CHECK_MIN_DEPTH_M: f64 = 10.0;
/// Ticks without telemetry before warning.
const STALE_TELEMETRY_TICKS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorLimits {
    pub staging_depth: f64,
    pub min_altitude: f64,
    pub max_depth: f64,
    /// Compare payout against CTD depth and watch for stale telemetry.
    pub realtime_ctd: bool,
}

impl MonitorLimits {
    pub fn from_config(winch: &WinchConfig, ops: &OpsConfig) -> Self {
        Self {
            staging_depth: winch.staging_depth,
            min_altitude: winch.min_altitude,
            max_depth: winch.max_depth,
            realtime_ctd: ops.realtime_ctd,
        }
    }
}

/// Why a safety stop was issued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BreachReason {
    Altitude { altitude: f64, min: f64 },
    MaxDepth { depth: f64, max: f64 },
}

impl fmt::Display for BreachReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Altitude { altitude, min } => {
                write!(f, "altitude {altitude:.2} m below minimum {min:.2} m")
            }
            Self::MaxDepth { depth, max } => {
                write!(f, "depth {depth:.2} m beyond maximum {max:.2} m")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SafetyAction {
    Command(WinchCommand),
    Breach {
        command: WinchCommand,
        reason: BreachReason,
    },
    Ctd(CtdDirective),
}

#[derive(Debug)]
pub struct SafetyMonitor {
    limits: MonitorLimits,
    schedule: PauseDepthSchedule,
    last_state: Option<MotionState>,
    altitude: f64,
    ctd_depth: Option<f64>,
    max_depth_reached: f64,
    ticks_without_telemetry: u32,
    /// Last non-safety command emitted in the current state.
    last_emitted: Option<WinchCommand>,
}

impl SafetyMonitor {
    pub fn new(limits: MonitorLimits, schedule: PauseDepthSchedule) -> Self {
        Self {
            limits,
            schedule,
            last_state: None,
            altitude: DEFAULT_ALTITUDE_M,
            ctd_depth: None,
            max_depth_reached: 0.0,
            ticks_without_telemetry: 0,
            last_emitted: None,
        }
    }

    pub fn limits(&self) -> &MonitorLimits {
        &self.limits
    }

    pub fn max_depth_reached(&self) -> f64 {
        self.max_depth_reached
    }

    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    pub fn schedule(&self) -> &PauseDepthSchedule {
        &self.schedule
    }

    /// Evaluate one status snapshot and, if one arrived, a CTD sample.
    pub fn evaluate(
        &mut self,
        status: &WinchStatus,
        telemetry: Option<CtdTelemetry>,
    ) -> Vec<SafetyAction> {
        self.observe_state(status.state);
        self.observe_telemetry(telemetry, status.depth_m);

        let mut actions = Vec::new();
        match status.direction {
            Direction::Down => self.check_descent(status, &mut actions),
            Direction::Up => self.check_ascent(status, &mut actions),
            Direction::None => {}
        }
        actions
    }

    fn observe_state(&mut self, state: MotionState) {
        let previous = self.last_state.replace(state);
        if previous == Some(state) {
            return;
        }
        self.last_emitted = None;
        match (previous, state) {
            (Some(MotionState::MaxDepth), MotionState::Upcasting) => {
                info!(max_depth_reached = self.max_depth_reached, "turnaround");
                if let Err(e) = self.schedule.refresh() {
                    warn!(error = %e, "pause depth refresh failed, keeping previous list");
                }
            }
            (_, MotionState::Staging) => {
                debug!("new cast, resetting deepest depth");
                self.max_depth_reached = 0.0;
            }
            _ => {}
        }
    }

    fn observe_telemetry(&mut self, telemetry: Option<CtdTelemetry>, payout_depth: f64) {
        match telemetry {
            Some(sample) => {
                self.altitude = sample.alt_m;
                self.ctd_depth = Some(sample.depth_m);
                self.ticks_without_telemetry = 0;
            }
            None => self.ticks_without_telemetry = self.ticks_without_telemetry.saturating_add(1),
        }
        if !self.limits.realtime_ctd {
            return;
        }

        if self.telemetry_stale() {
            warn!(ticks = self.ticks_without_telemetry, "no CTD telemetry");
        }
        if let Some(mismatch) = self.ctd_mismatch(payout_depth) {
            warn!(
                payout_depth,
                ctd_depth = ?self.ctd_depth,
                mismatch_pct = mismatch * 100.0,
                "payout depth disagrees with CTD"
            );
        }
    }

    /// Relative payout/CTD disagreement, when it exceeds the tolerance and the
    /// CTD is deep enough for the comparison to mean anything.
    fn ctd_mismatch(&self, payout_depth: f64) -> Option<f64> {
        let ctd = self.ctd_depth.filter(|d| *d > CTD_CHECK_MIN_DEPTH_M)?;
        let mismatch = ((payout_depth - ctd) / ctd).abs();
        (mismatch > CTD_DEPTH_TOLERANCE).then_some(mismatch)
    }

    /// True when the stale-telemetry warning fires on this tick.
    fn telemetry_stale(&self) -> bool {
        self.ticks_without_telemetry > 0
            && self.ticks_without_telemetry % STALE_TELEMETRY_TICKS == 0
    }

    fn check_descent(&mut self, status: &WinchStatus, actions: &mut Vec<SafetyAction>) {
        let depth = status.depth_m;
        self.max_depth_reached = self.max_depth_reached.max(depth);

        if status.state == MotionState::Staging
            && depth > self.limits.staging_depth
            && self.once(WinchCommand::Pause(PauseKind::Default))
        {
            info!(depth, "staging depth reached");
            actions.push(SafetyAction::Command(WinchCommand::Pause(PauseKind::Default)));
            actions.push(SafetyAction::Ctd(CtdDirective::Init));
        }

        let reason = if self.altitude < self.limits.min_altitude {
            Some(BreachReason::Altitude {
                altitude: self.altitude,
                min: self.limits.min_altitude,
            })
        } else if depth > self.limits.max_depth {
            Some(BreachReason::MaxDepth {
                depth,
                max: self.limits.max_depth,
            })
        } else {
            None
        };
        if let Some(reason) = reason {
            let command = breach_command(status.state);
            error!(state = %status.state, depth, %reason, command = %command, "safety limit breached, stopping");
            actions.push(SafetyAction::Breach { command, reason });
        }
    }

    fn check_ascent(&mut self, status: &WinchStatus, actions: &mut Vec<SafetyAction>) {
        if status.state != MotionState::Upcasting {
            return;
        }
        let depth = status.depth_m;

        if depth < self.limits.staging_depth {
            if self.once(WinchCommand::UpStage) {
                info!(depth, "up-stage depth reached");
                actions.push(SafetyAction::Command(WinchCommand::UpStage));
                actions.push(SafetyAction::Ctd(CtdDirective::Stop));
            }
            return;
        }

        let Some(next) = self.schedule.get_next(self.max_depth_reached) else {
            return;
        };
        let pause = WinchCommand::Pause(PauseKind::Bottle);
        if depth < next && self.once(pause) {
            self.schedule.use_next();
            info!(depth, target = next, "sampling depth reached");
            actions.push(SafetyAction::Command(pause));
        }
    }

    /// Ticks since the last CTD sample.
    pub fn ticks_without_telemetry(&self) -> u32 {
        self.ticks_without_telemetry
    }

    /// True the first time `cmd` is emitted in the current state.
    fn once(&mut self, cmd: WinchCommand) -> bool {
        if self.last_emitted == Some(cmd) {
            return false;
        }
        self.last_emitted = Some(cmd);
        true
    }
}

/// Stop command for a breach seen in `state`. Staging only answers to
/// pause or stop; everywhere else the cast ends at the bottom.
fn breach_command(state: MotionState) -> WinchCommand {
    match state {
        MotionState::Staging => WinchCommand::Stop,
        _ => WinchCommand::StopAtMaxDepth,
    }
}

/// Queues the monitor loop reads from and writes to.
#[derive(Debug)]
pub struct MonitorChannels {
    pub status: Receiver<WinchStatus>,
    pub telemetry: Receiver<CtdTelemetry>,
    pub commands: Sender<CommandMessage>,
    pub safety: Sender<WinchCommand>,
    pub ctd: Option<Sender<CtdDirective>>,
}

/// Monitor loop. Evaluates the newest status each tick.
pub fn run(
    mut monitor: SafetyMonitor,
    channels: MonitorChannels,
    period: Duration,
    shutdown: &AtomicBool,
) {
    debug!(period = ?period, "monitor loop started");
    while !shutdown.load(Ordering::SeqCst) {
        let status = match channels.status.recv_timeout(period) {
            Ok(first) => channels.status.try_iter().last().unwrap_or(first),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("status channel closed");
                break;
            }
        };
        let telemetry = channels.telemetry.try_iter().last();

        for action in monitor.evaluate(&status, telemetry) {
            if !route(action, &channels) {
                warn!("command queues closed, monitor loop exiting");
                return;
            }
        }
    }
    debug!("monitor loop stopped");
}

/// Deliver one action. False once the dispatcher is gone.
fn route(action: SafetyAction, channels: &MonitorChannels) -> bool {
    match action {
        SafetyAction::Breach { command, .. } => channels.safety.send(command).is_ok(),
        SafetyAction::Command(cmd) => match channels.commands.try_send(cmd.to_message()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(command = %cmd, "command queue full, dropped");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        },
        SafetyAction::Ctd(directive) => {
            if let Some(tx) = &channels.ctd {
                if let Err(e) = tx.try_send(directive) {
                    debug!(?directive, error = %e, "CTD directive not delivered");
                }
            }
            true
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
