//! The winch aggregate: current motion state, the actuators, the payout
//! estimator and the homing sequencer, owned together by the command loop.
//!
//! [`Winch::apply`] runs one operation against the transition table. A
//! rejected operation touches nothing. An accepted one performs its actuator
//! work first and commits the new state only if that work succeeded.

use crossbeam_channel::{Sender, TrySendError};
use riftox_common::config::WinchConfig;
use riftox_common::winch::command::{PauseKind, WinchCommand};
use riftox_common::winch::state::MotionState;
use riftox_common::winch::status::WinchStatus;
use riftox_dio::{DioCommander, DioError};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::parking::{ParkingError, ParkingReport, ParkingSequencer, ParkingTimings};
use crate::position::{PositionEstimator, SheaveGeometry};
use crate::state::machine::{self, Action, Operation, Plan, TransitionResult};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WinchError {
    #[error("{op} failed, winch stopped: {source}")]
    Actuator {
        op: Operation,
        #[source]
        source: DioError,
    },

    #[error(transparent)]
    Parking(#[from] ParkingError),
}

/// Result of an operation that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Transitioned { from: MotionState, to: MotionState },
    /// Illegal in the current state; nothing was changed.
    Rejected(&'static str),
}

/// Timings of the Parked → Staging unpark sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnparkTimings {
    pub upcast: Duration,
    pub latch_hold: Duration,
    pub downcast: Duration,
    pub settle: Duration,
}

impl UnparkTimings {
    pub fn from_config(cfg: &WinchConfig) -> Self {
        Self {
            upcast: Duration::from_millis(cfg.unparking_upcast_ms),
            latch_hold: Duration::from_millis(cfg.unparking_latch_hold_ms),
            downcast: Duration::from_millis(cfg.unparking_downcast_ms),
            settle: Duration::from_millis(cfg.unparking_settle_ms),
        }
    }
}

#[derive(Debug)]
pub struct Winch {
    state: MotionState,
    dio: DioCommander,
    estimator: PositionEstimator,
    parking: ParkingSequencer,
    unpark: UnparkTimings,
    approach: Duration,
    no_parking: bool,
    pause_tx: Option<Sender<PauseKind>>,
}

impl Winch {
    /// A parked winch with zeroed payout.
    pub fn new(dio: DioCommander, cfg: &WinchConfig) -> Self {
        Self {
            state: MotionState::Parked,
            dio,
            estimator: PositionEstimator::new(SheaveGeometry::from_config(cfg)),
            parking: ParkingSequencer::new(ParkingTimings::from_config(cfg)),
            unpark: UnparkTimings::from_config(cfg),
            approach: Duration::from_millis(cfg.parking_approach_ms),
            no_parking: cfg.no_parking,
            pause_tx: None,
        }
    }

    /// Send pause requests to the pause coordinator.
    pub fn with_pause_notifier(mut self, tx: Sender<PauseKind>) -> Self {
        self.pause_tx = Some(tx);
        self
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn depth_m(&self) -> f64 {
        self.estimator.depth_m()
    }

    pub fn estimator(&self) -> &PositionEstimator {
        &self.estimator
    }

    pub fn commander(&self) -> &DioCommander {
        &self.dio
    }

    /// Apply an inbound command.
    pub fn handle(&mut self, cmd: WinchCommand) -> Result<Outcome, WinchError> {
        match (Operation::from_command(cmd), cmd) {
            (Some(op), _) => self.apply(op),
            (None, WinchCommand::SetState(target)) => Ok(self.set_state(target)),
            (None, other) => {
                warn!(command = %other, "command has no operation");
                Ok(Outcome::Rejected("command has no operation"))
            }
        }
    }

    /// Run `op` against the transition table.
    pub fn apply(&mut self, op: Operation) -> Result<Outcome, WinchError> {
        let from = self.state;
        let plan = match machine::plan(from, op) {
            TransitionResult::Ok(plan) => plan,
            TransitionResult::Rejected(reason) => {
                warn!(state = %from, op = %op, reason, "illegal operation ignored");
                return Ok(Outcome::Rejected(reason));
            }
        };

        // Pulses up to now accrued under the old state.
        self.sample_quietly();
        let to = self.execute(op, plan)?;
        self.sample_quietly();

        self.state = to;
        if to == MotionState::Parked && from == MotionState::UpStaged {
            self.estimator.rezero();
        }
        info!(from = %from, to = %to, op = %op, "transition");

        if let Some(kind) = plan.notify_pause {
            self.notify_pause(kind);
        }
        Ok(Outcome::Transitioned { from, to })
    }

    /// Force the state without touching the actuators.
    pub fn set_state(&mut self, target: MotionState) -> Outcome {
        let from = self.state;
        self.sample_quietly();
        self.state = target;
        warn!(from = %from, to = %target, "state forced");
        Outcome::Transitioned { from, to: target }
    }

    /// Fresh status snapshot. Reads direction and payout from the controller.
    ///
    /// Depth is clamped at the surface: hauling past the zero reference on
    /// the way in reads as 0 m.
    pub fn status(&mut self) -> Result<WinchStatus, DioError> {
        let direction = self.dio.direction()?;
        self.sample()?;
        Ok(WinchStatus::now(direction, self.depth_m().max(0.0), self.state))
    }

    /// Home against the latch outside the cast cycle.
    pub fn repark(&mut self) -> Result<ParkingReport, WinchError> {
        info!(state = %self.state, "re-park requested");
        let report = self.parking.run(&self.dio)?;
        self.state = MotionState::Parked;
        self.estimator.rezero();
        Ok(report)
    }

    fn sample(&mut self) -> Result<(), DioError> {
        let [payout, _] = self.dio.payout_edge_counts()?;
        self.estimator.update(self.state, payout);
        Ok(())
    }

    fn sample_quietly(&mut self) {
        if let Err(e) = self.sample() {
            warn!(error = %e, "payout sample failed");
        }
    }

    /// Perform the actuator work of `plan`; returns the state to commit.
    fn execute(&mut self, op: Operation, plan: Plan) -> Result<MotionState, WinchError> {
        let result = match plan.action {
            Action::Unpark => self.unpark(),
            Action::HoldStaged => self
                .dio
                .link()
                .transaction(|_| {
                    self.dio.latch_release()?;
                    self.dio.stop_winch()
                }),
            Action::Stop => self.dio.stop_winch(),
            Action::DownCast => self.dio.down_cast(),
            Action::UpCast => self.dio.up_cast(),
            Action::Park => return self.park(op),
        };
        match result {
            Ok(()) => Ok(plan.next),
            Err(source) => {
                error!(state = %self.state, op = %op, error = %source, "actuator command failed");
                if let Err(e) = self.dio.stop_winch() {
                    warn!(error = %e, "stop after actuator failure failed");
                }
                Err(WinchError::Actuator { op, source })
            }
        }
    }

    fn unpark(&self) -> Result<(), DioError> {
        let t = self.unpark;
        self.dio.link().transaction(|_| {
            debug!("unparking");
            self.dio.up_cast_for(t.upcast)?;
            self.dio.latch_hold()?;
            thread::sleep(t.latch_hold);
            self.dio.down_cast_for(t.downcast)?;
            thread::sleep(t.settle);
            self.dio.latch_release()?;
            thread::sleep(t.settle);
            self.dio.stage()
        })
    }

    /// UpStaged → Parking → Parked. Falls back to UpStaged on failure so a
    /// later park can retry.
    fn park(&mut self, op: Operation) -> Result<MotionState, WinchError> {
        if self.no_parking {
            info!("parking disabled, holding at up-stage");
            return match self.dio.stop_winch() {
                Ok(()) => Ok(MotionState::UpStaged),
                Err(source) => Err(WinchError::Actuator { op, source }),
            };
        }

        self.state = MotionState::Parking;
        info!(approach = ?self.approach, "parking");
        let result = self
            .dio
            .up_cast_for(self.approach)
            .map_err(|source| WinchError::Actuator { op, source })
            .and_then(|()| self.parking.run(&self.dio).map_err(WinchError::from));

        match result {
            Ok(report) => {
                info!(polls = report.polls, elapsed = ?report.elapsed, "parked");
                Ok(MotionState::Parked)
            }
            Err(e) => {
                self.state = MotionState::UpStaged;
                error!(error = %e, "parking aborted, back at up-stage");
                if let Err(stop) = self.dio.stop_winch() {
                    warn!(error = %stop, "stop after parking failure failed");
                }
                Err(e)
            }
        }
    }

    fn notify_pause(&self, kind: PauseKind) {
        let Some(tx) = &self.pause_tx else {
            return;
        };
        match tx.try_send(kind) {
            Ok(()) => debug!(?kind, "pause requested"),
            Err(TrySendError::Full(_)) => warn!(?kind, "pause queue full, request dropped"),
            Err(TrySendError::Disconnected(_)) => {
                warn!(?kind, "pause coordinator gone, request dropped")
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
