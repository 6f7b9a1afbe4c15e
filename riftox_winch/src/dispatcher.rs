//! Command loop.
//!
//! Each tick publishes a fresh status snapshot, then applies at most one
//! command. Safety commands are taken before ordinary ones. Command names
//! are validated here; unknown names are logged and dropped.

use crossbeam_channel::{never, select, Receiver, Sender, TrySendError};
use riftox_common::winch::command::{CommandMessage, WinchCommand};
use riftox_common::winch::status::WinchStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use crate::payout_log::PayoutLog;
use crate::winch::{Outcome, Winch, WinchError};

/// Where each status snapshot goes.
#[derive(Debug)]
pub struct StatusSinks {
    pub monitor: Sender<WinchStatus>,
    pub external: Option<Sender<WinchStatus>>,
    pub payout_log: Option<PayoutLog>,
}

/// What one tick did.
#[derive(Debug)]
pub struct TickReport {
    /// `None` when the controller could not be read.
    pub status: Option<WinchStatus>,
    pub handled: Option<(WinchCommand, Result<Outcome, WinchError>)>,
}

#[derive(Debug)]
pub struct CommandDispatcher {
    winch: Winch,
    commands: Receiver<CommandMessage>,
    safety: Receiver<WinchCommand>,
    sinks: StatusSinks,
    period: Duration,
}

impl CommandDispatcher {
    pub fn new(
        winch: Winch,
        commands: Receiver<CommandMessage>,
        safety: Receiver<WinchCommand>,
        sinks: StatusSinks,
        period: Duration,
    ) -> Self {
        Self {
            winch,
            commands,
            safety,
            sinks,
            period,
        }
    }

    pub fn winch(&self) -> &Winch {
        &self.winch
    }

    pub fn into_winch(self) -> Winch {
        self.winch
    }

    /// Publish status, then wait up to one period for a command and apply it.
    pub fn tick(&mut self) -> TickReport {
        let status = self.publish_status();
        let handled = self.next_command().map(|cmd| {
            debug!(command = %cmd, state = %self.winch.state(), "applying command");
            let result = self.winch.handle(cmd);
            if let Err(e) = &result {
                error!(command = %cmd, error = %e, "command failed");
            }
            (cmd, result)
        });
        TickReport { status, handled }
    }

    /// Tick until `shutdown` is set, then stop the winch.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        info!(period = ?self.period, state = %self.winch.state(), "command loop started");
        while !shutdown.load(Ordering::SeqCst) {
            self.tick();
        }
        if let Err(e) = self.winch.commander().stop_winch() {
            warn!(error = %e, "stop on shutdown failed");
        }
        info!(state = %self.winch.state(), "command loop stopped");
    }

    fn publish_status(&mut self) -> Option<WinchStatus> {
        let status = match self.winch.status() {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "status read failed, not published this tick");
                return None;
            }
        };
        trace!(?status, "status");

        if let Err(TrySendError::Full(_)) = self.sinks.monitor.try_send(status) {
            debug!("monitor lagging, status dropped");
        }
        if let Some(tx) = &self.sinks.external {
            if let Err(TrySendError::Full(_)) = tx.try_send(status) {
                debug!("status sink lagging, status dropped");
            }
        }
        if let Some(log) = &mut self.sinks.payout_log {
            if let Err(e) = log.append(&status) {
                warn!(path = %log.path().display(), error = %e, "payout log write failed");
            }
        }
        Some(status)
    }

    fn next_command(&mut self) -> Option<WinchCommand> {
        if let Ok(cmd) = self.safety.try_recv() {
            return Some(cmd);
        }
        let (safety, commands) = (self.safety.clone(), self.commands.clone());
        select! {
            recv(safety) -> msg => match msg {
                Ok(cmd) => Some(cmd),
                Err(_) => {
                    debug!("safety queue closed");
                    self.safety = never();
                    None
                }
            },
            recv(commands) -> msg => match msg {
                Ok(msg) => validate(&msg),
                Err(_) => {
                    debug!("command queue closed");
                    self.commands = never();
                    None
                }
            },
            default(self.period) => None,
        }
    }
}

fn validate(msg: &CommandMessage) -> Option<WinchCommand> {
    match WinchCommand::try_from(msg) {
        Ok(cmd) => Some(cmd),
        Err(e) => {
            warn!(command = %msg.command, error = %e, "command rejected");
            None
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
