//! Thread wiring.
//!
//! ```text
//!   bus ──commands──► wincmd ──status──► winmon ──commands/safety──► wincmd
//!                      │  └─pause requests──► pausemon ──START──► wincmd
//!                      └──status──► bus
//! ```
//!
//! All queues are bounded. Every loop polls the shared shutdown flag.

use crossbeam_channel::{bounded, Receiver, Sender};
use riftox_common::config::WinctlConfig;
use riftox_common::winch::command::CommandMessage;
use riftox_common::winch::status::WinchStatus;
use riftox_common::winch::telemetry::{CtdDirective, CtdTelemetry};
use riftox_dio::DioCommander;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{error, info};

use crate::dispatcher::{CommandDispatcher, StatusSinks};
use crate::monitor::{self, MonitorChannels, MonitorLimits, SafetyMonitor};
use crate::pause::{self, PauseCoordinator};
use crate::payout_log::PayoutLog;
use crate::schedule::{PauseDepthSchedule, ScheduleError, TomlDepthFile};
use crate::winch::Winch;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("pause depths: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("cannot open payout log {path}: {source}")]
    PayoutLog { path: PathBuf, source: io::Error },

    #[error("failed to spawn thread {name}: {source}")]
    Spawn {
        name: &'static str,
        source: io::Error,
    },
}

/// The outside world's ends of the queues.
#[derive(Debug)]
pub struct Endpoints {
    pub commands: Sender<CommandMessage>,
    pub telemetry: Sender<CtdTelemetry>,
    pub status: Receiver<WinchStatus>,
    pub ctd: Receiver<CtdDirective>,
}

/// Running control threads.
#[derive(Debug)]
pub struct Runtime {
    threads: Vec<(&'static str, JoinHandle<()>)>,
}

impl Runtime {
    /// Wait for every thread to finish.
    pub fn join(self) {
        for (name, handle) in self.threads {
            if handle.join().is_err() {
                error!(thread = name, "thread panicked");
            }
        }
        info!("all control threads stopped");
    }
}

/// Build the control components from `config` and start their threads.
pub fn spawn(
    config: &WinctlConfig,
    dio: DioCommander,
    shutdown: Arc<AtomicBool>,
) -> Result<(Runtime, Endpoints), RuntimeError> {
    let schedule = match &config.ops.pause_depths_file {
        Some(path) => PauseDepthSchedule::new(Box::new(TomlDepthFile::new(path)))?,
        None => PauseDepthSchedule::empty(),
    };
    let payout_log = match &config.ops.payout_log {
        Some(path) => Some(PayoutLog::open(path).map_err(|source| RuntimeError::PayoutLog {
            path: path.clone(),
            source,
        })?),
        None => None,
    };

    let depth = config.loops.queue_depth;
    let (command_tx, command_rx) = bounded(depth);
    let (safety_tx, safety_rx) = bounded(depth);
    let (pause_tx, pause_rx) = bounded(depth);
    let (monitor_tx, monitor_rx) = bounded(depth);
    let (external_tx, external_rx) = bounded(depth);
    let (telemetry_tx, telemetry_rx) = bounded(depth);
    let (ctd_tx, ctd_rx) = bounded(depth);

    let winch = Winch::new(dio, &config.winch).with_pause_notifier(pause_tx);
    let mut dispatcher = CommandDispatcher::new(
        winch,
        command_rx,
        safety_rx,
        StatusSinks {
            monitor: monitor_tx,
            external: Some(external_tx),
            payout_log,
        },
        config.loops.command_period(),
    );
    let safety_monitor = SafetyMonitor::new(
        MonitorLimits::from_config(&config.winch, &config.ops),
        schedule,
    );
    let monitor_channels = MonitorChannels {
        status: monitor_rx,
        telemetry: telemetry_rx,
        commands: command_tx.clone(),
        safety: safety_tx,
        ctd: Some(ctd_tx),
    };
    let coordinator = PauseCoordinator::from_config(&config.winch);
    let pause_commands = command_tx.clone();

    let mut threads = Vec::with_capacity(3);

    let flag = Arc::clone(&shutdown);
    threads.push(start("wincmd", move || dispatcher.run(&flag))?);

    let flag = Arc::clone(&shutdown);
    let period = config.loops.monitor_period();
    threads.push(start("winmon", move || {
        monitor::run(safety_monitor, monitor_channels, period, &flag)
    })?);

    let flag = Arc::clone(&shutdown);
    let period = config.loops.pause_period();
    threads.push(start("pausemon", move || {
        pause::run(coordinator, pause_rx, pause_commands, period, &flag)
    })?);

    info!(queue_depth = depth, "control threads started");
    Ok((
        Runtime { threads },
        Endpoints {
            commands: command_tx,
            telemetry: telemetry_tx,
            status: external_rx,
            ctd: ctd_rx,
        },
    ))
}

fn start(
    name: &'static str,
    body: impl FnOnce() + Send + 'static,
) -> Result<(&'static str, JoinHandle<()>), RuntimeError> {
    thread::Builder::new()
        .name(name.to_string())
        .spawn(body)
        .map(|handle| (name, handle))
        .map_err(|source| RuntimeError::Spawn { name, source })
}

// ─── Tests ──────────────────────────────────────────────────────────
