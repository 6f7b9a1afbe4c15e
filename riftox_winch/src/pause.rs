//! Pause timing.
//!
//! A pause request starts a timer; when it runs out the coordinator issues
//! `START` so the cast resumes. A request that arrives while a pause is
//! running extends the end by one more full duration.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use riftox_common::config::WinchConfig;
use riftox_common::winch::command::{CommandMessage, PauseKind, WinchCommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct PauseCoordinator {
    default: Duration,
    bottle: Duration,
    active: bool,
    start: Option<Instant>,
    end: Option<Instant>,
}

impl PauseCoordinator {
    pub fn new(default: Duration, bottle: Duration) -> Self {
        Self {
            default,
            bottle,
            active: false,
            start: None,
            end: None,
        }
    }

    pub fn from_config(cfg: &WinchConfig) -> Self {
        Self::new(cfg.pause_duration(), cfg.bottle_pause_duration())
    }

    pub fn duration(&self, kind: PauseKind) -> Duration {
        match kind {
            PauseKind::Default => self.default,
            PauseKind::Bottle => self.bottle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// When the running pause started.
    pub fn started_at(&self) -> Option<Instant> {
        self.start
    }

    /// When the running pause ends.
    pub fn ends_at(&self) -> Option<Instant> {
        self.end
    }

    /// Register a pause request received at `now`.
    pub fn request(&mut self, kind: PauseKind, now: Instant) {
        let duration = self.duration(kind);
        match (self.active, self.end) {
            (true, Some(end)) => {
                self.end = Some(end + duration);
                info!(?kind, extra = ?duration, "pause extended");
            }
            _ => {
                self.active = true;
                self.start = Some(now);
                self.end = Some(now + duration);
                info!(?kind, duration = ?duration, "pause started");
            }
        }
    }

    /// `Some(START)` once the running pause has expired.
    pub fn tick(&mut self, now: Instant) -> Option<WinchCommand> {
        let end = self.end.filter(|_| self.active)?;
        if now <= end {
            return None;
        }
        self.active = false;
        self.start = None;
        self.end = None;
        info!("pause expired, resuming");
        Some(WinchCommand::Start)
    }
}

/// Pause loop: take requests from `requests`, emit `START` on `commands`.
pub fn run(
    mut coordinator: PauseCoordinator,
    requests: Receiver<PauseKind>,
    commands: Sender<CommandMessage>,
    period: Duration,
    shutdown: &AtomicBool,
) {
    debug!(period = ?period, "pause loop started");
    while !shutdown.load(Ordering::SeqCst) {
        match requests.recv_timeout(period) {
            Ok(kind) => coordinator.request(kind, Instant::now()),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("pause request channel closed");
                break;
            }
        }
        if let Some(cmd) = coordinator.tick(Instant::now()) {
            if commands.send(cmd.to_message()).is_err() {
                warn!("command queue closed, pause loop exiting");
                break;
            }
        }
    }
    debug!("pause loop stopped");
}

// ─── Tests ──────────────────────────────────────────────────────────
