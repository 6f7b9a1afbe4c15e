//! Line-oriented bus adapter used by `winctl`.
//!
//! Reads commands and CTD samples as JSON lines (or bare command names) from
//! any `BufRead`, and writes status snapshots and CTD directives as JSON
//! lines to any `Write`.

use crossbeam_channel::{select, Receiver, Sender};
use riftox_common::winch::bus::{parse_inbound, Inbound, Outbound};
use riftox_common::winch::command::CommandMessage;
use riftox_common::winch::status::WinchStatus;
use riftox_common::winch::telemetry::{CtdDirective, CtdTelemetry};
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Decode inbound lines until EOF or until a queue closes.
pub fn read_inbound(
    input: impl BufRead,
    commands: &Sender<CommandMessage>,
    telemetry: &Sender<CtdTelemetry>,
) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "bus read failed");
                break;
            }
        };
        let delivered = match parse_inbound(&line) {
            Ok(Some(Inbound::Command(cmd))) => {
                debug!(command = %cmd, "bus command");
                commands.send(cmd.to_message()).is_ok()
            }
            Ok(Some(Inbound::Telemetry(sample))) => telemetry.send(sample).is_ok(),
            Ok(None) => true,
            Err(e) => {
                warn!(line = %line.trim(), error = %e, "bus line rejected");
                true
            }
        };
        if !delivered {
            debug!("inbound queue closed");
            break;
        }
    }
    debug!("bus input ended");
}

/// Write outbound lines until `shutdown` is set or both queues close.
pub fn write_outbound(
    mut out: impl Write,
    status: Receiver<WinchStatus>,
    ctd: Receiver<CtdDirective>,
    poll: Duration,
    shutdown: &AtomicBool,
) {
    let mut status = Some(status);
    let mut ctd = Some(ctd);
    while !shutdown.load(Ordering::SeqCst) && (status.is_some() || ctd.is_some()) {
        let status_rx = status.clone().unwrap_or_else(crossbeam_channel::never);
        let ctd_rx = ctd.clone().unwrap_or_else(crossbeam_channel::never);
        let message = select! {
            recv(status_rx) -> msg => match msg {
                Ok(s) => Some(Outbound::Status(s)),
                Err(_) => {
                    status = None;
                    None
                }
            },
            recv(ctd_rx) -> msg => match msg {
                Ok(directive) => Some(Outbound::CtdCommand { directive }),
                Err(_) => {
                    ctd = None;
                    None
                }
            },
            default(poll) => None,
        };
        let Some(message) = message else {
            continue;
        };
        if let Err(e) = write_line(&mut out, &message) {
            warn!(error = %e, "bus write failed");
            break;
        }
    }
    debug!("bus output ended");
}

fn write_line(out: &mut impl Write, message: &Outbound) -> std::io::Result<()> {
    let line = message.to_line().map_err(std::io::Error::other)?;
    writeln!(out, "{line}")?;
    out.flush()
}

// ─── Tests ──────────────────────────────────────────────────────────
