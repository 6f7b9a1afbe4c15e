//! Recording port with scripted sensor replies.
//!
//! Outputs behave as a loopback: a `dio get` of an output returns the last
//! level set on it. Edge counters return queued values in order; the last
//! value repeats once the queue is down to one entry.

use parking_lot::Mutex;
use riftox_common::pins::{Level, PinAssignment};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::error::DioError;
use crate::port::DioPort;
use crate::wire::PinCommand;

#[derive(Default)]
struct Script {
    sent: Vec<PinCommand>,
    outputs: HashMap<PinAssignment, Level>,
    inputs: HashMap<PinAssignment, Level>,
    /// `None` entries fail the exchange.
    edges: HashMap<PinAssignment, VecDeque<Option<u64>>>,
    fail_sets: bool,
}

/// Port half, handed to a [`DioLink`](crate::link::DioLink).
pub struct ScriptedPort {
    script: Arc<Mutex<Script>>,
}

/// Test half, used to queue replies and inspect traffic.
#[derive(Clone)]
pub struct ScriptHandle {
    script: Arc<Mutex<Script>>,
}

/// Create a connected port/handle pair.
pub fn scripted() -> (ScriptedPort, ScriptHandle) {
    let script = Arc::new(Mutex::new(Script::default()));
    (
        ScriptedPort {
            script: Arc::clone(&script),
        },
        ScriptHandle { script },
    )
}

impl ScriptHandle {
    /// Every command received so far, in order.
    pub fn sent(&self) -> Vec<PinCommand> {
        self.script.lock().sent.clone()
    }

    /// Only the `Set` commands, as `(addr, level)`.
    pub fn sets(&self) -> Vec<(PinAssignment, Level)> {
        self.script
            .lock()
            .sent
            .iter()
            .filter_map(|cmd| match cmd {
                PinCommand::Set { addr, level } => Some((*addr, *level)),
                _ => None,
            })
            .collect()
    }

    pub fn clear_sent(&self) {
        self.script.lock().sent.clear();
    }

    pub fn output(&self, addr: PinAssignment) -> Option<Level> {
        self.script.lock().outputs.get(&addr).copied()
    }

    pub fn set_input(&self, addr: PinAssignment, level: Level) {
        self.script.lock().inputs.insert(addr, level);
    }

    pub fn queue_edges(&self, addr: PinAssignment, counts: impl IntoIterator<Item = u64>) {
        self.script
            .lock()
            .edges
            .entry(addr)
            .or_default()
            .extend(counts.into_iter().map(Some));
    }

    /// The next edge read on `addr` fails.
    pub fn queue_edge_failure(&self, addr: PinAssignment) {
        self.script.lock().edges.entry(addr).or_default().push_back(None);
    }

    /// Make every subsequent `Set` fail.
    pub fn fail_sets(&self, fail: bool) {
        self.script.lock().fail_sets = fail;
    }
}

impl DioPort for ScriptedPort {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn send(&mut self, command: &PinCommand) -> Result<String, DioError> {
        let mut script = self.script.lock();
        script.sent.push(*command);
        match *command {
            PinCommand::SourceMode { .. } => Ok(String::new()),
            PinCommand::Set { addr, level } => {
                if script.fail_sets {
                    return Err(DioError::Timeout(command.to_string()));
                }
                script.outputs.insert(addr, level);
                Ok(String::new())
            }
            PinCommand::GetOutput { addr } => {
                let level = script.outputs.get(&addr).copied().unwrap_or(Level::Low);
                Ok(readback(level))
            }
            PinCommand::GetInput { addr } => {
                let level = script.inputs.get(&addr).copied().unwrap_or(Level::Low);
                Ok(readback(level))
            }
            PinCommand::EdgeCount { addr } => {
                let queue = script.edges.entry(addr).or_default();
                let next = if queue.len() > 1 {
                    queue.pop_front().flatten()
                } else {
                    match queue.front().copied() {
                        // A queued failure is consumed even when it is last.
                        Some(None) => queue.pop_front().flatten(),
                        Some(count) => count,
                        None => Some(0),
                    }
                };
                next.map(|count| count.to_string())
                    .ok_or_else(|| DioError::Timeout(command.to_string()))
            }
        }
    }
}

fn readback(level: Level) -> String {
    match level {
        Level::High => "1".to_string(),
        Level::Low => "0".to_string(),
    }
}
