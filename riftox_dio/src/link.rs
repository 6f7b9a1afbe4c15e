//! The shared link to the DIO controller.
//!
//! There is one physical serial line and the protocol allows a single
//! outstanding request. `DioLink` wraps the port in a
//! [`parking_lot::ReentrantMutex`]: each exchange holds the lock for its
//! write and read, and [`DioLink::transaction`] holds it across a whole
//! sequence while the exchanges inside re-enter it.

use parking_lot::ReentrantMutex;
use riftox_common::pins::{Level, PinAssignment};
use static_assertions::assert_impl_all;
use std::cell::RefCell;
use std::sync::Arc;
use tracing::{trace, warn};

use crate::error::DioError;
use crate::port::DioPort;
use crate::wire::{self, PinCommand};

/// Cloneable handle to the single controller link.
#[derive(Clone)]
pub struct DioLink {
    inner: Arc<ReentrantMutex<RefCell<Box<dyn DioPort>>>>,
    driver: &'static str,
}

assert_impl_all!(DioLink: Send, Sync, Clone);

impl DioLink {
    pub fn new(port: Box<dyn DioPort>) -> Self {
        let driver = port.name();
        Self {
            inner: Arc::new(ReentrantMutex::new(RefCell::new(port))),
            driver,
        }
    }

    /// Name of the underlying driver.
    pub fn driver(&self) -> &'static str {
        self.driver
    }

    /// One write+read exchange under the link lock.
    pub fn exchange(&self, command: &PinCommand) -> Result<String, DioError> {
        let guard = self.inner.lock();
        let mut port = guard
            .try_borrow_mut()
            .map_err(|_| DioError::LinkFailure("port re-entered during an exchange".into()))?;
        let result = port.send(command);
        match &result {
            Ok(reply) => trace!(cmd = %command, reply = %reply, "dio exchange"),
            Err(e) => warn!(cmd = %command, error = %e, "dio exchange failed"),
        }
        result
    }

    /// Run `f` with the link held, so no other thread can interleave
    /// requests with the sequence inside.
    pub fn transaction<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        let _guard = self.inner.lock();
        f(self)
    }

    pub fn set(&self, addr: PinAssignment, level: Level) -> Result<(), DioError> {
        self.exchange(&PinCommand::Set { addr, level }).map(|_| ())
    }

    pub fn read_output(&self, addr: PinAssignment) -> Result<Level, DioError> {
        let cmd = PinCommand::GetOutput { addr };
        let reply = self.exchange(&cmd)?;
        wire::parse_level(&cmd, &reply)
    }

    pub fn read_input(&self, addr: PinAssignment) -> Result<Level, DioError> {
        let cmd = PinCommand::GetInput { addr };
        let reply = self.exchange(&cmd)?;
        wire::parse_level(&cmd, &reply)
    }

    pub fn edge_count(&self, addr: PinAssignment) -> Result<u64, DioError> {
        let cmd = PinCommand::EdgeCount { addr };
        let reply = self.exchange(&cmd)?;
        wire::parse_count(&cmd, &reply)
    }
}

impl std::fmt::Debug for DioLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DioLink").field("driver", &self.driver).finish()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
