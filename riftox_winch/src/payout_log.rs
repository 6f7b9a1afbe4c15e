//! Append-only `(timestamp, depth)` log, one line per status tick.

use riftox_common::winch::status::WinchStatus;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug)]
pub struct PayoutLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl PayoutLog {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        debug!(path = %path.display(), "payout log opened");
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `ts, depth_m` and flush.
    pub fn append(&mut self, status: &WinchStatus) -> io::Result<()> {
        writeln!(self.writer, "{:.2}, {:.2}", status.ts, status.depth_m)?;
        self.writer.flush()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
