//! Sampling depths for the upcast.
//!
//! Depths are kept deepest first. While the package rises the monitor asks
//! for the next depth still above the deepest point of the cast; depths at
//! or below that point can never be reached going up and are discarded for
//! the rest of the cast.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("depths file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read depths file: {0}")]
    Read(String),

    #[error("failed to parse depths file: {0}")]
    Parse(String),
}

/// Where the depth list comes from.
pub trait DepthSource: Send {
    fn load(&self) -> Result<Vec<f64>, ScheduleError>;
}

/// A TOML file with a top-level `DEPTHS = [..]` array.
#[derive(Debug, Clone)]
pub struct TomlDepthFile {
    path: PathBuf,
}

#[derive(Deserialize)]
struct DepthsFile {
    #[serde(rename = "DEPTHS")]
    depths: Vec<f64>,
}

impl TomlDepthFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DepthSource for TomlDepthFile {
    fn load(&self) -> Result<Vec<f64>, ScheduleError> {
        if !self.path.exists() {
            return Err(ScheduleError::NotFound(self.path.clone()));
        }
        let text = fs::read_to_string(&self.path).map_err(|e| ScheduleError::Read(e.to_string()))?;
        let file: DepthsFile =
            toml::from_str(&text).map_err(|e| ScheduleError::Parse(e.to_string()))?;
        Ok(file
            .depths
            .into_iter()
            .filter(|d| {
                let ok = d.is_finite() && *d >= 0.0;
                if !ok {
                    warn!(depth = *d, path = %self.path.display(), "discarding invalid pause depth");
                }
                ok
            })
            .collect())
    }
}

/// A fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticDepths(pub Vec<f64>);

impl DepthSource for StaticDepths {
    fn load(&self) -> Result<Vec<f64>, ScheduleError> {
        Ok(self.0.clone())
    }
}

pub struct PauseDepthSchedule {
    source: Box<dyn DepthSource>,
    /// Last list the source delivered, deepest first.
    loaded: Vec<f64>,
    /// Still to come this cast, deepest first.
    pending: Vec<f64>,
    skipped: Vec<f64>,
    completed: Vec<f64>,
}

impl std::fmt::Debug for PauseDepthSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PauseDepthSchedule")
            .field("pending", &self.pending)
            .field("skipped", &self.skipped)
            .field("completed", &self.completed)
            .finish()
    }
}

impl PauseDepthSchedule {
    /// Load the initial list. A source that fails here is fatal to the caller.
    pub fn new(source: Box<dyn DepthSource>) -> Result<Self, ScheduleError> {
        let loaded = sorted(source.load()?);
        info!(depths = ?loaded, "pause depths loaded");
        Ok(Self {
            source,
            pending: loaded.clone(),
            loaded,
            skipped: Vec::new(),
            completed: Vec::new(),
        })
    }

    /// A schedule with no depths.
    pub fn empty() -> Self {
        Self {
            source: Box::new(StaticDepths::default()),
            loaded: Vec::new(),
            pending: Vec::new(),
            skipped: Vec::new(),
            completed: Vec::new(),
        }
    }

    /// Next depth shallower than `max_reached`, without consuming it.
    ///
    /// Depths at or below `max_reached` are discarded until the next
    /// [`refresh`](Self::refresh). Calling this again with the same argument
    /// returns the same depth.
    pub fn get_next(&mut self, max_reached: f64) -> Option<f64> {
        let unreachable = self
            .pending
            .iter()
            .take_while(|d| **d >= max_reached)
            .count();
        if unreachable > 0 {
            let dropped: Vec<f64> = self.pending.drain(..unreachable).collect();
            debug!(?dropped, max_reached, "pause depths unreachable this cast");
            self.skipped.extend(dropped);
        }
        self.pending.first().copied()
    }

    /// Consume the depth the last [`get_next`](Self::get_next) returned.
    pub fn use_next(&mut self) -> Option<f64> {
        if self.pending.is_empty() {
            return None;
        }
        let depth = self.pending.remove(0);
        self.completed.push(depth);
        Some(depth)
    }

    /// Reload from the source and restore every depth for a new ascent.
    ///
    /// If the source fails the previous list is restored and the error is
    /// returned for logging.
    pub fn refresh(&mut self) -> Result<usize, ScheduleError> {
        let result = self.source.load().map(sorted);
        if let Ok(depths) = &result {
            self.loaded = depths.clone();
        }
        self.pending = self.loaded.clone();
        self.skipped.clear();
        self.completed.clear();
        result.map(|depths| {
            info!(depths = ?depths, "pause depths refreshed");
            depths.len()
        })
    }

    pub fn pending(&self) -> &[f64] {
        &self.pending
    }

    pub fn skipped(&self) -> &[f64] {
        &self.skipped
    }

    pub fn completed(&self) -> &[f64] {
        &self.completed
    }
}

fn sorted(mut depths: Vec<f64>) -> Vec<f64> {
    depths.sort_by(|a, b| b.total_cmp(a));
    depths
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::NamedTempFile;

    /// A source the test can change or break between loads.
    #[derive(Clone, Default)]
    struct SharedDepths(Arc<Mutex<Option<Vec<f64>>>>);

    impl DepthSource for SharedDepths {
        fn load(&self) -> Result<Vec<f64>, ScheduleError> {
            self.0
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ScheduleError::Read("source offline".to_string()))
        }
    }

    fn schedule(depths: &[f64]) -> PauseDepthSchedule {
        PauseDepthSchedule::new(Box::new(StaticDepths(depths.to_vec()))).unwrap()
    }

    #[test]
    fn unreachable_depth_stays_discarded() {
        let mut s = schedule(&[10.0, 20.0, 15.0]);
        assert_eq!(s.get_next(18.0), Some(15.0));
        assert_eq!(s.skipped(), &[20.0]);
        // Going deeper later does not bring 20 back.
        assert_eq!(s.get_next(22.0), Some(15.0));
        assert_eq!(s.use_next(), Some(15.0));
        assert_eq!(s.get_next(22.0), Some(10.0));
    }

    #[test]
    fn depth_at_max_is_unreachable() {
        let mut s = schedule(&[20.0, 10.0]);
        assert_eq!(s.get_next(20.0), Some(10.0));
    }

    #[test]
    fn use_next_moves_to_completed() {
        let mut s = schedule(&[15.0, 10.0]);
        s.get_next(30.0);
        s.use_next();
        assert_eq!(s.completed(), &[15.0]);
        assert_eq!(s.pending(), &[10.0]);
        s.use_next();
        assert_eq!(s.use_next(), None);
        assert_eq!(s.get_next(30.0), None);
    }

    #[test]
    fn refresh_restores_and_picks_up_changes() {
        let source = SharedDepths::default();
        *source.0.lock().unwrap() = Some(vec![20.0, 10.0]);
        let mut s = PauseDepthSchedule::new(Box::new(source.clone())).unwrap();
        s.get_next(15.0);
        s.use_next();
        assert!(s.pending().is_empty());

        *source.0.lock().unwrap() = Some(vec![25.0, 5.0]);
        assert_eq!(s.refresh(), Ok(2));
        assert_eq!(s.pending(), &[25.0, 5.0]);
        assert!(s.skipped().is_empty());
        assert!(s.completed().is_empty());
    }

    #[test]
    fn failed_refresh_keeps_previous_list() {
        let source = SharedDepths::default();
        *source.0.lock().unwrap() = Some(vec![20.0, 10.0]);
        let mut s = PauseDepthSchedule::new(Box::new(source.clone())).unwrap();
        s.get_next(15.0);
        s.use_next();

        *source.0.lock().unwrap() = None;
        assert!(s.refresh().is_err());
        assert_eq!(s.pending(), &[20.0, 10.0]);
    }

    #[test]
    fn toml_file_discards_invalid_entries() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "DEPTHS = [10.0, -3.0, 25.5, nan, 0.0]").unwrap();
        file.flush().unwrap();

        let depths = TomlDepthFile::new(file.path()).load().unwrap();
        assert_eq!(depths, vec![10.0, 25.5, 0.0]);
    }

    #[test]
    fn missing_file_is_error() {
        let err = TomlDepthFile::new("/nonexistent/depths.toml")
            .load()
            .unwrap_err();
        assert!(matches!(err, ScheduleError::NotFound(_)));
        assert!(PauseDepthSchedule::new(Box::new(TomlDepthFile::new("/nonexistent/depths.toml"))).is_err());
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "DEPTH = [1.0]").unwrap();
        file.flush().unwrap();
        assert!(matches!(
            TomlDepthFile::new(file.path()).load(),
            Err(ScheduleError::Parse(_))
        ));
    }

    proptest! {
        #[test]
        fn get_next_is_stable_and_consumed_depths_never_return(
            depths in proptest::collection::vec(0.0f64..100.0, 0..12),
            max in 0.0f64..120.0,
        ) {
            let mut s = schedule(&depths);
            let first = s.get_next(max);
            prop_assert_eq!(s.get_next(max), first);
            prop_assert_eq!(s.get_next(max), first);
            if let Some(d) = first {
                prop_assert!(d < max);
                prop_assert_eq!(s.use_next(), Some(d));
                let remaining = s.pending().iter().filter(|p| **p == d).count();
                let total = depths.iter().filter(|p| **p == d).count();
                // only duplicates of d may remain
                prop_assert_eq!(remaining, total - 1);
            }
        }
    }
}
