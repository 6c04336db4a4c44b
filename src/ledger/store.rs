//! Durable storage for the cumulative ledger counters.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::accounting::LedgerState;
use crate::error::Result;

/// Loads and saves [`LedgerState`] across restarts.
pub trait CounterStore {
    /// Reads the stored counters. A store that has never been written yields zeroes.
    fn load(&self) -> Result<LedgerState>;

    /// Replaces the stored counters.
    fn save(&mut self, state: &LedgerState) -> Result<()>;
}

impl<S: CounterStore + ?Sized> CounterStore for Box<S> {
    fn load(&self) -> Result<LedgerState> {
        (**self).load()
    }

    fn save(&mut self, state: &LedgerState) -> Result<()> {
        (**self).save(state)
    }
}

/// Counters kept as pretty-printed JSON in a single file.
///
/// Writes go to a sibling `.tmp` file which is then renamed over the target,
/// so a crash mid-write leaves the previous counters intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CounterStore for JsonFileStore {
    fn load(&self) -> Result<LedgerState> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no ledger file, starting from zero");
            return Ok(LedgerState::default());
        }
        let content = fs::read_to_string(&self.path)?;
        let state = serde_json::from_str(&content)?;
        info!(path = %self.path.display(), "ledger counters restored");
        Ok(state)
    }

    fn save(&mut self, state: &LedgerState) -> Result<()> {
        let temp_path = self.path.with_extension("tmp");
        let content = serde_json::to_string_pretty(state)?;

        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;
        debug!(path = %self.path.display(), "ledger counters saved");
        Ok(())
    }
}

/// In-process store for tests and ephemeral runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: LedgerState,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `state`, as if restored from a previous run.
    pub fn with_state(state: LedgerState) -> Self {
        Self { state, saves: 0 }
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl CounterStore for MemoryStore {
    fn load(&self) -> Result<LedgerState> {
        Ok(self.state)
    }

    fn save(&mut self, state: &LedgerState) -> Result<()> {
        self.state = *state;
        self.saves += 1;
        Ok(())
    }
}
