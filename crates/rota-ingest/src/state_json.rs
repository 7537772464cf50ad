//! JSON-backed change-detection state.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use rota_change::StateStore;
use rota_model::{ChangeState, Result};

use crate::atomic::write_atomic;

/// Change state stored as one JSON file. A missing or corrupt file
/// loads as the default state so a run is never blocked by it.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonStateStore {
    fn load(&mut self) -> ChangeState {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return ChangeState::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt state file, starting fresh");
                ChangeState::default()
            }
        }
    }

    fn save(&mut self, state: &ChangeState) -> Result<()> {
        let json = serde_json::to_vec_pretty(state)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }
}
