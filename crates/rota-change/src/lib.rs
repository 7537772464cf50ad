//! Change detection: content fingerprints and durable run state.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use rota_model::{ChangeState, Dataset, Result};

/// Durable access to the [`ChangeState`] document.
///
/// `load` never fails: a missing or corrupt document reads as the
/// default state ("no prior run").
pub trait StateStore {
    fn load(&mut self) -> ChangeState;
    fn save(&mut self, state: &ChangeState) -> Result<()>;
}

/// Why a dataset is (or is not) considered changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    FirstRun,
    NoChange,
    RowsAdded,
    RowsRemoved,
    RowsModified,
}

impl ChangeReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstRun => "first_run",
            Self::NoChange => "no_change",
            Self::RowsAdded => "rows_added",
            Self::RowsRemoved => "rows_removed",
            Self::RowsModified => "rows_modified",
        }
    }
}

/// Detail returned alongside the changed/unchanged verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeDetail {
    pub reason: ChangeReason,
    pub current_hash: String,
    pub previous_hash: Option<String>,
    /// Current row count minus the last recorded count.
    pub row_delta: i64,
}

/// Field separators for the deterministic serialization; neither can
/// appear in cleaned cell values.
const CELL_SEPARATOR: u8 = 0x1f;
const ROW_SEPARATOR: u8 = 0x1e;

/// SHA-256 over the canonical column order and every cell, rendered as
/// lower-hex. Identical datasets always fingerprint identically.
pub fn compute_fingerprint(dataset: &Dataset) -> String {
    let mut hasher = Sha256::new();
    for column in &dataset.columns {
        hasher.update(column.as_bytes());
        hasher.update([CELL_SEPARATOR]);
    }
    hasher.update([ROW_SEPARATOR]);
    for row in &dataset.rows {
        for cell in row {
            hasher.update(cell.as_bytes());
            hasher.update([CELL_SEPARATOR]);
        }
        hasher.update([ROW_SEPARATOR]);
    }
    hex::encode(hasher.finalize())
}

/// Change detector bound to one loaded state snapshot.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    state: ChangeState,
}

impl ChangeDetector {
    /// Loads the persisted state; absence degrades to a fresh state.
    pub fn load(store: &mut dyn StateStore) -> Self {
        Self {
            state: store.load(),
        }
    }

    pub fn from_state(state: ChangeState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &ChangeState {
        &self.state
    }

    /// Classifies the dataset against the last known-good baseline.
    pub fn has_changed(&self, dataset: &Dataset) -> (bool, ChangeDetail) {
        let current_hash = compute_fingerprint(dataset);
        let row_delta = dataset.row_count() as i64 - self.state.last_row_count as i64;
        let (changed, reason) = match &self.state.last_hash {
            None => (true, ChangeReason::FirstRun),
            Some(last) if last == &current_hash => (false, ChangeReason::NoChange),
            Some(_) => {
                let reason = match row_delta {
                    delta if delta > 0 => ChangeReason::RowsAdded,
                    delta if delta < 0 => ChangeReason::RowsRemoved,
                    _ => ChangeReason::RowsModified,
                };
                (true, reason)
            }
        };
        let detail = ChangeDetail {
            reason,
            current_hash,
            previous_hash: self.state.last_hash.clone(),
            row_delta,
        };
        debug!(reason = reason.as_str(), row_delta, "change check");
        (changed, detail)
    }

    /// Records the run. `run_count` and `last_run` always advance; the
    /// fingerprint/row-count/update-time baseline moves only when
    /// `success` is true, so failed runs never displace the last known
    /// good state.
    pub fn update_state(
        &mut self,
        store: &mut dyn StateStore,
        dataset: &Dataset,
        success: bool,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        self.state.run_count += 1;
        self.state.last_run = Some(now.clone());
        if success {
            self.state.last_hash = Some(compute_fingerprint(dataset));
            self.state.last_row_count = dataset.row_count();
            self.state.last_update_time = Some(now);
        }
        store.save(&self.state)
    }

    /// Clears the fingerprint so the next check reports a first run.
    pub fn reset_state(&mut self, store: &mut dyn StateStore) -> Result<()> {
        self.state.last_hash = None;
        self.state.last_row_count = 0;
        self.state.last_update_time = None;
        store.save(&self.state)
    }
}
