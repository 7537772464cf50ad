//! Durable change-detection state.

use serde::{Deserialize, Serialize};

/// Run bookkeeping persisted between process invocations.
///
/// Five JSON-scalar fields. A missing or corrupt persisted document
/// degrades to [`ChangeState::default`], which reads as "no prior run".
/// `last_hash`/`last_row_count`/`last_update_time` only move after a
/// fully successful pass; `run_count` and `last_run` advance every run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeState {
    #[serde(default)]
    pub last_run: Option<String>,
    #[serde(default)]
    pub last_hash: Option<String>,
    #[serde(default)]
    pub last_row_count: usize,
    #[serde(default)]
    pub last_update_time: Option<String>,
    #[serde(default)]
    pub run_count: u64,
}

impl ChangeState {
    pub fn is_first_run(&self) -> bool {
        self.last_hash.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_fills_defaults() {
        let state: ChangeState =
            serde_json::from_str(r#"{"run_count": 3}"#).expect("parse");
        assert_eq!(state.run_count, 3);
        assert!(state.is_first_run());
        assert_eq!(state.last_row_count, 0);
    }
}
