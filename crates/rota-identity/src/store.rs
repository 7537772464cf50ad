//! External alias table contract.

use serde::{Deserialize, Serialize};

use rota_model::Result;

/// One row of the external alias table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRow {
    pub alias: String,
    pub person_id: String,
    pub display_name: String,
    #[serde(default)]
    pub count: usize,
}

/// Read/write access to the external alias table.
///
/// Writes replace the whole table; callers treat a sync as
/// all-or-nothing.
pub trait AliasStore {
    fn read_all(&mut self) -> Result<Vec<AliasRow>>;
    fn write_all(&mut self, rows: &[AliasRow]) -> Result<()>;
}
