//! CSV-backed alias table.

use std::path::{Path, PathBuf};

use tracing::debug;

use rota_identity::{AliasRow, AliasStore};
use rota_model::{Result, RotaError};

use crate::atomic::write_atomic;

/// Alias table stored as a headed CSV file. A missing file reads as an
/// empty table; writes replace the whole file.
#[derive(Debug, Clone)]
pub struct CsvAliasStore {
    path: PathBuf,
}

impl CsvAliasStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AliasStore for CsvAliasStore {
    fn read_all(&mut self) -> Result<Vec<AliasRow>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "alias table missing, starting empty");
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)
            .map_err(|e| RotaError::Store(format!("read aliases {}: {e}", self.path.display())))?;
        let mut rows = Vec::new();
        for record in reader.deserialize::<AliasRow>() {
            let row = record.map_err(|e| {
                RotaError::Store(format!("alias row {}: {e}", self.path.display()))
            })?;
            rows.push(row);
        }
        Ok(rows)
    }

    fn write_all(&mut self, rows: &[AliasRow]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            writer
                .serialize(row)
                .map_err(|e| RotaError::Store(format!("serialize alias: {e}")))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| RotaError::Store(format!("flush aliases: {e}")))?;
        write_atomic(&self.path, &bytes)?;
        debug!(path = %self.path.display(), rows = rows.len(), "wrote alias table");
        Ok(())
    }
}
