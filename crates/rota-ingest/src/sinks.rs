//! Canonical CSV output and per-domain JSON documents.

use std::path::{Path, PathBuf};

use tracing::info;

use rota_model::{Dataset, DomainDocument, Result, RotaError};

use crate::atomic::write_atomic;

/// Destination for the canonical dataset.
pub trait CanonicalSink {
    fn write(&self, dataset: &Dataset) -> Result<()>;
}

/// Destination for domain documents, one file per (domain, year) plus
/// a `latest` aggregate per domain.
pub trait DomainSink {
    fn write_year(&self, document: &DomainDocument, year: i32) -> Result<()>;
    fn write_latest(&self, document: &DomainDocument) -> Result<()>;
}

/// Writes the canonical dataset as a single CSV file.
#[derive(Debug, Clone)]
pub struct CsvCanonicalSink {
    path: PathBuf,
}

impl CsvCanonicalSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CanonicalSink for CsvCanonicalSink {
    fn write(&self, dataset: &Dataset) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&dataset.columns)
            .map_err(|e| RotaError::Sink(format!("write header: {e}")))?;
        for row in &dataset.rows {
            writer
                .write_record(row)
                .map_err(|e| RotaError::Sink(format!("write row: {e}")))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| RotaError::Sink(format!("flush csv: {e}")))?;
        write_atomic(&self.path, &bytes)?;
        info!(path = %self.path.display(), rows = dataset.row_count(), "wrote canonical csv");
        Ok(())
    }
}

/// Writes domain documents into one directory as
/// `{domain}_{year}.json` and `{domain}_latest.json`.
#[derive(Debug, Clone)]
pub struct JsonDomainSink {
    dir: PathBuf,
}

impl JsonDomainSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write_file(&self, document: &DomainDocument, name: &str) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_vec_pretty(document)?;
        write_atomic(&path, &json)?;
        info!(
            path = %path.display(),
            records = document.record_count(),
            "wrote domain document"
        );
        Ok(())
    }
}

impl DomainSink for JsonDomainSink {
    fn write_year(&self, document: &DomainDocument, year: i32) -> Result<()> {
        self.write_file(document, &format!("{}_{year}.json", document.metadata.domain))
    }

    fn write_latest(&self, document: &DomainDocument) -> Result<()> {
        self.write_file(document, &format!("{}_latest.json", document.metadata.domain))
    }
}
