//! Audience-specific nested projections of the canonical dataset.

use serde::{Deserialize, Serialize};

/// Min/max of the primary date field across emitted records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Envelope metadata for one domain document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub domain: String,
    pub version: String,
    pub generated_at: String,
    pub record_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

/// One audience-specific projection: metadata envelope plus nested
/// per-record objects. Created fresh each run, no persisted identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainDocument {
    pub metadata: DocumentMetadata,
    pub records: Vec<serde_json::Value>,
}

impl DomainDocument {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}
