//! Raw and canonical record shapes.

use serde::{Deserialize, Serialize};

/// Derived column: ISO week of the primary date.
pub const WEEK_COLUMN: &str = "service_week";

/// Derived column: coarse time-of-day bucket.
pub const SLOT_COLUMN: &str = "service_slot";

/// Runtime column: lenient-cleaning annotations for the row.
pub const NOTES_COLUMN: &str = "notes";

/// Runtime column: 1-based source row reference.
pub const SOURCE_ROW_COLUMN: &str = "source_row";

/// Runtime column: run timestamp.
pub const UPDATED_AT_COLUMN: &str = "updated_at";

/// Separator joining multiple display names inside one canonical cell.
pub const NAME_JOIN: &str = "、";

/// Separator joining multiple person ids inside one canonical cell.
pub const ID_JOIN: &str = "|";

/// One source row: ordered `(label, value)` pairs.
///
/// Labels may repeat when the source table carries duplicate columns;
/// [`RawRecord::reconcile`] merges them before any cleaning runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub entries: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    /// Merges duplicate labels: the first position is kept, and a
    /// non-empty value wins over an empty one. Later non-empty values
    /// never displace an earlier non-empty value.
    pub fn reconcile(&self) -> Vec<(String, String)> {
        let mut merged: Vec<(String, String)> = Vec::with_capacity(self.entries.len());
        for (label, value) in &self.entries {
            match merged.iter_mut().find(|(existing, _)| existing == label) {
                Some((_, slot)) => {
                    if slot.trim().is_empty() && !value.trim().is_empty() {
                        *slot = value.clone();
                    }
                }
                None => merged.push((label.clone(), value.clone())),
            }
        }
        merged
    }

    /// First non-empty value under `label`, after reconciliation rules.
    pub fn value(&self, label: &str) -> Option<&str> {
        let mut fallback = None;
        for (entry_label, value) in &self.entries {
            if entry_label == label {
                if !value.trim().is_empty() {
                    return Some(value.as_str());
                }
                fallback.get_or_insert(value.as_str());
            }
        }
        fallback
    }

    /// Distinct labels in first-seen order.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for (label, _) in &self.entries {
            if !labels.contains(&label.as_str()) {
                labels.push(label.as_str());
            }
        }
        labels
    }
}

/// A rectangular dataset with a fixed column order.
///
/// Canonical output keeps one `columns` vector for the whole run; every
/// row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell value by row index and column name; empty when absent.
    pub fn value(&self, row: usize, column: &str) -> &str {
        self.column_index(column)
            .and_then(|idx| self.rows.get(row).and_then(|r| r.get(idx)))
            .map_or("", String::as_str)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Re-reads the dataset as raw records, one per row.
    pub fn to_raw_records(&self) -> Vec<RawRecord> {
        self.rows
            .iter()
            .map(|row| {
                RawRecord::new(
                    self.columns
                        .iter()
                        .cloned()
                        .zip(row.iter().cloned())
                        .collect(),
                )
            })
            .collect()
    }
}

/// Per-row note recorded when lenient cleaning had to intervene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowAnnotation {
    /// 1-based data row number.
    pub row_number: usize,
    pub field: Option<String>,
    pub message: String,
}
