//! CSV source reading: BOM handling, header detection, and the
//! optional per-column department row.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use tracing::debug;

use rota_clean::clean_date;
use rota_model::{RawRecord, Result, RotaError};

/// First-cell markers naming the department side-channel row.
const DEPARTMENT_MARKERS: [&str; 3] = ["部门", "所属部门", "department"];

/// One loaded source table. Duplicate header labels are preserved in
/// position; `departments` maps a column label to its department when
/// the source carried a department row.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub departments: BTreeMap<String, String>,
}

impl SourceTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One raw record per data row, headers zipped positionally so
    /// duplicate labels survive.
    pub fn to_raw_records(&self) -> Vec<RawRecord> {
        self.rows
            .iter()
            .map(|row| {
                RawRecord::new(
                    self.headers
                        .iter()
                        .cloned()
                        .zip(row.iter().cloned())
                        .collect(),
                )
            })
            .collect()
    }
}

/// Ordered row access plus the optional department side-channel.
pub trait TabularSource {
    fn read(&self) -> Result<SourceTable>;
}

/// CSV file source.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TabularSource for CsvSource {
    fn read(&self) -> Result<SourceTable> {
        read_csv_table(&self.path)
    }
}

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

#[derive(Debug, Default, Clone, Copy)]
struct RowStats {
    total: usize,
    non_empty: usize,
    date_like: usize,
}

impl RowStats {
    fn non_empty_ratio(self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.non_empty as f64 / self.total as f64
        }
    }
}

fn row_stats(row: &[String]) -> RowStats {
    let mut stats = RowStats {
        total: row.len(),
        ..RowStats::default()
    };
    for cell in row {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            continue;
        }
        stats.non_empty += 1;
        if clean_date(trimmed).is_some() {
            stats.date_like += 1;
        }
    }
    stats
}

fn is_data_like(stats: RowStats) -> bool {
    stats.date_like >= 1
}

fn is_header_like(stats: RowStats) -> bool {
    stats.non_empty_ratio() >= 0.6 && stats.date_like == 0
}

/// Picks the last header-like row before data starts. Title banners
/// above the real header row are skipped this way.
fn detect_header_row(rows: &[Vec<String>]) -> usize {
    if rows.is_empty() {
        return 0;
    }
    let probe = rows.len().min(5);
    let stats: Vec<RowStats> = rows.iter().take(probe).map(|row| row_stats(row)).collect();
    let data_index = stats.iter().position(|stat| is_data_like(*stat));
    let search_end = data_index.unwrap_or(1).max(1);
    let mut candidate = 0usize;
    for (idx, stat) in stats.iter().enumerate().take(search_end) {
        // A department side-channel row is header-like too; it must
        // stay below the real header.
        if is_header_like(*stat) && !is_department_row(&rows[idx]) {
            candidate = idx;
        }
    }
    candidate
}

fn is_department_row(row: &[String]) -> bool {
    row.iter()
        .find(|cell| !cell.trim().is_empty())
        .is_some_and(|cell| {
            let lowered = cell.trim().to_lowercase();
            DEPARTMENT_MARKERS.iter().any(|m| lowered == *m)
        })
}

/// Reads a CSV table: blank rows dropped, BOM trimmed, header row
/// detected, and a department row directly under the header consumed
/// into the side-channel.
pub fn read_csv_table(path: &Path) -> Result<SourceTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| RotaError::Source(format!("read csv {}: {e}", path.display())))?;
    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| RotaError::Source(format!("read record {}: {e}", path.display())))?;
        let row: Vec<String> = record.iter().map(normalize_cell).collect();
        if row.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        raw_rows.push(row);
    }
    if raw_rows.is_empty() {
        return Ok(SourceTable::default());
    }

    let header_index = detect_header_row(&raw_rows);
    let headers: Vec<String> = raw_rows[header_index].iter().map(|v| normalize_header(v)).collect();

    let mut data_start = header_index + 1;
    let mut departments = BTreeMap::new();
    if let Some(row) = raw_rows.get(data_start)
        && is_department_row(row)
    {
        for (idx, header) in headers.iter().enumerate() {
            let Some(cell) = row.get(idx) else { continue };
            let department = cell.trim();
            if header.is_empty() || department.is_empty() || is_department_row(&[cell.clone()]) {
                continue;
            }
            departments.insert(header.clone(), department.to_string());
        }
        data_start += 1;
    }

    let mut rows = Vec::new();
    for record in raw_rows.iter().skip(data_start) {
        let mut row = Vec::with_capacity(headers.len());
        for idx in 0..headers.len() {
            let value = record.get(idx).map(String::as_str).unwrap_or("");
            row.push(normalize_cell(value));
        }
        rows.push(row);
    }
    debug!(
        path = %path.display(),
        header_row = header_index,
        rows = rows.len(),
        departments = departments.len(),
        "loaded source table"
    );
    Ok(SourceTable {
        headers,
        rows,
        departments,
    })
}
