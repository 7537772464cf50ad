//! Validation issues and the per-run report.

use serde::{Deserialize, Serialize};

/// Issue severity. Warnings never disqualify a row from success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// One defect found in the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// 1-based data row number.
    pub row_number: usize,
    pub severity: Severity,
    pub field: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Per-run validation report.
///
/// `success_rows` counts rows with zero error-severity issues;
/// `warning_rows` counts rows that carry at least one warning.
/// Issue order is detection order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_rows: usize,
    pub success_rows: usize,
    pub warning_rows: usize,
    pub error_rows: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Builds a report from collected issues, computing the row rollups.
    pub fn from_issues(total_rows: usize, issues: Vec<ValidationIssue>) -> Self {
        let mut error_rows_seen = std::collections::BTreeSet::new();
        let mut warning_rows_seen = std::collections::BTreeSet::new();
        for issue in &issues {
            match issue.severity {
                Severity::Error => {
                    error_rows_seen.insert(issue.row_number);
                }
                Severity::Warning => {
                    warning_rows_seen.insert(issue.row_number);
                }
            }
        }
        let error_rows = error_rows_seen.len();
        Self {
            total_rows,
            success_rows: total_rows.saturating_sub(error_rows),
            warning_rows: warning_rows_seen.len(),
            error_rows,
            issues,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }
}
