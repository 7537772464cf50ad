//! Deterministic text rendering of a validation report.

use std::fmt::Write as _;

use rota_model::{Severity, ValidationIssue, ValidationReport};

/// Renders totals, then the error bucket, then the warning bucket.
///
/// Each bucket is truncated to `max_issues` entries with a trailing
/// `... and N more` line; issue order within a bucket is detection
/// order. Output is stable for identical reports.
pub fn format_report(report: &ValidationReport, max_issues: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "rows: {} total, {} ok, {} with errors, {} with warnings",
        report.total_rows, report.success_rows, report.error_rows, report.warning_rows
    );

    let errors: Vec<&ValidationIssue> = report
        .issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .collect();
    let warnings: Vec<&ValidationIssue> = report
        .issues
        .iter()
        .filter(|i| i.severity == Severity::Warning)
        .collect();

    if errors.is_empty() && warnings.is_empty() {
        out.push_str("no issues found\n");
        return out;
    }

    render_bucket(&mut out, "errors", &errors, max_issues);
    render_bucket(&mut out, "warnings", &warnings, max_issues);
    out
}

fn render_bucket(out: &mut String, title: &str, issues: &[&ValidationIssue], max_issues: usize) {
    if issues.is_empty() {
        return;
    }
    let _ = writeln!(out, "{title} ({}):", issues.len());
    for issue in issues.iter().take(max_issues) {
        match &issue.value {
            Some(value) => {
                let _ = writeln!(
                    out,
                    "  row {} [{}]: {} (value: {value})",
                    issue.row_number, issue.field, issue.message
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    "  row {} [{}]: {}",
                    issue.row_number, issue.field, issue.message
                );
            }
        }
    }
    if issues.len() > max_issues {
        let _ = writeln!(out, "  ... and {} more", issues.len() - max_issues);
    }
}
