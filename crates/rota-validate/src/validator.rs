//! Row and dataset level defect classification.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use rota_model::{
    Dataset, SLOT_COLUMN, SchemaConfig, Severity, ValidationIssue, ValidationReport,
};

/// Canonical primary-date pattern. Conformance is checked before
/// calendar validity so each defect gets exactly one issue.
static CANONICAL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("canonical date pattern"));

/// Validation context bound to one schema configuration.
pub struct Validator<'a> {
    config: &'a SchemaConfig,
}

impl<'a> Validator<'a> {
    pub fn new(config: &'a SchemaConfig) -> Self {
        Self { config }
    }

    /// Validates a canonical dataset.
    ///
    /// Per row: required-field presence, then primary-date format
    /// conformance, then calendar validity, all at error severity.
    /// Dataset level: rows sharing a (primary date, slot) pair get a
    /// duplicate-service warning each, never an error. Issue order is
    /// detection order.
    pub fn validate(&self, dataset: &Dataset) -> ValidationReport {
        let mut issues = Vec::new();
        let date_field = self.config.date_field.name.as_str();
        let required = self.config.effective_required_fields();

        for (idx, _) in dataset.rows.iter().enumerate() {
            let row_number = idx + 1;
            for field in &required {
                let value = dataset.value(idx, field);
                if value.trim().is_empty() {
                    issues.push(ValidationIssue {
                        row_number,
                        severity: Severity::Error,
                        field: field.clone(),
                        message: format!("required field `{field}` is empty"),
                        value: None,
                    });
                }
            }

            let date_value = dataset.value(idx, date_field);
            if !date_value.trim().is_empty() {
                if !CANONICAL_DATE.is_match(date_value.trim()) {
                    issues.push(ValidationIssue {
                        row_number,
                        severity: Severity::Error,
                        field: date_field.to_string(),
                        message: "primary date is not in YYYY-MM-DD form".to_string(),
                        value: Some(date_value.to_string()),
                    });
                } else if NaiveDate::parse_from_str(date_value.trim(), "%Y-%m-%d").is_err() {
                    issues.push(ValidationIssue {
                        row_number,
                        severity: Severity::Error,
                        field: date_field.to_string(),
                        message: "primary date is not a valid calendar date".to_string(),
                        value: Some(date_value.to_string()),
                    });
                }
            }
        }

        issues.extend(self.duplicate_service_warnings(dataset, date_field));
        ValidationReport::from_issues(dataset.row_count(), issues)
    }

    /// Groups rows by (primary date, slot); every member of a group
    /// larger than one is flagged. Undated rows are never grouped.
    fn duplicate_service_warnings(
        &self,
        dataset: &Dataset,
        date_field: &str,
    ) -> Vec<ValidationIssue> {
        let mut groups: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();
        for idx in 0..dataset.row_count() {
            let date = dataset.value(idx, date_field).trim().to_string();
            if date.is_empty() {
                continue;
            }
            let slot = dataset.value(idx, SLOT_COLUMN).trim().to_string();
            groups.entry((date, slot)).or_default().push(idx);
        }
        let mut flagged: Vec<(usize, String, String)> = Vec::new();
        for ((date, slot), members) in groups {
            if members.len() > 1 {
                for idx in members {
                    flagged.push((idx, date.clone(), slot.clone()));
                }
            }
        }
        // Detection order follows row order.
        flagged.sort_by_key(|(idx, _, _)| *idx);
        flagged
            .into_iter()
            .map(|(idx, date, slot)| ValidationIssue {
                row_number: idx + 1,
                severity: Severity::Warning,
                field: date_field.to_string(),
                message: format!("duplicate service for {date} ({slot})"),
                value: Some(date),
            })
            .collect()
    }
}
