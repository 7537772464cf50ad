//! Schema configuration: canonical fields and their source-label mappings.

use std::collections::BTreeMap;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, RotaError};

/// How a canonical field finds its value in the source table.
///
/// A mapping is either a single source label or an advanced shape carrying
/// several labels, an optional merge flag, and an optional department.
/// The shape is validated once at load time; anything that is neither a
/// string nor the advanced object is a scoped config error.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FieldMapping {
    /// One source column label.
    Simple(String),
    /// Several candidate labels, optionally merged into one value.
    Advanced {
        source_labels: Vec<String>,
        #[serde(default)]
        merge: bool,
        #[serde(default)]
        department: Option<String>,
    },
}

impl FieldMapping {
    /// All source labels this mapping claims, in declared order.
    pub fn source_labels(&self) -> Vec<&str> {
        match self {
            Self::Simple(label) => vec![label.as_str()],
            Self::Advanced { source_labels, .. } => {
                source_labels.iter().map(String::as_str).collect()
            }
        }
    }

    /// Whether multiple source columns are merged into one value.
    pub fn is_merge(&self) -> bool {
        matches!(self, Self::Advanced { merge: true, .. })
    }

    /// Explicit department override, if declared.
    pub fn department(&self) -> Option<&str> {
        match self {
            Self::Simple(_) => None,
            Self::Advanced { department, .. } => department.as_deref(),
        }
    }

    fn from_value(value: &serde_json::Value) -> std::result::Result<Self, String> {
        match value {
            serde_json::Value::String(label) => Ok(Self::Simple(label.clone())),
            serde_json::Value::Object(map) => {
                let labels = map
                    .get("source_labels")
                    .and_then(|v| v.as_array())
                    .ok_or_else(|| {
                        "advanced mapping requires a source_labels array".to_string()
                    })?;
                let mut source_labels = Vec::with_capacity(labels.len());
                for label in labels {
                    let label = label
                        .as_str()
                        .ok_or_else(|| "source_labels entries must be strings".to_string())?;
                    source_labels.push(label.to_string());
                }
                let merge = map
                    .get("merge")
                    .map(|v| {
                        v.as_bool()
                            .ok_or_else(|| "merge must be a boolean".to_string())
                    })
                    .transpose()?
                    .unwrap_or(false);
                let department = map
                    .get("department")
                    .filter(|v| !v.is_null())
                    .map(|v| {
                        v.as_str()
                            .map(ToString::to_string)
                            .ok_or_else(|| "department must be a string".to_string())
                    })
                    .transpose()?;
                Ok(Self::Advanced {
                    source_labels,
                    merge,
                    department,
                })
            }
            other => Err(format!(
                "mapping must be a source label string or an advanced object, got {other}"
            )),
        }
    }
}

impl<'de> Deserialize<'de> for FieldMapping {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(DeError::custom)
    }
}

/// Kind of cleaning a canonical field receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Plain text: trim, collapse whitespace, placeholder mapping.
    #[default]
    Text,
    /// Scripture reference: text cleaning plus book/chapter spacing.
    Scripture,
    /// Delimited song list: split, trim, de-duplicate.
    Songs,
}

/// One canonical field declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    /// Canonical field name (stable output column).
    pub name: String,
    /// Where the value comes from in the source table.
    pub mapping: FieldMapping,
    #[serde(default)]
    pub kind: FieldKind,
    /// Whether a role field may hold several people in one cell.
    #[serde(default)]
    pub multi: bool,
}

/// Placeholder labels treated as unmapped-but-ignorable column headers.
fn default_placeholder_labels() -> Vec<String> {
    ["-", "--", "N/A", "n/a", "备注", "空", "unnamed"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Delimiters recognized inside song-list cells.
fn default_song_delimiters() -> String {
    "、,，;；/|".to_string()
}

/// Declarative schema for one dataset: canonical fields, their source
/// mappings, role expansion, and department attribution.
///
/// Built once per configuration load and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Primary date field (drives week/slot derivation and validation).
    pub date_field: FieldDef,
    /// Optional service-time field feeding slot inference.
    #[serde(default)]
    pub time_field: Option<FieldDef>,
    /// Ordered non-role fields.
    #[serde(default)]
    pub base_fields: Vec<FieldDef>,
    /// Ordered role fields; each expands to `{role}_id`, `{role}_name`,
    /// `{role}_department` in the canonical output.
    #[serde(default)]
    pub role_fields: Vec<FieldDef>,
    /// Fields whose absence is an error-severity validation issue.
    /// The primary date field is always required, listed here or not.
    #[serde(default)]
    pub required_fields: Vec<String>,
    /// Department name to role-field names.
    #[serde(default)]
    pub departments: BTreeMap<String, Vec<String>>,
    #[serde(default = "default_placeholder_labels")]
    pub placeholder_labels: Vec<String>,
    #[serde(default = "default_song_delimiters")]
    pub song_delimiters: String,
    /// When set, unmapped source columns are reported as new columns.
    #[serde(default)]
    pub auto_detect_columns: bool,
    /// Schema version stamped into domain document metadata.
    #[serde(default = "default_schema_version")]
    pub version: String,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl SchemaConfig {
    /// Parses a schema config from JSON and validates its shape.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| RotaError::Config(format!("schema config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Structural validation, run once at load time.
    ///
    /// Source-label collisions are not checked here; they degrade to
    /// warnings when the column index is built.
    pub fn validate(&self) -> Result<()> {
        for field in self.all_fields() {
            if field.name.trim().is_empty() {
                return Err(RotaError::Config("field with empty name".to_string()));
            }
            let labels = field.mapping.source_labels();
            if labels.is_empty() || labels.iter().all(|l| l.trim().is_empty()) {
                return Err(RotaError::Config(format!(
                    "field `{}` declares no usable source label",
                    field.name
                )));
            }
        }
        Ok(())
    }

    /// Every field declaration in canonical order: date, time, base, roles.
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldDef> {
        std::iter::once(&self.date_field)
            .chain(self.time_field.iter())
            .chain(self.base_fields.iter())
            .chain(self.role_fields.iter())
    }

    /// Field names whose absence is an error, always including the
    /// primary date field.
    pub fn effective_required_fields(&self) -> Vec<String> {
        let mut required = vec![self.date_field.name.clone()];
        for name in &self.required_fields {
            if !required.contains(name) {
                required.push(name.clone());
            }
        }
        required
    }

    /// Department a role field belongs to via the departments table.
    pub fn department_of_role(&self, role: &str) -> Option<&str> {
        for (department, roles) in &self.departments {
            if roles.iter().any(|r| r == role) {
                return Some(department.as_str());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_mapping_from_string() {
        let mapping: FieldMapping = serde_json::from_str("\"讲道题目\"").expect("parse");
        assert_eq!(mapping, FieldMapping::Simple("讲道题目".to_string()));
        assert!(!mapping.is_merge());
        assert_eq!(mapping.department(), None);
    }

    #[test]
    fn advanced_mapping_from_object() {
        let raw = r#"{"source_labels": ["司琴", "钢琴"], "merge": true, "department": "敬拜部"}"#;
        let mapping: FieldMapping = serde_json::from_str(raw).expect("parse");
        assert_eq!(mapping.source_labels(), vec!["司琴", "钢琴"]);
        assert!(mapping.is_merge());
        assert_eq!(mapping.department(), Some("敬拜部"));
    }

    #[test]
    fn malformed_mapping_is_scoped_error() {
        let result: std::result::Result<FieldMapping, _> = serde_json::from_str("42");
        let message = result.expect_err("must fail").to_string();
        assert!(message.contains("mapping must be"), "got: {message}");
    }

    #[test]
    fn advanced_without_labels_rejected() {
        let result: std::result::Result<FieldMapping, _> =
            serde_json::from_str(r#"{"merge": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn required_fields_always_include_date() {
        let config = SchemaConfig::from_json(
            r#"{
                "date_field": {"name": "service_date", "mapping": "日期"},
                "required_fields": ["preacher_name"]
            }"#,
        )
        .expect("config");
        assert_eq!(
            config.effective_required_fields(),
            vec!["service_date".to_string(), "preacher_name".to_string()]
        );
    }

    #[test]
    fn empty_source_label_rejected() {
        let result = SchemaConfig::from_json(
            r#"{"date_field": {"name": "service_date", "mapping": "  "}}"#,
        );
        assert!(result.is_err());
    }
}
