//! Schema manager: column resolution and department attribution.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use rota_clean::clean_text;
use rota_model::SchemaConfig;

use crate::suggest::suggest_field_name;

/// A source label claimed by two canonical fields. The first
/// registration wins; the collision is reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnCollision {
    pub label: String,
    pub kept_field: String,
    pub dropped_field: String,
}

/// Result of partitioning a header row.
#[derive(Debug, Clone, Default)]
pub struct MappedColumns {
    /// `(source_label, canonical_field)` pairs in header order.
    pub mapped: Vec<(String, String)>,
    /// Labels with no canonical owner, blanks and placeholders excluded.
    pub unmapped: Vec<String>,
}

/// Immutable source-label index built once per configuration load.
pub struct SchemaManager {
    config: SchemaConfig,
    label_index: BTreeMap<String, String>,
    collisions: Vec<ColumnCollision>,
}

impl SchemaManager {
    /// Builds the label index from every mapping variant's declared
    /// source labels. Blank labels are skipped; a label claimed twice
    /// stays with its first owner and the collision is recorded.
    pub fn new(config: SchemaConfig) -> Self {
        let mut label_index = BTreeMap::new();
        let mut collisions = Vec::new();
        for field in config.all_fields() {
            for label in field.mapping.source_labels() {
                let label = clean_text(label);
                if label.is_empty() {
                    warn!(field = %field.name, "skipping blank source label");
                    continue;
                }
                match label_index.get(&label) {
                    Some(owner) if owner != &field.name => {
                        warn!(
                            label = %label,
                            kept = %owner,
                            dropped = %field.name,
                            "source label already claimed"
                        );
                        collisions.push(ColumnCollision {
                            label: label.clone(),
                            kept_field: owner.clone(),
                            dropped_field: field.name.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        label_index.insert(label, field.name.clone());
                    }
                }
            }
        }
        Self {
            config,
            label_index,
            collisions,
        }
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// Collisions found while building the index.
    pub fn collisions(&self) -> &[ColumnCollision] {
        &self.collisions
    }

    /// Canonical field owning a source label, if any.
    pub fn resolve_field(&self, label: &str) -> Option<&str> {
        self.label_index.get(&clean_text(label)).map(String::as_str)
    }

    /// Partitions a header row into mapped and unmapped labels.
    ///
    /// Blank and placeholder-style labels never count as unmapped; they
    /// are simply dropped.
    pub fn map_columns(&self, labels: &[String]) -> MappedColumns {
        let mut result = MappedColumns::default();
        for label in labels {
            let cleaned = clean_text(label);
            if cleaned.is_empty() || self.is_placeholder_label(&cleaned) {
                continue;
            }
            match self.resolve_field(&cleaned) {
                Some(field) => result.mapped.push((cleaned, field.to_string())),
                None => result.unmapped.push(cleaned),
            }
        }
        result
    }

    /// Unmapped labels, reported only when auto-detection is enabled.
    pub fn detect_new_columns(&self, labels: &[String]) -> Vec<String> {
        if !self.config.auto_detect_columns {
            return Vec::new();
        }
        self.map_columns(labels).unmapped
    }

    /// Department for a canonical role field. An explicit per-field
    /// department takes precedence over the departments table.
    pub fn department_for(&self, field: &str) -> Option<&str> {
        if let Some(def) = self.config.all_fields().find(|f| f.name == field)
            && let Some(department) = def.mapping.department()
        {
            return Some(department);
        }
        self.config.department_of_role(field)
    }

    /// Human-facing canonical-name suggestion for an unmapped label.
    /// Never authoritative for cleaning.
    pub fn suggest_field_name(&self, label: &str) -> String {
        suggest_field_name(label)
    }

    fn is_placeholder_label(&self, label: &str) -> bool {
        let lowered = label.to_lowercase();
        self.config
            .placeholder_labels
            .iter()
            .any(|p| p.to_lowercase() == lowered)
            || lowered.starts_with("unnamed")
    }
}
