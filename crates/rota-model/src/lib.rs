pub mod document;
pub mod error;
pub mod mapping;
pub mod record;
pub mod report;
pub mod state;

pub use document::{DateRange, DocumentMetadata, DomainDocument};
pub use error::{Result, RotaError};
pub use mapping::{FieldDef, FieldKind, FieldMapping, SchemaConfig};
pub use record::{
    Dataset, ID_JOIN, NAME_JOIN, NOTES_COLUMN, RawRecord, RowAnnotation, SLOT_COLUMN,
    SOURCE_ROW_COLUMN, UPDATED_AT_COLUMN, WEEK_COLUMN,
};
pub use report::{Severity, ValidationIssue, ValidationReport};
pub use state::ChangeState;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_round_trips() {
        let state = ChangeState {
            last_run: Some("2025-10-05T09:00:00Z".to_string()),
            last_hash: Some("abc123".to_string()),
            last_row_count: 42,
            last_update_time: Some("2025-10-05T09:00:00Z".to_string()),
            run_count: 7,
        };
        let json = serde_json::to_string(&state).expect("serialize state");
        let round: ChangeState = serde_json::from_str(&json).expect("deserialize state");
        assert_eq!(round, state);
    }

    #[test]
    fn document_serializes_without_empty_range() {
        let document = DomainDocument {
            metadata: DocumentMetadata {
                domain: "sermon_content".to_string(),
                version: "1.0".to_string(),
                generated_at: "2025-10-05T09:00:00Z".to_string(),
                record_count: 0,
                date_range: None,
            },
            records: Vec::new(),
        };
        let json = serde_json::to_string(&document).expect("serialize document");
        assert!(!json.contains("date_range"));
    }
}
