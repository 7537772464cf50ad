//! Canonical reshaping: raw rows into the fixed-order dataset.

use tracing::debug;

use rota_clean::{
    Slot, clean_date, clean_name, clean_scripture, clean_text, get_service_week,
    infer_service_slot, merge_columns, split_songs,
};
use rota_identity::AliasMapper;
use rota_map::SchemaManager;
use rota_model::{
    Dataset, FieldDef, FieldKind, ID_JOIN, NAME_JOIN, NOTES_COLUMN, RawRecord, RowAnnotation,
    SLOT_COLUMN, SOURCE_ROW_COLUMN, UPDATED_AT_COLUMN, WEEK_COLUMN,
};

/// Result of one canonicalization pass. Output row count always equals
/// input row count; soft cleaning failures surface as annotations.
#[derive(Debug, Clone)]
pub struct CanonicalOutput {
    pub dataset: Dataset,
    pub annotations: Vec<RowAnnotation>,
}

/// Reshapes raw records into the canonical column order.
///
/// Holds one schema manager and one alias snapshot for the whole run;
/// neither is mutated mid-pass, so reprojecting an already-canonical
/// dataset with the same run timestamp yields identical columns and
/// values.
pub struct Canonicalizer<'a> {
    schema: &'a SchemaManager,
    aliases: &'a AliasMapper,
    run_timestamp: String,
}

impl<'a> Canonicalizer<'a> {
    pub fn new(schema: &'a SchemaManager, aliases: &'a AliasMapper, run_timestamp: &str) -> Self {
        Self {
            schema,
            aliases,
            run_timestamp: run_timestamp.to_string(),
        }
    }

    /// The fixed output column order: date-derived fields first, then
    /// base fields in declared order, then per-role id/name/department
    /// triples, then runtime fields.
    pub fn layout(&self) -> Vec<String> {
        let config = self.schema.config();
        let mut columns = vec![
            config.date_field.name.clone(),
            WEEK_COLUMN.to_string(),
            SLOT_COLUMN.to_string(),
        ];
        if let Some(time) = &config.time_field {
            columns.push(time.name.clone());
        }
        for field in &config.base_fields {
            columns.push(field.name.clone());
        }
        for role in &config.role_fields {
            columns.push(format!("{}_id", role.name));
            columns.push(format!("{}_name", role.name));
            columns.push(format!("{}_department", role.name));
        }
        columns.push(NOTES_COLUMN.to_string());
        columns.push(SOURCE_ROW_COLUMN.to_string());
        columns.push(UPDATED_AT_COLUMN.to_string());
        columns
    }

    /// Canonicalizes every record. Per-row soft failures (for now, an
    /// unparseable primary date) degrade to a lenient text clean plus a
    /// row annotation; they never drop the row.
    pub fn canonicalize(&self, records: &[RawRecord]) -> CanonicalOutput {
        let mut dataset = Dataset::new(self.layout());
        let mut annotations = Vec::new();
        for (idx, record) in records.iter().enumerate() {
            let row_number = idx + 1;
            let (row, mut row_annotations) = self.clean_row(record, row_number);
            dataset.rows.push(row);
            annotations.append(&mut row_annotations);
        }
        debug!(
            rows = dataset.row_count(),
            annotations = annotations.len(),
            "canonicalized dataset"
        );
        CanonicalOutput {
            dataset,
            annotations,
        }
    }

    fn clean_row(&self, record: &RawRecord, row_number: usize) -> (Vec<String>, Vec<RowAnnotation>) {
        let config = self.schema.config();
        let mut annotations: Vec<RowAnnotation> = Vec::new();
        let mut row: Vec<String> = Vec::new();

        // Primary date plus derived week.
        let date_raw = self.field_value(record, &config.date_field);
        let date_cell = match clean_date(&date_raw) {
            Some(date) => date,
            None => {
                let lenient = clean_text(&date_raw);
                if !lenient.is_empty() {
                    annotations.push(RowAnnotation {
                        row_number,
                        field: Some(config.date_field.name.clone()),
                        message: format!("unparseable date: {lenient}"),
                    });
                }
                lenient
            }
        };
        let week_cell = get_service_week(&date_cell)
            .map(|w| w.to_string())
            .unwrap_or_default();

        // Slot from the time field, defaulting to morning.
        let time_cell = config
            .time_field
            .as_ref()
            .map(|field| clean_text(&self.field_value(record, field)));
        let slot = match &time_cell {
            Some(time) if !time.is_empty() => infer_service_slot(Some(time.as_str())),
            _ => Slot::default(),
        };

        row.push(date_cell);
        row.push(week_cell);
        row.push(slot.as_str().to_string());
        if let Some(time) = time_cell {
            row.push(time);
        }

        for field in &config.base_fields {
            let raw = self.field_value(record, field);
            let cell = match field.kind {
                FieldKind::Text => clean_text(&raw),
                FieldKind::Scripture => clean_scripture(&raw),
                FieldKind::Songs => split_songs(&raw, &config.song_delimiters).join(NAME_JOIN),
            };
            row.push(cell);
        }

        for role in &config.role_fields {
            let (ids, names) = self.resolve_role(record, role);
            let department = self
                .schema
                .department_for(&role.name)
                .unwrap_or_default()
                .to_string();
            row.push(ids);
            row.push(names);
            row.push(department);
        }

        let notes = annotations
            .iter()
            .map(|a| a.message.clone())
            .collect::<Vec<_>>()
            .join("; ");
        row.push(notes);
        row.push(row_number.to_string());
        row.push(self.run_timestamp.clone());

        (row, annotations)
    }

    /// Raw value for a field: merged across labels when the mapping asks
    /// for it, else the first non-empty candidate. Canonical column
    /// names are honored as a fallback so reshaping is idempotent.
    fn field_value(&self, record: &RawRecord, field: &FieldDef) -> String {
        if field.mapping.is_merge() {
            let labels = field.mapping.source_labels();
            let merged = merge_columns(record, &labels);
            if !merged.is_empty() {
                return merged.join(NAME_JOIN);
            }
        } else {
            for label in field.mapping.source_labels() {
                if let Some(value) = record.value(label)
                    && !clean_text(value).is_empty()
                {
                    return value.to_string();
                }
            }
        }
        record.value(&field.name).unwrap_or_default().to_string()
    }

    fn resolve_role(&self, record: &RawRecord, role: &FieldDef) -> (String, String) {
        let raw = self.role_raw_value(record, role);
        let names: Vec<String> = if role.multi {
            raw.split(|c| self.schema.config().song_delimiters.contains(c))
                .map(clean_name)
                .filter(|n| !n.is_empty())
                .collect()
        } else {
            let name = clean_name(&raw);
            if name.is_empty() { Vec::new() } else { vec![name] }
        };
        let (ids, displays) = self.aliases.resolve_list(&names);
        (ids.join(ID_JOIN), displays.join(NAME_JOIN))
    }

    /// Role values fall back to the canonical `{role}_name` column so a
    /// canonical dataset can be re-cleaned in place.
    fn role_raw_value(&self, record: &RawRecord, role: &FieldDef) -> String {
        if role.mapping.is_merge() {
            let labels = role.mapping.source_labels();
            let merged = merge_columns(record, &labels);
            if !merged.is_empty() {
                return merged.join(NAME_JOIN);
            }
        } else {
            for label in role.mapping.source_labels() {
                if let Some(value) = record.value(label)
                    && !clean_text(value).is_empty()
                {
                    return value.to_string();
                }
            }
        }
        let canonical = format!("{}_name", role.name);
        if let Some(value) = record.value(&canonical) {
            return value.to_string();
        }
        record.value(&role.name).unwrap_or_default().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rota_model::SchemaConfig;

    fn schema() -> SchemaManager {
        let config = SchemaConfig::from_json(
            r#"{
                "date_field": {"name": "service_date", "mapping": "日期"},
                "time_field": {"name": "service_time", "mapping": "时间"},
                "base_fields": [
                    {"name": "sermon_title", "mapping": {"source_labels": ["讲道题目", "题目"]}},
                    {"name": "scripture", "mapping": "经文", "kind": "scripture"},
                    {"name": "songs", "mapping": "诗歌", "kind": "songs"}
                ],
                "role_fields": [
                    {"name": "preacher", "mapping": "讲员"},
                    {"name": "worship_lead", "mapping": {"source_labels": ["领会", "主领"], "merge": true}, "multi": true}
                ],
                "departments": {"敬拜部": ["worship_lead"]}
            }"#,
        )
        .expect("schema config");
        SchemaManager::new(config)
    }

    fn aliases() -> AliasMapper {
        let mut mapper = AliasMapper::new();
        mapper.insert("张牧师", "preacher_zhang", "张牧师");
        mapper
    }

    fn record(entries: &[(&str, &str)]) -> RawRecord {
        RawRecord::new(
            entries
                .iter()
                .map(|(l, v)| ((*l).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn layout_follows_field_order_contract() {
        let schema = schema();
        let mapper = aliases();
        let canonicalizer = Canonicalizer::new(&schema, &mapper, "2025-10-05T00:00:00Z");
        assert_eq!(
            canonicalizer.layout(),
            vec![
                "service_date",
                "service_week",
                "service_slot",
                "service_time",
                "sermon_title",
                "scripture",
                "songs",
                "preacher_id",
                "preacher_name",
                "preacher_department",
                "worship_lead_id",
                "worship_lead_name",
                "worship_lead_department",
                "notes",
                "source_row",
                "updated_at",
            ]
        );
    }

    #[test]
    fn cleans_and_resolves_one_row() {
        let schema = schema();
        let mapper = aliases();
        let canonicalizer = Canonicalizer::new(&schema, &mapper, "2025-10-05T00:00:00Z");
        let output = canonicalizer.canonicalize(&[record(&[
            ("日期", "2025年10月5日"),
            ("时间", "上午 9:30"),
            ("讲道题目", "  恩典  之路 "),
            ("经文", "约翰福音3:16"),
            ("诗歌", "奇异恩典、奇异恩典、有福的确据"),
            ("讲员", "张牧师"),
            ("领会", "王弟兄、李姊妹"),
        ])]);
        let dataset = &output.dataset;
        assert!(output.annotations.is_empty());
        assert_eq!(dataset.value(0, "service_date"), "2025-10-05");
        assert_eq!(dataset.value(0, "service_week"), "40");
        assert_eq!(dataset.value(0, "service_slot"), "morning");
        assert_eq!(dataset.value(0, "sermon_title"), "恩典 之路");
        assert_eq!(dataset.value(0, "scripture"), "约翰福音 3:16");
        assert_eq!(dataset.value(0, "songs"), "奇异恩典、有福的确据");
        assert_eq!(dataset.value(0, "preacher_id"), "preacher_zhang");
        assert_eq!(dataset.value(0, "preacher_name"), "张牧师");
        assert_eq!(
            dataset.value(0, "worship_lead_id"),
            "person_王弟兄|person_李姊妹"
        );
        assert_eq!(dataset.value(0, "worship_lead_name"), "王弟兄、李姊妹");
        assert_eq!(dataset.value(0, "worship_lead_department"), "敬拜部");
        assert_eq!(dataset.value(0, "source_row"), "1");
    }

    #[test]
    fn duplicate_columns_merge_before_cleaning() {
        let schema = schema();
        let mapper = aliases();
        let canonicalizer = Canonicalizer::new(&schema, &mapper, "2025-10-05T00:00:00Z");
        let output = canonicalizer.canonicalize(&[record(&[
            ("日期", ""),
            ("讲员", "张牧师"),
            ("日期", "2025-10-05"),
        ])]);
        assert_eq!(output.dataset.value(0, "service_date"), "2025-10-05");
        assert!(output.annotations.is_empty());
    }

    #[test]
    fn unparseable_date_is_annotated_not_dropped() {
        let schema = schema();
        let mapper = aliases();
        let canonicalizer = Canonicalizer::new(&schema, &mapper, "2025-10-05T00:00:00Z");
        let output = canonicalizer.canonicalize(&[record(&[
            ("日期", "主日待定"),
            ("讲员", "张牧师"),
        ])]);
        assert_eq!(output.dataset.row_count(), 1);
        assert_eq!(output.annotations.len(), 1);
        assert_eq!(output.dataset.value(0, "service_date"), "主日待定");
        assert!(output.dataset.value(0, "notes").contains("unparseable date"));
        assert_eq!(output.dataset.value(0, "service_week"), "");
    }

    #[test]
    fn reprojection_is_idempotent() {
        let schema = schema();
        let mapper = aliases();
        let canonicalizer = Canonicalizer::new(&schema, &mapper, "2025-10-05T00:00:00Z");
        let first = canonicalizer.canonicalize(&[
            record(&[
                ("日期", "2025/10/5"),
                ("时间", "晚堂"),
                ("讲员", "张牧师 2025-10-05"),
                ("诗歌", "奇异恩典"),
                ("领会", "王弟兄"),
            ]),
            record(&[("日期", "2025-10-12"), ("讲员", "李四")]),
        ]);
        let second = canonicalizer.canonicalize(&first.dataset.to_raw_records());
        assert_eq!(second.dataset.columns, first.dataset.columns);
        assert_eq!(second.dataset.rows, first.dataset.rows);
    }
}
