//! Audience-specific projections of the canonical dataset.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde_json::{Map, Value, json};
use tracing::debug;

use rota_model::{
    Dataset, DateRange, DocumentMetadata, DomainDocument, FieldDef, FieldKind, ID_JOIN, NAME_JOIN,
    NOTES_COLUMN, SLOT_COLUMN, SchemaConfig, WEEK_COLUMN,
};

/// The three projection targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainKind {
    /// Sermon-facing view: title, scripture, songs, preacher.
    SermonContent,
    /// Serving-team view: every role with its people.
    VolunteerRoster,
    /// Worship-flow view: songs, scripture, and worship roles; rows
    /// without a usable date are skipped.
    WorshipLiturgy,
}

impl DomainKind {
    pub const ALL: [Self; 3] = [
        Self::SermonContent,
        Self::VolunteerRoster,
        Self::WorshipLiturgy,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SermonContent => "sermon_content",
            Self::VolunteerRoster => "volunteer_roster",
            Self::WorshipLiturgy => "worship_liturgy",
        }
    }
}

/// Per-run projection settings.
#[derive(Debug, Clone)]
pub struct DomainOptions {
    /// Strip person ids from person objects.
    pub exclude_identity: bool,
    /// Stamped into every document envelope.
    pub generated_at: String,
}

/// Projects canonical rows into nested domain records.
///
/// Field roles are derived from the schema: the scripture and songs
/// fields by kind, the title as the first plain base field, and the
/// preacher as the first declared role.
pub struct DomainProjector<'a> {
    config: &'a SchemaConfig,
}

impl<'a> DomainProjector<'a> {
    pub fn new(config: &'a SchemaConfig) -> Self {
        Self { config }
    }

    /// Builds the full aggregate document for one domain.
    pub fn project(
        &self,
        kind: DomainKind,
        dataset: &Dataset,
        options: &DomainOptions,
    ) -> DomainDocument {
        let mut records = Vec::new();
        let mut dates: Vec<String> = Vec::new();
        for row in 0..dataset.row_count() {
            if let Some(record) = self.project_row(kind, dataset, row, options) {
                // The range covers parseable dates only; annotated
                // leftovers like "待定" carry no calendar position.
                let date = dataset.value(row, &self.config.date_field.name).trim();
                if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok() {
                    dates.push(date.to_string());
                }
                records.push(record);
            }
        }
        debug!(domain = kind.name(), records = records.len(), "projected domain");
        self.wrap(kind, records, &dates, options)
    }

    /// Splits the projection by calendar year of the primary date.
    /// Rows without a parseable date appear only in the aggregate
    /// built by [`Self::project`].
    pub fn project_by_year(
        &self,
        kind: DomainKind,
        dataset: &Dataset,
        options: &DomainOptions,
    ) -> BTreeMap<i32, DomainDocument> {
        let mut buckets: BTreeMap<i32, (Vec<Value>, Vec<String>)> = BTreeMap::new();
        for row in 0..dataset.row_count() {
            let date = dataset.value(row, &self.config.date_field.name).trim();
            let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
                continue;
            };
            if let Some(record) = self.project_row(kind, dataset, row, options) {
                let bucket = buckets.entry(parsed.year()).or_default();
                bucket.0.push(record);
                bucket.1.push(date.to_string());
            }
        }
        buckets
            .into_iter()
            .map(|(year, (records, dates))| (year, self.wrap(kind, records, &dates, options)))
            .collect()
    }

    fn wrap(
        &self,
        kind: DomainKind,
        records: Vec<Value>,
        dates: &[String],
        options: &DomainOptions,
    ) -> DomainDocument {
        let date_range = match (dates.iter().min(), dates.iter().max()) {
            (Some(start), Some(end)) => Some(DateRange {
                start: start.clone(),
                end: end.clone(),
            }),
            _ => None,
        };
        DomainDocument {
            metadata: DocumentMetadata {
                domain: kind.name().to_string(),
                version: self.config.version.clone(),
                generated_at: options.generated_at.clone(),
                record_count: records.len(),
                date_range,
            },
            records,
        }
    }

    fn project_row(
        &self,
        kind: DomainKind,
        dataset: &Dataset,
        row: usize,
        options: &DomainOptions,
    ) -> Option<Value> {
        let date = dataset.value(row, &self.config.date_field.name).trim();
        match kind {
            DomainKind::SermonContent => Some(self.content_row(dataset, row, options)),
            DomainKind::VolunteerRoster => Some(self.roster_row(dataset, row, options)),
            DomainKind::WorshipLiturgy => {
                if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                    return None;
                }
                Some(self.liturgy_row(dataset, row, options))
            }
        }
    }

    fn content_row(&self, dataset: &Dataset, row: usize, options: &DomainOptions) -> Value {
        let mut record = self.common_fields(dataset, row);
        if let Some(title) = self.first_base_field(FieldKind::Text) {
            record.insert(
                "title".to_string(),
                json!(dataset.value(row, &title.name)),
            );
        }
        if let Some(scripture) = self.first_base_field(FieldKind::Scripture) {
            record.insert(
                "scripture".to_string(),
                json!(dataset.value(row, &scripture.name)),
            );
        }
        record.insert("songs".to_string(), self.songs_value(dataset, row));
        let preacher = self
            .preacher_role()
            .map(|role| self.person_objects(dataset, row, role, options))
            .and_then(|mut people| {
                if people.is_empty() {
                    None
                } else {
                    Some(people.remove(0))
                }
            });
        record.insert("preacher".to_string(), preacher.unwrap_or(Value::Null));
        let notes = dataset.value(row, NOTES_COLUMN);
        if !notes.is_empty() {
            record.insert("notes".to_string(), json!(notes));
        }
        Value::Object(record)
    }

    fn roster_row(&self, dataset: &Dataset, row: usize, options: &DomainOptions) -> Value {
        let mut record = self.common_fields(dataset, row);
        record.remove(WEEK_COLUMN_KEY);
        record.insert(
            "roles".to_string(),
            self.roles_value(dataset, row, options, |_| true),
        );
        Value::Object(record)
    }

    fn liturgy_row(&self, dataset: &Dataset, row: usize, options: &DomainOptions) -> Value {
        let mut record = self.common_fields(dataset, row);
        if let Some(scripture) = self.first_base_field(FieldKind::Scripture) {
            record.insert(
                "scripture".to_string(),
                json!(dataset.value(row, &scripture.name)),
            );
        }
        record.insert("songs".to_string(), self.songs_value(dataset, row));
        let preacher = self.preacher_role().map(|r| r.name.clone());
        record.insert(
            "roles".to_string(),
            self.roles_value(dataset, row, options, |role| {
                Some(&role.name) != preacher.as_ref()
            }),
        );
        Value::Object(record)
    }

    fn common_fields(&self, dataset: &Dataset, row: usize) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert(
            "date".to_string(),
            json!(dataset.value(row, &self.config.date_field.name)),
        );
        record.insert(
            WEEK_COLUMN_KEY.to_string(),
            json!(dataset.value(row, WEEK_COLUMN)),
        );
        record.insert("slot".to_string(), json!(dataset.value(row, SLOT_COLUMN)));
        record
    }

    fn songs_value(&self, dataset: &Dataset, row: usize) -> Value {
        let songs: Vec<&str> = self
            .first_base_field(FieldKind::Songs)
            .map(|field| {
                dataset
                    .value(row, &field.name)
                    .split(NAME_JOIN)
                    .filter(|s| !s.trim().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        json!(songs)
    }

    fn roles_value(
        &self,
        dataset: &Dataset,
        row: usize,
        options: &DomainOptions,
        include: impl Fn(&FieldDef) -> bool,
    ) -> Value {
        let mut roles = Map::new();
        for role in &self.config.role_fields {
            if !include(role) {
                continue;
            }
            let people = self.person_objects(dataset, row, role, options);
            roles.insert(role.name.clone(), json!(people));
        }
        Value::Object(roles)
    }

    /// Person objects for one role cell. Multi-person roles keep cell
    /// order; the first person is tagged `lead`, the rest `member`.
    fn person_objects(
        &self,
        dataset: &Dataset,
        row: usize,
        role: &FieldDef,
        options: &DomainOptions,
    ) -> Vec<Value> {
        let names: Vec<&str> = dataset
            .value(row, &format!("{}_name", role.name))
            .split(NAME_JOIN)
            .filter(|s| !s.trim().is_empty())
            .collect();
        let ids: Vec<&str> = dataset
            .value(row, &format!("{}_id", role.name))
            .split(ID_JOIN)
            .filter(|s| !s.trim().is_empty())
            .collect();
        let department = dataset.value(row, &format!("{}_department", role.name));

        names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let mut person = Map::new();
                person.insert("name".to_string(), json!(name));
                if !options.exclude_identity
                    && let Some(id) = ids.get(idx)
                {
                    person.insert("id".to_string(), json!(id));
                }
                if !department.is_empty() {
                    person.insert("department".to_string(), json!(department));
                }
                if role.multi {
                    let tag = if idx == 0 { "lead" } else { "member" };
                    person.insert("role".to_string(), json!(tag));
                }
                Value::Object(person)
            })
            .collect()
    }

    fn first_base_field(&self, kind: FieldKind) -> Option<&FieldDef> {
        self.config.base_fields.iter().find(|f| f.kind == kind)
    }

    fn preacher_role(&self) -> Option<&FieldDef> {
        self.config.role_fields.first()
    }
}

const WEEK_COLUMN_KEY: &str = "week";

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SchemaConfig {
        SchemaConfig::from_json(
            r#"{
                "date_field": {"name": "service_date", "mapping": "日期"},
                "base_fields": [
                    {"name": "sermon_title", "mapping": "题目"},
                    {"name": "scripture", "mapping": "经文", "kind": "scripture"},
                    {"name": "songs", "mapping": "诗歌", "kind": "songs"}
                ],
                "role_fields": [
                    {"name": "preacher", "mapping": "讲员"},
                    {"name": "worship_lead", "mapping": "领会", "multi": true}
                ],
                "departments": {"敬拜部": ["worship_lead"]},
                "version": "2.1"
            }"#,
        )
        .expect("config")
    }

    fn dataset() -> Dataset {
        Dataset {
            columns: [
                "service_date",
                "service_week",
                "service_slot",
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
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            rows: vec![
                vec![
                    "2025-10-05".to_string(),
                    "40".to_string(),
                    "morning".to_string(),
                    "恩典之路".to_string(),
                    "约翰福音 3:16".to_string(),
                    "奇异恩典、有福的确据".to_string(),
                    "preacher_zhang".to_string(),
                    "张牧师".to_string(),
                    String::new(),
                    "person_王弟兄|person_李姊妹".to_string(),
                    "王弟兄、李姊妹".to_string(),
                    "敬拜部".to_string(),
                    String::new(),
                ],
                vec![
                    "待定".to_string(),
                    String::new(),
                    "morning".to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    "敬拜部".to_string(),
                    "unparseable date: 待定".to_string(),
                ],
                vec![
                    "2024-12-29".to_string(),
                    "52".to_string(),
                    "evening".to_string(),
                    "岁末感恩".to_string(),
                    String::new(),
                    "这世界非我家".to_string(),
                    "preacher_zhang".to_string(),
                    "张牧师".to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                    "敬拜部".to_string(),
                    String::new(),
                ],
            ],
        }
    }

    fn options() -> DomainOptions {
        DomainOptions {
            exclude_identity: false,
            generated_at: "2025-10-06T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn content_projection_shapes_records() {
        let config = config();
        let projector = DomainProjector::new(&config);
        let document = projector.project(DomainKind::SermonContent, &dataset(), &options());
        assert_eq!(document.metadata.domain, "sermon_content");
        assert_eq!(document.metadata.version, "2.1");
        assert_eq!(document.metadata.record_count, 3);
        let range = document.metadata.date_range.as_ref().expect("range");
        assert_eq!(range.start, "2024-12-29");
        assert_eq!(range.end, "2025-10-05");

        let first = &document.records[0];
        assert_eq!(first["title"], "恩典之路");
        assert_eq!(first["songs"], json!(["奇异恩典", "有福的确据"]));
        assert_eq!(first["preacher"]["id"], "preacher_zhang");
        assert_eq!(first["preacher"]["name"], "张牧师");
        assert_eq!(document.records[1]["preacher"], Value::Null);
        assert_eq!(document.records[1]["notes"], "unparseable date: 待定");
    }

    #[test]
    fn date_range_ignores_unparseable_dates() {
        let config = config();
        let projector = DomainProjector::new(&config);
        // The roster keeps every row, so the undated "待定" row is
        // emitted but must not stretch the envelope range.
        let document = projector.project(DomainKind::VolunteerRoster, &dataset(), &options());
        assert_eq!(document.metadata.record_count, 3);
        let range = document.metadata.date_range.as_ref().expect("range");
        assert_eq!(range.start, "2024-12-29");
        assert_eq!(range.end, "2025-10-05");

        let mut undated = dataset();
        undated.rows.retain(|row| row[0] == "待定");
        let document = projector.project(DomainKind::VolunteerRoster, &undated, &options());
        assert_eq!(document.metadata.record_count, 1);
        assert!(document.metadata.date_range.is_none());
    }

    #[test]
    fn roster_tags_lead_and_member() {
        let config = config();
        let projector = DomainProjector::new(&config);
        let document = projector.project(DomainKind::VolunteerRoster, &dataset(), &options());
        let roles = &document.records[0]["roles"];
        let worship = roles["worship_lead"].as_array().expect("array");
        assert_eq!(worship.len(), 2);
        assert_eq!(worship[0]["role"], "lead");
        assert_eq!(worship[0]["department"], "敬拜部");
        assert_eq!(worship[1]["role"], "member");
        let preacher = roles["preacher"].as_array().expect("array");
        assert_eq!(preacher[0]["name"], "张牧师");
        assert!(preacher[0].get("role").is_none());
    }

    #[test]
    fn exclude_identity_strips_ids() {
        let config = config();
        let projector = DomainProjector::new(&config);
        let document = projector.project(
            DomainKind::VolunteerRoster,
            &dataset(),
            &DomainOptions {
                exclude_identity: true,
                generated_at: "2025-10-06T00:00:00Z".to_string(),
            },
        );
        let worship = document.records[0]["roles"]["worship_lead"]
            .as_array()
            .expect("array");
        assert!(worship[0].get("id").is_none());
        assert_eq!(worship[0]["name"], "王弟兄");
    }

    #[test]
    fn liturgy_skips_undated_rows_and_preacher() {
        let config = config();
        let projector = DomainProjector::new(&config);
        let document = projector.project(DomainKind::WorshipLiturgy, &dataset(), &options());
        assert_eq!(document.metadata.record_count, 2);
        let roles = &document.records[0]["roles"];
        assert!(roles.get("preacher").is_none());
        assert!(roles.get("worship_lead").is_some());
    }

    #[test]
    fn year_buckets_split_and_drop_undated() {
        let config = config();
        let projector = DomainProjector::new(&config);
        let by_year = projector.project_by_year(DomainKind::SermonContent, &dataset(), &options());
        let years: Vec<i32> = by_year.keys().copied().collect();
        assert_eq!(years, vec![2024, 2025]);
        assert_eq!(by_year[&2024].metadata.record_count, 1);
        assert_eq!(by_year[&2025].metadata.record_count, 1);
        let range = by_year[&2025].metadata.date_range.as_ref().expect("range");
        assert_eq!(range.start, "2025-10-05");
        assert_eq!(range.end, "2025-10-05");
    }
}
