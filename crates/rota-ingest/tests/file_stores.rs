use std::fs;

use tempfile::tempdir;

use rota_change::StateStore;
use rota_identity::{AliasRow, AliasStore};
use rota_ingest::{
    CanonicalSink, CsvAliasStore, CsvCanonicalSink, CsvSource, DomainSink, JsonDomainSink,
    JsonStateStore, TabularSource,
};
use rota_model::{ChangeState, Dataset, DocumentMetadata, DomainDocument};

#[test]
fn csv_source_reads_banner_department_and_duplicates() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("schedule.csv");
    fs::write(
        &path,
        "\u{feff}2025年主日服侍表,,,\n\
         日期,讲员,日期,司琴\n\
         部门,讲道部,,敬拜部\n\
         2025-10-05,张牧师,,王姊妹\n\
         ,,2025-10-12,李姊妹\n",
    )
    .expect("write csv");

    let table = CsvSource::new(&path).read().expect("read");
    assert_eq!(table.headers, vec!["日期", "讲员", "日期", "司琴"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.departments.get("讲员").map(String::as_str), Some("讲道部"));
    assert_eq!(table.departments.get("司琴").map(String::as_str), Some("敬拜部"));

    let records = table.to_raw_records();
    assert_eq!(records[0].value("日期"), Some("2025-10-05"));
    // Duplicate date column: the non-empty cell wins.
    assert_eq!(records[1].value("日期"), Some("2025-10-12"));
}

#[test]
fn csv_source_empty_file_is_empty_table() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("empty.csv");
    fs::write(&path, "").expect("write csv");
    let table = CsvSource::new(&path).read().expect("read");
    assert!(table.is_empty());
    assert!(table.headers.is_empty());
}

#[test]
fn alias_store_roundtrip_and_missing_file() {
    let dir = tempdir().expect("tempdir");
    let mut store = CsvAliasStore::new(dir.path().join("aliases.csv"));
    assert!(store.read_all().expect("read missing").is_empty());

    let rows = vec![
        AliasRow {
            alias: "张牧师".to_string(),
            person_id: "preacher_zhang".to_string(),
            display_name: "张牧师".to_string(),
            count: 3,
        },
        AliasRow {
            alias: "老张".to_string(),
            person_id: "preacher_zhang".to_string(),
            display_name: "张牧师".to_string(),
            count: 1,
        },
    ];
    store.write_all(&rows).expect("write");
    assert_eq!(store.read_all().expect("read back"), rows);
}

#[test]
fn state_store_defaults_on_missing_and_corrupt() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("state.json");
    let mut store = JsonStateStore::new(&path);
    assert!(store.load().is_first_run());

    fs::write(&path, "{not json").expect("write corrupt");
    assert!(store.load().is_first_run());

    let state = ChangeState {
        last_run: Some("2025-10-05T00:00:00Z".to_string()),
        last_hash: Some("abc".to_string()),
        last_row_count: 7,
        last_update_time: Some("2025-10-05T00:00:00Z".to_string()),
        run_count: 2,
    };
    store.save(&state).expect("save");
    let loaded = store.load();
    assert_eq!(loaded.run_count, 2);
    assert_eq!(loaded.last_hash.as_deref(), Some("abc"));
}

#[test]
fn canonical_sink_writes_readable_csv() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("canonical.csv");
    let dataset = Dataset {
        columns: vec!["service_date".to_string(), "preacher_name".to_string()],
        rows: vec![vec!["2025-10-05".to_string(), "张牧师".to_string()]],
    };
    CsvCanonicalSink::new(&path).write(&dataset).expect("write");

    let written = fs::read_to_string(&path).expect("read back");
    assert!(written.starts_with("service_date,preacher_name"));
    assert!(written.contains("2025-10-05,张牧师"));
}

#[test]
fn domain_sink_names_year_and_latest_files() {
    let dir = tempdir().expect("tempdir");
    let sink = JsonDomainSink::new(dir.path().join("domains"));
    let document = DomainDocument {
        metadata: DocumentMetadata {
            domain: "sermon_content".to_string(),
            version: "1.0".to_string(),
            generated_at: "2025-10-05T00:00:00Z".to_string(),
            record_count: 0,
            date_range: None,
        },
        records: Vec::new(),
    };
    sink.write_year(&document, 2025).expect("write year");
    sink.write_latest(&document).expect("write latest");

    let year_path = dir.path().join("domains/sermon_content_2025.json");
    let latest_path = dir.path().join("domains/sermon_content_latest.json");
    assert!(year_path.exists());
    assert!(latest_path.exists());
    let parsed: DomainDocument =
        serde_json::from_str(&fs::read_to_string(latest_path).expect("read")).expect("parse");
    assert_eq!(parsed.metadata.domain, "sermon_content");
}
