//! Schedule processing pipeline with explicit stages.
//!
//! Stages in order:
//! 1. **Load**: read the schema configuration and the source CSV
//! 2. **Map**: build the column index, collect unmapped columns
//! 3. **Identity**: load the alias table snapshot
//! 4. **Canonicalize**: clean and reshape every row
//! 5. **Change**: fingerprint against the last known-good baseline
//! 6. **Validate**: severity-classified defects
//! 7. **Output**: canonical CSV, domain documents, alias sync, state
//!
//! Each stage takes the output of the previous stage and returns typed
//! results. The change baseline advances only when validation reports
//! no error-severity issues.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use tracing::{info, info_span, warn};

use rota_change::{ChangeDetail, ChangeDetector};
use rota_identity::{AliasMapper, AliasStore, SyncOutcome};
use rota_ingest::{
    CanonicalSink, CsvAliasStore, CsvCanonicalSink, CsvSource, DomainSink, JsonDomainSink,
    JsonStateStore, SourceTable, TabularSource,
};
use rota_map::SchemaManager;
use rota_model::{Dataset, SchemaConfig, ValidationReport};
use rota_transform::{Canonicalizer, DomainKind, DomainOptions, DomainProjector};
use rota_validate::Validator;

/// Canonical output filename inside the output directory.
const CANONICAL_FILE: &str = "canonical.csv";

/// Subdirectory holding the per-domain JSON documents.
const DOMAIN_DIR: &str = "domains";

/// Everything one pipeline invocation needs.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub input: PathBuf,
    pub schema: PathBuf,
    pub output_dir: PathBuf,
    pub aliases: PathBuf,
    pub state_file: PathBuf,
    pub exclude_identity: bool,
    /// Process even when the fingerprint is unchanged.
    pub force: bool,
    /// When false, nothing on disk is touched (check / dry-run).
    pub write_outputs: bool,
}

/// Result of one pipeline invocation.
#[derive(Debug)]
pub struct RunOutcome {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub row_count: usize,
    /// Source columns no mapping claimed.
    pub unmapped_columns: Vec<String>,
    /// Unmapped columns reported for schema evolution (auto-detect on).
    pub new_columns: Vec<String>,
    /// Lenient-cleaning annotations across all rows.
    pub annotation_count: usize,
    /// Names seen this run with no alias table entry.
    pub new_people: Vec<String>,
    pub change: ChangeDetail,
    /// Absent when processing was skipped as unchanged.
    pub report: Option<ValidationReport>,
    pub alias_sync: Option<SyncOutcome>,
    pub outputs_written: bool,
    pub skipped_unchanged: bool,
}

impl RunOutcome {
    pub fn has_errors(&self) -> bool {
        self.report
            .as_ref()
            .is_some_and(ValidationReport::has_errors)
    }
}

/// Result of the load stage.
struct LoadResult {
    config: SchemaConfig,
    table: SourceTable,
}

fn load(options: &PipelineOptions) -> Result<LoadResult> {
    let _span = info_span!("load").entered();
    let raw = fs::read_to_string(&options.schema)
        .with_context(|| format!("read schema config: {}", options.schema.display()))?;
    let mut config = SchemaConfig::from_json(&raw)
        .with_context(|| format!("parse schema config: {}", options.schema.display()))?;
    let table = CsvSource::new(&options.input)
        .read()
        .with_context(|| format!("read schedule: {}", options.input.display()))?;
    if table.is_empty() {
        warn!(path = %options.input.display(), "source table has no data rows");
    }
    apply_department_hints(&mut config, &table.departments);
    Ok(LoadResult { config, table })
}

/// Folds the source's column→department row into the schema's
/// departments table. Explicit mapping departments and configured
/// table entries take precedence; hints only fill gaps.
fn apply_department_hints(config: &mut SchemaConfig, hints: &BTreeMap<String, String>) {
    if hints.is_empty() {
        return;
    }
    let mut additions: Vec<(String, String)> = Vec::new();
    for role in &config.role_fields {
        if role.mapping.department().is_some() || config.department_of_role(&role.name).is_some() {
            continue;
        }
        for label in role.mapping.source_labels() {
            if let Some(department) = hints.get(label) {
                additions.push((department.clone(), role.name.clone()));
                break;
            }
        }
    }
    for (department, role) in additions {
        config.departments.entry(department).or_default().push(role);
    }
}

/// Runs the whole pipeline.
pub fn execute(options: &PipelineOptions) -> Result<RunOutcome> {
    let loaded = load(options)?;

    let _span = info_span!("map").entered();
    let manager = SchemaManager::new(loaded.config);
    let mapped = manager.map_columns(&loaded.table.headers);
    let new_columns = manager.detect_new_columns(&loaded.table.headers);
    if !mapped.unmapped.is_empty() {
        info!(count = mapped.unmapped.len(), "unmapped source columns");
    }
    drop(_span);

    let _span = info_span!("identity").entered();
    let mut alias_store = CsvAliasStore::new(&options.aliases);
    let alias_rows = alias_store
        .read_all()
        .with_context(|| format!("load alias table: {}", options.aliases.display()))?;
    let mut mapper = AliasMapper::new();
    mapper.load_rows(&alias_rows);
    info!(aliases = mapper.len(), "alias snapshot loaded");
    drop(_span);

    let _span = info_span!("canonicalize").entered();
    let run_timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let canonicalizer = Canonicalizer::new(&manager, &mapper, &run_timestamp);
    let output = canonicalizer.canonicalize(&loaded.table.to_raw_records());
    let dataset = output.dataset;
    drop(_span);

    let _span = info_span!("change").entered();
    let mut state_store = JsonStateStore::new(&options.state_file);
    let mut detector = ChangeDetector::load(&mut state_store);
    let (changed, change) = detector.has_changed(&dataset);
    drop(_span);

    let role_names: Vec<String> = manager
        .config()
        .role_fields
        .iter()
        .map(|f| f.name.clone())
        .collect();
    let name_counts = AliasMapper::extract_names(&dataset, &role_names);
    let (new_people, _existing) = mapper.detect_new_and_existing(&name_counts);

    if !changed && !options.force && options.write_outputs {
        info!(reason = change.reason.as_str(), "content unchanged, skipping outputs");
        detector
            .update_state(&mut state_store, &dataset, true)
            .context("record unchanged run")?;
        return Ok(RunOutcome {
            input: options.input.clone(),
            output_dir: options.output_dir.clone(),
            row_count: dataset.row_count(),
            unmapped_columns: mapped.unmapped,
            new_columns,
            annotation_count: output.annotations.len(),
            new_people,
            change,
            report: None,
            alias_sync: None,
            outputs_written: false,
            skipped_unchanged: true,
        });
    }

    let _span = info_span!("validate").entered();
    let report = Validator::new(manager.config()).validate(&dataset);
    info!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        "validation finished"
    );
    drop(_span);

    let mut alias_sync = None;
    let mut outputs_written = false;
    if options.write_outputs {
        let _span = info_span!("output").entered();
        let success = !report.has_errors();
        write_outputs(
            options,
            &manager,
            &dataset,
            &run_timestamp,
        )?;
        alias_sync = Some(
            mapper
                .sync(&mut alias_store, &name_counts)
                .context("sync alias table")?,
        );
        detector
            .update_state(&mut state_store, &dataset, success)
            .context("save change state")?;
        outputs_written = true;
    }

    Ok(RunOutcome {
        input: options.input.clone(),
        output_dir: options.output_dir.clone(),
        row_count: dataset.row_count(),
        unmapped_columns: mapped.unmapped,
        new_columns,
        annotation_count: output.annotations.len(),
        new_people,
        change,
        report: Some(report),
        alias_sync,
        outputs_written,
        skipped_unchanged: false,
    })
}

fn write_outputs(
    options: &PipelineOptions,
    manager: &SchemaManager,
    dataset: &Dataset,
    run_timestamp: &str,
) -> Result<()> {
    let canonical_path = options.output_dir.join(CANONICAL_FILE);
    CsvCanonicalSink::new(&canonical_path)
        .write(dataset)
        .with_context(|| format!("write canonical csv: {}", canonical_path.display()))?;

    let domain_dir = options.output_dir.join(DOMAIN_DIR);
    let sink = JsonDomainSink::new(&domain_dir);
    let projector = DomainProjector::new(manager.config());
    let domain_options = DomainOptions {
        exclude_identity: options.exclude_identity,
        generated_at: run_timestamp.to_string(),
    };
    for kind in DomainKind::ALL {
        for (year, document) in projector.project_by_year(kind, dataset, &domain_options) {
            sink.write_year(&document, year)
                .with_context(|| format!("write {} {year}", kind.name()))?;
        }
        let latest = projector.project(kind, dataset, &domain_options);
        sink.write_latest(&latest)
            .with_context(|| format!("write {} latest", kind.name()))?;
    }
    Ok(())
}

/// Default companion file locations inside the output directory.
pub fn default_aliases_path(output_dir: &Path) -> PathBuf {
    output_dir.join("aliases.csv")
}

pub fn default_state_path(output_dir: &Path) -> PathBuf {
    output_dir.join("state.json")
}
