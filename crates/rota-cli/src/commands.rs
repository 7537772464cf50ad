//! Subcommand entry points.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use rota_change::ChangeDetector;
use rota_ingest::{CsvSource, JsonStateStore, TabularSource};
use rota_map::SchemaManager;
use rota_model::SchemaConfig;

use crate::cli::{CheckArgs, ResetStateArgs, RunArgs, SuggestArgs};
use rota_cli::pipeline::{
    PipelineOptions, RunOutcome, default_aliases_path, default_state_path, execute,
};

pub fn run_schedule(args: &RunArgs) -> Result<RunOutcome> {
    let options = PipelineOptions {
        input: args.input.clone(),
        schema: args.schema.clone(),
        output_dir: args.output_dir.clone(),
        aliases: args
            .aliases
            .clone()
            .unwrap_or_else(|| default_aliases_path(&args.output_dir)),
        state_file: args
            .state_file
            .clone()
            .unwrap_or_else(|| default_state_path(&args.output_dir)),
        exclude_identity: args.exclude_identity,
        force: args.force,
        write_outputs: !args.dry_run,
    };
    execute(&options)
}

pub fn run_check(args: &CheckArgs) -> Result<RunOutcome> {
    let options = PipelineOptions {
        input: args.input.clone(),
        schema: args.schema.clone(),
        output_dir: PathBuf::new(),
        aliases: args
            .aliases
            .clone()
            .unwrap_or_else(|| default_aliases_path(&PathBuf::from("output"))),
        state_file: args
            .state_file
            .clone()
            .unwrap_or_else(|| default_state_path(&PathBuf::from("output"))),
        exclude_identity: false,
        force: false,
        write_outputs: false,
    };
    execute(&options)
}

/// One suggestion: the unmapped source label and a canonical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub label: String,
    pub suggested: String,
}

pub fn run_suggest(args: &SuggestArgs) -> Result<Vec<Suggestion>> {
    let raw = fs::read_to_string(&args.schema)
        .with_context(|| format!("read schema config: {}", args.schema.display()))?;
    let config = SchemaConfig::from_json(&raw)
        .with_context(|| format!("parse schema config: {}", args.schema.display()))?;
    let table = CsvSource::new(&args.input)
        .read()
        .with_context(|| format!("read schedule: {}", args.input.display()))?;

    let manager = SchemaManager::new(config);
    let mapped = manager.map_columns(&table.headers);
    let suggestions = mapped
        .unmapped
        .into_iter()
        .map(|label| {
            let suggested = manager.suggest_field_name(&label);
            Suggestion { label, suggested }
        })
        .collect();
    Ok(suggestions)
}

pub fn run_reset_state(args: &ResetStateArgs) -> Result<PathBuf> {
    let mut store = JsonStateStore::new(&args.state_file);
    let mut detector = ChangeDetector::load(&mut store);
    detector
        .reset_state(&mut store)
        .with_context(|| format!("reset state: {}", args.state_file.display()))?;
    info!(path = %args.state_file.display(), "change baseline cleared");
    Ok(args.state_file.clone())
}
