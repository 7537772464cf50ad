//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "rota",
    version,
    about = "Canonicalize service schedule spreadsheets",
    long_about = "Clean messy service schedule spreadsheets into a canonical \
                  dataset.\n\n\
                  Maps free-form column headers to canonical fields, resolves \
                  people through an alias table, detects content changes \
                  between runs, validates the result, and writes per-audience \
                  JSON documents."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Process a schedule and write canonical and domain outputs.
    Run(RunArgs),

    /// Validate a schedule and report changes without writing outputs.
    Check(CheckArgs),

    /// Suggest canonical field names for unmapped source columns.
    Suggest(SuggestArgs),

    /// Clear the change baseline so the next run processes everything.
    ResetState(ResetStateArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Path to the source schedule CSV.
    #[arg(value_name = "SCHEDULE_CSV")]
    pub input: PathBuf,

    /// Path to the schema configuration JSON.
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: PathBuf,

    /// Output directory for canonical and domain files.
    #[arg(long = "output-dir", value_name = "DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Alias table CSV (default: <OUTPUT_DIR>/aliases.csv).
    #[arg(long = "aliases", value_name = "PATH")]
    pub aliases: Option<PathBuf>,

    /// Change state file (default: <OUTPUT_DIR>/state.json).
    #[arg(long = "state-file", value_name = "PATH")]
    pub state_file: Option<PathBuf>,

    /// Omit person ids from domain documents.
    #[arg(long = "exclude-identity")]
    pub exclude_identity: bool,

    /// Process even when the content fingerprint is unchanged.
    #[arg(long = "force")]
    pub force: bool,

    /// Validate and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Maximum issues to print per severity bucket.
    #[arg(long = "max-issues", value_name = "N", default_value_t = 20)]
    pub max_issues: usize,
}

#[derive(Parser)]
pub struct CheckArgs {
    /// Path to the source schedule CSV.
    #[arg(value_name = "SCHEDULE_CSV")]
    pub input: PathBuf,

    /// Path to the schema configuration JSON.
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: PathBuf,

    /// Alias table CSV read for identity resolution.
    #[arg(long = "aliases", value_name = "PATH")]
    pub aliases: Option<PathBuf>,

    /// Change state file read for the change report.
    #[arg(long = "state-file", value_name = "PATH")]
    pub state_file: Option<PathBuf>,

    /// Maximum issues to print per severity bucket.
    #[arg(long = "max-issues", value_name = "N", default_value_t = 20)]
    pub max_issues: usize,
}

#[derive(Parser)]
pub struct SuggestArgs {
    /// Path to the source schedule CSV.
    #[arg(value_name = "SCHEDULE_CSV")]
    pub input: PathBuf,

    /// Path to the schema configuration JSON.
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: PathBuf,
}

#[derive(Parser)]
pub struct ResetStateArgs {
    /// Change state file to reset.
    #[arg(long = "state-file", value_name = "PATH")]
    pub state_file: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
