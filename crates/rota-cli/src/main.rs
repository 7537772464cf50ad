//! Service schedule canonicalizer CLI.

use clap::{ColorChoice, Parser};
use rota_cli::logging::{LogConfig, LogFormat, init_logging};
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_check, run_reset_state, run_schedule, run_suggest};
use crate::summary::{print_outcome, print_suggestions};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match cli.command {
        Command::Run(args) => match run_schedule(&args) {
            Ok(outcome) => {
                print_outcome(&outcome, args.max_issues);
                i32::from(outcome.has_errors())
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Check(args) => match run_check(&args) {
            Ok(outcome) => {
                print_outcome(&outcome, args.max_issues);
                i32::from(outcome.has_errors())
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Suggest(args) => match run_suggest(&args) {
            Ok(suggestions) => {
                print_suggestions(&suggestions);
                0
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::ResetState(args) => match run_reset_state(&args) {
            Ok(path) => {
                println!("State reset: {}", path.display());
                0
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
    };
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
