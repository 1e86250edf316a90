//! runscope CLI: inspect local wandb run directories.
//!
//! `runscope [flags] <WANDB_DIR> <COMMAND>` runs one registry operation and
//! exits. Output is human-readable unless `--json` is given.

mod commands;
mod format;
mod parse;

use std::process;

use runscope_core::Error;
use runscope_engine::{AccessMode, RunRegistry};
use runscope_recordlog::ScanOptions;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{
    format_error, format_history, format_keys, format_media, format_metrics, format_run,
    format_runs, OutputMode,
};
use parse::{matches_to_action, CliAction};

fn main() {
    let matches = build_cli().get_matches();

    init_logging(matches.get_count("verbose"));

    let output_mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let registry = match open_registry(&matches) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("{}", format_error(&e, output_mode));
            process::exit(1);
        }
    };

    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("(error) {}", e);
            process::exit(1);
        }
    };

    match execute(&registry, action, output_mode) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, output_mode));
            process::exit(1);
        }
    }
}

/// `-v` wins over `RUST_LOG`; with neither, only warnings are shown.
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_registry(matches: &clap::ArgMatches) -> Result<RunRegistry, Error> {
    let root = matches
        .get_one::<String>("dir")
        .map(String::as_str)
        .unwrap_or(".");

    debug!(root, "Opening run registry");
    let mut builder = RunRegistry::builder().root(root);
    if matches.get_flag("no-verify") {
        builder = builder.scan_options(ScanOptions::lenient());
    }
    if matches.get_flag("allow-delete") {
        builder = builder.access_mode(AccessMode::ReadWrite);
    }
    builder.open()
}

fn execute(registry: &RunRegistry, action: CliAction, mode: OutputMode) -> Result<String, Error> {
    match action {
        CliAction::List => Ok(format_runs(&registry.discover()?, mode)),
        CliAction::Show { id } => Ok(format_run(&*registry.get(&id)?, mode)),
        CliAction::History { id, force } => Ok(format_history(&registry.history(&id, force)?, mode)),
        CliAction::Metrics { id, keys } => {
            Ok(format_metrics(&registry.metrics(&id, keys.as_deref())?, mode))
        }
        CliAction::Available { id } => Ok(format_keys(&registry.available_metrics(&id)?, mode)),
        CliAction::Media { id } => Ok(format_media(&registry.media(&id)?, mode)),
        CliAction::ConfigKeys => Ok(format_keys(&registry.config_keys()?, mode)),
        CliAction::Delete { id } => {
            registry.delete_run(&id)?;
            Ok(match mode {
                OutputMode::Json => serde_json::json!({ "deleted": id }).to_string(),
                OutputMode::Human => format!("Deleted run {}", id),
            })
        }
    }
}
