//! clap command tree

use clap::{Arg, ArgAction, Command};

fn run_id_arg() -> Arg {
    Arg::new("id")
        .value_name("RUN_ID")
        .required(true)
        .help("Run identifier (the suffix of the run directory name)")
}

/// Build the `runscope` command
pub fn build_cli() -> Command {
    Command::new("runscope")
        .about("Inspect local wandb run directories")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg(
            Arg::new("dir")
                .value_name("WANDB_DIR")
                .required(true)
                .help("Directory containing run-*/offline-run-* directories"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Print JSON instead of human-readable output"),
        )
        .arg(
            Arg::new("no-verify")
                .long("no-verify")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Skip record log checksum verification"),
        )
        .arg(
            Arg::new("allow-delete")
                .long("allow-delete")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Open the registry read-write so runs can be deleted"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Increase log verbosity (-v info, -vv debug)"),
        )
        .subcommand(Command::new("list").about("List runs, newest first"))
        .subcommand(
            Command::new("show")
                .about("Show one run's metadata, config and summary")
                .arg(run_id_arg()),
        )
        .subcommand(
            Command::new("history")
                .about("Print a run's history rows")
                .arg(run_id_arg())
                .arg(
                    Arg::new("force")
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .help("Reread the record log even if cached"),
                ),
        )
        .subcommand(
            Command::new("metrics")
                .about("Print metrics as columns")
                .arg(run_id_arg())
                .arg(
                    Arg::new("key")
                        .short('k')
                        .long("key")
                        .value_name("KEY")
                        .action(ArgAction::Append)
                        .help("Metric to include (repeatable; default: all numeric)"),
                ),
        )
        .subcommand(
            Command::new("available")
                .about("List numeric metric keys of a run")
                .arg(run_id_arg()),
        )
        .subcommand(
            Command::new("media")
                .about("List a run's gif/mp4 files by epoch")
                .arg(run_id_arg()),
        )
        .subcommand(Command::new("config-keys").about("List config keys across all runs"))
        .subcommand(
            Command::new("delete")
                .about("Delete a run directory (requires --allow-delete)")
                .arg(run_id_arg()),
        )
}
