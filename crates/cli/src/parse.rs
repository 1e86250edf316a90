//! ArgMatches → CliAction conversion.

use clap::ArgMatches;

/// One registry operation requested on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    List,
    Show { id: String },
    History { id: String, force: bool },
    Metrics { id: String, keys: Option<Vec<String>> },
    Available { id: String },
    Media { id: String },
    ConfigKeys,
    Delete { id: String },
}

fn run_id(matches: &ArgMatches) -> Result<String, String> {
    matches
        .get_one::<String>("id")
        .cloned()
        .ok_or_else(|| "Missing run id".to_string())
}

/// Convert clap ArgMatches into a CliAction.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    let (sub_name, sub) = matches
        .subcommand()
        .ok_or_else(|| "No command provided".to_string())?;

    match sub_name {
        "list" => Ok(CliAction::List),
        "show" => Ok(CliAction::Show { id: run_id(sub)? }),
        "history" => Ok(CliAction::History {
            id: run_id(sub)?,
            force: sub.get_flag("force"),
        }),
        "metrics" => Ok(CliAction::Metrics {
            id: run_id(sub)?,
            keys: sub
                .get_many::<String>("key")
                .map(|keys| keys.cloned().collect()),
        }),
        "available" => Ok(CliAction::Available { id: run_id(sub)? }),
        "media" => Ok(CliAction::Media { id: run_id(sub)? }),
        "config-keys" => Ok(CliAction::ConfigKeys),
        "delete" => Ok(CliAction::Delete { id: run_id(sub)? }),
        other => Err(format!("Unknown command: {}", other)),
    }
}
