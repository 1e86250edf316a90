//! Sidecar files
//!
//! The producer mirrors part of the log into `files/` as plain JSON/YAML:
//! `wandb-metadata.json`, `config.yaml` and `wandb-summary.json`. Each is
//! loaded on its own; one missing or broken file never affects the others.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use runscope_core::{Map, Outcome, Value};
use tracing::debug;

/// Directory holding the sidecars, relative to the run directory
pub const FILES_DIR: &str = "files";
/// Process metadata
pub const METADATA_FILE: &str = "wandb-metadata.json";
/// Run configuration
pub const CONFIG_FILE: &str = "config.yaml";
/// Final summary values
pub const SUMMARY_FILE: &str = "wandb-summary.json";

/// The three sidecar loads for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Sidecars {
    /// `wandb-metadata.json`
    pub metadata: Outcome<Map>,
    /// `config.yaml`, entries unwrapped
    pub config: Outcome<Map>,
    /// `wandb-summary.json`
    pub summary: Outcome<Map>,
}

/// Loader for sidecar files
pub struct SidecarLoader;

impl SidecarLoader {
    /// Load all three sidecars of a run directory
    pub fn load(run_dir: &Path) -> Sidecars {
        let files = run_dir.join(FILES_DIR);
        Sidecars {
            metadata: Self::load_metadata(&files),
            config: Self::load_config(&files),
            summary: Self::load_summary(&files),
        }
    }

    /// Load `wandb-metadata.json`
    pub fn load_metadata(files_dir: &Path) -> Outcome<Map> {
        load_json_object(&files_dir.join(METADATA_FILE))
    }

    /// Load `wandb-summary.json`
    pub fn load_summary(files_dir: &Path) -> Outcome<Map> {
        load_json_object(&files_dir.join(SUMMARY_FILE))
    }

    /// Load `config.yaml` and unwrap `{value: ...}` entries
    pub fn load_config(files_dir: &Path) -> Outcome<Map> {
        let path = files_dir.join(CONFIG_FILE);
        read_text(&path)
            .and_then(|text| {
                if text.trim().is_empty() {
                    return Outcome::Loaded(Map::new());
                }
                match serde_yaml::from_str::<serde_yaml::Value>(&text) {
                    Ok(serde_yaml::Value::Null) => Outcome::Loaded(Map::new()),
                    Ok(doc) => match Value::from(doc) {
                        Value::Object(map) => Outcome::Loaded(map),
                        other => Outcome::degraded(format!(
                            "expected a mapping, found {}",
                            other.type_name()
                        )),
                    },
                    Err(e) => Outcome::degraded(e.to_string()),
                }
            })
            .map(unwrap_config_entries)
            .logged(&path)
    }
}

/// Replace every `{value: X, ...}` entry with `X`
///
/// Entries that are not mappings, or mappings without a `value` key, are
/// kept as they are.
pub fn unwrap_config_entries(config: Map) -> Map {
    config
        .into_iter()
        .map(|(key, value)| match value {
            Value::Object(mut inner) if inner.contains_key("value") => {
                let unwrapped = inner.shift_remove("value").unwrap_or(Value::Null);
                (key, unwrapped)
            }
            other => (key, other),
        })
        .collect()
}

fn read_text(path: &Path) -> Outcome<String> {
    match fs::read_to_string(path) {
        Ok(text) => Outcome::Loaded(text),
        Err(e) if e.kind() == ErrorKind::NotFound => Outcome::Absent,
        Err(e) => Outcome::degraded(e.to_string()),
    }
}

fn load_json_object(path: &Path) -> Outcome<Map> {
    read_text(path)
        .and_then(|text| match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Outcome::Loaded(map),
            Ok(other) => Outcome::degraded(format!(
                "expected an object, found {}",
                other.type_name()
            )),
            Err(e) => Outcome::degraded(e.to_string()),
        })
        .logged(path)
}

trait LogDegraded {
    fn logged(self, path: &Path) -> Self;
}

impl<T> LogDegraded for Outcome<T> {
    fn logged(self, path: &Path) -> Self {
        if let Some(reason) = self.degraded_reason() {
            debug!(path = %path.display(), %reason, "Ignoring unreadable sidecar");
        }
        self
    }
}
