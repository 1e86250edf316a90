//! Run aggregation
//!
//! Builds one canonical [`Run`] from a run directory by combining:
//!
//! | Source | Contributes |
//! |--------|-------------|
//! | Directory name | id, offline flag, creation time |
//! | `wandb-metadata.json` | metadata, program name, args fallback |
//! | `config.yaml` | config (wins over the log) |
//! | `wandb-summary.json` | summary (wins over the log) |
//! | Record log | config keys missing from the sidecar, summary fallback, display name |
//! | `files/media` | `has_media` |
//!
//! No step is fatal. A source that is absent or degraded simply contributes
//! nothing.

use std::fs;
use std::path::{Path, PathBuf};

use runscope_core::{insert_path, lookup_path, Map, Outcome, Run, RunDirName, RunId, Value};

use crate::log_cache::{LogCache, LogSummary};
use crate::media::{has_media, MEDIA_DIR};
use crate::sidecar::{SidecarLoader, Sidecars, FILES_DIR};

/// Record log file name prefix
pub const LOG_FILE_PREFIX: &str = "run-";
/// Record log file extension
pub const LOG_FILE_SUFFIX: &str = ".wandb";

/// Config paths consulted for a display name, in priority order
pub const DISPLAY_NAME_PATHS: [&str; 2] = [
    "params.config.full_experiment_name",
    "env_kwargs.retarget_info.clip",
];

// ============================================================================
// Run directories
// ============================================================================

/// A directory whose name matches the run naming grammar
#[derive(Debug, Clone, PartialEq)]
pub struct RunDirectory {
    /// Absolute path
    pub path: PathBuf,
    /// Final path component
    pub dir_name: String,
    /// Parsed name
    pub parsed: RunDirName,
    /// First `run-*.wandb` file by name, if any
    pub log_file: Option<PathBuf>,
}

impl RunDirectory {
    /// Inspect `path`; `None` when its name is not a run directory name
    pub fn inspect(path: &Path) -> Option<Self> {
        let dir_name = path.file_name()?.to_str()?;
        let parsed = RunDirName::parse(dir_name)?;
        Some(RunDirectory {
            path: path.to_path_buf(),
            dir_name: dir_name.to_string(),
            parsed,
            log_file: find_log_file(path),
        })
    }

    /// Run identifier
    pub fn id(&self) -> &RunId {
        &self.parsed.run_id
    }

    /// `files/` directory
    pub fn files_dir(&self) -> PathBuf {
        self.path.join(FILES_DIR)
    }

    /// `files/media` directory
    pub fn media_dir(&self) -> PathBuf {
        self.files_dir().join(MEDIA_DIR)
    }

    /// Whether this directory wins over `other` for the same run id
    ///
    /// Newer creation time wins, unparsable times lose, and ties go to the
    /// lexicographically greater directory name.
    pub fn supersedes(&self, other: &RunDirectory) -> bool {
        (self.parsed.created_at, &self.dir_name) > (other.parsed.created_at, &other.dir_name)
    }
}

/// First `run-*.wandb` file in `dir`, by name
pub fn find_log_file(dir: &Path) -> Option<PathBuf> {
    let mut logs: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(LOG_FILE_PREFIX) && name.ends_with(LOG_FILE_SUFFIX))
                .unwrap_or(false)
                && path.is_file()
        })
        .collect();
    logs.sort();
    logs.into_iter().next()
}

// ============================================================================
// Aggregator
// ============================================================================

/// Builds [`Run`] values, reading record logs through a shared [`LogCache`]
pub struct RunAggregator<'a> {
    logs: &'a LogCache,
}

impl<'a> RunAggregator<'a> {
    /// Create an aggregator backed by `logs`
    pub fn new(logs: &'a LogCache) -> Self {
        RunAggregator { logs }
    }

    /// Aggregate one run directory
    pub fn aggregate(&self, dir: &RunDirectory) -> Run {
        let sidecars = SidecarLoader::load(&dir.path);
        let binary = match &dir.log_file {
            Some(path) => self.logs.get_or_read(dir.id(), path),
            None => Outcome::Absent,
        };
        let has_media = has_media(&dir.media_dir());
        assemble(dir, sidecars, binary.loaded().as_deref(), has_media)
    }
}

/// Combine already-loaded sources into a [`Run`]
pub fn assemble(
    dir: &RunDirectory,
    sidecars: Sidecars,
    binary: Option<&LogSummary>,
    has_media: bool,
) -> Run {
    let id = dir.id().clone();
    let metadata = sidecars.metadata.loaded();

    let mut config = merge_config(sidecars.config.loaded(), binary.map(|b| &b.config));
    let summary = sidecars
        .summary
        .loaded()
        .or_else(|| binary.map(|b| b.summary.clone()));

    if config.is_empty() {
        if let Some(meta) = &metadata {
            config = config_from_args(&metadata_args(meta));
        }
    }

    let display_name = resolve_display_name(&id, binary.and_then(LogSummary::display_name), &config);
    let name = metadata
        .as_ref()
        .and_then(|meta| meta.get("program"))
        .and_then(Value::as_str)
        .and_then(|program| program.rsplit('/').next())
        .filter(|base| !base.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string());

    Run {
        directory: dir.path.clone(),
        log_file_path: dir.log_file.clone(),
        is_offline: dir.parsed.is_offline,
        created_at: dir.parsed.created_at,
        name,
        display_name,
        metadata,
        config,
        summary,
        media_dir: dir.media_dir(),
        has_media,
        id,
    }
}

// ============================================================================
// Merge rules
// ============================================================================

/// Merge sidecar config with log config
///
/// Without a sidecar config (or with an empty one) the log config is used
/// as is. Otherwise log keys are added only where the sidecar lacks them.
pub fn merge_config(sidecar: Option<Map>, binary: Option<&Map>) -> Map {
    match sidecar {
        Some(mut merged) if !merged.is_empty() => {
            if let Some(binary) = binary {
                for (key, value) in binary {
                    if !merged.contains_key(key) {
                        merged.insert(key.clone(), value.clone());
                    }
                }
            }
            merged
        }
        _ => binary.cloned().unwrap_or_default(),
    }
}

fn metadata_args(metadata: &Map) -> Vec<&str> {
    metadata
        .get("args")
        .and_then(Value::as_array)
        .map(|args| args.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// Build a config from `key.path=value` command-line arguments
///
/// Tokens without `=` are ignored. A dotted key is written as a nested path;
/// when an intermediate segment already holds a scalar, the value is stored
/// under the full dotted key instead.
pub fn config_from_args(args: &[&str]) -> Map {
    let mut config = Map::new();
    for arg in args {
        let Some((key_path, raw)) = arg.split_once('=') else {
            continue;
        };
        let value = coerce_arg_value(raw);
        let segments: Vec<&str> = key_path.split('.').collect();
        if !insert_path(&mut config, &segments, value.clone()) {
            config.insert(key_path.to_string(), value);
        }
    }
    config
}

/// Coerce an argument value: bool, then float (if it contains `.`), then
/// integer, else the raw string
pub fn coerce_arg_value(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    let parsed = if raw.contains('.') {
        raw.parse::<f64>().ok().map(Value::Float)
    } else {
        raw.parse::<i64>().ok().map(Value::Int)
    };
    parsed.unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Pick the display name: log name (unless it is just the id), then the
/// config paths in [`DISPLAY_NAME_PATHS`], then the id
pub fn resolve_display_name(id: &RunId, log_name: Option<&str>, config: &Map) -> String {
    if let Some(name) = log_name.filter(|name| !name.is_empty() && *name != id.as_str()) {
        return name.to_string();
    }
    DISPLAY_NAME_PATHS
        .iter()
        .find_map(|path| lookup_path(config, path).and_then(Value::as_label))
        .unwrap_or_else(|| id.to_string())
}
