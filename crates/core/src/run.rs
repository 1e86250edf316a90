//! Canonical run model
//!
//! A [`Run`] is the merged view of one run directory: the record log, the
//! sidecar files and the directory name itself. It is built once per cache
//! lifetime and never mutated afterwards.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::PathBuf;

use crate::types::RunId;
use crate::value::{lookup_path, Map, Value};

static EPOCH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"epoch(\d+)").expect("epoch pattern is valid"));

/// Canonical reconstructed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    /// Identifier parsed from the directory name
    pub id: RunId,
    /// Run directory
    pub directory: PathBuf,
    /// Binary record log, if the directory contains one
    pub log_file_path: Option<PathBuf>,
    /// Directory carries the `offline-` prefix
    pub is_offline: bool,
    /// Creation time from the directory name
    pub created_at: Option<NaiveDateTime>,
    /// Program basename from metadata, else the run id
    pub name: String,
    /// Resolved human-facing label
    pub display_name: String,
    /// Sidecar metadata (never reconstructed from the log)
    pub metadata: Option<Map>,
    /// Fully merged configuration
    pub config: Map,
    /// Final metric values
    pub summary: Option<Map>,
    /// `files/media` under the run directory
    pub media_dir: PathBuf,
    /// At least one `.gif` / `.mp4` exists under `media_dir`
    pub has_media: bool,
}

impl Run {
    fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref()?.get(key)
    }

    /// Process state recorded in metadata (`running`, `finished`, ...)
    pub fn state(&self) -> Option<&str> {
        self.metadata_value("state")?.as_str()
    }

    /// Host the run executed on
    pub fn host(&self) -> Option<&str> {
        self.metadata_value("host")?.as_str()
    }

    /// Program path recorded in metadata
    pub fn program(&self) -> Option<&str> {
        self.metadata_value("program")?.as_str()
    }

    /// GPU description recorded in metadata
    pub fn gpu(&self) -> Option<&Value> {
        self.metadata_value("gpu")
    }

    /// Command-line arguments recorded in metadata; non-string entries are skipped
    pub fn args(&self) -> Vec<&str> {
        self.metadata_value("args")
            .and_then(Value::as_array)
            .map(|args| args.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Dotted-path lookup into the merged config
    pub fn config_value(&self, path: &str) -> Option<&Value> {
        lookup_path(&self.config, path)
    }

    /// Ordering used by discovery: newest first, unparsable timestamps last
    pub fn discovery_order(a: &Run, b: &Run) -> Ordering {
        match (&a.created_at, &b.created_at) {
            (Some(x), Some(y)) => y.cmp(x).then_with(|| a.id.cmp(&b.id)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        }
    }
}

/// One media artifact (gif / mp4) logged by a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaFile {
    /// Absolute path
    pub path: PathBuf,
    /// File name with extension
    pub filename: String,
    /// File stem
    pub name: String,
    /// Epoch extracted from `epoch(\d+)` in the stem
    pub epoch: Option<u64>,
    /// Path relative to the run's `files/` directory
    pub relative_path: PathBuf,
}

impl MediaFile {
    /// Extract the epoch number from a file stem like `epoch40_4_hash`
    pub fn epoch_from_name(name: &str) -> Option<u64> {
        EPOCH_PATTERN
            .captures(name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Stable sort by epoch; files without an epoch go last
    pub fn sort_by_epoch(files: &mut [MediaFile]) {
        files.sort_by(|a, b| match (a.epoch, b.epoch) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }
}
