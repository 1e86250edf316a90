//! Cache of binary-log run state
//!
//! Decoding a record log is the most expensive step of aggregation, so the
//! run/config/summary part of each log is kept for the registry's lifetime.
//! History is not kept here; it has its own mtime-checked cache in the
//! registry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use runscope_core::{Map, Outcome, RunId};
use runscope_recordlog::{LogContents, RecordLogReader, RunRecord, ScanStats};
use tracing::debug;

/// Run-level state recovered from a log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogSummary {
    /// Run record, if present
    pub run: Option<RunRecord>,
    /// Accumulated config
    pub config: Map,
    /// Accumulated summary
    pub summary: Map,
    /// Scan counters from the read
    pub stats: ScanStats,
}

impl From<LogContents> for LogSummary {
    fn from(contents: LogContents) -> Self {
        LogSummary {
            run: contents.run,
            config: contents.config,
            summary: contents.summary,
            stats: contents.stats,
        }
    }
}

impl LogSummary {
    /// Display name from the run record, if set
    pub fn display_name(&self) -> Option<&str> {
        self.run
            .as_ref()
            .map(|run| run.display_name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// Cached summary together with the log it was decoded from
struct CachedLog {
    path: PathBuf,
    summary: Arc<LogSummary>,
}

/// Per-run cache of [`LogSummary`] values
///
/// Only successful reads are cached; an absent or degraded log is retried on
/// the next lookup. An entry only serves lookups for the same log path, so a
/// run id that moves to another directory is decoded afresh. Two threads
/// missing at once may both decode the log; the later insert wins and both
/// results are equal.
pub struct LogCache {
    reader: RecordLogReader,
    entries: Mutex<HashMap<RunId, CachedLog>>,
}

impl LogCache {
    /// Create an empty cache reading with `reader`
    pub fn new(reader: RecordLogReader) -> Self {
        LogCache {
            reader,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Reader used on misses
    pub fn reader(&self) -> &RecordLogReader {
        &self.reader
    }

    /// Cached summary for `id`, reading `path` on a miss
    ///
    /// An entry decoded from a different path counts as a miss.
    pub fn get_or_read(&self, id: &RunId, path: &Path) -> Outcome<Arc<LogSummary>> {
        if let Some(hit) = self.entries.lock().get(id) {
            if hit.path == path {
                return Outcome::Loaded(Arc::clone(&hit.summary));
            }
            debug!(run_id = %id, cached = %hit.path.display(), path = %path.display(), "Log path changed");
        }

        let outcome = self
            .reader
            .read(path)
            .map(|contents| Arc::new(LogSummary::from(contents)));
        if let Outcome::Loaded(summary) = &outcome {
            self.entries.lock().insert(
                id.clone(),
                CachedLog {
                    path: path.to_path_buf(),
                    summary: Arc::clone(summary),
                },
            );
        }
        outcome
    }

    /// Whether `id` has a cached entry
    pub fn contains(&self, id: &RunId) -> bool {
        self.entries.lock().contains_key(id)
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
