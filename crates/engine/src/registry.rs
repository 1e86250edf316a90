//! Run registry
//!
//! The only entry point external callers use. Owns three caches, each behind
//! its own lock:
//!
//! | Cache | Key | Filled by | Invalidated by |
//! |-------|-----|-----------|----------------|
//! | runs | run id | `discover` (wholesale replace) | `discover`, `clear_cache`, `delete_run` |
//! | history | run id | `history` | log mtime change, `force`, `clear_cache`, `delete_run` |
//! | logs | run id | aggregation | `clear_cache`, `delete_run` |
//!
//! Locks are never held across file I/O, so a slow scan does not block
//! readers of already-cached data.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;
use runscope_core::{Error, HistoryRow, MediaFile, Outcome, Result, Run, RunId};
use runscope_recordlog::RecordLogReader;
use tracing::{debug, info, warn};

use crate::aggregate::{RunAggregator, RunDirectory};
use crate::log_cache::LogCache;
use crate::media::list_media;
use crate::metrics::{MetricSeries, MetricsProjector};
use crate::options::{RegistryBuilder, RegistryOptions};

/// Config key prefixes hidden from `config_keys`
pub const HIDDEN_CONFIG_PREFIXES: [&str; 2] = ["_wandb", "wandb_version"];

/// Cached history of one run
struct HistoryEntry {
    /// Log the rows were read from
    path: PathBuf,
    /// Log mtime when the rows were read
    token: SystemTime,
    rows: Arc<Vec<HistoryRow>>,
}

/// Discovers runs under a root directory and serves cached views of them
pub struct RunRegistry {
    root: PathBuf,
    options: RegistryOptions,

    /// Last discovery result
    ///
    /// Replaced as a whole by every `discover`, never patched per run.
    runs: Mutex<HashMap<RunId, Arc<Run>>>,

    /// History rows per run, validated against the log's mtime
    history: Mutex<HashMap<RunId, HistoryEntry>>,

    /// Decoded run/config/summary state per log
    logs: LogCache,
}

impl RunRegistry {
    /// Open a read-only registry over `root`
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(root, RegistryOptions::default())
    }

    /// Open with explicit options
    pub fn open_with_options(root: impl AsRef<Path>, options: RegistryOptions) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::InvalidRoot(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(RunRegistry {
            root: root.to_path_buf(),
            options,
            runs: Mutex::new(HashMap::new()),
            history: Mutex::new(HashMap::new()),
            logs: LogCache::new(RecordLogReader::new(options.scan)),
        })
    }

    /// Start a builder
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Options in effect
    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    // ========================================================================
    // Discovery
    // ========================================================================

    /// Scan the root and rebuild the run cache
    ///
    /// Returns runs newest first; runs whose timestamp did not parse come
    /// last. Directories not named like runs are ignored. When two
    /// directories carry the same run id only the newer one is kept.
    pub fn discover(&self) -> Result<Vec<Arc<Run>>> {
        let mut dirs: Vec<RunDirectory> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter_map(|path| RunDirectory::inspect(&path))
            .collect();
        dirs.sort_by(|a, b| a.dir_name.cmp(&b.dir_name));

        let mut unique: BTreeMap<RunId, RunDirectory> = BTreeMap::new();
        for dir in dirs {
            let wins = match unique.get(dir.id()) {
                None => true,
                Some(existing) => {
                    let wins = dir.supersedes(existing);
                    let (kept, ignored) = if wins {
                        (&dir.dir_name, &existing.dir_name)
                    } else {
                        (&existing.dir_name, &dir.dir_name)
                    };
                    warn!(run_id = %dir.id(), %kept, %ignored, "Duplicate run id");
                    wins
                }
            };
            if wins {
                unique.insert(dir.id().clone(), dir);
            }
        }

        let aggregator = RunAggregator::new(&self.logs);
        let mut runs: Vec<Arc<Run>> = unique
            .values()
            .map(|dir| Arc::new(aggregator.aggregate(dir)))
            .collect();
        runs.sort_by(|a, b| Run::discovery_order(a, b));

        *self.runs.lock() = runs
            .iter()
            .map(|run| (run.id.clone(), Arc::clone(run)))
            .collect();

        info!("Discovered {} runs in {}", runs.len(), self.root.display());
        Ok(runs)
    }

    /// Look up a run, rediscovering once on a miss
    pub fn get(&self, id: &str) -> Result<Arc<Run>> {
        if let Some(run) = self.cached_run(id) {
            return Ok(run);
        }
        debug!(run_id = id, "Run not cached, rediscovering");
        self.discover()?;
        self.cached_run(id).ok_or_else(|| Error::run_not_found(id))
    }

    fn cached_run(&self, id: &str) -> Option<Arc<Run>> {
        self.runs.lock().get(id).cloned()
    }

    // ========================================================================
    // History and metrics
    // ========================================================================

    /// History rows of a run, in log order
    ///
    /// Served from cache while the log's mtime is unchanged; `force` always
    /// rereads. A run without a log (or whose log vanished) has an empty
    /// history. A run discovered before its log existed picks the log up
    /// here and is rebuilt in the run cache.
    pub fn history(&self, id: &str, force: bool) -> Result<Arc<Vec<HistoryRow>>> {
        let mut run = self.get(id)?;
        if run.log_file_path.is_none() {
            if let Some(rebuilt) = self.adopt_new_log(&run) {
                run = rebuilt;
            }
        }
        let Some(log_path) = run.log_file_path.as_deref() else {
            return Ok(Arc::default());
        };

        let token = match fs::metadata(log_path) {
            Ok(meta) => meta.modified().ok(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(run_id = id, "Record log missing");
                return Ok(Arc::default());
            }
            Err(e) => {
                warn!(run_id = id, error = %e, "Cannot stat record log");
                None
            }
        };

        if !force {
            if let Some(token) = token {
                if let Some(entry) = self.history.lock().get(id) {
                    if entry.token == token && entry.path == log_path {
                        return Ok(Arc::clone(&entry.rows));
                    }
                }
            }
        }

        let rows = match self.logs.reader().read(log_path) {
            Outcome::Loaded(contents) => Arc::new(contents.history),
            Outcome::Absent => return Ok(Arc::default()),
            Outcome::Degraded { .. } => return Ok(Arc::default()),
        };

        if rows.is_empty() {
            warn!(run_id = id, path = %log_path.display(), "No history found in record log");
        } else {
            info!(
                "Loaded {} history rows for {} (display_name: {})",
                rows.len(),
                id,
                run.display_name
            );
        }

        // Without an mtime there is nothing to validate against later
        if let Some(token) = token {
            self.history.lock().insert(
                run.id.clone(),
                HistoryEntry {
                    path: log_path.to_path_buf(),
                    token,
                    rows: Arc::clone(&rows),
                },
            );
        }
        Ok(rows)
    }

    /// Re-inspect the directory of a run cached without a log
    fn adopt_new_log(&self, run: &Run) -> Option<Arc<Run>> {
        let dir = RunDirectory::inspect(&run.directory)?;
        dir.log_file.as_ref()?;
        let rebuilt = Arc::new(RunAggregator::new(&self.logs).aggregate(&dir));
        debug!(run_id = %rebuilt.id, "Record log appeared after discovery");
        self.runs
            .lock()
            .insert(rebuilt.id.clone(), Arc::clone(&rebuilt));
        Some(rebuilt)
    }

    /// Columnar metrics; all numeric non-internal keys when `keys` is `None`
    pub fn metrics(&self, id: &str, keys: Option<&[String]>) -> Result<MetricSeries> {
        let history = self.history(id, false)?;
        if history.is_empty() {
            warn!(run_id = id, "No history when projecting metrics");
        }
        Ok(MetricsProjector::project(&history, keys))
    }

    /// Sorted numeric keys available for plotting
    pub fn available_metrics(&self, id: &str) -> Result<Vec<String>> {
        let history = self.history(id, false)?;
        let keys = MetricsProjector::list_available_metrics(&history);
        if keys.is_empty() && !history.is_empty() {
            let sample: Vec<&str> = history[0].keys().take(10).map(String::as_str).collect();
            warn!(
                run_id = id,
                rows = history.len(),
                ?sample,
                "No numeric metrics found in history"
            );
        }
        Ok(keys)
    }

    // ========================================================================
    // Media and config
    // ========================================================================

    /// Media files of a run, sorted by epoch
    pub fn media(&self, id: &str) -> Result<Vec<MediaFile>> {
        let run = self.get(id)?;
        Ok(list_media(&run.directory.join("files"), &run.media_dir))
    }

    /// Every flattened config key across known runs, sorted
    ///
    /// Discovers first when nothing is cached yet. Producer bookkeeping keys
    /// (see [`HIDDEN_CONFIG_PREFIXES`]) are left out.
    pub fn config_keys(&self) -> Result<Vec<String>> {
        let runs: Vec<Arc<Run>> = {
            let cached = self.runs.lock();
            cached.values().cloned().collect()
        };
        let runs = if runs.is_empty() {
            self.discover()?
        } else {
            runs
        };

        let mut keys = BTreeSet::new();
        for run in &runs {
            for (key, value) in &run.config {
                if value.is_object() {
                    value.collect_leaf_paths(key, &mut keys);
                } else {
                    keys.insert(key.clone());
                }
            }
        }
        Ok(keys
            .into_iter()
            .filter(|key| !HIDDEN_CONFIG_PREFIXES.iter().any(|p| key.starts_with(p)))
            .collect())
    }

    // ========================================================================
    // Cache lifecycle
    // ========================================================================

    /// Drop every cached run, history and log
    pub fn clear_cache(&self) {
        self.runs.lock().clear();
        self.history.lock().clear();
        self.logs.clear();
        debug!("Cleared registry caches");
    }

    /// Clear caches and rediscover; returns the number of runs
    pub fn refresh(&self) -> Result<usize> {
        self.clear_cache();
        Ok(self.discover()?.len())
    }

    /// Number of runs in the cache
    pub fn cached_run_count(&self) -> usize {
        self.runs.lock().len()
    }

    /// Whether history for `id` is cached
    pub fn is_history_cached(&self, id: &str) -> bool {
        self.history.lock().contains_key(id)
    }

    /// Remove a run directory from disk
    ///
    /// Refused with [`Error::ReadOnly`] unless the registry was opened
    /// read-write. Clears all caches afterwards. A directory that vanished
    /// after discovery is reported as not found.
    pub fn delete_run(&self, id: &str) -> Result<()> {
        if self.options.access_mode.is_read_only() {
            return Err(Error::ReadOnly(format!("cannot delete run {}", id)));
        }
        let run = self.get(id)?;
        match fs::remove_dir_all(&run.directory) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.clear_cache();
                return Err(Error::run_not_found(id));
            }
            Err(e) => return Err(e.into()),
        }
        self.clear_cache();
        info!(run_id = id, path = %run.directory.display(), "Deleted run");
        Ok(())
    }
}
