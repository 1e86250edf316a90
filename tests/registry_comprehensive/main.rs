//! Registry Comprehensive Test Suite
//!
//! End-to-end tests over real run directories built in a temp dir: record
//! logs written with the test-utils encoder plus sidecar files on disk.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all registry tests
//! cargo test --test registry_comprehensive
//!
//! # Run merge tests only
//! cargo test --test registry_comprehensive merge::
//! ```

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use runscope::{Map, RunRegistry, Value};
use runscope_recordlog::{encode, LogWriter};
use tempfile::TempDir;

// Test modules
pub mod discovery;
pub mod history_cache;
pub mod merge;
pub mod metrics;
pub mod resilience;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// A run directory under construction
pub struct RunFixture {
    pub dir: PathBuf,
    pub id: String,
}

impl RunFixture {
    /// Create `<root>/<dir_name>/files`
    pub fn new(root: &Path, dir_name: &str) -> Self {
        let dir = root.join(dir_name);
        fs::create_dir_all(dir.join("files")).unwrap();
        let id = dir_name.rsplit('-').next().unwrap().to_string();
        RunFixture { dir, id }
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(format!("run-{}.wandb", self.id))
    }

    pub fn files(&self) -> PathBuf {
        self.dir.join("files")
    }

    /// Write a record log containing `records` after the header chunk
    pub fn log(&self, records: &[Vec<u8>]) -> &Self {
        let mut writer = LogWriter::new();
        for record in records {
            writer.append_record(record);
        }
        writer.write_to(&self.log_path()).unwrap();
        self
    }

    pub fn log_bytes(&self, bytes: &[u8]) -> &Self {
        fs::write(self.log_path(), bytes).unwrap();
        self
    }

    pub fn config_yaml(&self, text: &str) -> &Self {
        fs::write(self.files().join("config.yaml"), text).unwrap();
        self
    }

    pub fn summary_json(&self, text: &str) -> &Self {
        fs::write(self.files().join("wandb-summary.json"), text).unwrap();
        self
    }

    pub fn metadata_json(&self, text: &str) -> &Self {
        fs::write(self.files().join("wandb-metadata.json"), text).unwrap();
        self
    }

    pub fn media(&self, relative: &str) -> &Self {
        let path = self.files().join("media").join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"GIF89a").unwrap();
        self
    }

    /// Pin the log's mtime so cache tests do not depend on clock resolution
    pub fn set_log_mtime(&self, secs: u64) {
        let file = File::options().write(true).open(self.log_path()).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }
}

pub fn open(root: &TempDir) -> RunRegistry {
    RunRegistry::open(root.path()).unwrap()
}

/// Parse a JSON object literal into a [`Map`]
pub fn map(json: &str) -> Map {
    match serde_json::from_str::<Value>(json).unwrap() {
        Value::Object(map) => map,
        other => panic!("not an object: {:?}", other),
    }
}
