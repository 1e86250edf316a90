//! Registry configuration
//!
//! ```ignore
//! use runscope_engine::{AccessMode, RunRegistry};
//!
//! // Read-only viewer over a wandb directory
//! let registry = RunRegistry::open("./wandb")?;
//!
//! // Allow deleting runs, skip CRC checks on damaged logs
//! let registry = RunRegistry::builder()
//!     .root("./wandb")
//!     .access_mode(AccessMode::ReadWrite)
//!     .lenient()
//!     .open()?;
//! ```

use std::path::{Path, PathBuf};

use runscope_core::{Error, Result};
use runscope_recordlog::ScanOptions;

use crate::registry::RunRegistry;

/// Whether the registry may modify the run directory tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Inspect only; `delete_run` is refused
    #[default]
    ReadOnly,
    /// `delete_run` is permitted
    ReadWrite,
}

impl AccessMode {
    /// Check if writes are refused
    pub fn is_read_only(self) -> bool {
        self == AccessMode::ReadOnly
    }
}

/// Options for opening a [`RunRegistry`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Record log scanning
    pub scan: ScanOptions,
    /// Read-only or read-write
    pub access_mode: AccessMode,
}

impl RegistryOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the access mode
    pub fn access_mode(mut self, mode: AccessMode) -> Self {
        self.access_mode = mode;
        self
    }

    /// Set the scan options
    pub fn scan_options(mut self, scan: ScanOptions) -> Self {
        self.scan = scan;
        self
    }
}

/// Builder for [`RunRegistry`]
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    root: Option<PathBuf>,
    options: RegistryOptions,
}

impl RegistryBuilder {
    /// Create a builder with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory containing the run directories
    pub fn root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = Some(root.as_ref().to_path_buf());
        self
    }

    /// Set the access mode
    pub fn access_mode(mut self, mode: AccessMode) -> Self {
        self.options.access_mode = mode;
        self
    }

    /// Permit `delete_run`
    pub fn read_write(self) -> Self {
        self.access_mode(AccessMode::ReadWrite)
    }

    /// Set the record log scan options
    pub fn scan_options(mut self, scan: ScanOptions) -> Self {
        self.options.scan = scan;
        self
    }

    /// Read record logs without checksum verification
    pub fn lenient(self) -> Self {
        self.scan_options(ScanOptions::lenient())
    }

    /// Open the registry
    ///
    /// Fails with [`Error::InvalidRoot`] when no root was set or the root is
    /// not a directory.
    pub fn open(self) -> Result<RunRegistry> {
        let root = self
            .root
            .ok_or_else(|| Error::InvalidRoot("no root directory configured".to_string()))?;
        RunRegistry::open_with_options(root, self.options)
    }
}
