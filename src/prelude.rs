//! Convenient imports for Runscope.
//!
//! ```ignore
//! use runscope::prelude::*;
//!
//! let registry = RunRegistry::open("./wandb")?;
//! let runs = registry.discover()?;
//! ```

// Main entry point
pub use runscope_engine::{AccessMode, RegistryBuilder, RunRegistry};

// Error handling
pub use runscope_core::{Error, Result};

// Run model
pub use runscope_core::{HistoryRow, Map, MediaFile, Run, RunId, Value};

// Projections
pub use runscope_engine::MetricSeries;

// Log scanning
pub use runscope_recordlog::ScanOptions;
