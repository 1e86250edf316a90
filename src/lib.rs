//! # Runscope
//!
//! Reconstructs experiment runs from local wandb run directories.
//!
//! A run directory holds a binary record log (`run-<id>.wandb`) plus optional
//! sidecar files under `files/`. Runscope reads both, merges them into one
//! canonical [`Run`], and serves history and metric projections from a
//! cached [`RunRegistry`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use runscope::prelude::*;
//!
//! let registry = RunRegistry::open("./wandb")?;
//!
//! for run in registry.discover()? {
//!     println!("{} {}", run.id, run.display_name);
//! }
//!
//! let series = registry.metrics("x7k2m9", None)?;
//! let loss = series.get("loss");
//! ```
//!
//! ## Layers
//!
//! - [`recordlog`] - block-framed record log reader and protobuf decoding
//! - [`engine`] - sidecars, aggregation, metrics projection and the registry
//! - [`model`] - run model, values, outcomes and errors shared by both

#![warn(missing_docs)]

pub mod prelude;

/// Run model, values and errors
pub use runscope_core as model;
/// Sidecars, aggregation, metrics and the registry
pub use runscope_engine as engine;
/// Record log reader
pub use runscope_recordlog as recordlog;

pub use runscope_core::{
    Error, HistoryRow, Map, MediaFile, Outcome, Result, Run, RunDirName, RunId, Value,
};
pub use runscope_engine::{
    AccessMode, MetricSeries, MetricsProjector, RegistryBuilder, RegistryOptions, RunRegistry,
};
pub use runscope_recordlog::{LogContents, RecordLogReader, ScanOptions, ScanStats};
