//! Core types for runscope
//!
//! This crate defines the shared vocabulary of the workspace:
//! - [`Value`]: discriminated JSON-like value tree
//! - [`RunId`], [`RunDirName`]: run identity and the directory naming grammar
//! - [`Run`], [`MediaFile`], [`HistoryRow`]: the reconstructed run model
//! - [`Outcome`]: loaded / absent / degraded results of best-effort loads
//! - [`Error`]: failures surfaced to callers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod outcome;
pub mod run;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use outcome::Outcome;
pub use run::{MediaFile, Run};
pub use types::{HistoryRow, RunDirName, RunId, RUN_TIMESTAMP_FORMAT};
pub use value::{insert_path, lookup_path, remove_path, Map, Value};
