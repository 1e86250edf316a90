//! Run reconstruction engine
//!
//! Turns a directory of wandb run directories into canonical [`Run`] values
//! and columnar metrics:
//!
//! - [`sidecar`]: `files/` JSON/YAML sidecars
//! - [`aggregate`]: merge and precedence rules producing one [`Run`]
//! - [`metrics`]: history rows → [`MetricSeries`]
//! - [`media`]: gif/mp4 artifacts
//! - [`registry`]: [`RunRegistry`], discovery plus caches
//!
//! [`Run`]: runscope_core::Run

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod log_cache;
pub mod media;
pub mod metrics;
pub mod options;
pub mod registry;
pub mod sidecar;

pub use aggregate::{
    coerce_arg_value, config_from_args, merge_config, resolve_display_name, RunAggregator,
    RunDirectory,
};
pub use log_cache::{LogCache, LogSummary};
pub use metrics::{MetricSeries, MetricsProjector, AXIS_KEYS};
pub use options::{AccessMode, RegistryBuilder, RegistryOptions};
pub use registry::RunRegistry;
pub use sidecar::{SidecarLoader, Sidecars};
