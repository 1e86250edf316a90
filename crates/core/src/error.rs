//! Error types for runscope
//!
//! Only failures a caller must react to are errors. Missing sidecars, missing
//! or damaged record logs and unparsable timestamps are modelled as
//! [`Outcome`](crate::Outcome) values and never reach this type.

use thiserror::Error;

/// All runscope errors
#[derive(Debug, Error)]
pub enum Error {
    /// Requested run identifier does not exist under the registry root
    #[error("run {run_id} not found")]
    RunNotFound {
        /// Identifier that was requested
        run_id: String,
    },

    /// Registry root is missing or not a directory
    #[error("invalid root directory: {0}")]
    InvalidRoot(String),

    /// Operation needs write access but the registry is read-only
    #[error("read-only registry: {0}")]
    ReadOnly(String),

    /// I/O error on an explicit operation
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for runscope operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Construct a not-found error
    pub fn run_not_found(run_id: impl Into<String>) -> Self {
        Error::RunNotFound {
            run_id: run_id.into(),
        }
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::RunNotFound { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
