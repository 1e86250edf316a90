//! Error types for record log decoding
//!
//! These never reach registry callers; the reader folds them into
//! `Outcome::Degraded` reasons or per-chunk statistics.

use thiserror::Error;

/// Record log decoding errors
#[derive(Debug, Error)]
pub enum LogError {
    /// I/O error while reading the log
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File header is short or carries the wrong ident/magic/version
    #[error("bad file header: {0}")]
    BadHeader(String),

    /// A chunk payload is not a well-formed record message
    #[error("malformed record: {0}")]
    Malformed(String),
}

impl LogError {
    /// Construct a malformed-record error
    pub fn malformed(msg: impl Into<String>) -> Self {
        LogError::Malformed(msg.into())
    }
}

/// Result type for record log operations
pub type LogResult<T> = std::result::Result<T, LogError>;
