//! Core types for runscope
//!
//! This module defines the fundamental identifiers used throughout the system:
//! - [`RunId`]: Stable identifier of a run, taken from its directory name
//! - [`RunDirName`]: Parsed form of a run directory name
//! - [`HistoryRow`]: One logged step of a run's history

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

use crate::value::Map;

/// One logged step: ordered key → scalar mapping.
pub type HistoryRow = Map;

/// Directory naming grammar: `[offline-]run-YYYYMMDD_HHMMSS-<run id>`
static RUN_DIR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(offline-)?run-(\d{8}_\d{6})-([a-z0-9]+)$").expect("run dir pattern is valid")
});

/// Timestamp layout embedded in run directory names
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Unique identifier for a run
///
/// Lowercase alphanumeric, as assigned by the producer and embedded in the
/// run directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Create a RunId, validating the lowercase alphanumeric alphabet
    ///
    /// # Examples
    ///
    /// ```
    /// use runscope_core::RunId;
    ///
    /// assert!(RunId::parse("a1b2c3").is_some());
    /// assert!(RunId::parse("A1B2").is_none());
    /// assert!(RunId::parse("").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
        valid.then(|| RunId(raw.to_string()))
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RunId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RunId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for RunId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RunId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Parsed run directory name
///
/// A directory is a run iff its name matches the naming grammar. The embedded
/// timestamp may still fail calendar validation (e.g. month 13), in which case
/// `created_at` is `None` but the directory is still a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirName {
    /// `offline-` prefix present
    pub is_offline: bool,
    /// Raw `YYYYMMDD_HHMMSS` text
    pub timestamp: String,
    /// Parsed creation time, if the timestamp is a valid date-time
    pub created_at: Option<NaiveDateTime>,
    /// Run identifier
    pub run_id: RunId,
}

impl RunDirName {
    /// Parse a directory name against the naming grammar
    ///
    /// # Examples
    ///
    /// ```
    /// use runscope_core::RunDirName;
    ///
    /// let parsed = RunDirName::parse("offline-run-20240102_030405-abc123").unwrap();
    /// assert!(parsed.is_offline);
    /// assert_eq!(parsed.run_id.as_str(), "abc123");
    /// assert!(RunDirName::parse("latest-run").is_none());
    /// ```
    pub fn parse(name: &str) -> Option<Self> {
        let caps = RUN_DIR_PATTERN.captures(name)?;
        let timestamp = caps.get(2)?.as_str().to_string();
        let run_id = RunId::parse(caps.get(3)?.as_str())?;
        let created_at = NaiveDateTime::parse_from_str(&timestamp, RUN_TIMESTAMP_FORMAT).ok();
        Some(RunDirName {
            is_offline: caps.get(1).is_some(),
            timestamp,
            created_at,
            run_id,
        })
    }
}
