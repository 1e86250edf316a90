//! Best-effort load outcomes
//!
//! Every source a run is assembled from (sidecar files, the record log) may
//! be missing or unreadable without that being an error. [`Outcome`] keeps the
//! distinction explicit:
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | `Loaded` | Source read and parsed |
//! | `Absent` | Source does not exist; no data from it |
//! | `Degraded` | Source exists but could not be used; the reason is kept for logging |
//!
//! Neither `Absent` nor `Degraded` is ever surfaced to callers as an error.

/// Outcome of a best-effort load
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Source read successfully
    Loaded(T),
    /// Source does not exist
    Absent,
    /// Source exists but could not be used
    Degraded {
        /// Why the source was unusable
        reason: String,
    },
}

impl<T> Outcome<T> {
    /// Construct a degraded outcome
    pub fn degraded(reason: impl Into<String>) -> Self {
        Outcome::Degraded {
            reason: reason.into(),
        }
    }

    /// Check if the source was loaded
    pub fn is_loaded(&self) -> bool {
        matches!(self, Outcome::Loaded(_))
    }

    /// Check if the source was absent
    pub fn is_absent(&self) -> bool {
        matches!(self, Outcome::Absent)
    }

    /// Check if the source was degraded
    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    /// Borrow the loaded value
    pub fn as_ref(&self) -> Outcome<&T> {
        match self {
            Outcome::Loaded(v) => Outcome::Loaded(v),
            Outcome::Absent => Outcome::Absent,
            Outcome::Degraded { reason } => Outcome::Degraded {
                reason: reason.clone(),
            },
        }
    }

    /// Map the loaded value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Loaded(v) => Outcome::Loaded(f(v)),
            Outcome::Absent => Outcome::Absent,
            Outcome::Degraded { reason } => Outcome::Degraded { reason },
        }
    }

    /// Chain another best-effort step on the loaded value
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Outcome::Loaded(v) => f(v),
            Outcome::Absent => Outcome::Absent,
            Outcome::Degraded { reason } => Outcome::Degraded { reason },
        }
    }

    /// Collapse to `Option`, dropping the absent/degraded distinction
    pub fn loaded(self) -> Option<T> {
        match self {
            Outcome::Loaded(v) => Some(v),
            _ => None,
        }
    }

    /// Reason string for degraded outcomes
    pub fn degraded_reason(&self) -> Option<&str> {
        match self {
            Outcome::Degraded { reason } => Some(reason),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for Outcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Outcome::Loaded(v),
            None => Outcome::Absent,
        }
    }
}
