//! Time windows for scoping touches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Returns true if `t` lies in the half-open interval `[start, end)`.
///
/// No validation is performed: when `end <= start` nothing is in scope.
pub fn in_scope(t: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    start <= t && t < end
}

/// A half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeScope {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeScope {
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Returns true if `t` falls inside this window.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        in_scope(t, self.start, self.end)
    }

    /// Returns true if no timestamp can fall inside this window.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}
