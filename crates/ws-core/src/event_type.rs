//! Issue event type tags.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The type tag of an issue timeline event.
///
/// Only closing and reopening affect aggregation. Every other tag the
/// tracker emits (labeling, assignment, renames...) is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IssueEventType {
    Closed,
    Reopened,
    Other(String),
}

impl IssueEventType {
    /// String form as stored by the tracker.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Closed => "closed",
            Self::Reopened => "reopened",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for IssueEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueEventType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<&str> for IssueEventType {
    fn from(s: &str) -> Self {
        match s {
            "closed" => Self::Closed,
            "reopened" => Self::Reopened,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Serialize for IssueEventType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IssueEventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}
