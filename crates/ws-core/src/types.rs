//! Corpus type definitions with validation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event_type::IssueEventType;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

/// A repository, identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RepositoryParts", into = "RepositoryParts")]
pub struct Repository {
    owner: String,
    name: String,
}

#[derive(Serialize, Deserialize)]
struct RepositoryParts {
    owner: String,
    name: String,
}

impl Repository {
    /// Creates a repository after validating both parts are non-empty.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, ValidationError> {
        let owner = owner.into();
        let name = name.into();
        if owner.is_empty() {
            return Err(ValidationError::Empty {
                field: "repository owner",
            });
        }
        if name.is_empty() {
            return Err(ValidationError::Empty {
                field: "repository name",
            });
        }
        Ok(Self { owner, name })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the `owner/name` slug.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl TryFrom<RepositoryParts> for Repository {
    type Error = ValidationError;

    fn try_from(parts: RepositoryParts) -> Result<Self, Self::Error> {
        Self::new(parts.owner, parts.name)
    }
}

impl From<Repository> for RepositoryParts {
    fn from(repo: Repository) -> Self {
        Self {
            owner: repo.owner,
            name: repo.name,
        }
    }
}

/// Stable identity of an issue across the corpus.
///
/// Issue numbers are only unique within a repository, so the key carries
/// the owning repository as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IssueKey {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl IssueKey {
    pub fn new(repo: &Repository, number: u64) -> Self {
        Self {
            owner: repo.owner.clone(),
            repo: repo.name.clone(),
            number,
        }
    }

    /// Returns the web link, e.g. `github.com/golang/go/issues/123`.
    pub fn link(&self) -> String {
        format!("github.com/{}/{}/issues/{}", self.owner, self.repo, self.number)
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// An issue as exposed by a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Number visible in the tracker UI.
    pub number: u64,
    pub title: String,
    /// Login of the author, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub created_at: DateTime<Utc>,
    /// When the issue was last closed; `None` if it never was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    /// The record is a pull request rather than an issue.
    #[serde(default)]
    pub pull_request: bool,
    /// The record is a tombstone for a deleted or transferred issue.
    #[serde(default)]
    pub not_exist: bool,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Issue {
    /// Creates an open, unlabelled issue.
    pub fn new(number: u64, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            number,
            title: title.into(),
            user: None,
            created_at,
            closed_at: None,
            pull_request: false,
            not_exist: false,
            labels: Vec::new(),
        }
    }

    /// Returns true if this record should never be reported.
    pub const fn is_excluded(&self) -> bool {
        self.pull_request || self.not_exist
    }
}

/// A timeline event on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueEvent {
    #[serde(rename = "type")]
    pub kind: IssueEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A comment on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueComment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub created_at: DateTime<Utc>,
}
