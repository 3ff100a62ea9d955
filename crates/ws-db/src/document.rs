//! Corpus interchange documents.
//!
//! A corpus dump is a JSONL stream with one [`IssueDocument`] per line,
//! each carrying the issue together with its full timeline and comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ws_core::{Issue, IssueComment, IssueEvent, IssueEventType, Repository, ValidationError};

/// One issue with its events and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDocument {
    pub owner: String,
    pub repo: String,
    pub number: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pull_request: bool,
    #[serde(default)]
    pub not_exist: bool,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub events: Vec<EventDocument>,
    #[serde(default)]
    pub comments: Vec<CommentDocument>,
}

/// A timeline event inside an [`IssueDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDocument {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A comment inside an [`IssueDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl IssueDocument {
    /// The repository this issue belongs to.
    pub fn repository(&self) -> Result<Repository, ValidationError> {
        Repository::new(self.owner.as_str(), self.repo.as_str())
    }

    /// The issue itself, without its timeline.
    pub fn issue(&self) -> Issue {
        Issue {
            number: self.number,
            title: self.title.clone(),
            user: self.user.clone(),
            created_at: self.created_at,
            closed_at: self.closed_at,
            pull_request: self.pull_request,
            not_exist: self.not_exist,
            labels: self.labels.clone(),
        }
    }

    pub fn issue_events(&self) -> Vec<IssueEvent> {
        self.events
            .iter()
            .map(|event| IssueEvent {
                kind: IssueEventType::from(event.kind.as_str()),
                actor: event.actor.clone(),
                created_at: event.created_at,
            })
            .collect()
    }

    pub fn issue_comments(&self) -> Vec<IssueComment> {
        self.comments
            .iter()
            .map(|comment| IssueComment {
                user: comment.user.clone(),
                created_at: comment.created_at,
            })
            .collect()
    }
}
