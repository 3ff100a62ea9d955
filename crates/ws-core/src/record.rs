//! Aggregated per-issue activity records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::extract_category;
use crate::types::{Issue, IssueKey, Repository};

/// One issue's activity within a query's scope.
///
/// Records carry only derived fields; nothing links back to the source issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub title: String,

    /// Repository slug, `owner/name`.
    pub repo: String,

    /// `github.com/owner/name/issues/<number>`.
    pub link: String,

    /// Component prefix of the title, empty if there is none.
    pub category: String,

    pub labels: Vec<String>,

    /// The scoping username, set when an in-scope open was attributed.
    #[serde(default)]
    pub opened_by: String,

    /// Creation time, if the open itself was in scope.
    #[serde(default)]
    pub date_opened: Option<DateTime<Utc>>,

    /// Closing time, if closed in scope and not reopened since.
    #[serde(default)]
    pub date_closed: Option<DateTime<Utc>>,

    /// In-scope comments by the scoping user.
    #[serde(default)]
    pub comments: u32,
}

impl IssueRecord {
    /// Creates an empty record for an issue.
    pub fn new(key: &IssueKey, repo: &Repository, issue: &Issue) -> Self {
        Self {
            title: issue.title.clone(),
            repo: repo.slug(),
            link: key.link(),
            category: extract_category(&issue.title).to_string(),
            labels: issue.labels.clone(),
            opened_by: String::new(),
            date_opened: None,
            date_closed: None,
            comments: 0,
        }
    }
}
