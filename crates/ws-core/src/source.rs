//! The iteration interface a corpus exposes to the aggregator.

use std::collections::HashMap;
use std::convert::Infallible;

use crate::types::{Issue, IssueComment, IssueEvent, IssueKey, Repository};

/// A hierarchical issue-tracker corpus.
///
/// Repositories yield issues, and issues yield their events and comments.
/// Any enumeration may fail; the aggregator hands such errors back to its
/// caller untouched, so implementations pick whatever error type suits them.
pub trait IssueSource {
    type Error;

    /// Lists every repository in the corpus.
    fn repositories(&self) -> Result<Vec<Repository>, Self::Error>;

    /// Lists the issues of one repository, pull requests and tombstones included.
    fn issues(&self, repo: &Repository) -> Result<Vec<Issue>, Self::Error>;

    /// Lists the timeline events of one issue.
    fn events(&self, issue: &IssueKey) -> Result<Vec<IssueEvent>, Self::Error>;

    /// Lists the comments of one issue.
    fn comments(&self, issue: &IssueKey) -> Result<Vec<IssueComment>, Self::Error>;
}

/// An in-memory corpus.
///
/// Repositories and issues enumerate in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    repositories: Vec<Repository>,
    issues: HashMap<Repository, Vec<Issue>>,
    events: HashMap<IssueKey, Vec<IssueEvent>>,
    comments: HashMap<IssueKey, Vec<IssueComment>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a repository. Adding it twice is a no-op.
    pub fn add_repository(&mut self, repo: &Repository) {
        if !self.issues.contains_key(repo) {
            self.repositories.push(repo.clone());
            self.issues.insert(repo.clone(), Vec::new());
        }
    }

    /// Adds an issue, registering its repository if needed.
    ///
    /// Returns the key to attach events and comments to.
    pub fn add_issue(&mut self, repo: &Repository, issue: Issue) -> IssueKey {
        self.add_repository(repo);
        let key = IssueKey::new(repo, issue.number);
        self.issues.entry(repo.clone()).or_default().push(issue);
        key
    }

    pub fn add_event(&mut self, issue: &IssueKey, event: IssueEvent) {
        self.events.entry(issue.clone()).or_default().push(event);
    }

    pub fn add_comment(&mut self, issue: &IssueKey, comment: IssueComment) {
        self.comments.entry(issue.clone()).or_default().push(comment);
    }
}

impl IssueSource for MemorySource {
    type Error = Infallible;

    fn repositories(&self) -> Result<Vec<Repository>, Self::Error> {
        Ok(self.repositories.clone())
    }

    fn issues(&self, repo: &Repository) -> Result<Vec<Issue>, Self::Error> {
        Ok(self.issues.get(repo).cloned().unwrap_or_default())
    }

    fn events(&self, issue: &IssueKey) -> Result<Vec<IssueEvent>, Self::Error> {
        Ok(self.events.get(issue).cloned().unwrap_or_default())
    }

    fn comments(&self, issue: &IssueKey) -> Result<Vec<IssueComment>, Self::Error> {
        Ok(self.comments.get(issue).cloned().unwrap_or_default())
    }
}
