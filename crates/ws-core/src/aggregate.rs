//! Issue activity aggregation.
//!
//! Walks a corpus (repositories → issues → events and comments) and merges
//! every qualifying touch on an issue into a single [`IssueRecord`].
//!
//! # Qualification
//!
//! Pull requests and tombstones are skipped outright. For the rest:
//!
//! 1. Without a username every issue is included.
//! 2. An in-scope open by the user (or by anyone, when unscoped) records the
//!    opener and the creation date.
//! 3. An in-scope `closed` event by the user records the issue's closing
//!    time; a later in-scope `reopened` event clears it again. Reopening never
//!    creates a record on its own.
//! 4. Each in-scope comment by the user is counted. Comments are only counted
//!    for a named user.
//!
//! Records are returned sorted by link, as strings.

use std::collections::HashMap;

use crate::event_type::IssueEventType;
use crate::record::IssueRecord;
use crate::scope::TimeScope;
use crate::source::IssueSource;
use crate::types::{Issue, IssueKey, Repository};

/// What to aggregate: a time window, plus optional repository and user filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityQuery {
    pub scope: TimeScope,
    repository: Option<String>,
    username: Option<String>,
}

impl ActivityQuery {
    /// Creates an unfiltered query over `scope`.
    pub const fn new(scope: TimeScope) -> Self {
        Self {
            scope,
            repository: None,
            username: None,
        }
    }

    /// Restricts the query to repositories with this name, under any owner.
    ///
    /// An empty name leaves the query unrestricted.
    #[must_use]
    pub fn with_repository(mut self, name: impl Into<String>) -> Self {
        self.repository = Some(name.into()).filter(|name| !name.is_empty());
        self
    }

    /// Scopes touches to this user's login.
    ///
    /// An empty login leaves the query unscoped.
    #[must_use]
    pub fn with_username(mut self, login: impl Into<String>) -> Self {
        self.username = Some(login.into()).filter(|login| !login.is_empty());
        self
    }

    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    fn matches_repository(&self, repo: &Repository) -> bool {
        self.repository().is_none_or(|name| repo.name() == name)
    }

    /// True when unscoped, or when `login` is the scoping user.
    fn is_actor(&self, login: Option<&str>) -> bool {
        self.username().is_none_or(|user| login == Some(user))
    }
}

/// Aggregates per-issue activity from `source` according to `query`.
///
/// Any error from the source aborts the whole aggregation and is returned
/// as-is; no partial result is produced.
pub fn aggregate_issues<S: IssueSource>(
    source: &S,
    query: &ActivityQuery,
) -> Result<Vec<IssueRecord>, S::Error> {
    let mut records: HashMap<IssueKey, IssueRecord> = HashMap::new();
    let mut repos_visited = 0_usize;
    let mut issues_visited = 0_usize;

    for repo in source.repositories()? {
        if !query.matches_repository(&repo) {
            tracing::trace!(%repo, "repository filtered out");
            continue;
        }
        repos_visited += 1;

        for issue in source.issues(&repo)? {
            if issue.is_excluded() {
                tracing::trace!(
                    %repo,
                    number = issue.number,
                    pull_request = issue.pull_request,
                    not_exist = issue.not_exist,
                    "skipping excluded issue"
                );
                continue;
            }
            issues_visited += 1;
            collect_issue(source, query, &repo, &issue, &mut records)?;
        }
    }

    let mut issues: Vec<IssueRecord> = records.into_values().collect();
    issues.sort_by(|a, b| a.link.cmp(&b.link));

    tracing::debug!(
        repos_visited,
        issues_visited,
        records = issues.len(),
        "aggregated issue activity"
    );
    Ok(issues)
}

/// Applies every touch on one issue to the accumulator.
fn collect_issue<S: IssueSource>(
    source: &S,
    query: &ActivityQuery,
    repo: &Repository,
    issue: &Issue,
    records: &mut HashMap<IssueKey, IssueRecord>,
) -> Result<(), S::Error> {
    let key = IssueKey::new(repo, issue.number);
    let username = query.username();

    if username.is_none() {
        record_for(records, &key, repo, issue);
    }

    if query.is_actor(issue.user.as_deref()) && query.scope.contains(issue.created_at) {
        let record = record_for(records, &key, repo, issue);
        record.opened_by = username.unwrap_or_default().to_string();
        record.date_opened = Some(issue.created_at);
    }

    for event in source.events(&key)? {
        if !query.is_actor(event.actor.as_deref()) || !query.scope.contains(event.created_at) {
            continue;
        }
        match event.kind {
            IssueEventType::Closed => {
                record_for(records, &key, repo, issue).date_closed = issue.closed_at;
            }
            IssueEventType::Reopened => {
                if let Some(record) = records.get_mut(&key) {
                    record.date_closed = None;
                }
            }
            IssueEventType::Other(_) => {}
        }
    }

    for comment in source.comments(&key)? {
        let by_user = username.is_some_and(|user| comment.user.as_deref() == Some(user));
        if by_user && query.scope.contains(comment.created_at) {
            record_for(records, &key, repo, issue).comments += 1;
        }
    }

    Ok(())
}

/// Returns the record for `key`, creating it on first touch.
fn record_for<'a>(
    records: &'a mut HashMap<IssueKey, IssueRecord>,
    key: &IssueKey,
    repo: &Repository,
    issue: &Issue,
) -> &'a mut IssueRecord {
    records
        .entry(key.clone())
        .or_insert_with(|| IssueRecord::new(key, repo, issue))
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::source::MemorySource;
    use crate::types::{IssueComment, IssueEvent};

    fn jan(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).unwrap()
    }

    /// January 10th (noon) up to January 20th (noon).
    fn window() -> TimeScope {
        TimeScope::new(jan(10), jan(20))
    }

    fn go_repo() -> Repository {
        Repository::new("golang", "go").unwrap()
    }

    fn issue_by(number: u64, title: &str, user: &str, created_at: DateTime<Utc>) -> Issue {
        let mut issue = Issue::new(number, title, created_at);
        issue.user = Some(user.to_string());
        issue
    }

    fn event(kind: &str, actor: &str, created_at: DateTime<Utc>) -> IssueEvent {
        IssueEvent {
            kind: IssueEventType::from(kind),
            actor: Some(actor.to_string()),
            created_at,
        }
    }

    fn comment(user: &str, created_at: DateTime<Utc>) -> IssueComment {
        IssueComment {
            user: Some(user.to_string()),
            created_at,
        }
    }

    fn run(source: &MemorySource, query: &ActivityQuery) -> Vec<IssueRecord> {
        let Ok(records) = aggregate_issues(source, query);
        records
    }

    fn alice() -> ActivityQuery {
        ActivityQuery::new(window()).with_username("alice")
    }

    #[test]
    fn opened_in_scope_by_user() {
        let mut source = MemorySource::new();
        let mut issue = issue_by(1, "net/http: fix leak", "alice", jan(12));
        issue.labels = vec!["NeedsFix".to_string()];
        source.add_issue(&go_repo(), issue);

        let records = run(&source, &alice());

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.title, "net/http: fix leak");
        assert_eq!(record.repo, "golang/go");
        assert_eq!(record.link, "github.com/golang/go/issues/1");
        assert_eq!(record.category, "net/http");
        assert_eq!(record.labels, ["NeedsFix"]);
        assert_eq!(record.opened_by, "alice");
        assert_eq!(record.date_opened, Some(jan(12)));
        assert_eq!(record.date_closed, None);
        assert_eq!(record.comments, 0);
    }

    #[test]
    fn opened_by_someone_else_is_not_included() {
        let mut source = MemorySource::new();
        source.add_issue(&go_repo(), issue_by(1, "fix bug", "bob", jan(12)));

        assert!(run(&source, &alice()).is_empty());
    }

    #[test]
    fn issue_without_author_never_matches_a_user() {
        let mut source = MemorySource::new();
        source.add_issue(&go_repo(), Issue::new(1, "fix bug", jan(12)));

        assert!(run(&source, &alice()).is_empty());
    }

    #[test]
    fn many_touches_produce_one_record() {
        let mut source = MemorySource::new();
        let mut issue = issue_by(7, "cmd/go: flaky test", "alice", jan(11));
        issue.closed_at = Some(jan(15));
        let key = source.add_issue(&go_repo(), issue);
        source.add_event(&key, event("closed", "alice", jan(13)));
        source.add_event(&key, event("reopened", "alice", jan(14)));
        source.add_event(&key, event("closed", "alice", jan(15)));
        source.add_comment(&key, comment("alice", jan(12)));
        source.add_comment(&key, comment("alice", jan(13)));
        source.add_comment(&key, comment("alice", jan(16)));

        let records = run(&source, &alice());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date_opened, Some(jan(11)));
        assert_eq!(records[0].date_closed, Some(jan(15)));
        assert_eq!(records[0].comments, 3);
    }

    #[test]
    fn touches_on_scope_boundaries() {
        let mut source = MemorySource::new();
        let key = source.add_issue(&go_repo(), issue_by(1, "fix bug", "bob", jan(1)));
        source.add_comment(&key, comment("alice", jan(10)));
        source.add_comment(&key, comment("alice", jan(20)));
        source.add_comment(&key, comment("alice", jan(20) - Duration::seconds(1)));

        let records = run(&source, &alice());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].comments, 2);
    }

    #[test]
    fn open_at_start_is_in_scope_and_at_end_is_not() {
        let mut source = MemorySource::new();
        source.add_issue(&go_repo(), issue_by(1, "at start", "alice", jan(10)));
        source.add_issue(&go_repo(), issue_by(2, "at end", "alice", jan(20)));

        let records = run(&source, &alice());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].link, "github.com/golang/go/issues/1");
    }

    #[test]
    fn pull_requests_and_tombstones_are_excluded() {
        let mut source = MemorySource::new();

        let mut pr = issue_by(1, "cmd/go: add flag", "alice", jan(12));
        pr.pull_request = true;
        pr.closed_at = Some(jan(13));
        let pr_key = source.add_issue(&go_repo(), pr);
        source.add_event(&pr_key, event("closed", "alice", jan(13)));
        source.add_comment(&pr_key, comment("alice", jan(13)));

        let mut gone = issue_by(2, "spam", "alice", jan(12));
        gone.not_exist = true;
        let gone_key = source.add_issue(&go_repo(), gone);
        source.add_comment(&gone_key, comment("alice", jan(13)));

        assert!(run(&source, &alice()).is_empty());
        assert!(run(&source, &ActivityQuery::new(window())).is_empty());
    }

    #[test]
    fn close_uses_issue_closing_time() {
        let mut source = MemorySource::new();
        let mut issue = issue_by(1, "fix bug", "bob", jan(1));
        issue.closed_at = Some(jan(25));
        let key = source.add_issue(&go_repo(), issue);
        source.add_event(&key, event("closed", "alice", jan(12)));

        let records = run(&source, &alice());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date_closed, Some(jan(25)));
        assert_eq!(records[0].date_opened, None);
        assert_eq!(records[0].opened_by, "");
    }

    #[test]
    fn reopen_clears_close() {
        let mut source = MemorySource::new();
        let mut issue = issue_by(1, "fix bug", "bob", jan(1));
        issue.closed_at = Some(jan(12));
        let key = source.add_issue(&go_repo(), issue);
        source.add_event(&key, event("closed", "alice", jan(12)));
        source.add_event(&key, event("reopened", "alice", jan(14)));

        let records = run(&source, &alice());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date_closed, None);
    }

    #[test]
    fn reopen_alone_does_not_create_a_record() {
        let mut source = MemorySource::new();
        let key = source.add_issue(&go_repo(), issue_by(1, "fix bug", "bob", jan(1)));
        source.add_event(&key, event("reopened", "alice", jan(14)));

        assert!(run(&source, &alice()).is_empty());
    }

    #[test]
    fn reopen_by_someone_else_keeps_close() {
        let mut source = MemorySource::new();
        let mut issue = issue_by(1, "fix bug", "bob", jan(1));
        issue.closed_at = Some(jan(12));
        let key = source.add_issue(&go_repo(), issue);
        source.add_event(&key, event("closed", "alice", jan(12)));
        source.add_event(&key, event("reopened", "bob", jan(14)));

        let records = run(&source, &alice());

        assert_eq!(records[0].date_closed, Some(jan(12)));
    }

    #[test]
    fn out_of_scope_events_are_ignored() {
        let mut source = MemorySource::new();
        let mut issue = issue_by(1, "fix bug", "bob", jan(1));
        issue.closed_at = Some(jan(5));
        let key = source.add_issue(&go_repo(), issue);
        source.add_event(&key, event("closed", "alice", jan(5)));

        assert!(run(&source, &alice()).is_empty());
    }

    #[test]
    fn other_event_types_are_ignored() {
        let mut source = MemorySource::new();
        let key = source.add_issue(&go_repo(), issue_by(1, "fix bug", "bob", jan(1)));
        source.add_event(&key, event("labeled", "alice", jan(12)));
        source.add_event(&key, event("assigned", "alice", jan(12)));

        assert!(run(&source, &alice()).is_empty());
    }

    #[test]
    fn comments_by_other_users_are_not_counted() {
        let mut source = MemorySource::new();
        let key = source.add_issue(&go_repo(), issue_by(1, "fix bug", "alice", jan(12)));
        source.add_comment(&key, comment("bob", jan(13)));
        source.add_comment(&key, comment("alice", jan(14)));

        let records = run(&source, &alice());

        assert_eq!(records[0].comments, 1);
    }

    #[test]
    fn unscoped_includes_every_issue_once() {
        let mut source = MemorySource::new();
        let tools = Repository::new("golang", "tools").unwrap();

        // Created long before the window, never touched.
        source.add_issue(&go_repo(), issue_by(1, "old", "bob", jan(1)));

        // Opened in scope.
        source.add_issue(&go_repo(), issue_by(2, "x/net: new", "carol", jan(12)));

        // Closed in scope by anyone.
        let mut closed = issue_by(3, "closed", "dave", jan(2));
        closed.closed_at = Some(jan(15));
        let closed_key = source.add_issue(&tools, closed);
        source.add_event(&closed_key, event("closed", "erin", jan(15)));
        source.add_comment(&closed_key, comment("erin", jan(15)));

        let records = run(&source, &ActivityQuery::new(window()));

        assert_eq!(records.len(), 3);
        let by_link: HashMap<&str, &IssueRecord> =
            records.iter().map(|r| (r.link.as_str(), r)).collect();

        let old = by_link["github.com/golang/go/issues/1"];
        assert_eq!(old.date_opened, None);
        assert_eq!(old.date_closed, None);

        let new = by_link["github.com/golang/go/issues/2"];
        assert_eq!(new.date_opened, Some(jan(12)));
        assert_eq!(new.opened_by, "");
        assert_eq!(new.category, "x/net");

        let closed = by_link["github.com/golang/tools/issues/3"];
        assert_eq!(closed.date_opened, None);
        assert_eq!(closed.date_closed, Some(jan(15)));
        assert_eq!(closed.comments, 0, "comments only count for a named user");
    }

    #[test]
    fn empty_username_is_unscoped() {
        let mut source = MemorySource::new();
        source.add_issue(&go_repo(), issue_by(1, "old", "bob", jan(1)));

        let query = ActivityQuery::new(window()).with_username("");

        assert_eq!(query.username(), None);
        assert_eq!(run(&source, &query).len(), 1);
    }

    #[test]
    fn links_sort_as_strings() {
        let mut source = MemorySource::new();
        source.add_issue(&go_repo(), issue_by(2, "two", "alice", jan(12)));
        source.add_issue(&go_repo(), issue_by(10, "ten", "alice", jan(12)));
        source.add_issue(&go_repo(), issue_by(1, "one", "alice", jan(12)));

        let links: Vec<String> = run(&source, &alice())
            .into_iter()
            .map(|r| r.link)
            .collect();

        assert_eq!(
            links,
            [
                "github.com/golang/go/issues/1",
                "github.com/golang/go/issues/10",
                "github.com/golang/go/issues/2",
            ]
        );
    }

    #[test]
    fn repository_filter_matches_name_only() {
        let mut source = MemorySource::new();
        let foo = Repository::new("golang", "foo").unwrap();
        let fork = Repository::new("someone", "foo").unwrap();
        let bar = Repository::new("golang", "bar").unwrap();
        source.add_issue(&foo, issue_by(1, "a", "alice", jan(12)));
        source.add_issue(&fork, issue_by(1, "b", "alice", jan(12)));
        source.add_issue(&bar, issue_by(1, "c", "alice", jan(12)));

        let records = run(&source, &alice().with_repository("foo"));

        let repos: Vec<&str> = records.iter().map(|r| r.repo.as_str()).collect();
        assert_eq!(repos, ["golang/foo", "someone/foo"]);
    }

    #[test]
    fn inverted_window_yields_nothing_for_a_user() {
        let mut source = MemorySource::new();
        source.add_issue(&go_repo(), issue_by(1, "a", "alice", jan(12)));

        let query = ActivityQuery::new(TimeScope::new(jan(20), jan(10))).with_username("alice");

        assert!(run(&source, &query).is_empty());
    }

    /// Wraps a corpus and fails when asked for the comments of one issue.
    struct FailingSource {
        inner: MemorySource,
        fail_on: IssueKey,
    }

    #[derive(Debug, PartialEq, Eq)]
    struct CorpusUnavailable(u64);

    impl IssueSource for FailingSource {
        type Error = CorpusUnavailable;

        fn repositories(&self) -> Result<Vec<Repository>, Self::Error> {
            let Ok(repos) = self.inner.repositories();
            Ok(repos)
        }

        fn issues(&self, repo: &Repository) -> Result<Vec<Issue>, Self::Error> {
            let Ok(issues) = self.inner.issues(repo);
            Ok(issues)
        }

        fn events(&self, issue: &IssueKey) -> Result<Vec<IssueEvent>, Self::Error> {
            let Ok(events) = self.inner.events(issue);
            Ok(events)
        }

        fn comments(&self, issue: &IssueKey) -> Result<Vec<IssueComment>, Self::Error> {
            if *issue == self.fail_on {
                return Err(CorpusUnavailable(issue.number));
            }
            let Ok(comments) = self.inner.comments(issue);
            Ok(comments)
        }
    }

    #[test]
    fn source_errors_abort_aggregation() {
        let mut inner = MemorySource::new();
        inner.add_issue(&go_repo(), issue_by(1, "fine", "alice", jan(12)));
        let fail_on = inner.add_issue(&go_repo(), issue_by(2, "broken", "alice", jan(12)));

        let source = FailingSource { inner, fail_on };

        let result = aggregate_issues(&source, &ActivityQuery::new(window()));

        assert_eq!(result, Err(CorpusUnavailable(2)));
    }
}
