//! Storage layer for the issue corpus.
//!
//! Provides a local, queryable copy of an issue-tracker corpus using `rusqlite`,
//! and exposes it to the aggregator through [`IssueSource`].
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format (e.g., `2024-01-15T10:30:00Z`),
//! so lexicographic ordering matches chronological ordering.
//!
//! ## Labels
//!
//! The `labels` column of `issues` stores a JSON array of label names, in the
//! order the tracker reported them.
//!
//! ## Timeline Order
//!
//! Events and comments carry a `seq` column holding their position in the
//! imported document. Re-importing an issue replaces its timeline wholesale.

mod document;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use thiserror::Error;
use ws_core::{
    Issue, IssueComment, IssueEvent, IssueEventType, IssueKey, IssueSource, Repository,
    ValidationError,
};

pub use document::{CommentDocument, EventDocument, IssueDocument};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored row failed core validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// An issue number or sequence index does not fit the storage integer type.
    #[error("integer out of storage range: {0}")]
    IntegerRange(#[from] std::num::TryFromIntError),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for {context}: {timestamp}")]
    TimestampParse {
        context: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// Failed to encode or decode the labels column.
    #[error("invalid labels for {context}")]
    InvalidLabels {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Row counts of the stored corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CorpusStats {
    pub repositories: i64,
    pub issues: i64,
    pub events: i64,
    pub comments: i64,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS repositories (
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                PRIMARY KEY (owner, name)
            );

            CREATE TABLE IF NOT EXISTS issues (
                owner TEXT NOT NULL,
                repo TEXT NOT NULL,
                number INTEGER NOT NULL,
                title TEXT NOT NULL,
                author TEXT,
                created_at TEXT NOT NULL,
                closed_at TEXT,
                is_pull_request INTEGER NOT NULL DEFAULT 0,
                not_exist INTEGER NOT NULL DEFAULT 0,
                labels TEXT NOT NULL DEFAULT '[]',
                PRIMARY KEY (owner, repo, number),
                FOREIGN KEY (owner, repo) REFERENCES repositories(owner, name) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_issues_author ON issues(author);
            CREATE INDEX IF NOT EXISTS idx_issues_created ON issues(created_at);

            CREATE TABLE IF NOT EXISTS issue_events (
                owner TEXT NOT NULL,
                repo TEXT NOT NULL,
                number INTEGER NOT NULL,
                seq INTEGER NOT NULL,
                type TEXT NOT NULL,
                actor TEXT,
                created_at TEXT NOT NULL,
                PRIMARY KEY (owner, repo, number, seq),
                FOREIGN KEY (owner, repo, number)
                    REFERENCES issues(owner, repo, number) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_issue_events_actor ON issue_events(actor);

            CREATE TABLE IF NOT EXISTS issue_comments (
                owner TEXT NOT NULL,
                repo TEXT NOT NULL,
                number INTEGER NOT NULL,
                seq INTEGER NOT NULL,
                author TEXT,
                created_at TEXT NOT NULL,
                PRIMARY KEY (owner, repo, number, seq),
                FOREIGN KEY (owner, repo, number)
                    REFERENCES issues(owner, repo, number) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_issue_comments_author ON issue_comments(author);
            ",
        )?;
        Ok(())
    }

    /// Imports a single issue document. See [`Database::import_issues`].
    pub fn import_issue(&mut self, doc: &IssueDocument) -> Result<(), DbError> {
        self.import_issues(std::slice::from_ref(doc)).map(|_| ())
    }

    /// Imports issue documents in one transaction.
    ///
    /// An issue already in the corpus is updated in place and its events and
    /// comments are replaced by those of the document.
    pub fn import_issues(&mut self, docs: &[IssueDocument]) -> Result<usize, DbError> {
        if docs.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        for doc in docs {
            import_document(&tx, doc)?;
        }
        tx.commit()?;
        tracing::debug!(issues = docs.len(), "imported issue documents");
        Ok(docs.len())
    }

    /// Counts the rows of each corpus table.
    pub fn corpus_stats(&self) -> Result<CorpusStats, DbError> {
        let count = |table: &str| -> Result<i64, DbError> {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
        };
        Ok(CorpusStats {
            repositories: count("repositories")?,
            issues: count("issues")?,
            events: count("issue_events")?,
            comments: count("issue_comments")?,
        })
    }
}

fn import_document(conn: &Connection, doc: &IssueDocument) -> Result<(), DbError> {
    let repo = doc.repository()?;
    let key = IssueKey::new(&repo, doc.number);
    let number = i64::try_from(doc.number)?;
    let labels = serde_json::to_string(&doc.labels).map_err(|source| DbError::InvalidLabels {
        context: key.to_string(),
        source,
    })?;

    conn.execute(
        "INSERT OR IGNORE INTO repositories (owner, name) VALUES (?, ?)",
        params![repo.owner(), repo.name()],
    )?;
    conn.execute(
        "
        INSERT INTO issues
        (owner, repo, number, title, author, created_at, closed_at, is_pull_request, not_exist, labels)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (owner, repo, number) DO UPDATE SET
            title = excluded.title,
            author = excluded.author,
            created_at = excluded.created_at,
            closed_at = excluded.closed_at,
            is_pull_request = excluded.is_pull_request,
            not_exist = excluded.not_exist,
            labels = excluded.labels
        ",
        params![
            repo.owner(),
            repo.name(),
            number,
            doc.title,
            doc.user,
            format_timestamp(doc.created_at),
            doc.closed_at.map(format_timestamp),
            doc.pull_request,
            doc.not_exist,
            labels,
        ],
    )?;

    conn.execute(
        "DELETE FROM issue_events WHERE owner = ? AND repo = ? AND number = ?",
        params![repo.owner(), repo.name(), number],
    )?;
    conn.execute(
        "DELETE FROM issue_comments WHERE owner = ? AND repo = ? AND number = ?",
        params![repo.owner(), repo.name(), number],
    )?;

    let mut insert_event = conn.prepare_cached(
        "
        INSERT INTO issue_events (owner, repo, number, seq, type, actor, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ",
    )?;
    for (seq, event) in doc.events.iter().enumerate() {
        insert_event.execute(params![
            repo.owner(),
            repo.name(),
            number,
            i64::try_from(seq)?,
            event.kind,
            event.actor,
            format_timestamp(event.created_at),
        ])?;
    }

    let mut insert_comment = conn.prepare_cached(
        "
        INSERT INTO issue_comments (owner, repo, number, seq, author, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ",
    )?;
    for (seq, comment) in doc.comments.iter().enumerate() {
        insert_comment.execute(params![
            repo.owner(),
            repo.name(),
            number,
            i64::try_from(seq)?,
            comment.user,
            format_timestamp(comment.created_at),
        ])?;
    }

    Ok(())
}

/// Raw `issues` row, before timestamp and label parsing.
struct IssueRow {
    number: i64,
    title: String,
    author: Option<String>,
    created_at: String,
    closed_at: Option<String>,
    is_pull_request: bool,
    not_exist: bool,
    labels: String,
}

impl IssueRow {
    fn into_issue(self, repo: &Repository) -> Result<Issue, DbError> {
        let number = u64::try_from(self.number)?;
        let context = IssueKey::new(repo, number).to_string();
        let labels = serde_json::from_str(&self.labels).map_err(|source| DbError::InvalidLabels {
            context: context.clone(),
            source,
        })?;
        let closed_at = self
            .closed_at
            .map(|ts| parse_timestamp(&ts, &context))
            .transpose()?;
        Ok(Issue {
            number,
            title: self.title,
            user: self.author,
            created_at: parse_timestamp(&self.created_at, &context)?,
            closed_at,
            pull_request: self.is_pull_request,
            not_exist: self.not_exist,
            labels,
        })
    }
}

impl IssueSource for Database {
    type Error = DbError;

    /// Lists repositories ordered by owner, then name.
    fn repositories(&self) -> Result<Vec<Repository>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT owner, name FROM repositories ORDER BY owner ASC, name ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut repos = Vec::new();
        for row in rows {
            let (owner, name) = row?;
            repos.push(Repository::new(owner, name)?);
        }
        Ok(repos)
    }

    /// Lists a repository's issues ordered by number.
    fn issues(&self, repo: &Repository) -> Result<Vec<Issue>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT number, title, author, created_at, closed_at, is_pull_request, not_exist, labels
            FROM issues
            WHERE owner = ? AND repo = ?
            ORDER BY number ASC
            ",
        )?;
        let rows = stmt.query_map(params![repo.owner(), repo.name()], |row| {
            Ok(IssueRow {
                number: row.get(0)?,
                title: row.get(1)?,
                author: row.get(2)?,
                created_at: row.get(3)?,
                closed_at: row.get(4)?,
                is_pull_request: row.get(5)?,
                not_exist: row.get(6)?,
                labels: row.get(7)?,
            })
        })?;
        let mut issues = Vec::new();
        for row in rows {
            issues.push(row?.into_issue(repo)?);
        }
        Ok(issues)
    }

    /// Lists an issue's events in import order.
    fn events(&self, issue: &IssueKey) -> Result<Vec<IssueEvent>, DbError> {
        let number = i64::try_from(issue.number)?;
        let mut stmt = self.conn.prepare(
            "
            SELECT type, actor, created_at
            FROM issue_events
            WHERE owner = ? AND repo = ? AND number = ?
            ORDER BY seq ASC
            ",
        )?;
        let rows = stmt.query_map(params![issue.owner, issue.repo, number], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let context = issue.to_string();
        let mut events = Vec::new();
        for row in rows {
            let (kind, actor, created_at) = row?;
            events.push(IssueEvent {
                kind: IssueEventType::from(kind.as_str()),
                actor,
                created_at: parse_timestamp(&created_at, &context)?,
            });
        }
        Ok(events)
    }

    /// Lists an issue's comments in import order.
    fn comments(&self, issue: &IssueKey) -> Result<Vec<IssueComment>, DbError> {
        let number = i64::try_from(issue.number)?;
        let mut stmt = self.conn.prepare(
            "
            SELECT author, created_at
            FROM issue_comments
            WHERE owner = ? AND repo = ? AND number = ?
            ORDER BY seq ASC
            ",
        )?;
        let rows = stmt.query_map(params![issue.owner, issue.repo, number], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;
        let context = issue.to_string();
        let mut comments = Vec::new();
        for row in rows {
            let (user, created_at) = row?;
            comments.push(IssueComment {
                user,
                created_at: parse_timestamp(&created_at, &context)?,
            });
        }
        Ok(comments)
    }
}

fn parse_timestamp(timestamp: &str, context: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            context: context.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
