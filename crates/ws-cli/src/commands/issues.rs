//! Issues command for per-user activity summaries.
//!
//! This module implements `ws issues`, which aggregates the local corpus over
//! a time window and prints one line per touched issue, or the records as JSON.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use ws_core::{ActivityQuery, IssueRecord, TimeScope, aggregate_issues};
use ws_db::Database;

use super::util::parse_datetime;
use crate::Config;

#[derive(Debug, Args)]
pub struct IssuesArgs {
    /// Start of the window, inclusive (RFC 3339, YYYY-MM-DD, or e.g. '2 weeks ago').
    #[arg(long)]
    pub start: String,

    /// End of the window, exclusive. Defaults to now.
    #[arg(long)]
    pub end: Option<String>,

    /// Only consider repositories with this name.
    #[arg(long)]
    pub repo: Option<String>,

    /// Only count touches by this login.
    #[arg(long)]
    pub user: Option<String>,

    /// Output records as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &IssuesArgs, config: &Config) -> Result<()> {
    let query = build_query(args, config, Utc::now())?;
    tracing::debug!(?query, "running issue query");

    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    let records = aggregate_issues(&db, &query).context("failed to aggregate issue activity")?;

    if args.json {
        writeln!(writer, "{}", format_issues_json(&records)?)?;
    } else {
        write!(writer, "{}", format_issues(&query, &records))?;
    }
    Ok(())
}

/// Builds the query from arguments, falling back to configured defaults.
fn build_query(args: &IssuesArgs, config: &Config, now: DateTime<Utc>) -> Result<ActivityQuery> {
    let start = parse_datetime(&args.start).context("invalid --start")?;
    let end = match &args.end {
        Some(end) => parse_datetime(end).context("invalid --end")?,
        None => now,
    };
    if end <= start {
        tracing::warn!(%start, %end, "time window is empty");
    }

    let mut query = ActivityQuery::new(TimeScope::new(start, end));
    if let Some(repo) = args.repo.as_ref().or(config.repository.as_ref()) {
        query = query.with_repository(repo.as_str());
    }
    if let Some(user) = args.user.as_ref().or(config.username.as_ref()) {
        query = query.with_username(user.as_str());
    }
    Ok(query)
}

// ========== Human-Readable Output ==========

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

/// Format records as a table.
pub fn format_issues(query: &ActivityQuery, records: &[IssueRecord]) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "ISSUES {} to {}",
        query.scope.start.format("%Y-%m-%d %H:%M UTC"),
        query.scope.end.format("%Y-%m-%d %H:%M UTC")
    )
    .unwrap();
    writeln!(output, "User: {}", query.username().unwrap_or("(anyone)")).unwrap();
    writeln!(output, "Repository: {}", query.repository().unwrap_or("(all)")).unwrap();
    writeln!(output).unwrap();

    if records.is_empty() {
        writeln!(output, "No issue activity in this window.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<40}  {:<10}  {:<10}  {:>8}  Title",
        "Link", "Opened", "Closed", "Comments"
    )
    .unwrap();
    for record in records {
        writeln!(
            output,
            "{:<40}  {:<10}  {:<10}  {:>8}  {}",
            record.link,
            format_date(record.date_opened),
            format_date(record.date_closed),
            record.comments,
            record.title
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    let noun = if records.len() == 1 { "issue" } else { "issues" };
    writeln!(output, "{} {noun}", records.len()).unwrap();

    output
}

// ========== JSON Output ==========

pub fn format_issues_json(records: &[IssueRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).context("failed to encode issue records")
}
