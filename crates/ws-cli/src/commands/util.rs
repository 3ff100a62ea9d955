//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use regex::Regex;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").unwrap());

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Parse a datetime string as ISO 8601, a calendar date, or relative time.
///
/// Supports:
/// - ISO 8601: "2026-01-15T10:30:00Z"
/// - Date: "2026-01-15" (midnight UTC)
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_datetime(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::default()).and_utc());
    }

    // Try relative time: "N hours/minutes/days/weeks ago"
    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid datetime: {s}. Use ISO 8601 (e.g., 2026-01-15T10:30:00Z), a date (e.g., 2026-01-15) or relative (e.g., '2 weeks ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    let duration = Duration::minutes(n * minutes_per_unit);
    Ok(Utc::now() - duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_with_offset() {
        let dt = parse_datetime("2025-01-15T10:30:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 15, 8, 30, 0).unwrap());
    }

    #[test]
    fn parses_bare_date_as_utc_midnight() {
        let dt = parse_datetime("2025-01-15").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_relative_time() {
        let before = Utc::now();
        let dt = parse_datetime("2 weeks ago").unwrap();
        let after = Utc::now();
        assert!(dt <= after - Duration::weeks(2));
        assert!(dt >= before - Duration::weeks(2));
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_datetime("last tuesday").unwrap_err();
        assert!(err.to_string().contains("Invalid datetime"));
    }

    #[test]
    fn rejects_huge_relative_values() {
        let err = parse_datetime("99999999 weeks ago").unwrap_err();
        assert!(err.to_string().contains("too large"));
    }
}
