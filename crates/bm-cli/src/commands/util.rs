//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use bm_core::Action;
use bm_core::editor::time_of_day;
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use regex::Regex;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").expect("relative time pattern")
});

/// Pre-compiled regex for a wall-clock time like "8:05" or "20:30".
static CLOCK_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("clock time pattern"));

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// A parsed `--at` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
    /// Only the time of day; the date stays as selected.
    Clock(NaiveTime),
    /// A full instant.
    Instant(DateTime<Utc>),
}

impl When {
    /// Picker actions that select this time in `tz`.
    pub fn actions<Tz: TimeZone>(self, tz: &Tz) -> Vec<Action> {
        match self {
            Self::Clock(time) => vec![Action::SetTime(time)],
            Self::Instant(at) => {
                let local = at.with_timezone(tz);
                vec![
                    Action::SetDate(local.date_naive()),
                    Action::SetTime(local.time()),
                ]
            }
        }
    }
}

/// Parse an `--at` string as a clock time, RFC 3339, or relative time.
///
/// Supports:
/// - Clock: "8:05", "20:30"
/// - RFC 3339: "2026-01-15T10:30:00Z"
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_when(s: &str, now: DateTime<Utc>) -> anyhow::Result<When> {
    let s = s.trim();

    if let Some(caps) = CLOCK_TIME_RE.captures(s) {
        let hour: u32 = caps[1].parse().context("failed to parse hour")?;
        let minute: u32 = caps[2].parse().context("failed to parse minute")?;
        return Ok(When::Clock(time_of_day(hour, minute)?));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(When::Instant(dt.with_timezone(&Utc)));
    }

    // Try relative time: "N hours/minutes/days/weeks ago"
    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid time: {s}. Use HH:MM, RFC 3339 (e.g., 2026-01-15T10:30:00Z) or relative (e.g., '30 minutes ago')"
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

    Ok(When::Instant(now - Duration::minutes(n * minutes_per_unit)))
}

/// Picker actions for an optional `--at` value, relative to `now`.
pub fn at_actions<Tz: TimeZone>(at: Option<&str>, now: &DateTime<Tz>) -> anyhow::Result<Vec<Action>> {
    match at {
        Some(s) => Ok(parse_when(s, now.with_timezone(&Utc))?.actions(&now.timezone())),
        None => Ok(Vec::new()),
    }
}

/// Formats a remaining lifetime as "Xh Ym" or "Ym".
pub fn format_remaining(remaining: Duration) -> String {
    let total_minutes = remaining.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
