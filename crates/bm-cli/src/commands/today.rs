//! Today command: feed and diaper totals since local midnight.

use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use bm_client::{RemoteStore, Repository};
use bm_core::aggregation::{DiaperSummary, FeedSummary, diaper_today_summary, feed_today_summary};
use bm_core::display::format_ounces;
use bm_core::{Diaper, Feed};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

/// Today's numbers for both tabs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayReport {
    pub generated_at: DateTime<Utc>,
    pub timezone: String,
    pub feeds: FeedSummary,
    pub diapers: DiaperSummary,
}

/// Name of the host's time zone, as reported for `chrono::Local`.
pub fn local_zone_name() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "local".to_string())
}

/// Prints today's totals. `timezone` names the zone of `now`.
pub async fn run<S, W, Tz>(
    writer: &mut W,
    feeds: &Repository<'_, S, Feed>,
    diapers: &Repository<'_, S, Diaper>,
    json: bool,
    now: &DateTime<Tz>,
    timezone: &str,
) -> Result<()>
where
    S: RemoteStore,
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let feed_events = feeds.list_all_or_empty().await;
    let diaper_events = diapers.list_all_or_empty().await;

    let report = TodayReport {
        generated_at: now.with_timezone(&Utc),
        timezone: timezone.to_string(),
        feeds: feed_today_summary(&feed_events, now),
        diapers: diaper_today_summary(&diaper_events, now),
    };

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        render(writer, &report)?;
    }
    Ok(())
}

/// Formats the human-readable summary.
pub fn render<W: Write>(writer: &mut W, report: &TodayReport) -> Result<()> {
    let now = report.generated_at;
    let feeds = &report.feeds;
    let diapers = &report.diapers;

    writeln!(writer, "FEEDS TODAY")?;
    writeln!(writer, "───────────")?;
    writeln!(writer, "Total:       {} oz", format_ounces(feeds.total_oz))?;
    writeln!(writer, "Feeds:       {}", feeds.feed_count)?;
    writeln!(writer, "Avg/feed:    {} oz", feeds.avg_label())?;
    writeln!(
        writer,
        "Last feed:   {}",
        feeds.since_last(now).as_deref().unwrap_or("none yet")
    )?;

    writeln!(writer)?;
    writeln!(writer, "DIAPERS TODAY")?;
    writeln!(writer, "─────────────")?;
    writeln!(writer, "Total:       {}", diapers.total)?;
    writeln!(writer, "Wet:         {}", diapers.wet)?;
    writeln!(writer, "Dirty:       {}", diapers.dirty)?;
    writeln!(
        writer,
        "Last change: {}",
        diapers.since_last(now).as_deref().unwrap_or("none yet")
    )?;
    Ok(())
}
