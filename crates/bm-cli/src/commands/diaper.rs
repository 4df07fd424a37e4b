//! `bm diaper` subcommands.

use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use bm_client::{RemoteStore, Repository};
use bm_core::aggregation::{DayBucket, DiaperMetrics, diaper_chart_max, diaper_daily_series};
use bm_core::display::progress_bar;
use bm_core::{Action, Diaper};
use chrono::{DateTime, TimeZone};

use super::events;
use super::util::at_actions;
use crate::cli::DiaperAction;

pub async fn run<S, W, Tz>(
    writer: &mut W,
    repo: &Repository<'_, S, Diaper>,
    action: &DiaperAction,
    window_days: u32,
    now: &DateTime<Tz>,
) -> Result<()>
where
    S: RemoteStore,
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match action {
        DiaperAction::Add { at, kind } => {
            let mut actions = at_actions(at.as_deref(), now)?;
            actions.push(Action::SetDiaperType(*kind));
            events::save(writer, repo, None, actions, now).await
        }
        DiaperAction::Edit { id, at, kind } => {
            let mut actions = at_actions(at.as_deref(), now)?;
            actions.extend(kind.map(Action::SetDiaperType));
            events::save(writer, repo, Some(id.as_str()), actions, now).await
        }
        DiaperAction::Rm { id } => events::remove(writer, repo, id, now).await,
        DiaperAction::List { limit, json } => events::list(writer, repo, *limit, *json, now).await,
        DiaperAction::Chart { days, json } => {
            let diapers = repo.list_all_or_empty().await;
            let series = diaper_daily_series(&diapers, now, days.unwrap_or(window_days));
            if *json {
                writeln!(writer, "{}", serde_json::to_string_pretty(&series)?)?;
            } else {
                render_chart(writer, &series)?;
            }
            Ok(())
        }
    }
}

/// Renders one bar of total changes per day, scaled to [`diaper_chart_max`].
#[allow(clippy::cast_precision_loss)]
pub fn render_chart<W: Write>(writer: &mut W, series: &[DayBucket<DiaperMetrics>]) -> Result<()> {
    let max = diaper_chart_max(series);
    writeln!(writer, "Changes per day (scale {max})")?;
    for bucket in series {
        let m = bucket.metrics;
        let marker = if bucket.is_today { "  today" } else { "" };
        writeln!(
            writer,
            "{:>2}  {}  {:>2} ({} wet, {} dirty){marker}",
            bucket.label,
            progress_bar(m.total as f64, max as f64),
            m.total,
            m.wet,
            m.dirty
        )?;
    }
    Ok(())
}
