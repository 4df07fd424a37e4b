//! `bm feed` subcommands.

use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use bm_client::{RemoteStore, Repository};
use bm_core::aggregation::{DayBucket, FeedMetrics, feed_chart_max, feed_daily_series};
use bm_core::display::{format_ounces, progress_bar};
use bm_core::{Action, Feed, Ounces};
use chrono::{DateTime, TimeZone};

use super::events;
use super::util::at_actions;
use crate::cli::FeedAction;

pub async fn run<S, W, Tz>(
    writer: &mut W,
    repo: &Repository<'_, S, Feed>,
    action: &FeedAction,
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
        FeedAction::Add { at, oz } => {
            let mut actions = at_actions(at.as_deref(), now)?;
            actions.push(Action::SetOunces(Ounces::new(*oz)?));
            events::save(writer, repo, None, actions, now).await
        }
        FeedAction::Edit { id, at, oz } => {
            let mut actions = at_actions(at.as_deref(), now)?;
            if let Some(oz) = oz {
                actions.push(Action::SetOunces(Ounces::new(*oz)?));
            }
            events::save(writer, repo, Some(id.as_str()), actions, now).await
        }
        FeedAction::Rm { id } => events::remove(writer, repo, id, now).await,
        FeedAction::List { limit, json } => events::list(writer, repo, *limit, *json, now).await,
        FeedAction::Chart { days, json } => {
            let feeds = repo.list_all_or_empty().await;
            let series = feed_daily_series(&feeds, now, days.unwrap_or(window_days));
            if *json {
                writeln!(writer, "{}", serde_json::to_string_pretty(&series)?)?;
            } else {
                render_chart(writer, &series)?;
            }
            Ok(())
        }
    }
}

/// Renders one bar per day, scaled to [`feed_chart_max`].
pub fn render_chart<W: Write>(writer: &mut W, series: &[DayBucket<FeedMetrics>]) -> Result<()> {
    let max = feed_chart_max(series);
    writeln!(writer, "Ounces per day (scale {} oz)", format_ounces(max))?;
    for bucket in series {
        let marker = if bucket.is_today { "  today" } else { "" };
        writeln!(
            writer,
            "{:>2}  {}  {}{marker}",
            bucket.label,
            progress_bar(bucket.metrics.ounces, max),
            format_ounces(bucket.metrics.ounces)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use bm_client::MemoryStore;
    use bm_core::{Session, UserId};
    use chrono::{Duration, FixedOffset, Utc};
    use insta::assert_snapshot;

    fn tz() -> FixedOffset {
        FixedOffset::west_opt(8 * 3600).unwrap()
    }

    fn now() -> DateTime<FixedOffset> {
        tz().with_ymd_and_hms(2025, 1, 29, 16, 0, 0).unwrap()
    }

    fn session() -> Session {
        Session {
            id_token: "token".to_string(),
            refresh_token: "refresh".to_string(),
            local_id: UserId::new("uid-1").unwrap(),
            email: "parent@example.com".to_string(),
            expires_at: now().with_timezone(&Utc) + Duration::hours(1),
        }
    }

    fn feed(day: u32, h: u32, oz: f64) -> Feed {
        let at = tz()
            .with_ymd_and_hms(2025, 1, day, h, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        Feed {
            timestamp: at,
            ounces: Ounces::new(oz).unwrap(),
            created_at: at,
        }
    }

    #[tokio::test]
    async fn add_rejects_unselectable_ounces_before_writing() {
        let store = MemoryStore::new();
        let session = session();
        let repo = Repository::new(&store, &session);

        let action = FeedAction::Add { at: None, oz: 10.5 };
        let err = run(&mut Vec::new(), &repo, &action, 14, &now())
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("ounces must be between"));
        assert_eq!(store.snapshot().await, serde_json::Value::Null);
    }

    #[tokio::test]
    async fn add_at_clock_time_lands_today() {
        let store = MemoryStore::new();
        let session = session();
        let repo = Repository::new(&store, &session);

        let action = FeedAction::Add {
            at: Some("6:00".to_string()),
            oz: 3.5,
        };
        run(&mut Vec::new(), &repo, &action, 14, &now()).await.unwrap();

        let feeds = repo.list_all().await.unwrap();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].record.timestamp, feed(29, 6, 3.5).timestamp);
    }

    #[tokio::test]
    async fn chart_covers_window() {
        let store = MemoryStore::new();
        let session = session();
        let repo = Repository::new(&store, &session);
        repo.create(&feed(29, 8, 4.0)).await.unwrap();
        repo.create(&feed(29, 12, 4.5)).await.unwrap();
        repo.create(&feed(27, 9, 10.0)).await.unwrap();
        repo.create(&feed(20, 9, 10.0)).await.unwrap();

        let mut output = Vec::new();
        let action = FeedAction::Chart {
            days: Some(3),
            json: false,
        };
        run(&mut output, &repo, &action, 14, &now()).await.unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r#"
        Ounces per day (scale 20 oz)
        27  █████░░░░░  10
        28  ░░░░░░░░░░  0
        29  ████░░░░░░  8.5  today
        "#);
    }

    #[tokio::test]
    async fn chart_json_has_one_bucket_per_day() {
        let store = MemoryStore::new();
        let session = session();
        let repo = Repository::new(&store, &session);
        repo.create(&feed(29, 8, 4.0)).await.unwrap();

        let mut output = Vec::new();
        let action = FeedAction::Chart {
            days: None,
            json: true,
        };
        run(&mut output, &repo, &action, 7, &now()).await.unwrap();

        let buckets: Vec<serde_json::Value> = serde_json::from_slice(&output).unwrap();
        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[6]["date"], "2025-01-29");
        assert_eq!(buckets[6]["ounces"], 4.0);
        assert_eq!(buckets[6]["isToday"], true);
        assert_eq!(buckets[0]["date"], "2025-01-23");
    }

    #[test]
    fn chart_scales_above_floor() {
        let series = vec![DayBucket {
            date: chrono::NaiveDate::from_ymd_opt(2025, 1, 29).unwrap(),
            label: "29".to_string(),
            metrics: FeedMetrics { ounces: 40.0 },
            is_today: true,
        }];
        let mut output = Vec::new();
        render_chart(&mut output, &series).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r#"
        Ounces per day (scale 40 oz)
        29  ██████████  40  today
        "#);
    }
}
