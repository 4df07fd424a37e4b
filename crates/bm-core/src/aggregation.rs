//! Daily series and "today" summaries over logged events.
//!
//! Everything here is pure. The caller supplies the reference instant in the
//! time zone that defines calendar days (`chrono::Local` in the CLI, fixed
//! offsets in tests), so the same event list always yields the same buckets.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::display::{format_elapsed, round_tenths};
use crate::event::{Diaper, EventRecord, Feed};

/// Default number of days in a rolling series.
pub const DEFAULT_WINDOW_DAYS: u32 = 14;

/// Longest series window accepted, about ten years.
pub const MAX_WINDOW_DAYS: u32 = 3660;

/// Lowest ounce value the feed chart scales to.
pub const FEED_CHART_FLOOR_OZ: f64 = 20.0;

/// Lowest count the diaper chart scales to.
pub const DIAPER_CHART_FLOOR: usize = 10;

/// One calendar day of aggregated events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket<M> {
    pub date: NaiveDate,
    /// Day of month, unpadded ("7").
    pub label: String,
    #[serde(flatten)]
    pub metrics: M,
    pub is_today: bool,
}

/// Per-day feed totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FeedMetrics {
    pub ounces: f64,
}

/// Per-day diaper counts. A `both` change counts once in each of `wet` and
/// `dirty` and once in `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiaperMetrics {
    pub wet: usize,
    pub dirty: usize,
    pub total: usize,
}

/// Today's feed statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSummary {
    pub total_oz: f64,
    pub feed_count: usize,
    /// Average per feed, rounded to one decimal; 0 when there were no feeds.
    pub avg_per_feed: f64,
    pub last_feed: Option<DateTime<Utc>>,
}

impl FeedSummary {
    /// Average as displayed: one decimal, or "0" when there were no feeds.
    pub fn avg_label(&self) -> String {
        if self.feed_count == 0 {
            "0".to_string()
        } else {
            format!("{:.1}", self.avg_per_feed)
        }
    }

    /// Elapsed time since the latest feed today.
    pub fn since_last(&self, now: DateTime<Utc>) -> Option<String> {
        self.last_feed.map(|last| format_elapsed(last, now))
    }
}

/// Today's diaper statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaperSummary {
    pub total: usize,
    pub wet: usize,
    pub dirty: usize,
    pub last_change: Option<DateTime<Utc>>,
}

impl DiaperSummary {
    /// Elapsed time since the latest change today.
    pub fn since_last(&self, now: DateTime<Utc>) -> Option<String> {
        self.last_change.map(|last| format_elapsed(last, now))
    }
}

// ========== Day Boundaries ==========

/// Returns the first instant of `date` in `tz`.
///
/// An ambiguous midnight (DST fall-back) resolves to the earlier instant. A
/// midnight that falls in a DST gap resolves to the first whole hour that
/// exists.
pub fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=3)
        .find_map(|h| {
            tz.from_local_datetime(&(midnight + Duration::hours(h)))
                .earliest()
        })
        .map_or_else(|| midnight.and_utc(), |dt| dt.with_timezone(&Utc))
}

/// Start of the calendar day containing `reference`.
pub fn start_of_day<Tz: TimeZone>(reference: &DateTime<Tz>) -> DateTime<Utc> {
    local_midnight(&reference.timezone(), reference.date_naive())
}

// ========== Daily Series ==========

/// Buckets events into `window_days` calendar days ending on the day of
/// `reference`, oldest first.
///
/// An event belongs to the day whose local midnight is at or before it, so an
/// event at exactly midnight starts the new day. Events outside the window
/// are ignored. Windows longer than [`MAX_WINDOW_DAYS`] are clamped.
fn daily_series<Tz, R, E, M>(
    events: &[E],
    reference: &DateTime<Tz>,
    window_days: u32,
    mut fold: impl FnMut(&mut M, &R),
) -> Vec<DayBucket<M>>
where
    Tz: TimeZone,
    R: EventRecord,
    E: AsRef<R>,
    M: Default,
{
    let tz = reference.timezone();
    let today = reference.date_naive();
    let window_days = window_days.min(MAX_WINDOW_DAYS);
    let Some(first_day) = today.checked_sub_signed(Duration::days(i64::from(window_days) - 1))
    else {
        return Vec::new();
    };

    let mut buckets: Vec<DayBucket<M>> = (0..window_days)
        .map_while(|offset| first_day.checked_add_signed(Duration::days(i64::from(offset))))
        .map(|date| DayBucket {
            date,
            label: date.day().to_string(),
            metrics: M::default(),
            is_today: date == today,
        })
        .collect();

    for event in events {
        let record = event.as_ref();
        let day = record.timestamp().with_timezone(&tz).date_naive();
        let Ok(index) = usize::try_from((day - first_day).num_days()) else {
            continue;
        };
        if let Some(bucket) = buckets.get_mut(index) {
            fold(&mut bucket.metrics, record);
        }
    }

    buckets
}

/// Total ounces per day over the window.
pub fn feed_daily_series<Tz, E>(
    events: &[E],
    reference: &DateTime<Tz>,
    window_days: u32,
) -> Vec<DayBucket<FeedMetrics>>
where
    Tz: TimeZone,
    E: AsRef<Feed>,
{
    daily_series(events, reference, window_days, |m: &mut FeedMetrics, feed: &Feed| {
        m.ounces += feed.ounces.value();
    })
}

/// Wet, dirty, and total changes per day over the window.
pub fn diaper_daily_series<Tz, E>(
    events: &[E],
    reference: &DateTime<Tz>,
    window_days: u32,
) -> Vec<DayBucket<DiaperMetrics>>
where
    Tz: TimeZone,
    E: AsRef<Diaper>,
{
    daily_series(
        events,
        reference,
        window_days,
        |m: &mut DiaperMetrics, diaper: &Diaper| {
            if diaper.kind.is_wet() {
                m.wet += 1;
            }
            if diaper.kind.is_dirty() {
                m.dirty += 1;
            }
            m.total += 1;
        },
    )
}

/// Upper bound for the feed chart axis, never below 20 oz.
pub fn feed_chart_max(series: &[DayBucket<FeedMetrics>]) -> f64 {
    series
        .iter()
        .map(|b| b.metrics.ounces)
        .fold(FEED_CHART_FLOOR_OZ, f64::max)
}

/// Upper bound for the diaper chart axis, never below 10 changes.
pub fn diaper_chart_max(series: &[DayBucket<DiaperMetrics>]) -> usize {
    series
        .iter()
        .map(|b| b.metrics.total)
        .fold(DIAPER_CHART_FLOOR, usize::max)
}

// ========== Today ==========

/// Events at or after today's local midnight. Later days are included.
fn since_midnight<'a, Tz, R, E>(
    events: &'a [E],
    reference: &DateTime<Tz>,
) -> impl Iterator<Item = &'a R>
where
    Tz: TimeZone,
    R: EventRecord,
    E: AsRef<R>,
{
    let midnight = start_of_day(reference);
    events
        .iter()
        .map(<E as AsRef<R>>::as_ref)
        .filter(move |record: &&R| record.timestamp() >= midnight)
}

/// Today's feed totals.
#[allow(clippy::cast_precision_loss)]
pub fn feed_today_summary<Tz, E>(events: &[E], reference: &DateTime<Tz>) -> FeedSummary
where
    Tz: TimeZone,
    E: AsRef<Feed>,
{
    let mut total_oz = 0.0;
    let mut feed_count = 0;
    let mut last_feed: Option<DateTime<Utc>> = None;

    for feed in since_midnight::<Tz, Feed, E>(events, reference) {
        total_oz += feed.ounces.value();
        feed_count += 1;
        last_feed = last_feed.max(Some(feed.timestamp));
    }

    let avg_per_feed = if feed_count == 0 {
        0.0
    } else {
        round_tenths(total_oz / feed_count as f64)
    };

    FeedSummary {
        total_oz,
        feed_count,
        avg_per_feed,
        last_feed,
    }
}

/// Today's diaper counts.
pub fn diaper_today_summary<Tz, E>(events: &[E], reference: &DateTime<Tz>) -> DiaperSummary
where
    Tz: TimeZone,
    E: AsRef<Diaper>,
{
    let mut summary = DiaperSummary {
        total: 0,
        wet: 0,
        dirty: 0,
        last_change: None,
    };

    for diaper in since_midnight::<Tz, Diaper, E>(events, reference) {
        summary.total += 1;
        if diaper.kind.is_wet() {
            summary.wet += 1;
        }
        if diaper.kind.is_dirty() {
            summary.dirty += 1;
        }
        summary.last_change = summary.last_change.max(Some(diaper.timestamp));
    }

    summary
}
