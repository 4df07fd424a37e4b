//! Entry editor state.
//!
//! All picker selections and edit targets live in one [`EditorState`]. The
//! only way to change it is [`EditorState::reduce`], which returns the next
//! state for an [`Action`].

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use serde::Serialize;

use crate::diaper_type::DiaperType;
use crate::event::{Diaper, DiaperEvent, Feed, FeedEvent};
use crate::types::{EventId, Ounces, ValidationError};

/// Which collection the editor is working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Feeds,
    Diapers,
}

/// A state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectTab(Tab),
    SetTime(NaiveTime),
    SetDate(NaiveDate),
    SetOunces(Ounces),
    SetDiaperType(DiaperType),
    /// Load a feed into the pickers and mark it as the edit target.
    BeginFeedEdit(FeedEvent),
    /// Load a diaper change into the pickers and mark it as the edit target.
    BeginDiaperEdit(DiaperEvent),
    /// The current draft was written; reset the pickers.
    Saved,
    /// Abandon any edit and reset the pickers.
    Cancel,
}

/// What the current draft should do when submitted.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission<T> {
    Create(T),
    Replace(EventId, T),
}

/// Picker selections and edit targets for both tabs.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub tab: Tab,
    pub editing_feed: Option<EventId>,
    pub editing_diaper: Option<EventId>,
    pub date: NaiveDate,
    /// Selected time of day, minute precision.
    pub time: NaiveTime,
    pub ounces: Ounces,
    pub diaper_type: DiaperType,
}

/// Builds a minute-precision time of day from picker values.
pub fn time_of_day(hour: u32, minute: u32) -> Result<NaiveTime, ValidationError> {
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or(ValidationError::InvalidTimeOfDay { hour, minute })
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

/// Resolves a wall-clock time in `tz`. Times inside a DST gap move forward
/// one hour; ambiguous times take the earlier instant.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map_or_else(|| naive.and_utc(), |dt| dt.with_timezone(&Utc))
}

impl EditorState {
    /// Fresh state with the pickers at `now`.
    pub fn new<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self {
            tab: Tab::default(),
            editing_feed: None,
            editing_diaper: None,
            date: now.date_naive(),
            time: truncate_to_minute(now.time()),
            ounces: Ounces::default(),
            diaper_type: DiaperType::default(),
        }
    }

    /// Applies `action`. `now` supplies the time zone and the reset time.
    #[must_use]
    pub fn reduce<Tz: TimeZone>(self, action: Action, now: &DateTime<Tz>) -> Self {
        match action {
            Action::SelectTab(tab) => Self { tab, ..self },
            Action::SetTime(time) => Self {
                time: truncate_to_minute(time),
                ..self
            },
            Action::SetDate(date) => Self { date, ..self },
            Action::SetOunces(ounces) => Self { ounces, ..self },
            Action::SetDiaperType(diaper_type) => Self {
                diaper_type,
                ..self
            },
            Action::BeginFeedEdit(entry) => {
                let local = entry.timestamp.with_timezone(&now.timezone());
                Self {
                    tab: Tab::Feeds,
                    editing_feed: Some(entry.id),
                    date: local.date_naive(),
                    time: truncate_to_minute(local.time()),
                    ounces: entry.record.ounces,
                    ..self
                }
            }
            Action::BeginDiaperEdit(entry) => {
                let local = entry.timestamp.with_timezone(&now.timezone());
                Self {
                    tab: Tab::Diapers,
                    editing_diaper: Some(entry.id),
                    date: local.date_naive(),
                    time: truncate_to_minute(local.time()),
                    diaper_type: entry.record.kind,
                    ..self
                }
            }
            Action::Saved => {
                let (editing_feed, editing_diaper) = match self.tab {
                    Tab::Feeds => (None, self.editing_diaper),
                    Tab::Diapers => (self.editing_feed, None),
                };
                Self {
                    editing_feed,
                    editing_diaper,
                    ..Self::new(now)
                }
                .with_tab(self.tab)
            }
            Action::Cancel => Self::new(now).with_tab(self.tab),
        }
    }

    fn with_tab(mut self, tab: Tab) -> Self {
        self.tab = tab;
        self
    }

    /// Whether the active tab has an edit target.
    pub const fn is_editing(&self) -> bool {
        match self.tab {
            Tab::Feeds => self.editing_feed.is_some(),
            Tab::Diapers => self.editing_diaper.is_some(),
        }
    }

    /// The selected date and time as an instant in `tz`.
    pub fn selected_instant<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Utc> {
        resolve_local(tz, self.date.and_time(self.time))
    }

    /// The feed to write. `createdAt` is always `now`, including on edits.
    pub fn feed_submission<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Submission<Feed> {
        let feed = Feed {
            timestamp: self.selected_instant(&now.timezone()),
            ounces: self.ounces,
            created_at: now.with_timezone(&Utc),
        };
        match &self.editing_feed {
            Some(id) => Submission::Replace(id.clone(), feed),
            None => Submission::Create(feed),
        }
    }

    /// The diaper change to write. `createdAt` is always `now`, including on edits.
    pub fn diaper_submission<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Submission<Diaper> {
        let diaper = Diaper {
            timestamp: self.selected_instant(&now.timezone()),
            kind: self.diaper_type,
            created_at: now.with_timezone(&Utc),
        };
        match &self.editing_diaper {
            Some(id) => Submission::Replace(id.clone(), diaper),
            None => Submission::Create(diaper),
        }
    }
}
