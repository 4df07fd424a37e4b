//! Add, edit, remove and list, shared by feeds and diaper changes.
//!
//! Every write goes through the editor state and is followed by a full reload
//! of the collection. A failed write is logged and the reload still runs.

use std::fmt::Display;
use std::io::Write;

use anyhow::{Context, Result};
use bm_client::{RemoteStore, Repository};
use bm_core::display::{day_header, format_clock};
use bm_core::{
    Action, Diaper, EditorState, Entry, EventId, EventRecord, Feed, Submission, Tab,
};
use chrono::{DateTime, TimeZone};

/// A record kind the CLI can log.
pub trait Logged: EventRecord {
    /// Editor tab that owns this kind.
    const TAB: Tab;
    /// Singular noun for messages.
    const NOUN: &'static str;
    /// Plural noun for messages.
    const PLURAL: &'static str;

    /// Action that loads `entry` into the editor.
    fn begin_edit(entry: Entry<Self>) -> Action;

    /// The write the editor currently describes.
    fn submission<Tz: TimeZone>(state: &EditorState, now: &DateTime<Tz>) -> Submission<Self>;

    /// Short description for list rows ("4.5 oz", "Wet").
    fn describe(&self) -> String;
}

impl Logged for Feed {
    const TAB: Tab = Tab::Feeds;
    const NOUN: &'static str = "feed";
    const PLURAL: &'static str = "feeds";

    fn begin_edit(entry: Entry<Self>) -> Action {
        Action::BeginFeedEdit(entry)
    }

    fn submission<Tz: TimeZone>(state: &EditorState, now: &DateTime<Tz>) -> Submission<Self> {
        state.feed_submission(now)
    }

    fn describe(&self) -> String {
        format!("{} oz", self.ounces)
    }
}

impl Logged for Diaper {
    const TAB: Tab = Tab::Diapers;
    const NOUN: &'static str = "diaper change";
    const PLURAL: &'static str = "diaper changes";

    fn begin_edit(entry: Entry<Self>) -> Action {
        Action::BeginDiaperEdit(entry)
    }

    fn submission<Tz: TimeZone>(state: &EditorState, now: &DateTime<Tz>) -> Submission<Self> {
        state.diaper_submission(now)
    }

    fn describe(&self) -> String {
        self.kind.label().to_string()
    }
}

/// Number of rows printed after a write.
const RELOAD_ROWS: usize = 5;

/// Creates a record, or replaces `editing` when given, from picker `actions`.
pub async fn save<S, T, W, Tz>(
    writer: &mut W,
    repo: &Repository<'_, S, T>,
    editing: Option<&str>,
    actions: Vec<Action>,
    now: &DateTime<Tz>,
) -> Result<()>
where
    S: RemoteStore,
    T: Logged,
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut state = EditorState::new(now).reduce(Action::SelectTab(T::TAB), now);

    if let Some(id) = editing {
        let id = EventId::new(id)?;
        let entry = repo
            .list_all()
            .await
            .with_context(|| format!("failed to load {}", T::PLURAL))?
            .into_iter()
            .find(|entry| entry.id == id)
            .with_context(|| format!("No {} with ID {id}", T::NOUN))?;
        state = state.reduce(T::begin_edit(entry), now);
    }

    for action in actions {
        state = state.reduce(action, now);
    }

    match T::submission(&state, now) {
        Submission::Create(record) => match repo.create(&record).await {
            Ok(id) => writeln!(writer, "Added {} {id}", T::NOUN)?,
            Err(err) => tracing::error!(error = %err, "failed to add {}", T::NOUN),
        },
        Submission::Replace(id, record) => match repo.update(&id, &record).await {
            Ok(()) => writeln!(writer, "Updated {} {id}", T::NOUN)?,
            Err(err) => tracing::error!(error = %err, %id, "failed to update {}", T::NOUN),
        },
    }

    reload(writer, repo, now).await
}

/// Deletes the record with `id`.
pub async fn remove<S, T, W, Tz>(
    writer: &mut W,
    repo: &Repository<'_, S, T>,
    id: &str,
    now: &DateTime<Tz>,
) -> Result<()>
where
    S: RemoteStore,
    T: Logged,
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let id = EventId::new(id)?;
    match repo.delete(&id).await {
        Ok(()) => writeln!(writer, "Deleted {} {id}", T::NOUN)?,
        Err(err) => tracing::error!(error = %err, %id, "failed to delete {}", T::NOUN),
    }

    reload(writer, repo, now).await
}

/// Prints the latest `limit` records grouped by day.
pub async fn list<S, T, W, Tz>(
    writer: &mut W,
    repo: &Repository<'_, S, T>,
    limit: usize,
    json: bool,
    now: &DateTime<Tz>,
) -> Result<()>
where
    S: RemoteStore,
    T: Logged,
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let entries = repo.list_all_or_empty().await;
    let shown = &entries[..entries.len().min(limit)];

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(shown)?)?;
    } else {
        render_list(writer, shown, now)?;
    }
    Ok(())
}

async fn reload<S, T, W, Tz>(
    writer: &mut W,
    repo: &Repository<'_, S, T>,
    now: &DateTime<Tz>,
) -> Result<()>
where
    S: RemoteStore,
    T: Logged,
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let entries = repo.list_all_or_empty().await;
    writeln!(writer)?;
    render_list(writer, &entries[..entries.len().min(RELOAD_ROWS)], now)
}

/// Renders entries (already newest first) under day headers.
pub fn render_list<T, W, Tz>(writer: &mut W, entries: &[Entry<T>], now: &DateTime<Tz>) -> Result<()>
where
    T: Logged,
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if entries.is_empty() {
        writeln!(writer, "No {} yet.", T::PLURAL)?;
        return Ok(());
    }

    let tz = now.timezone();
    let today = now.date_naive();
    let mut current_day = None;

    for entry in entries {
        let local = entry.timestamp().with_timezone(&tz);
        let day = local.date_naive();
        if current_day != Some(day) {
            writeln!(writer, "{}", day_header(day, today))?;
            current_day = Some(day);
        }
        writeln!(
            writer,
            "  {:>8}  {:<8}  {}",
            format_clock(&local),
            entry.record.describe(),
            entry.id
        )?;
    }
    Ok(())
}
