//! Logged events: feeds and diaper changes.
//!
//! A record (`Feed`, `Diaper`) is the body stored at one key of a remote
//! collection. An [`Entry`] pairs that body with the id the store assigned.

use std::fmt;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::diaper_type::DiaperType;
use crate::types::{EventId, Ounces};

/// A record kind that lives in its own remote collection.
pub trait EventRecord:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
    /// Collection name under the user's namespace (`feeds`, `diapers`).
    const COLLECTION: &'static str;

    /// When the event happened (user-chosen).
    fn timestamp(&self) -> DateTime<Utc>;

    /// When the record was written.
    fn created_at(&self) -> DateTime<Utc>;
}

/// A bottle feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    /// When the feed happened.
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,
    /// Amount taken.
    pub ounces: Ounces,
    /// When the record was written.
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
}

impl EventRecord for Feed {
    const COLLECTION: &'static str = "feeds";

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A diaper change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diaper {
    /// When the change happened.
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,
    /// What the diaper contained.
    #[serde(rename = "type")]
    pub kind: DiaperType,
    /// When the record was written.
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
}

impl EventRecord for Diaper {
    const COLLECTION: &'static str = "diapers";

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A stored record together with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<T> {
    pub id: EventId,
    #[serde(flatten)]
    pub record: T,
}

impl<T> Entry<T> {
    pub const fn new(id: EventId, record: T) -> Self {
        Self { id, record }
    }
}

impl<T> Deref for Entry<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.record
    }
}

impl<T> AsRef<T> for Entry<T> {
    fn as_ref(&self) -> &T {
        &self.record
    }
}

impl AsRef<Self> for Feed {
    fn as_ref(&self) -> &Self {
        self
    }
}

impl AsRef<Self> for Diaper {
    fn as_ref(&self) -> &Self {
        self
    }
}

/// A feed with its id.
pub type FeedEvent = Entry<Feed>;

/// A diaper change with its id.
pub type DiaperEvent = Entry<Diaper>;

/// Orders entries most recent first, breaking ties by id (descending).
pub fn sort_newest_first<T: EventRecord>(entries: &mut [Entry<T>]) {
    entries.sort_by(|a, b| {
        b.record
            .timestamp()
            .cmp(&a.record.timestamp())
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Serde adapter for instants in the store's ISO-8601 form.
///
/// Writes millisecond precision with a `Z` suffix
/// (`2025-01-29T08:00:00.000Z`); reads any RFC 3339 string.
pub mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
