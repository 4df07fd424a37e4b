//! Per-user event collections.
//!
//! A [`Repository`] reads and writes one collection (`feeds` or `diapers`)
//! under `users/{uid}/` using the session's id token. Writes do not touch any
//! local copy; callers reload with [`Repository::list_all`] afterwards.

use std::marker::PhantomData;

use bm_core::event::sort_newest_first;
use bm_core::{Entry, EventId, EventRecord, Session};
use serde_json::Value;

use crate::store::{RemoteStore, StoreError, check_key, error_message};

/// One user's collection of `T` records.
#[derive(Debug)]
pub struct Repository<'a, S, T> {
    store: &'a S,
    session: &'a Session,
    _record: PhantomData<fn() -> T>,
}

impl<'a, S: RemoteStore, T: EventRecord> Repository<'a, S, T> {
    pub const fn new(store: &'a S, session: &'a Session) -> Self {
        Self {
            store,
            session,
            _record: PhantomData,
        }
    }

    fn collection_path(&self) -> String {
        format!("users/{}/{}", self.session.local_id, T::COLLECTION)
    }

    fn entry_path(&self, id: &EventId) -> Result<String, StoreError> {
        check_key(id.as_str())?;
        Ok(format!("{}/{id}", self.collection_path()))
    }

    fn auth(&self) -> &str {
        &self.session.id_token
    }

    /// All records, most recent first.
    ///
    /// A missing collection is empty. Records that fail to decode are skipped.
    pub async fn list_all(&self) -> Result<Vec<Entry<T>>, StoreError> {
        let value = self.store.get(&self.collection_path(), self.auth()).await?;
        let mut entries = decode_collection::<T>(value)?;
        sort_newest_first(&mut entries);
        tracing::debug!(
            collection = T::COLLECTION,
            count = entries.len(),
            "listed collection"
        );
        Ok(entries)
    }

    /// [`Self::list_all`], logging any failure and returning an empty list.
    pub async fn list_all_or_empty(&self) -> Vec<Entry<T>> {
        match self.list_all().await {
            Ok(entries) => entries,
            Err(err) => {
                tracing::error!(collection = T::COLLECTION, error = %err, "failed to fetch");
                Vec::new()
            }
        }
    }

    /// Inserts a record and returns the id the store assigned.
    pub async fn create(&self, record: &T) -> Result<EventId, StoreError> {
        let body = encode(record)?;
        let key = self
            .store
            .push(&self.collection_path(), self.auth(), &body)
            .await?;
        let id = EventId::new(key).map_err(|err| StoreError::InvalidResponse(err.to_string()))?;
        tracing::debug!(collection = T::COLLECTION, %id, "created record");
        Ok(id)
    }

    /// Replaces the record at `id`.
    pub async fn update(&self, id: &EventId, record: &T) -> Result<(), StoreError> {
        let body = encode(record)?;
        self.store
            .put(&self.entry_path(id)?, self.auth(), &body)
            .await?;
        tracing::debug!(collection = T::COLLECTION, %id, "replaced record");
        Ok(())
    }

    /// Removes the record at `id`.
    pub async fn delete(&self, id: &EventId) -> Result<(), StoreError> {
        self.store.delete(&self.entry_path(id)?, self.auth()).await?;
        tracing::debug!(collection = T::COLLECTION, %id, "deleted record");
        Ok(())
    }
}

fn encode<T: EventRecord>(record: &T) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|err| StoreError::InvalidResponse(err.to_string()))
}

fn decode_entry<T: EventRecord>(key: String, value: Value) -> Option<Entry<T>> {
    let id = EventId::new(key).ok()?;
    match serde_json::from_value::<T>(value) {
        Ok(record) => Some(Entry::new(id, record)),
        Err(err) => {
            tracing::warn!(collection = T::COLLECTION, %id, error = %err, "skipping unreadable record");
            None
        }
    }
}

/// Turns a collection node into entries, in no particular order.
///
/// The store returns `null` for an empty collection and may return an array
/// when every key is a small integer.
fn decode_collection<T: EventRecord>(value: Value) -> Result<Vec<Entry<T>>, StoreError> {
    if let Some(message) = error_message(&value) {
        return Err(StoreError::Remote { message });
    }

    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(key, value)| decode_entry(key, value))
            .collect()),
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .filter(|(_, value)| !value.is_null())
            .filter_map(|(index, value)| decode_entry(index.to_string(), value))
            .collect()),
        other => Err(StoreError::InvalidResponse(format!(
            "expected a collection, got {other}"
        ))),
    }
}
