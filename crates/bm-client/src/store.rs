//! Path-addressed JSON store.
//!
//! The realtime database exposes every node of its JSON tree at
//! `{base}/{path}.json`. [`HttpStore`] talks to it over REST; [`MemoryStore`]
//! keeps an equivalent tree in process.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Default request timeout for store calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Store client errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The store answered with an error.
    #[error("store error: {message}")]
    Remote { message: String },
    /// The database URL is not an http(s) URL.
    #[error("invalid database URL: {0:?}")]
    InvalidBaseUrl(String),
    /// A key that the store would reject or misroute.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
    /// Failed to parse a response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A JSON tree addressed by slash-separated paths.
///
/// `auth` is the caller's id token; implementations decide how to check it.
pub trait RemoteStore: Send + Sync {
    /// Reads the value at `path`; `Null` when absent.
    fn get(&self, path: &str, auth: &str) -> impl Future<Output = Result<Value, StoreError>> + Send;

    /// Appends `body` under a new child key of `path` and returns that key.
    fn push(
        &self,
        path: &str,
        auth: &str,
        body: &Value,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Replaces the value at `path`.
    fn put(
        &self,
        path: &str,
        auth: &str,
        body: &Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes the value at `path`.
    fn delete(&self, path: &str, auth: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Rejects keys containing characters the store forbids in keys.
pub fn check_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.contains(['/', '.', '#', '$', '[', ']']) {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Extracts the message from an `{"error": "..."}` body.
pub(crate) fn error_message(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::String(message) => Some(message.clone()),
        Value::Object(details) => details
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

// ========== HTTP ==========

/// REST client for the realtime database.
#[derive(Clone)]
pub struct HttpStore {
    http: reqwest::Client,
    base_url: String,
}

impl fmt::Debug for HttpStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpStore")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpStore {
    /// Creates a client for the database at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, StoreError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let host = base_url
            .strip_prefix("https://")
            .or_else(|| base_url.strip_prefix("http://"));
        if host.is_none_or(str::is_empty) {
            return Err(StoreError::InvalidBaseUrl(base_url));
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(StoreError::ClientBuild)?;

        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    async fn send(&self, request: reqwest::RequestBuilder, auth: &str) -> Result<Value, StoreError> {
        let response = request.query(&[("auth", auth)]).send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(%status, bytes = body.len(), "store responded");

        let value: Option<Value> = serde_json::from_str(&body).ok();
        if !status.is_success() {
            let message = value
                .as_ref()
                .and_then(error_message)
                .unwrap_or_else(|| format!("status {status}: {body}"));
            return Err(StoreError::Remote { message });
        }

        value.ok_or_else(|| StoreError::InvalidResponse(format!("not JSON: {body}")))
    }
}

impl RemoteStore for HttpStore {
    async fn get(&self, path: &str, auth: &str) -> Result<Value, StoreError> {
        tracing::debug!(path, "GET");
        self.send(self.http.get(self.url(path)), auth).await
    }

    async fn push(&self, path: &str, auth: &str, body: &Value) -> Result<String, StoreError> {
        tracing::debug!(path, "POST");
        let reply = self.send(self.http.post(self.url(path)).json(body), auth).await?;
        reply
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StoreError::InvalidResponse(format!("missing name in {reply}")))
    }

    async fn put(&self, path: &str, auth: &str, body: &Value) -> Result<(), StoreError> {
        tracing::debug!(path, "PUT");
        self.send(self.http.put(self.url(path)).json(body), auth).await?;
        Ok(())
    }

    async fn delete(&self, path: &str, auth: &str) -> Result<(), StoreError> {
        tracing::debug!(path, "DELETE");
        self.send(self.http.delete(self.url(path)), auth).await?;
        Ok(())
    }
}

// ========== In-Memory ==========

/// In-process JSON tree with the same addressing as the realtime database.
///
/// When built with [`MemoryStore::with_token`], calls carrying any other
/// token fail the way the remote rules would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    root: Mutex<Value>,
    required_token: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that only accepts `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            root: Mutex::new(Value::Null),
            required_token: Some(token.into()),
        }
    }

    /// A copy of the whole tree.
    pub async fn snapshot(&self) -> Value {
        self.root.lock().await.clone()
    }

    fn authorize(&self, auth: &str) -> Result<(), StoreError> {
        match &self.required_token {
            Some(token) if token != auth => Err(StoreError::Remote {
                message: "Permission denied".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn node<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(root, |value, key| value.get(key))
}

/// Walks to `path`, turning every node on the way into an object.
fn node_mut<'a>(root: &'a mut Value, path: &str) -> &'a mut Value {
    segments(path).fold(root, |value, key| {
        if !value.is_object() {
            *value = Value::Object(Map::new());
        }
        &mut value[key]
    })
}

/// Drops empty objects, as the database never stores them.
fn prune(value: &mut Value) {
    if let Value::Object(map) = value {
        for child in map.values_mut() {
            prune(child);
        }
        map.retain(|_, child| !child.is_null());
        if map.is_empty() {
            *value = Value::Null;
        }
    }
}

impl RemoteStore for MemoryStore {
    async fn get(&self, path: &str, auth: &str) -> Result<Value, StoreError> {
        self.authorize(auth)?;
        let root = self.root.lock().await;
        Ok(node(&root, path).cloned().unwrap_or(Value::Null))
    }

    async fn push(&self, path: &str, auth: &str, body: &Value) -> Result<String, StoreError> {
        self.authorize(auth)?;
        let key = format!("-{}", Uuid::new_v4().simple());
        let mut root = self.root.lock().await;
        *node_mut(&mut root, &format!("{path}/{key}")) = body.clone();
        prune(&mut root);
        Ok(key)
    }

    async fn put(&self, path: &str, auth: &str, body: &Value) -> Result<(), StoreError> {
        self.authorize(auth)?;
        let mut root = self.root.lock().await;
        *node_mut(&mut root, path) = body.clone();
        prune(&mut root);
        Ok(())
    }

    async fn delete(&self, path: &str, auth: &str) -> Result<(), StoreError> {
        self.authorize(auth)?;
        let mut root = self.root.lock().await;
        if node(&root, path).is_some() {
            *node_mut(&mut root, path) = Value::Null;
            prune(&mut root);
        }
        Ok(())
    }
}
