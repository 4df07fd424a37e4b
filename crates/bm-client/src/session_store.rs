//! Persisted session slot.
//!
//! A single `session.json` holds the current [`Session`]. Loading it refreshes
//! an expired session through a [`TokenRefresher`] so callers never see stale
//! credentials.

use std::path::{Path, PathBuf};

use bm_core::Session;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::auth::TokenRefresher;

/// Session file errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading, writing or removing the file failed.
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The session could not be encoded.
    #[error("failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// File-backed storage for the one active session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Reads the stored session as-is, without checking expiry.
    ///
    /// Returns `None` if the file doesn't exist. A file that can't be parsed
    /// is removed and also yields `None`.
    pub fn read(&self) -> Result<Option<Session>, SessionError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        match serde_json::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "discarding malformed session");
                self.clear()?;
                Ok(None)
            }
        }
    }

    /// Overwrites the slot with `session`.
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json).map_err(|e| self.io_error(e))?;
        tracing::debug!(path = %self.path.display(), "saved session");
        Ok(())
    }

    /// Removes the slot. Removing an empty slot is not an error.
    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "cleared session");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Returns a session that is valid at `now`, or `None`.
    ///
    /// An expired session is exchanged through `refresher`. On success the new
    /// session (keeping the stored e-mail) replaces the old one; on failure the
    /// slot is cleared.
    pub async fn load<R>(&self, refresher: &R, now: DateTime<Utc>) -> Result<Option<Session>, SessionError>
    where
        R: TokenRefresher + Sync,
    {
        let Some(session) = self.read()? else {
            return Ok(None);
        };

        if !session.is_expired(now) {
            return Ok(Some(session));
        }

        tracing::debug!(expired_at = %session.expires_at, "refreshing session");
        match refresher.refresh(&session.refresh_token).await {
            Ok(token) => {
                let refreshed = token.into_session(session.email, now);
                self.save(&refreshed)?;
                Ok(Some(refreshed))
            }
            Err(err) => {
                tracing::warn!(error = %err, "session refresh failed, logging out");
                self.clear()?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bm_core::UserId;
    use chrono::{Duration, TimeZone};

    use crate::auth::{AuthError, RefreshedToken};

    struct Grants;

    impl TokenRefresher for Grants {
        async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, AuthError> {
            assert_eq!(refresh_token, "refresh-old");
            Ok(RefreshedToken {
                id_token: "id-new".to_string(),
                refresh_token: "refresh-new".to_string(),
                user_id: UserId::new("uid-1").unwrap(),
                expires_in_secs: 3600,
            })
        }
    }

    struct Refuses;

    impl TokenRefresher for Refuses {
        async fn refresh(&self, _refresh_token: &str) -> Result<RefreshedToken, AuthError> {
            Err(AuthError::from_provider("TOKEN_EXPIRED"))
        }
    }

    /// Fails the test if a refresh is attempted.
    struct Untouched;

    impl TokenRefresher for Untouched {
        async fn refresh(&self, _refresh_token: &str) -> Result<RefreshedToken, AuthError> {
            panic!("refresh should not be called");
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 29, 12, 0, 0).unwrap()
    }

    fn session(expires_at: DateTime<Utc>) -> Session {
        Session {
            id_token: "id-old".to_string(),
            refresh_token: "refresh-old".to_string(),
            local_id: UserId::new("uid-1").unwrap(),
            email: "parent@example.com".to_string(),
            expires_at,
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("nested").join("session.json"))
    }

    #[test]
    fn read_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).read().unwrap().is_none());
    }

    #[test]
    fn save_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let saved = session(now() + Duration::hours(1));

        store.save(&saved).unwrap();
        assert_eq!(store.read().unwrap(), Some(saved));
    }

    #[test]
    fn file_uses_camel_case_and_epoch_millis() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&session(now())).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["idToken"], "id-old");
        assert_eq!(raw["localId"], "uid-1");
        assert_eq!(raw["expiresAt"], now().timestamp_millis());
    }

    #[test]
    fn malformed_file_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{not json").unwrap();

        assert!(store.read().unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&session(now())).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.read().unwrap().is_none());
    }

    #[tokio::test]
    async fn load_returns_live_session_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let live = session(now() + Duration::minutes(5));
        store.save(&live).unwrap();

        assert_eq!(store.load(&Untouched, now()).await.unwrap(), Some(live));
    }

    #[tokio::test]
    async fn load_refreshes_expired_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&session(now())).unwrap();

        let loaded = store.load(&Grants, now()).await.unwrap().unwrap();
        assert_eq!(loaded.id_token, "id-new");
        assert_eq!(loaded.refresh_token, "refresh-new");
        assert_eq!(loaded.email, "parent@example.com");
        assert_eq!(loaded.expires_at, now() + Duration::hours(1));
        assert!(!loaded.is_expired(now()));

        assert_eq!(store.read().unwrap(), Some(loaded));
    }

    #[tokio::test]
    async fn failed_refresh_logs_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&session(now() - Duration::hours(2))).unwrap();

        assert!(store.load(&Refuses, now()).await.unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn load_never_returns_expired_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        for offset in [-3600, -1, 0] {
            store.save(&session(now() + Duration::seconds(offset))).unwrap();
            if let Some(loaded) = store.load(&Refuses, now()).await.unwrap() {
                assert!(!loaded.is_expired(now()));
            }
            if let Some(loaded) = store.load(&Grants, now()).await.unwrap() {
                assert!(!loaded.is_expired(now()));
            }
        }
    }
}
