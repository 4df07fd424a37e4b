//! Authenticated session credentials.

use std::fmt;

use chrono::{DateTime, Duration, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Credential bundle granting access to one user's data.
///
/// Persisted as camelCase JSON with `expiresAt` in epoch milliseconds.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id_token: String,
    pub refresh_token: String,
    pub local_id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("local_id", &self.local_id)
            .field("email", &self.email)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Session {
    /// Builds a session issued at `issued_at` that lives for `expires_in_secs`.
    ///
    /// A lifetime that does not fit the calendar yields a session that is
    /// already expired.
    pub fn issued(
        id_token: String,
        refresh_token: String,
        local_id: UserId,
        email: String,
        issued_at: DateTime<Utc>,
        expires_in_secs: i64,
    ) -> Self {
        Self {
            id_token,
            refresh_token,
            local_id,
            email,
            expires_at: TimeDelta::try_seconds(expires_in_secs)
                .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
                .unwrap_or(issued_at),
        }
    }

    /// A session whose expiry is at or before `now` must not authorize requests.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Time left before expiry, or zero when already expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}
