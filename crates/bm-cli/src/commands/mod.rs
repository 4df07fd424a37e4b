//! CLI subcommand implementations.

pub mod auth;
pub mod diaper;
pub mod events;
pub mod feed;
pub mod status;
pub mod today;
pub mod util;

use anyhow::{Context, Result};
use bm_client::{AuthClient, HttpStore, SessionStore};
use bm_core::Session;
use chrono::{DateTime, Utc};

use crate::Config;

/// Session slot at the configured path.
pub fn session_store(config: &Config) -> SessionStore {
    SessionStore::new(&config.session_path)
}

/// Identity provider client, failing with a hint if no API key is configured.
pub fn auth_client(config: &Config) -> Result<AuthClient> {
    let api_key = config
        .api_key
        .as_deref()
        .context("No API key configured. Set api_key in ~/.config/bm/config.toml or BM_API_KEY.")?;
    AuthClient::new(api_key, config.endpoints()).context("failed to create auth client")
}

/// Database client, failing with a hint if no URL is configured.
pub fn open_store(config: &Config) -> Result<HttpStore> {
    let url = config.database_url.as_deref().context(
        "No database URL configured. Set database_url in ~/.config/bm/config.toml or BM_DATABASE_URL.",
    )?;
    HttpStore::new(url).context("failed to create database client")
}

/// Loads the session, refreshing it if expired, or fails asking to log in.
pub async fn require_session(config: &Config, now: DateTime<Utc>) -> Result<Session> {
    let client = auth_client(config)?;
    session_store(config)
        .load(&client, now)
        .await
        .context("failed to load session")?
        .context("Not logged in. Run 'bm login' first.")
}
