//! Sign-up, log-in and log-out.
//!
//! Successful sign-up and log-in persist the session; log-out clears it.
//! Provider errors surface with their mapped message.

use std::io::Write;

use anyhow::Result;
use bm_client::{AuthClient, SessionStore};
use chrono::{DateTime, Utc};

pub async fn sign_up<W: Write>(
    writer: &mut W,
    client: &AuthClient,
    sessions: &SessionStore,
    email: &str,
    password: &str,
    confirmation: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let grant = client.sign_up(email, password, confirmation).await?;
    let session = grant.into_session(now);
    sessions.save(&session)?;
    writeln!(writer, "Signed up as {}", session.email)?;
    Ok(())
}

pub async fn log_in<W: Write>(
    writer: &mut W,
    client: &AuthClient,
    sessions: &SessionStore,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let grant = client.log_in(email, password).await?;
    let session = grant.into_session(now);
    sessions.save(&session)?;
    writeln!(writer, "Logged in as {}", session.email)?;
    Ok(())
}

pub fn log_out<W: Write>(writer: &mut W, sessions: &SessionStore) -> Result<()> {
    sessions.clear()?;
    writeln!(writer, "Logged out.")?;
    Ok(())
}
