//! Status command for showing the stored session. Never contacts the network.

use std::io::Write;

use anyhow::Result;
use bm_client::SessionStore;
use chrono::{DateTime, Utc};

use super::util::format_remaining;

pub fn run<W: Write>(writer: &mut W, sessions: &SessionStore, now: DateTime<Utc>) -> Result<()> {
    writeln!(writer, "Session file: {}", sessions.path().display())?;

    let Some(session) = sessions.read()? else {
        writeln!(writer, "Not logged in.")?;
        return Ok(());
    };

    writeln!(writer, "Logged in as {} ({})", session.email, session.local_id)?;
    if session.is_expired(now) {
        writeln!(writer, "Token expired; it will be refreshed on the next command.")?;
    } else {
        writeln!(
            writer,
            "Token valid for {}",
            format_remaining(session.remaining(now))
        )?;
    }
    Ok(())
}
