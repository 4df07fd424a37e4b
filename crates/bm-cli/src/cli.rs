//! Command-line argument definitions.

use std::path::PathBuf;

use bm_core::DiaperType;
use bm_core::aggregation::MAX_WINDOW_DAYS;
use clap::{Parser, Subcommand};

/// Feeding and diaper log.
///
/// Records feeds and diaper changes to a realtime database shared by every
/// caregiver on the account, and summarizes today and the last two weeks.
#[derive(Debug, Parser)]
#[command(name = "bm", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create an account and log in.
    Signup {
        #[arg(long)]
        email: String,

        #[arg(long, env = "BM_PASSWORD", hide_env_values = true)]
        password: String,

        /// Password again.
        #[arg(long, env = "BM_PASSWORD_CONFIRM", hide_env_values = true)]
        confirm: String,
    },

    /// Log in to an existing account.
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "BM_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session.
    Logout,

    /// Show who is logged in. Never touches the network.
    Status,

    /// Summarize today's feeds and diaper changes.
    Today {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Log and review feeds.
    #[command(subcommand)]
    Feed(FeedAction),

    /// Log and review diaper changes.
    #[command(subcommand)]
    Diaper(DiaperAction),
}

/// Feed subcommands.
#[derive(Debug, Subcommand)]
pub enum FeedAction {
    /// Record a feed.
    Add {
        /// When it happened: "HH:MM", RFC 3339, or "30 minutes ago" (default: now).
        #[arg(long)]
        at: Option<String>,

        /// Amount in ounces, 0.5 to 10 in steps of 0.5.
        #[arg(long, default_value_t = 4.0)]
        oz: f64,
    },

    /// Change a recorded feed.
    Edit {
        /// Feed ID.
        id: String,

        /// New time: "HH:MM" keeps the day, RFC 3339 or relative sets both.
        #[arg(long)]
        at: Option<String>,

        /// New amount in ounces.
        #[arg(long)]
        oz: Option<f64>,
    },

    /// Delete a feed.
    Rm {
        /// Feed ID.
        id: String,
    },

    /// List recent feeds, newest first.
    List {
        /// Number of feeds to show.
        #[arg(long, default_value_t = 15)]
        limit: usize,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Daily ounces over recent days.
    Chart {
        /// Number of days (default: `window_days` from config).
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_WINDOW_DAYS)))]
        days: Option<u32>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Diaper subcommands.
#[derive(Debug, Subcommand)]
pub enum DiaperAction {
    /// Record a diaper change.
    Add {
        /// When it happened: "HH:MM", RFC 3339, or "30 minutes ago" (default: now).
        #[arg(long)]
        at: Option<String>,

        /// wet, dirty or both.
        #[arg(long = "type", default_value = "wet")]
        kind: DiaperType,
    },

    /// Change a recorded diaper change.
    Edit {
        /// Diaper change ID.
        id: String,

        /// New time: "HH:MM" keeps the day, RFC 3339 or relative sets both.
        #[arg(long)]
        at: Option<String>,

        /// New type: wet, dirty or both.
        #[arg(long = "type")]
        kind: Option<DiaperType>,
    },

    /// Delete a diaper change.
    Rm {
        /// Diaper change ID.
        id: String,
    },

    /// List recent diaper changes, newest first.
    List {
        /// Number of changes to show.
        #[arg(long, default_value_t = 15)]
        limit: usize,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Daily wet, dirty and total counts over recent days.
    Chart {
        /// Number of days (default: `window_days` from config).
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_WINDOW_DAYS)))]
        days: Option<u32>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
