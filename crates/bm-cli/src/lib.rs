//! Baby monitor CLI library.
//!
//! This crate provides the `bm` command-line interface: argument parsing,
//! configuration, and the command implementations.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, DiaperAction, FeedAction};
pub use config::Config;
