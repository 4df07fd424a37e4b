//! Core domain logic for the baby monitor.
//!
//! This crate contains the fundamental types and logic for:
//! - Events: feeds and diaper changes as stored remotely
//! - Aggregation: rolling daily series and "today" summaries
//! - Editor: the picker/edit state and its transitions
//! - Session: the credential bundle and its expiry rule

pub mod aggregation;
mod diaper_type;
pub mod display;
pub mod editor;
pub mod event;
mod session;
#[cfg(test)]
mod test_zone;
mod types;

pub use diaper_type::DiaperType;
pub use editor::{Action, EditorState, Submission, Tab};
pub use event::{Diaper, DiaperEvent, Entry, EventRecord, Feed, FeedEvent};
pub use session::Session;
pub use types::{EventId, Ounces, UserId, ValidationError};
