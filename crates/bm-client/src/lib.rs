//! Remote collaborators for the baby monitor.
//!
//! - [`auth`]: identity provider sign-up, log-in and token refresh
//! - [`store`]: the path-addressed JSON store, over HTTP or in memory
//! - [`repository`]: per-user feed and diaper collections on top of a store
//! - [`session_store`]: the persisted session and its refresh-on-load rule

pub mod auth;
pub mod repository;
pub mod session_store;
pub mod store;

pub use auth::{AuthClient, AuthEndpoints, AuthError, AuthGrant, RefreshedToken, TokenRefresher};
pub use repository::Repository;
pub use session_store::{SessionError, SessionStore};
pub use store::{HttpStore, MemoryStore, RemoteStore, StoreError};
