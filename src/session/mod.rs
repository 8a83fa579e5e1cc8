//! Authenticated session lifecycle.
//!
//! The [`SessionStore`] owns the live user and credential, persists them through
//! [`AuthStorage`](crate::storage::AuthStorage), publishes every transition on a
//! `tokio::sync::watch` channel and keeps the single-shot refresh timer.

mod refresh;
mod state;
mod store;

pub use refresh::Refresher;
pub use state::{AuthSuccess, SessionEpoch, SessionState};
pub use store::SessionStore;
