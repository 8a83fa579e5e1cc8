use std::time::Duration;

use derive_more::Display;

use crate::types::User;

/// Counter bumped on every session clear.
///
/// Work started under one epoch must not apply its result once the epoch has moved on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub struct SessionEpoch(pub u64);

impl SessionEpoch {
    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Snapshot of the live session, published on every transition.
#[derive(Debug, Clone, Default, PartialEq)]
#[non_exhaustive]
pub struct SessionState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_loading: bool,
    pub last_error: Option<String>,
    pub epoch: SessionEpoch,
}

impl SessionState {
    /// Both a credential and a user are present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

/// Result of a successful login, registration or refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSuccess {
    pub user: User,
    pub token: String,
    pub refresh_token: Option<String>,
    /// Lifetime of `token`; `None` disables the refresh timer.
    pub expires_in: Option<Duration>,
}
