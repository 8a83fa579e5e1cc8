//! Navigation-time access control.
//!
//! Each guard inspects the [`SessionStore`] and either allows the navigation or names
//! the destination to redirect to. These are UX decisions only; the API enforces
//! authorization on its side.

use crate::config::ClientConfig;
use crate::navigation::Navigator;
use crate::session::SessionStore;
use crate::types::Role;

const RETURN_PARAM: &str = "returnUrl";

/// Outcome of a guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(String),
}

impl Access {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Route guards bound to one session.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    store: SessionStore,
    login_path: String,
    landing_path: String,
}

impl RouteGuard {
    #[must_use]
    pub fn new(store: SessionStore, config: &ClientConfig) -> Self {
        Self {
            store,
            login_path: config.login_path().to_owned(),
            landing_path: config.landing_path().to_owned(),
        }
    }

    /// Allow signed-in users; send everyone else to login with `requested` as the
    /// return target.
    #[must_use]
    pub fn require_authenticated(&self, requested: &str) -> Access {
        if self.store.is_authenticated() {
            return Access::Allow;
        }
        let encoded = urlencoding::encode(requested);
        Access::Redirect(format!("{}?{RETURN_PARAM}={encoded}", self.login_path))
    }

    /// Allow only signed-out users (login and register pages).
    #[must_use]
    pub fn guest_only(&self) -> Access {
        if self.store.is_authenticated() {
            Access::Redirect(self.landing_path.clone())
        } else {
            Access::Allow
        }
    }

    /// Allow users whose role is in `allowed`.
    ///
    /// A user without a role is denied. No user at all goes to login.
    #[must_use]
    pub fn require_role(&self, allowed: &[Role]) -> Access {
        let Some(user) = self.store.current_user() else {
            return Access::Redirect(self.login_path.clone());
        };

        match user.role {
            Some(role) if allowed.contains(&role) => Access::Allow,
            _ => Access::Redirect(self.landing_path.clone()),
        }
    }

    /// Perform the redirect of a denied outcome. Returns whether navigation may proceed.
    pub fn enforce(&self, access: Access, navigator: &dyn Navigator) -> bool {
        match access {
            Access::Allow => true,
            Access::Redirect(destination) => {
                navigator.navigate(&destination);
                false
            }
        }
    }
}
