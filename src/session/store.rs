use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::watch;

use super::refresh::{RefreshTimer, Refresher, RefresherDyn};
use super::state::{AuthSuccess, SessionEpoch, SessionState};
use crate::error::Error;
use crate::storage::{AuthStorage, StoredAuth};
use crate::token;
use crate::types::User;

/// Single source of truth for the authenticated session.
///
/// Cheap to clone: every clone is a handle onto the same session. Construct one at
/// startup and pass it to every component that needs it.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

struct Inner {
    storage: AuthStorage,
    refresh_lead: Duration,
    state: watch::Sender<SessionState>,
    // Also serializes every mutation of `state` + `storage`.
    timer: Mutex<RefreshTimer>,
    refresher: RwLock<Option<Weak<dyn RefresherDyn>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(storage: AuthStorage, refresh_lead: Duration) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(Inner {
                storage,
                refresh_lead,
                state,
                timer: Mutex::new(RefreshTimer::default()),
                refresher: RwLock::new(None),
            }),
        }
    }

    /// Register the component the refresh timer calls.
    ///
    /// Only a weak reference is kept, so the refresher may itself own a store handle.
    pub fn bind_refresher<R: Refresher>(&self, refresher: &Arc<R>) {
        let weak = Arc::downgrade(refresher);
        let weak: Weak<dyn RefresherDyn> = weak;
        *self
            .inner
            .refresher
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(weak);
    }

    /// Adopt a persisted, unexpired session. Anything else found in storage is purged.
    ///
    /// Returns whether a session was adopted.
    pub fn hydrate(&self) -> bool {
        self.hydrate_at(OffsetDateTime::now_utc())
    }

    pub(crate) fn hydrate_at(&self, now: OffsetDateTime) -> bool {
        let mut timer = self.lock_timer();

        let Some(stored) = self.inner.storage.load() else {
            self.inner.storage.purge();
            tracing::debug!("No persisted session");
            return false;
        };

        let payload = match token::decode_payload(&stored.token) {
            Ok(payload) if payload.is_live_at(now) => payload,
            Ok(_) | Err(_) => {
                self.inner.storage.purge();
                tracing::debug!("Persisted session expired or malformed, purged");
                return false;
            }
        };

        self.inner.state.send_modify(|s| {
            s.user = Some(stored.user);
            s.token = Some(stored.token);
            s.last_error = None;
        });

        let remaining = payload.expires_at - now.unix_timestamp();
        let remaining = Duration::from_secs(u64::try_from(remaining).unwrap_or(0));
        timer.cancel();
        self.schedule_refresh(&mut timer, remaining);

        tracing::debug!("Session restored from storage");
        true
    }

    /// Epoch of the live session.
    #[must_use]
    pub fn epoch(&self) -> SessionEpoch {
        self.inner.state.borrow().epoch
    }

    /// Mark an auth operation as started and return the epoch it runs under.
    pub fn begin(&self) -> SessionEpoch {
        let mut epoch = SessionEpoch::default();
        self.inner.state.send_modify(|s| {
            s.is_loading = true;
            s.last_error = None;
            epoch = s.epoch;
        });
        epoch
    }

    /// Record a failed auth operation. The session itself is left untouched.
    pub fn fail(&self, error: &Error) {
        let message = error.user_message();
        self.inner.state.send_modify(|s| {
            s.is_loading = false;
            s.last_error = Some(message);
        });
    }

    /// Install a freshly authenticated session.
    ///
    /// Storage is written before the new state is published, so any subscriber that
    /// observes `is_authenticated()` can also read the token back from storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Superseded`] if the session was cleared after `epoch` was
    /// taken; the stale result is discarded.
    pub fn apply_success(
        &self,
        epoch: SessionEpoch,
        success: AuthSuccess,
        remember: bool,
    ) -> Result<(), Error> {
        let mut timer = self.lock_timer();

        let current = self.epoch();
        if current != epoch {
            self.inner.state.send_modify(|s| s.is_loading = false);
            tracing::debug!(%epoch, %current, "Discarding auth result for a cleared session");
            return Err(Error::Superseded);
        }

        let AuthSuccess {
            user,
            token,
            refresh_token,
            expires_in,
        } = success;

        self.inner.storage.persist(&StoredAuth {
            token: token.clone(),
            user: user.clone(),
            refresh_token,
            remember,
        });

        self.inner.state.send_modify(|s| {
            s.user = Some(user);
            s.token = Some(token);
            s.is_loading = false;
            s.last_error = None;
        });

        timer.cancel();
        if let Some(expires_in) = expires_in {
            self.schedule_refresh(&mut timer, expires_in);
        }

        tracing::debug!(%epoch, remember, "Session applied");
        Ok(())
    }

    /// Drop the session: state, both storage scopes and any pending refresh.
    pub fn clear(&self) {
        let mut timer = self.lock_timer();
        self.clear_locked(&mut timer);
    }

    /// Clear the session only if it is still the one started at `epoch`.
    ///
    /// Returns `true` if this call performed the clear.
    pub fn invalidate(&self, epoch: SessionEpoch) -> bool {
        let mut timer = self.lock_timer();
        if self.epoch() != epoch {
            return false;
        }
        self.clear_locked(&mut timer);
        true
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.inner.state.borrow().user.clone()
    }

    #[must_use]
    pub fn current_token(&self) -> Option<String> {
        self.inner.state.borrow().token.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.inner.state.borrow().last_error.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receive the current state and every later transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Persisted refresh credential, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.inner.storage.refresh_token()
    }

    /// Persisted token, read straight from storage.
    #[must_use]
    pub fn stored_token(&self) -> Option<String> {
        self.inner.storage.token()
    }

    /// Whether the live session was persisted to the durable scope.
    #[must_use]
    pub fn remembered(&self) -> bool {
        self.inner.storage.remembered()
    }

    #[must_use]
    pub fn has_pending_refresh(&self) -> bool {
        self.lock_timer().is_armed()
    }

    fn clear_locked(&self, timer: &mut RefreshTimer) {
        timer.cancel();
        self.inner.storage.purge();
        self.inner.state.send_modify(|s| {
            s.user = None;
            s.token = None;
            s.last_error = None;
            s.is_loading = false;
            s.epoch = s.epoch.next();
        });
        tracing::debug!(epoch = %self.epoch(), "Session cleared");
    }

    fn schedule_refresh(&self, timer: &mut RefreshTimer, expires_in: Duration) {
        let Some(delay) = expires_in
            .checked_sub(self.inner.refresh_lead)
            .filter(|d| !d.is_zero())
        else {
            tracing::debug!("Token lifetime shorter than refresh lead, no refresh scheduled");
            return;
        };

        let Some(refresher) = self.refresher() else {
            tracing::debug!("No refresher bound, no refresh scheduled");
            return;
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime, refresh not scheduled");
            return;
        };

        let generation = timer.generation();
        let store = Arc::downgrade(&self.inner);
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;

            let Some(inner) = store.upgrade() else { return };
            let store = SessionStore { inner };
            if !store.lock_timer().detach(generation) || !store.is_authenticated() {
                return;
            }
            let Some(refresher) = refresher.upgrade() else { return };

            let epoch = store.epoch();
            tracing::debug!(%epoch, "Refreshing session before expiry");
            match refresher.refresh_dyn().await {
                Ok(()) | Err(Error::Superseded) => {}
                Err(e) => {
                    // A newer session may have replaced the one this timer belonged to.
                    if store.invalidate(epoch) {
                        tracing::warn!(error = %e, "Scheduled refresh failed, session cleared");
                    }
                }
            }
        });
        timer.arm(generation, handle);
    }

    fn refresher(&self) -> Option<Weak<dyn RefresherDyn>> {
        self.inner
            .refresher
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn lock_timer(&self) -> MutexGuard<'_, RefreshTimer> {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("SessionStore")
            .field("authenticated", &state.is_authenticated())
            .field("epoch", &state.epoch)
            .finish_non_exhaustive()
    }
}
