use std::future::Future;
use std::pin::Pin;

use tokio::task::JoinHandle;

use crate::error::Error;

/// Renews the session before its credential expires.
///
/// Bound to the [`SessionStore`](super::SessionStore) at startup; the store calls it
/// from the refresh timer armed by every successful authentication.
///
/// # Example
///
/// ```rust,ignore
/// impl Refresher for MyGateway {
///     async fn refresh(&self) -> Result<(), finportal::Error> {
///         let response = self.api.post("/auth/refresh", &body).await?;
///         self.store.apply_success(epoch, response.into(), remember)
///     }
/// }
/// ```
pub trait Refresher: Send + Sync + 'static {
    fn refresh(&self) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Object-safe wrapper for `Refresher` (needed for `Weak<dyn>`).
pub(crate) trait RefresherDyn: Send + Sync {
    fn refresh_dyn(&self) -> Pin<Box<dyn Future<Output = Result<(), Error>> + Send + '_>>;
}

impl<T: Refresher> RefresherDyn for T {
    fn refresh_dyn(&self) -> Pin<Box<dyn Future<Output = Result<(), Error>> + Send + '_>> {
        Box::pin(self.refresh())
    }
}

/// Single-shot refresh timer slot.
///
/// The generation tag lets a firing timer tell whether it is still the current one.
#[derive(Debug, Default)]
pub(crate) struct RefreshTimer {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl RefreshTimer {
    /// Abort the pending timer, if any, and invalidate its generation.
    pub(crate) fn cancel(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn arm(&mut self, generation: u64, handle: JoinHandle<()>) {
        debug_assert!(self.handle.is_none());
        self.generation = generation;
        self.handle = Some(handle);
    }

    /// Called by the firing timer: drops its own handle without aborting it.
    /// Returns `false` if a newer timer replaced it.
    pub(crate) fn detach(&mut self, generation: u64) -> bool {
        if self.generation != generation {
            return false;
        }
        self.handle.take();
        true
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}
