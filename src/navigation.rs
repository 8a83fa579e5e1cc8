use std::sync::{Mutex, MutexGuard};

/// Moves the UI to another destination (a path with optional query string).
///
/// Implemented by the shell that renders the dashboard.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, destination: &str);
}

/// In-memory navigator that records every destination it was sent to.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    visited: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starting location, without counting it as a navigation.
    #[must_use]
    pub fn starting_at(destination: impl Into<String>) -> Self {
        Self {
            visited: Mutex::new(vec![destination.into()]),
        }
    }

    /// Most recent destination.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.visited().last().cloned()
    }

    /// Every destination, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.visited().clone()
    }

    /// How many times `destination` was visited.
    #[must_use]
    pub fn count(&self, destination: &str) -> usize {
        self.visited().iter().filter(|d| *d == destination).count()
    }

    fn visited(&self) -> MutexGuard<'_, Vec<String>> {
        self.visited
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, destination: &str) {
        tracing::debug!(%destination, "Navigating");
        self.visited().push(destination.to_owned());
    }
}
