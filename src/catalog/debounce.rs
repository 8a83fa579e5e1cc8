use std::time::Duration;

use tokio::sync::mpsc;

/// Sending half of a [`Debouncer`]. Cheap to clone.
#[derive(Debug)]
pub struct DebounceInput<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Clone for DebounceInput<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> DebounceInput<T> {
    /// Record a new value and restart the quiescence countdown.
    ///
    /// Returns `false` once the receiving [`Debouncer`] is gone.
    pub fn push(&self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }
}

/// Coalesces a burst of inputs into the last one, released only after `window` has
/// passed without another input.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> Debouncer<T> {
    #[must_use]
    pub fn channel(window: Duration) -> (DebounceInput<T>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (DebounceInput { tx }, Self { window, rx })
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait for the next settled value.
    ///
    /// Returns `None` once every [`DebounceInput`] is dropped and nothing is pending.
    /// A value still waiting out its window when the inputs close is released
    /// immediately. Not cancel safe: dropping the future discards the pending value.
    pub async fn settled(&mut self) -> Option<T> {
        let mut latest = self.rx.recv().await?;
        loop {
            match tokio::time::timeout(self.window, self.rx.recv()).await {
                Ok(Some(value)) => latest = value,
                Ok(None) | Err(_) => return Some(latest),
            }
        }
    }
}
