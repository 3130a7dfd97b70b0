//! Shutdown coordination for a running listener.

use tokio::sync::watch;

/// Stop signal for one listener instance.
///
/// Backed by a watch channel so a listener that subscribes after the
/// trigger still observes it.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a new, untriggered signal.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Get a handle that resolves once the signal fires.
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Fire the signal. Further calls have no effect.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of [`Shutdown`].
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Wait for the trigger. Also returns if the [`Shutdown`] was dropped.
    pub async fn wait(mut self) {
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn late_subscriber_sees_trigger() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());

        shutdown.trigger();
        assert!(shutdown.is_triggered());

        tokio::time::timeout(Duration::from_secs(1), shutdown.subscribe().wait())
            .await
            .expect("listener should observe an earlier trigger");
    }

    #[tokio::test]
    async fn waiting_listener_is_woken() {
        let shutdown = Shutdown::new();
        let listener = shutdown.subscribe();
        let waiter = tokio::spawn(listener.wait());

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn dropped_signal_releases_listener() {
        let shutdown = Shutdown::new();
        let listener = shutdown.subscribe();
        drop(shutdown);

        tokio::time::timeout(Duration::from_secs(1), listener.wait())
            .await
            .unwrap();
    }
}
