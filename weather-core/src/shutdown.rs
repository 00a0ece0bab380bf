//! Cancellation handle shared by the signal watcher and the API clients.

use std::future::Future;

use tokio::sync::watch;

/// Fires the shutdown. Dropping it without calling [`ShutdownTrigger::trigger`]
/// never cancels anything.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Observed by every outbound call.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl Shutdown {
    /// A handle that is never triggered.
    pub fn never() -> Self {
        let (_trigger, shutdown) = channel();
        shutdown
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the trigger fires.
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|fired| *fired).await.is_err() {
            // Trigger dropped without firing.
            std::future::pending::<()>().await;
        }
    }

    /// Runs `fut` unless the shutdown fires first, in which case `cancelled`
    /// is returned and `fut` is dropped.
    pub async fn guard<F, T, E>(&self, fut: F, cancelled: E) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        tokio::select! {
            biased;
            _ = self.triggered() => Err(cancelled),
            res = fut => res,
        }
    }
}
