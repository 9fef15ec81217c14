use tokio::sync::watch;

/// Owning side of the process shutdown signal.
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Cloneable observer handed to the poll loop and the HTTP server.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // send_replace never fails, even when every observer is gone
        self.tx.send_replace(true);
    }
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is triggered or the trigger is dropped.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // Err means the trigger is gone, which counts as shutdown
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}
