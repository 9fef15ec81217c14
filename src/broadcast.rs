//! Subscriber registry and push-to-all transport.
//!
//! Snapshots fan out over a `tokio::broadcast` channel. Each viewer connection
//! holds a [`Subscription`]; the live connection count is an atomic counter
//! bumped on subscribe and released when the subscription drops.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::ClusterSnapshot;

/// Event name used for snapshot pushes.
pub const SNAPSHOT_EVENT: &str = "snapshot";

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct SnapshotEvent {
    pub name: String,
    pub snapshot: Arc<ClusterSnapshot>,
}

/// What the poll loop needs from the transport: a sink plus a live counter.
pub trait Broadcaster: Send + Sync {
    /// Push to every connected viewer. Returns how many receivers were reached.
    fn push_to_all(&self, event: &str, snapshot: Arc<ClusterSnapshot>) -> Result<usize>;

    fn active_connection_count(&self) -> usize;
}

pub struct SubscriberRegistry {
    tx: broadcast::Sender<SnapshotEvent>,
    active: Arc<AtomicUsize>,
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Register a viewer connection. The count drops again when the returned value is dropped.
    pub fn subscribe(&self) -> Subscription {
        // Receiver first: a counted viewer must always have a live receiver
        let rx = self.tx.subscribe();
        let count = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let id = Uuid::new_v4();
        log::debug!("Viewer {} connected ({} active)", id, count);
        Subscription {
            id,
            rx,
            active: self.active.clone(),
        }
    }
}

impl Broadcaster for SubscriberRegistry {
    fn push_to_all(&self, event: &str, snapshot: Arc<ClusterSnapshot>) -> Result<usize> {
        let event = SnapshotEvent {
            name: event.to_string(),
            snapshot,
        };
        match self.tx.send(event) {
            Ok(n) => Ok(n),
            // No receivers is not a failure; nobody is watching
            Err(_) if self.active_connection_count() == 0 => Ok(0),
            Err(e) => Err(Error::BroadcastError(e.to_string())),
        }
    }

    fn active_connection_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// One viewer's view of the broadcast stream.
pub struct Subscription {
    id: Uuid,
    rx: broadcast::Receiver<SnapshotEvent>,
    active: Arc<AtomicUsize>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next pushed event; `None` once the registry is gone. A slow viewer that
    /// fell behind skips straight to the newest snapshots.
    pub async fn recv(&mut self) -> Option<SnapshotEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::debug!("Viewer {} lagged, skipped {} snapshots", self.id, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let left = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
        log::debug!("Viewer {} disconnected ({} active)", self.id, left);
    }
}
