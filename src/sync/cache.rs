use std::sync::{Arc, Mutex};

use crate::models::ClusterSnapshot;

/// Holds the latest complete snapshot for viewers that connect between broadcasts.
/// The value is replaced wholesale; readers share the same immutable `Arc`.
#[derive(Default)]
pub struct SnapshotCache {
    latest: Mutex<Option<Arc<ClusterSnapshot>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until the first successful poll cycle.
    pub fn get(&self) -> Option<Arc<ClusterSnapshot>> {
        // A poisoned lock still holds a complete snapshot
        let guard = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    pub fn set(&self, snapshot: Arc<ClusterSnapshot>) {
        let mut guard = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(snapshot);
    }
}
