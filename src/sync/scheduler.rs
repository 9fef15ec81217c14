use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::broadcast::{Broadcaster, SNAPSHOT_EVENT};
use crate::error::Result;
use crate::reader::ClusterReader;
use crate::shutdown::Shutdown;
use crate::sync::aggregator::build_snapshot;
use crate::sync::cache::SnapshotCache;
use crate::sync::fingerprint::{fingerprint, Fingerprint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
    Evaluating,
    Broadcasting,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Unchanged,
    Broadcast { reached: usize },
}

/// Delay between cycles: `busy` while anyone is watching, `idle` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub busy: Duration,
    pub idle: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            busy: Duration::from_secs(5),
            idle: Duration::from_secs(30),
        }
    }
}

impl PollIntervals {
    pub fn next_delay(&self, active_connections: usize) -> Duration {
        if active_connections > 0 {
            self.busy
        } else {
            self.idle
        }
    }
}

/// Drives aggregate → fingerprint → broadcast until shutdown.
///
/// Sole writer of the last-broadcast fingerprint and sole caller of
/// [`SnapshotCache::set`].
pub struct PollScheduler {
    reader: Arc<dyn ClusterReader>,
    cache: Arc<SnapshotCache>,
    broadcaster: Arc<dyn Broadcaster>,
    intervals: PollIntervals,
    last_fingerprint: Option<Fingerprint>,
    state: PollState,
}

impl PollScheduler {
    pub fn new(
        reader: Arc<dyn ClusterReader>,
        cache: Arc<SnapshotCache>,
        broadcaster: Arc<dyn Broadcaster>,
        intervals: PollIntervals,
    ) -> Self {
        Self {
            reader,
            cache,
            broadcaster,
            intervals,
            last_fingerprint: None,
            state: PollState::Idle,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn last_fingerprint(&self) -> Option<&Fingerprint> {
        self.last_fingerprint.as_ref()
    }

    pub fn next_delay(&self) -> Duration {
        self.intervals.next_delay(self.broadcaster.active_connection_count())
    }

    /// One aggregate → evaluate → (broadcast) pass. The fingerprint only advances
    /// after a successful push, so a failed push is retried next cycle.
    pub async fn poll_once(&mut self, shutdown: &Shutdown) -> Result<CycleOutcome> {
        self.state = PollState::Polling;
        let snapshot = build_snapshot(self.reader.as_ref(), shutdown).await?;

        self.state = PollState::Evaluating;
        let fp = fingerprint(&snapshot)?;
        if self.last_fingerprint.as_ref() == Some(&fp) {
            return Ok(CycleOutcome::Unchanged);
        }

        self.state = PollState::Broadcasting;
        let snapshot = Arc::new(snapshot);
        self.cache.set(snapshot.clone());
        let reached = self.broadcaster.push_to_all(SNAPSHOT_EVENT, snapshot)?;
        self.last_fingerprint = Some(fp);
        Ok(CycleOutcome::Broadcast { reached })
    }

    /// Run until shutdown. Cycle failures are logged and the loop carries on after
    /// the normal delay.
    pub async fn run(&mut self, shutdown: Shutdown) {
        info!(
            "Poll loop started (busy {:?}, idle {:?})",
            self.intervals.busy, self.intervals.idle
        );

        while !shutdown.is_triggered() {
            match self.poll_once(&shutdown).await {
                Ok(CycleOutcome::Unchanged) => debug!("Snapshot unchanged"),
                Ok(CycleOutcome::Broadcast { reached }) => {
                    debug!("Snapshot changed, pushed to {} viewers", reached)
                }
                Err(e) if e.is_cancelled() => break,
                Err(e) => warn!("Poll cycle failed: {}", e),
            }

            self.state = PollState::Idle;
            let delay = self.next_delay();
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.state = PollState::Stopped;
        info!("Poll loop stopped");
    }
}
