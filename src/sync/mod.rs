//! Snapshot synchronization engine: aggregate, fingerprint, cache, broadcast.

pub mod aggregator;
pub mod cache;
pub mod fingerprint;
pub mod project;
pub mod scheduler;

pub use aggregator::build_snapshot;
pub use cache::SnapshotCache;
pub use fingerprint::{fingerprint, Fingerprint};
pub use scheduler::{PollIntervals, PollScheduler, PollState};
