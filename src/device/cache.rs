//! Holder for the most recently committed snapshot.

use crate::device::data::Snapshot;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

/// The last snapshot successfully decoded from the device.
///
/// Snapshots are swapped in whole; readers get an `Arc` to an immutable
/// value and never see a half-built one.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotCache {
    /// Create a cache holding the empty placeholder snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Publish a new snapshot, replacing the previous one.
    pub fn replace(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = snapshot;
    }

    /// When the current snapshot was committed, if ever.
    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.current().fetched_at
    }
}
