//! Snapshot store paired with the cached baseline.

use super::store::SnapshotStore;
use crate::types::{Snapshot, SnapshotKind};
use parking_lot::Mutex;

/// The snapshot store plus the in-memory copy of the latest snapshot's
/// content that delta checks compare against.
///
/// The baseline is a cache. Dedup always consults the store itself, so a
/// stale baseline can only cause an extra check, never a duplicate.
pub struct SnapshotHistory {
    store: SnapshotStore,

    /// Content of the latest snapshot. `None` until one exists.
    baseline: Mutex<Option<String>>,
}

impl SnapshotHistory {
    /// Wrap a store, priming the baseline from its latest snapshot.
    pub fn new(store: SnapshotStore) -> Self {
        let history = Self {
            store,
            baseline: Mutex::new(None),
        };
        history.prime_baseline();
        history
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Append a snapshot; on success the baseline becomes `content`.
    pub fn capture(&self, content: &str, kind: SnapshotKind) -> bool {
        self.capture_if(content, kind, |_| true)
    }

    /// Append a snapshot only if `should_capture` approves the current
    /// baseline. The baseline is locked for the whole check-append-update
    /// sequence, so concurrent triggers see it either before or after.
    pub fn capture_if<F>(&self, content: &str, kind: SnapshotKind, should_capture: F) -> bool
    where
        F: FnOnce(Option<&str>) -> bool,
    {
        let mut baseline = self.baseline.lock();
        if !should_capture(baseline.as_deref()) {
            return false;
        }

        let saved = self.store.append(content, kind);
        if saved {
            *baseline = Some(content.to_string());
        }
        saved
    }

    /// Current baseline content.
    pub fn baseline(&self) -> Option<String> {
        self.baseline.lock().clone()
    }

    /// Replace the baseline (after a restore). Empty content clears it.
    pub fn reset_baseline(&self, content: &str) {
        *self.baseline.lock() = if content.is_empty() {
            None
        } else {
            Some(content.to_string())
        };
    }

    /// Recompute the baseline from the store's latest snapshot.
    pub fn prime_baseline(&self) {
        let latest = self.store.latest().map(|s| s.content);
        *self.baseline.lock() = latest;
    }

    /// All snapshots, newest first.
    pub fn list_all(&self) -> Vec<Snapshot> {
        self.store.list_all()
    }

    pub fn count(&self) -> usize {
        self.store.count()
    }
}
