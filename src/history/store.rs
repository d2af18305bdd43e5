//! Snapshot store: de-duplicated, fail-soft appends over the snapshot log.

use super::log::SnapshotLog;
use crate::error::Result;
use crate::types::{ContentHash, Snapshot, SnapshotId, SnapshotKind, Timestamp};
use parking_lot::Mutex;
use std::path::Path;
use tracing::{debug, warn};

/// Versioned history of the document.
///
/// Appends are rejected (not failed) for blank content and for content equal
/// to the latest snapshot. Only the latest snapshot is compared, so a value
/// can reappear later in the timeline after an edit-and-revert.
///
/// The plain methods (`append`, `list_all`, `latest`) never surface storage
/// errors: they log and degrade to "nothing happened". The `try_` variants
/// return the error for callers that want it.
pub struct SnapshotStore {
    log: SnapshotLog,

    /// Serialises the read-latest / append pair.
    write_lock: Mutex<()>,
}

impl SnapshotStore {
    /// Open or create the store backed by the log at `path`.
    pub fn open(path: impl AsRef<Path>, cache_size: usize) -> Result<Self> {
        Ok(Self {
            log: SnapshotLog::open(path, cache_size)?,
            write_lock: Mutex::new(()),
        })
    }

    /// Append `content` as a new snapshot. Returns whether one was created.
    pub fn append(&self, content: &str, kind: SnapshotKind) -> bool {
        match self.try_append(content, kind) {
            Ok(created) => created.is_some(),
            Err(e) => {
                warn!(%kind, error = %e, "failed to save snapshot");
                false
            }
        }
    }

    /// Append `content`, returning the created snapshot or `None` when the
    /// content is blank or unchanged from the latest snapshot.
    pub fn try_append(&self, content: &str, kind: SnapshotKind) -> Result<Option<Snapshot>> {
        if content.trim().is_empty() {
            return Ok(None);
        }

        let _lock = self.write_lock.lock();

        let latest = self.log.latest_entry();
        if let Some(entry) = &latest {
            if entry.hash == ContentHash::of(content)
                && self.log.read_entry(entry)?.content == content
            {
                debug!(%kind, latest = %entry.id, "content unchanged, skipping snapshot");
                return Ok(None);
            }
        }

        let id = SnapshotId::next_after(latest.map(|e| e.id), Timestamp::now());
        let snapshot = Snapshot::new(id, content, kind);
        self.log.append(&snapshot)?;

        debug!(%kind, %id, chars = content.chars().count(), "snapshot saved");
        Ok(Some(snapshot))
    }

    /// All snapshots, newest first. Empty on storage failure.
    pub fn list_all(&self) -> Vec<Snapshot> {
        self.try_list_all().unwrap_or_else(|e| {
            warn!(error = %e, "failed to read snapshot history");
            Vec::new()
        })
    }

    pub fn try_list_all(&self) -> Result<Vec<Snapshot>> {
        self.log.read_all()
    }

    /// Number of stored snapshots.
    pub fn count(&self) -> usize {
        self.log.len()
    }

    /// The most recent snapshot. `None` on an empty log or storage failure.
    pub fn latest(&self) -> Option<Snapshot> {
        self.try_latest().unwrap_or_else(|e| {
            warn!(error = %e, "failed to read latest snapshot");
            None
        })
    }

    pub fn try_latest(&self) -> Result<Option<Snapshot>> {
        self.log.latest()
    }

    /// Force sync to disk.
    pub fn sync(&self) -> Result<()> {
        self.log.sync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store(dir: &TempDir) -> SnapshotStore {
        SnapshotStore::open(dir.path().join("history.log"), 16).unwrap()
    }

    #[test]
    fn test_first_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        assert!(store.append("Hello world", SnapshotKind::Manual));
        assert_eq!(store.count(), 1);

        let all = store.list_all();
        assert_eq!(all[0].summary, "Hello world");
        assert_eq!(all[0].kind, SnapshotKind::Manual);
    }

    #[test]
    fn test_duplicate_of_latest_rejected() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        assert!(store.append("ABC", SnapshotKind::Manual));
        assert!(!store.append("ABC", SnapshotKind::Auto));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_blank_rejected() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        assert!(!store.append("", SnapshotKind::Manual));
        assert!(!store.append("   ", SnapshotKind::Auto));
        assert!(!store.append("\n\t ", SnapshotKind::Auto));
        assert_eq!(store.count(), 0);
        assert!(store.list_all().is_empty());
        assert!(store.latest().is_none());
    }

    #[test]
    fn test_non_adjacent_repeat_allowed() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        assert!(store.append("draft", SnapshotKind::Auto));
        assert!(store.append("draft, edited", SnapshotKind::Auto));
        assert!(store.append("draft", SnapshotKind::Manual));
        assert_eq!(store.count(), 3);
    }

    #[test]
    fn test_ids_strictly_increase() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        for i in 0..20 {
            assert!(store.append(&format!("v{}", i), SnapshotKind::Auto));
        }

        let all = store.list_all();
        assert_eq!(all.len(), store.count());
        for pair in all.windows(2) {
            assert!(pair[0].id > pair[1].id);
        }
        assert_eq!(all[0].content, "v19");
    }

    #[test]
    fn test_dedup_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = test_store(&dir);
            store.append("persisted", SnapshotKind::Manual);
        }

        let store = test_store(&dir);
        assert!(!store.append("persisted", SnapshotKind::Auto));
        assert_eq!(store.count(), 1);
    }
}
