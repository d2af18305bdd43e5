//! Core types for the snapshot history.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Number of characters kept in a snapshot summary.
pub const SUMMARY_CHARS: usize = 60;

/// Unique identifier for a snapshot.
///
/// The value is the creation time in milliseconds since the Unix epoch, so
/// ordering by id is ordering by creation time.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub u64);

impl SnapshotId {
    /// Next id strictly after `latest`, preferring the current clock.
    pub fn next_after(latest: Option<SnapshotId>, now: Timestamp) -> Self {
        let now = now.as_millis();
        match latest {
            Some(prev) if prev.0 >= now => SnapshotId(prev.0.saturating_add(1)),
            _ => SnapshotId(now),
        }
    }

    /// Creation time encoded in the id.
    pub fn timestamp(self) -> Timestamp {
        Timestamp(self.0 as i64)
    }
}

impl fmt::Debug for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotId({})", self.0)
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Milliseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_millis() as i64)
    }

    /// Milliseconds, clamped at zero for pre-epoch values.
    pub fn as_millis(self) -> u64 {
        self.0.max(0) as u64
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// SHA-256 of snapshot content, kept in the log index for cheap dedup.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    pub fn of(content: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        ContentHash(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({}...)", &self.to_hex()[..8])
    }
}

/// What caused a snapshot to be taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    /// Explicit user save, or a safety snapshot before clear/restore/rewrite.
    Manual,
    /// Taken by the scheduler.
    Auto,
}

impl SnapshotKind {
    pub(crate) fn to_byte(self) -> u8 {
        match self {
            SnapshotKind::Manual => 0,
            SnapshotKind::Auto => 1,
        }
    }

    pub(crate) fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(SnapshotKind::Manual),
            1 => Some(SnapshotKind::Auto),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotKind::Manual => "manual",
            SnapshotKind::Auto => "auto",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable saved copy of the document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub content: String,
    /// Preview derived from `content` at creation time.
    pub summary: String,
    #[serde(rename = "type")]
    pub kind: SnapshotKind,
}

impl Snapshot {
    pub fn new(id: SnapshotId, content: impl Into<String>, kind: SnapshotKind) -> Self {
        let content = content.into();
        let summary = summarize(&content);
        Self {
            id,
            content,
            summary,
            kind,
        }
    }

    pub fn created_at(&self) -> Timestamp {
        self.id.timestamp()
    }
}

/// Build the history preview: the first [`SUMMARY_CHARS`] characters with
/// newlines flattened to spaces, plus `...` when the content was cut.
pub fn summarize(content: &str) -> String {
    let mut summary: String = content
        .chars()
        .take(SUMMARY_CHARS)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    if content.chars().count() > SUMMARY_CHARS {
        summary.push_str("...");
    }
    summary
}
