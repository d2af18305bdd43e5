//! Append-only snapshot log.

use crate::error::{RedpenError, Result};
use crate::types::{ContentHash, Snapshot, SnapshotId, SnapshotKind};
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Magic bytes for a snapshot record.
const LOG_MAGIC: &[u8; 4] = b"SNP\0";

/// Current record format version.
const LOG_VERSION: u8 = 1;

/// Fixed part of a record: magic + version + flags + id + kind.
const RECORD_HEADER_SIZE: usize = 4 + 1 + 1 + 8 + 1;

/// Index entry for one record in the log.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LogEntry {
    pub id: SnapshotId,
    pub offset: u64,
    /// Frame length in bytes.
    pub len: u64,
    pub hash: ContentHash,
}

/// Result of decoding the bytes at one position of the log.
enum Frame {
    /// A record that passed every check, and its frame length.
    Complete(Snapshot, usize),
    /// The bytes end before the frame does. A torn final write looks like this.
    Short,
    /// Not a readable record.
    Corrupt(RedpenError),
}

/// Append-only file of snapshot records.
///
/// The file is the source of truth; the offset index and the decoded
/// snapshot cache are rebuilt on open.
pub struct SnapshotLog {
    /// Path to the log file.
    path: PathBuf,

    /// Log file handle.
    file: Mutex<File>,

    /// One entry per record, in file order.
    entries: RwLock<Vec<LogEntry>>,

    /// Current file size (end of the last valid record).
    file_size: RwLock<u64>,

    /// Recently decoded snapshots.
    cache: Mutex<LruCache<SnapshotId, Snapshot>>,
}

impl SnapshotLog {
    /// Open or create a snapshot log.
    ///
    /// Unreadable records are skipped and left on disk. Only a frame cut
    /// short at the end of the file (a write interrupted by a crash) is
    /// truncated away.
    pub fn open(path: impl AsRef<Path>, cache_size: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        let scan = Self::scan(&file)?;
        if let Some(torn_at) = scan.torn_at {
            warn!(
                path = %path.display(),
                valid_size = torn_at,
                file_size = scan.end,
                "truncating torn tail of snapshot log"
            );
            file.set_len(torn_at)?;
            file.sync_all()?;
        }
        let end = scan.torn_at.unwrap_or(scan.end);

        debug!(path = %path.display(), records = scan.entries.len(), "snapshot log opened");

        let cache_size = NonZeroUsize::new(cache_size.max(1)).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            path,
            file: Mutex::new(file),
            entries: RwLock::new(scan.entries),
            file_size: RwLock::new(end),
            cache: Mutex::new(LruCache::new(cache_size)),
        })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a snapshot and sync it to disk.
    ///
    /// Returns the offset where it was written. On failure the file is cut
    /// back to its previous length so no partial record is left behind.
    pub fn append(&self, snapshot: &Snapshot) -> Result<u64> {
        let bytes = encode_record(snapshot);

        let mut file = self.file.lock();
        let offset = *self.file_size.read();

        let written = file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| file.write_all(&bytes))
            .and_then(|_| file.sync_data());

        if let Err(e) = written {
            let _ = file.set_len(offset);
            return Err(e.into());
        }

        *self.file_size.write() = offset + bytes.len() as u64;
        self.entries.write().push(LogEntry {
            id: snapshot.id,
            offset,
            len: bytes.len() as u64,
            hash: ContentHash::of(&snapshot.content),
        });
        self.cache.lock().put(snapshot.id, snapshot.clone());

        Ok(offset)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Index entry with the highest id.
    pub(crate) fn latest_entry(&self) -> Option<LogEntry> {
        self.entries.read().iter().max_by_key(|e| e.id).copied()
    }

    /// The snapshot with the highest id.
    pub fn latest(&self) -> Result<Option<Snapshot>> {
        match self.latest_entry() {
            Some(entry) => self.read_entry(&entry).map(Some),
            None => Ok(None),
        }
    }

    /// All snapshots, newest first.
    pub fn read_all(&self) -> Result<Vec<Snapshot>> {
        let mut entries = self.entries.read().clone();
        entries.sort_by(|a, b| b.id.cmp(&a.id));

        entries.iter().map(|e| self.read_entry(e)).collect()
    }

    /// Force sync to disk.
    pub fn sync(&self) -> Result<()> {
        self.file.lock().sync_all()?;
        Ok(())
    }

    /// Current file size.
    pub fn size(&self) -> u64 {
        *self.file_size.read()
    }

    pub(crate) fn read_entry(&self, entry: &LogEntry) -> Result<Snapshot> {
        if let Some(cached) = self.cache.lock().get(&entry.id).cloned() {
            return Ok(cached);
        }

        let mut bytes = vec![0u8; entry.len as usize];
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(entry.offset))?;
            file.read_exact(&mut bytes)?;
        }

        let snapshot = match decode_frame(&bytes) {
            Frame::Complete(snapshot, _) => snapshot,
            Frame::Short => {
                return Err(RedpenError::InvalidFormat("Truncated snapshot record".into()))
            }
            Frame::Corrupt(e) => return Err(e),
        };

        self.cache.lock().put(snapshot.id, snapshot.clone());
        Ok(snapshot)
    }

    /// Index every readable record.
    ///
    /// After an unreadable frame the scan resumes at the next offset holding a
    /// valid record. If none follows and the frame was cut short, its offset
    /// is reported as a torn tail.
    fn scan(file: &File) -> Result<Scan> {
        let mut data = Vec::new();
        let mut reader = BufReader::new(file.try_clone()?);
        reader.seek(SeekFrom::Start(0))?;
        reader.read_to_end(&mut data)?;

        let mut entries = Vec::new();
        let mut offset = 0usize;
        let mut torn_at = None;

        while offset < data.len() {
            let reason = match decode_frame(&data[offset..]) {
                Frame::Complete(snapshot, len) => {
                    entries.push(LogEntry {
                        id: snapshot.id,
                        offset: offset as u64,
                        len: len as u64,
                        hash: ContentHash::of(&snapshot.content),
                    });
                    offset += len;
                    continue;
                }
                Frame::Short => None,
                Frame::Corrupt(e) => Some(e),
            };

            match next_record_start(&data, offset + 1) {
                Some(next) => {
                    warn!(
                        offset,
                        skipped = next - offset,
                        error = ?reason,
                        "skipping unreadable snapshot record"
                    );
                    offset = next;
                }
                None => {
                    match reason {
                        None => torn_at = Some(offset as u64),
                        Some(e) => warn!(offset, error = %e, "no readable snapshot records after offset"),
                    }
                    break;
                }
            }
        }

        Ok(Scan {
            entries,
            end: data.len() as u64,
            torn_at,
        })
    }
}

struct Scan {
    entries: Vec<LogEntry>,
    /// Physical length of the file.
    end: u64,
    /// Start of a short final frame, if any.
    torn_at: Option<u64>,
}

/// First offset at or after `from` where a valid record starts.
fn next_record_start(data: &[u8], from: usize) -> Option<usize> {
    (from..data.len().saturating_sub(LOG_MAGIC.len() - 1)).find(|&i| {
        data[i..].starts_with(LOG_MAGIC) && matches!(decode_frame(&data[i..]), Frame::Complete(..))
    })
}

/// Serialize one record. The trailing CRC covers every byte before it.
pub(crate) fn encode_record(snapshot: &Snapshot) -> Vec<u8> {
    let summary = snapshot.summary.as_bytes();
    let content = snapshot.content.as_bytes();

    let mut buf =
        Vec::with_capacity(RECORD_HEADER_SIZE + 2 + summary.len() + 4 + content.len() + 4);

    buf.extend_from_slice(LOG_MAGIC);
    buf.push(LOG_VERSION);
    // Flags (reserved)
    buf.push(0u8);
    buf.extend_from_slice(&snapshot.id.0.to_le_bytes());
    buf.push(snapshot.kind.to_byte());

    buf.extend_from_slice(&(summary.len() as u16).to_le_bytes());
    buf.extend_from_slice(summary);

    buf.extend_from_slice(&(content.len() as u32).to_le_bytes());
    buf.extend_from_slice(content);

    let checksum = crc32fast::hash(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());

    buf
}

/// Decode the record starting at `buf[0]`. Trailing bytes are ignored.
fn decode_frame(buf: &[u8]) -> Frame {
    if buf.len() < LOG_MAGIC.len() {
        return if LOG_MAGIC.starts_with(buf) {
            Frame::Short
        } else {
            Frame::Corrupt(RedpenError::InvalidFormat("Invalid snapshot magic".into()))
        };
    }
    if &buf[..4] != LOG_MAGIC {
        return Frame::Corrupt(RedpenError::InvalidFormat("Invalid snapshot magic".into()));
    }
    if buf.len() < RECORD_HEADER_SIZE + 2 {
        return Frame::Short;
    }
    if buf[4] != LOG_VERSION {
        return Frame::Corrupt(RedpenError::InvalidFormat(format!(
            "Unsupported snapshot log version: {}",
            buf[4]
        )));
    }

    let id = SnapshotId(u64::from_le_bytes(le_bytes(&buf[6..14])));
    let kind_byte = buf[14];

    let summary_start = RECORD_HEADER_SIZE + 2;
    let summary_len = u16::from_le_bytes(le_bytes(&buf[RECORD_HEADER_SIZE..summary_start])) as usize;
    let content_len_at = summary_start + summary_len;
    if buf.len() < content_len_at + 4 {
        return Frame::Short;
    }

    let content_start = content_len_at + 4;
    let content_len = u32::from_le_bytes(le_bytes(&buf[content_len_at..content_start])) as usize;
    let checksum_at = content_start + content_len;
    let len = checksum_at + 4;
    if buf.len() < len {
        return Frame::Short;
    }

    let stored_checksum = u32::from_le_bytes(le_bytes(&buf[checksum_at..len]));
    let computed_checksum = crc32fast::hash(&buf[..checksum_at]);
    if stored_checksum != computed_checksum {
        return Frame::Corrupt(RedpenError::ChecksumMismatch {
            id,
            expected: stored_checksum,
            got: computed_checksum,
        });
    }

    let Some(kind) = SnapshotKind::from_byte(kind_byte) else {
        return Frame::Corrupt(RedpenError::InvalidFormat(format!(
            "Unknown snapshot kind: {}",
            kind_byte
        )));
    };

    let text = |bytes: &[u8]| {
        String::from_utf8(bytes.to_vec()).map_err(|e| RedpenError::Deserialization(e.to_string()))
    };
    let (summary, content) = match (
        text(&buf[summary_start..content_len_at]),
        text(&buf[content_start..checksum_at]),
    ) {
        (Ok(summary), Ok(content)) => (summary, content),
        (Err(e), _) | (_, Err(e)) => return Frame::Corrupt(e),
    };

    Frame::Complete(
        Snapshot {
            id,
            content,
            summary,
            kind,
        },
        len,
    )
}

/// Copy a length-checked slice into a fixed-size array.
fn le_bytes<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn snapshot(id: u64, content: &str) -> Snapshot {
        Snapshot::new(SnapshotId(id), content, SnapshotKind::Manual)
    }

    #[test]
    fn test_append_and_read() {
        let dir = TempDir::new().unwrap();
        let log = SnapshotLog::open(dir.path().join("history.log"), 8).unwrap();

        let offset = log.append(&snapshot(10, "hello")).unwrap();
        assert_eq!(offset, 0);
        assert_eq!(log.len(), 1);

        let latest = log.latest().unwrap().unwrap();
        assert_eq!(latest.id, SnapshotId(10));
        assert_eq!(latest.content, "hello");
        assert_eq!(latest.kind, SnapshotKind::Manual);
    }

    #[test]
    fn test_read_all_newest_first() {
        let dir = TempDir::new().unwrap();
        let log = SnapshotLog::open(dir.path().join("history.log"), 8).unwrap();

        for id in [3, 1, 2] {
            log.append(&snapshot(id, &format!("v{}", id))).unwrap();
        }

        let ids: Vec<u64> = log.read_all().unwrap().iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(log.latest_entry().unwrap().id, SnapshotId(3));
    }

    #[test]
    fn test_persistence_bypasses_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.log");

        {
            let log = SnapshotLog::open(&path, 8).unwrap();
            for id in 1..=5 {
                log.append(&snapshot(id, &format!("version {}\nbody", id))).unwrap();
            }
        }

        // Cache of one forces disk reads for most records.
        let log = SnapshotLog::open(&path, 1).unwrap();
        let all = log.read_all().unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].content, "version 5\nbody");
        assert_eq!(all[0].summary, "version 5 body");
        assert_eq!(all[4].id, SnapshotId(1));
    }

    #[test]
    fn test_torn_tail_is_truncated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.log");

        let good_size = {
            let log = SnapshotLog::open(&path, 8).unwrap();
            log.append(&snapshot(1, "first")).unwrap();
            log.append(&snapshot(2, "second")).unwrap();
            log.size()
        };

        // Simulate a write cut short.
        let partial = encode_record(&snapshot(3, "third, never finished"));
        let mut bytes = fs::read(&path).unwrap();
        bytes.extend_from_slice(&partial[..partial.len() / 2]);
        fs::write(&path, &bytes).unwrap();

        let log = SnapshotLog::open(&path, 8).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.size(), good_size);
        assert_eq!(fs::metadata(&path).unwrap().len(), good_size);

        // Appending continues cleanly after the truncation point.
        log.append(&snapshot(4, "fourth")).unwrap();
        drop(log);
        let log = SnapshotLog::open(&path, 8).unwrap();
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_corrupt_record_skipped_without_losing_later_ones() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.log");

        let first_len = encode_record(&snapshot(1, "first body")).len();
        {
            let log = SnapshotLog::open(&path, 8).unwrap();
            log.append(&snapshot(1, "first body")).unwrap();
            log.append(&snapshot(2, "second body")).unwrap();
            log.append(&snapshot(3, "third body")).unwrap();
        }
        let size_before = fs::metadata(&path).unwrap().len();

        // Flip a content byte of the first record.
        let mut bytes = fs::read(&path).unwrap();
        bytes[first_len - 6] ^= 0xff;
        fs::write(&path, &bytes).unwrap();

        let log = SnapshotLog::open(&path, 8).unwrap();
        let contents: Vec<String> = log.read_all().unwrap().into_iter().map(|s| s.content).collect();
        assert_eq!(contents, vec!["third body", "second body"]);
        assert_eq!(fs::metadata(&path).unwrap().len(), size_before);

        log.append(&snapshot(4, "fourth body")).unwrap();
        drop(log);
        let log = SnapshotLog::open(&path, 8).unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log.latest().unwrap().unwrap().content, "fourth body");
    }

    #[test]
    fn test_header_corruption_detected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.log");

        {
            let log = SnapshotLog::open(&path, 8).unwrap();
            log.append(&snapshot(1, "only")).unwrap();
        }

        // Set the id field to u64::MAX; the checksum covers the header.
        let mut bytes = fs::read(&path).unwrap();
        bytes[6..14].copy_from_slice(&u64::MAX.to_le_bytes());
        fs::write(&path, &bytes).unwrap();

        let log = SnapshotLog::open(&path, 8).unwrap();
        assert!(log.is_empty());
        assert_eq!(log.size(), bytes.len() as u64);
    }

    #[test]
    fn test_trailing_garbage_kept_and_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.log");

        {
            let log = SnapshotLog::open(&path, 8).unwrap();
            log.append(&snapshot(1, "before")).unwrap();
        }
        let mut bytes = fs::read(&path).unwrap();
        bytes.extend_from_slice(b"not a record at all");
        fs::write(&path, &bytes).unwrap();

        {
            let log = SnapshotLog::open(&path, 8).unwrap();
            assert_eq!(log.len(), 1);
            assert_eq!(log.size(), bytes.len() as u64);
            log.append(&snapshot(2, "after")).unwrap();
        }

        let log = SnapshotLog::open(&path, 8).unwrap();
        let ids: Vec<u64> = log.read_all().unwrap().iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
