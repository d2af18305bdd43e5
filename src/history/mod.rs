//! Snapshot history.
//!
//! Snapshots live in an append-only log file. Each record is framed and
//! checksummed; the offset index is rebuilt on open.

mod baseline;
mod log;
mod store;

pub use baseline::SnapshotHistory;
pub use log::SnapshotLog;
pub use store::SnapshotStore;
