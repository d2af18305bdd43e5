//! # Redpen
//!
//! Local persistence and history engine for an editorial writing assistant.
//!
//! ## Core Concepts
//!
//! - **Settings**: A small key-value namespace for the draft, policy and
//!   preferences. Last write wins.
//! - **Snapshots**: An append-only log of document versions. An append that
//!   repeats the newest snapshot is absorbed.
//! - **Scheduler**: Takes automatic snapshots on a fixed interval and after
//!   large edits, and debounces draft autosave.
//! - **Session**: The editor state, with restore, clear/undo and the
//!   language-model collaborators.
//!
//! ## Example
//!
//! ```ignore
//! use redpen::{Profile, Session, SessionConfig, StoreConfig};
//!
//! let profile = Profile::open_or_create(StoreConfig {
//!     path: "./redpen-profile".into(),
//!     ..Default::default()
//! })?;
//! let mut session = Session::open(profile, SessionConfig::default())?;
//!
//! session.set_content("Draft text...");
//! session.save_now();
//!
//! for snapshot in session.history() {
//!     println!("{} {}", snapshot.created_at(), snapshot.summary);
//! }
//! ```

pub mod assist;
pub mod config;
pub mod error;
pub mod history;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod store;
pub mod types;

// Re-exports
pub use config::{ScheduleConfig, SessionConfig, StoreConfig};
pub use error::{RedpenError, Result};
pub use history::{SnapshotHistory, SnapshotLog, SnapshotStore};
pub use scheduler::{DeltaPolicy, Scheduler, SchedulerEvent, TimerSet, Trigger};
pub use session::{BusyFlags, ClearTarget, Notice, PendingAnalysis, PendingRewrite, Session};
pub use settings::{ContentStyle, SettingKey, Settings, SettingsStore, Typography};
pub use store::{Profile, ProfileStats};
pub use types::{ContentHash, Snapshot, SnapshotId, SnapshotKind, Timestamp};
