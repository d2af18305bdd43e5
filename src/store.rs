//! Profile directory tying the settings and history namespaces together.

use crate::config::StoreConfig;
use crate::error::{RedpenError, Result};
use crate::history::{SnapshotHistory, SnapshotStore};
use crate::settings::SettingsStore;
use fs2::FileExt;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Magic bytes for the profile manifest.
const PROFILE_MAGIC: &[u8; 4] = b"RPN\0";

/// Current schema version.
///
/// Each version may only add namespaces. Opening an older profile creates the
/// missing ones and bumps the manifest; existing data is never touched.
pub const SCHEMA_VERSION: u8 = 2;

/// Namespaces and the schema version that introduced them.
const NAMESPACES: &[(u8, &str)] = &[(1, SETTINGS_FILE), (2, HISTORY_FILE)];

const SETTINGS_FILE: &str = "settings.bin";
const HISTORY_FILE: &str = "history.log";

/// Profile statistics.
#[derive(Clone, Debug, Default)]
pub struct ProfileStats {
    pub snapshot_count: u64,
    pub setting_count: u64,
    pub history_size_bytes: u64,
}

/// One user's local data: scalar settings plus snapshot history.
///
/// Holds an exclusive lock on the directory for its lifetime; a second open
/// of the same profile fails with [`RedpenError::Locked`].
pub struct Profile {
    /// Profile configuration.
    config: StoreConfig,

    /// Lock file for exclusive access.
    _lock_file: File,

    /// Schema version found on disk before any upgrade.
    opened_version: u8,

    settings: Arc<SettingsStore>,

    history: Arc<SnapshotHistory>,
}

impl Profile {
    /// Open an existing profile or create a new one.
    pub fn open_or_create(config: StoreConfig) -> Result<Self> {
        if config.path.join("MANIFEST").exists() {
            Self::open(config)
        } else if config.create_if_missing {
            Self::create(config)
        } else {
            Err(RedpenError::NotInitialized)
        }
    }

    /// Create a new profile.
    pub fn create(config: StoreConfig) -> Result<Self> {
        fs::create_dir_all(&config.path)?;
        Self::write_manifest(&config.path, SCHEMA_VERSION)?;

        let lock_file = Self::acquire_lock(&config.path)?;
        Self::open_namespaces(config, lock_file, SCHEMA_VERSION)
    }

    /// Open an existing profile, upgrading older schema versions in place.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let version = Self::read_manifest(&config.path)?;
        if version > SCHEMA_VERSION {
            return Err(RedpenError::UnsupportedVersion {
                found: version,
                supported: SCHEMA_VERSION,
            });
        }

        let lock_file = Self::acquire_lock(&config.path)?;

        if version < SCHEMA_VERSION {
            let added: Vec<&str> = NAMESPACES
                .iter()
                .filter(|(since, _)| *since > version)
                .map(|(_, name)| *name)
                .collect();
            info!(from = version, to = SCHEMA_VERSION, ?added, "upgrading profile schema");
        }

        let profile = Self::open_namespaces(config, lock_file, version)?;

        if version < SCHEMA_VERSION {
            Self::write_manifest(&profile.config.path, SCHEMA_VERSION)?;
        }

        Ok(profile)
    }

    fn open_namespaces(config: StoreConfig, lock_file: File, opened_version: u8) -> Result<Self> {
        let settings = Arc::new(SettingsStore::open(config.path.join(SETTINGS_FILE))?);
        let store = SnapshotStore::open(
            config.path.join(HISTORY_FILE),
            config.snapshot_cache_size,
        )?;
        let history = Arc::new(SnapshotHistory::new(store));

        Ok(Self {
            config,
            _lock_file: lock_file,
            opened_version,
            settings,
            history,
        })
    }

    /// Scalar settings namespace.
    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    /// Snapshot history namespace with its baseline.
    pub fn history(&self) -> &Arc<SnapshotHistory> {
        &self.history
    }

    /// Schema version the profile had when it was opened.
    pub fn opened_version(&self) -> u8 {
        self.opened_version
    }

    /// Get profile statistics.
    pub fn stats(&self) -> ProfileStats {
        ProfileStats {
            snapshot_count: self.history.count() as u64,
            setting_count: self.settings.len() as u64,
            history_size_bytes: fs::metadata(self.config.path.join(HISTORY_FILE))
                .map(|m| m.len())
                .unwrap_or(0),
        }
    }

    /// Sync history to disk. Settings are synced on every write.
    pub fn sync(&self) -> Result<()> {
        self.history.store().sync()
    }

    /// Get the profile path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    // --- Private Helpers ---

    fn write_manifest(path: &Path, version: u8) -> Result<()> {
        let tmp_path = path.join("MANIFEST.tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(PROFILE_MAGIC)?;
            file.write_all(&[version])?;
            file.sync_all()?;
        }
        fs::rename(tmp_path, path.join("MANIFEST"))?;

        Ok(())
    }

    fn read_manifest(path: &Path) -> Result<u8> {
        let mut file = File::open(path.join("MANIFEST"))?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != PROFILE_MAGIC {
            return Err(RedpenError::InvalidFormat("Invalid profile magic".into()));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] == 0 {
            return Err(RedpenError::InvalidFormat("Schema version 0".into()));
        }

        Ok(version[0])
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_file = File::create(path.join("LOCK"))?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| RedpenError::Locked)?;

        Ok(lock_file)
    }
}

impl Drop for Profile {
    fn drop(&mut self) {
        // Best-effort sync on drop
        let _ = self.sync();
    }
}
