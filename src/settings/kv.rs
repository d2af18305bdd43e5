//! File-backed scalar settings.

use crate::error::{RedpenError, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Magic bytes for the settings file.
const SETTINGS_MAGIC: &[u8; 4] = b"KVS\0";

/// Current settings file format version.
const SETTINGS_VERSION: u8 = 1;

/// Magic + version + body length.
const SETTINGS_HEADER_SIZE: u64 = 4 + 1 + 8;

/// Persistent string-to-string store.
///
/// Every `set` rewrites the whole file through a temp file and a rename, so
/// the file on disk is always either the old or the new map. The in-memory
/// map only changes after the write succeeded.
pub struct SettingsStore {
    /// Path to the settings file.
    path: PathBuf,

    /// Current values.
    values: RwLock<BTreeMap<String, String>>,
}

impl SettingsStore {
    /// Open the settings file, starting empty if it doesn't exist yet.
    ///
    /// An unreadable file is renamed to `<name>.corrupt` and the store starts
    /// empty, so every key reads as absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            match Self::load_from_file(&path) {
                Ok(values) => values,
                Err(e) => {
                    Self::set_aside(&path, &e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Value for `key`, or `None` if it was never written.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    /// Write `value` under `key`.
    ///
    /// Storage failures are logged and reported as `false`.
    pub fn set(&self, key: &str, value: &str) -> bool {
        match self.try_set(key, value) {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "failed to persist setting");
                false
            }
        }
    }

    /// Write `value` under `key`, returning storage errors.
    pub fn try_set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write();
        if values.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }

        let mut updated = values.clone();
        updated.insert(key.to_string(), value.to_string());
        self.save(&updated)?;
        *values = updated;

        debug!(key, len = value.len(), "setting saved");
        Ok(())
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let encoded = rmp_serde::to_vec(values)?;

        let tmp_path = self.path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)?;

            file.write_all(SETTINGS_MAGIC)?;
            file.write_all(&[SETTINGS_VERSION])?;
            file.write_all(&(encoded.len() as u64).to_le_bytes())?;
            file.write_all(&encoded)?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn set_aside(path: &Path, error: &RedpenError) {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(".corrupt");
        let aside = path.with_file_name(name);

        match fs::rename(path, &aside) {
            Ok(()) => warn!(
                path = %path.display(),
                moved_to = %aside.display(),
                error = %error,
                "unreadable settings file set aside, using defaults"
            ),
            Err(rename_error) => warn!(
                path = %path.display(),
                error = %error,
                rename_error = %rename_error,
                "unreadable settings file, using defaults"
            ),
        }
    }

    fn load_from_file(path: &Path) -> Result<BTreeMap<String, String>> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != SETTINGS_MAGIC {
            return Err(RedpenError::InvalidFormat("Invalid settings magic".into()));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != SETTINGS_VERSION {
            return Err(RedpenError::InvalidFormat(format!(
                "Unsupported settings version: {}",
                version[0]
            )));
        }

        let mut len_bytes = [0u8; 8];
        file.read_exact(&mut len_bytes)?;
        let len = u64::from_le_bytes(len_bytes);
        if len > file_size.saturating_sub(SETTINGS_HEADER_SIZE) {
            return Err(RedpenError::InvalidFormat(format!(
                "Settings body length {} exceeds file size {}",
                len, file_size
            )));
        }

        let mut encoded = vec![0u8; len as usize];
        file.read_exact(&mut encoded)?;

        Ok(rmp_serde::from_slice(&encoded)?)
    }
}
