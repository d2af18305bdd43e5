//! Configuration for the profile store, the snapshot scheduler and the session.

use crate::error::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Profile store configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Profile directory holding the manifest, settings and history.
    pub path: PathBuf,

    /// Whether to create the profile if it doesn't exist.
    pub create_if_missing: bool,

    /// Decoded snapshots kept in memory (number of snapshots).
    pub snapshot_cache_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./redpen-profile"),
            create_if_missing: true,
            snapshot_cache_size: 64,
        }
    }
}

impl StoreConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Timer settings for automatic snapshots and draft autosave.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Period of the interval trigger.
    #[serde(with = "millis")]
    pub interval: Duration,

    /// Quiet period after the last edit before the delta check runs.
    #[serde(with = "millis")]
    pub quiet_period: Duration,

    /// Quiet period before draft content / policy text is written to settings.
    #[serde(with = "millis")]
    pub autosave_delay: Duration,

    /// Absolute character difference that triggers a delta snapshot.
    pub delta_chars: usize,

    /// Relative difference (fraction of the baseline length) that triggers one.
    pub delta_ratio: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(180),
            quiet_period: Duration::from_secs(3),
            autosave_delay: Duration::from_secs(1),
            delta_chars: 400,
            delta_ratio: 0.05,
        }
    }
}

/// Session behaviour.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a cleared value can be brought back with undo.
    #[serde(with = "millis")]
    pub undo_window: Duration,

    /// Longest document accepted for analysis, in characters.
    pub max_document_chars: usize,

    pub schedule: ScheduleConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            undo_window: Duration::from_secs(5),
            max_document_chars: 20_000,
            schedule: ScheduleConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Durations are configured as whole milliseconds.
mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
