//! Scalar settings namespace.
//!
//! One string value per key, last write wins, no history. A missing key is
//! the normal first-run state and readers supply their own default.

mod kv;
mod profile;

pub use kv::SettingsStore;
pub use profile::{
    default_policy, policy_for_style, ContentStyle, PolicyTemplate, SettingKey, Settings,
    Typography, POLICY_TEMPLATES,
};
