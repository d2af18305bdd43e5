//! Error types for the editor engine.

use crate::types::SnapshotId;
use thiserror::Error;

/// Main error type for storage, session and collaborator operations.
#[derive(Debug, Error)]
pub enum RedpenError {
    // --- Storage ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid store format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported schema version: {found} (newest known is {supported})")]
    UnsupportedVersion { found: u8, supported: u8 },

    #[error("Checksum mismatch for snapshot {id}: expected {expected}, got {got}")]
    ChecksumMismatch {
        id: SnapshotId,
        expected: u32,
        got: u32,
    },

    #[error("Profile is locked by another process")]
    Locked,

    #[error("Profile not initialized")]
    NotInitialized,

    // --- Input validation ---
    #[error("Document is empty")]
    EmptyDocument,

    #[error("Document is too long: {len} characters (limit {max})")]
    DocumentTooLong { len: usize, max: usize },

    #[error("Invalid selection {start}..{end} for document of {len} characters")]
    InvalidSelection { start: usize, end: usize, len: usize },

    // --- Fix application ---
    #[error("Quoted text not found in the current document")]
    FixNotFound,

    // --- Collaborators ---
    #[error("API credential is missing")]
    MissingCredential,

    #[error("Collaborator call failed: {0}")]
    Collaborator(String),

    #[error("Malformed collaborator response: {0}")]
    MalformedResponse(String),
}

impl From<serde_json::Error> for RedpenError {
    fn from(e: serde_json::Error) -> Self {
        RedpenError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for RedpenError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        RedpenError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for RedpenError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        RedpenError::Deserialization(e.to_string())
    }
}

impl RedpenError {
    /// Whether this error originated in the storage layer.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            RedpenError::Io(_)
                | RedpenError::Serialization(_)
                | RedpenError::Deserialization(_)
                | RedpenError::InvalidFormat(_)
                | RedpenError::UnsupportedVersion { .. }
                | RedpenError::ChecksumMismatch { .. }
                | RedpenError::Locked
                | RedpenError::NotInitialized
        )
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, RedpenError>;
