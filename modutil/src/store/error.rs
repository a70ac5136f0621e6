//! Error types for the manifest store.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while loading or persisting records.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The trust manifest could be neither fetched nor read locally.
    #[error("trust manifest unavailable from {url}: {reason}")]
    ManifestUnavailable { url: String, reason: String },

    /// The manifest was readable but its content is not acceptable.
    #[error("invalid trust manifest: {0}")]
    InvalidManifest(String),

    /// A persisted record exists but cannot be parsed.
    #[error("corrupt state file {}: {reason}", path.display())]
    CorruptState { path: PathBuf, reason: String },

    /// A record could not be read from disk.
    #[error("failed to read {}: {source}", path.display())]
    ReadFailed { path: PathBuf, source: io::Error },

    /// A record could not be written to disk.
    #[error("failed to persist {}: {reason}", path.display())]
    PersistenceError { path: PathBuf, reason: String },
}
