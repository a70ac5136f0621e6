//! Error types for the sync engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::archive::ExtractError;
use crate::fingerprint::FingerprintError;
use crate::store::StoreError;
use crate::transfer::TransferError;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced by [`super::SyncController`] actions.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The operation needs an install directory.
    #[error("install directory is not set")]
    InstallDirUnset,

    /// A download is still running.
    #[error("a download is already in progress ({url})")]
    Busy { url: String },

    /// Loading or persisting a record failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The download failed.
    #[error(transparent)]
    Transfer(TransferError),

    /// Extracting the archive failed.
    #[error("failed to install {}: {source}", archive.display())]
    Install {
        archive: PathBuf,
        #[source]
        source: ExtractError,
    },

    /// Install was requested before the archive was downloaded.
    #[error("package archive {} has not been downloaded", path.display())]
    ArchiveMissing { path: PathBuf },

    /// The archive could not be hashed for verification.
    #[error("failed to verify archive: {0}")]
    Fingerprint(#[from] FingerprintError),

    /// The archive does not match the digest published in the manifest.
    #[error("archive {} failed verification: expected {expected}, got {actual}", archive.display())]
    ChecksumMismatch {
        archive: PathBuf,
        expected: String,
        actual: String,
    },
}

impl From<TransferError> for SyncError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Busy { url } => Self::Busy { url },
            other => Self::Transfer(other),
        }
    }
}
