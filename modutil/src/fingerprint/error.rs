//! Error types for fingerprinting.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for fingerprint operations.
pub type FingerprintResult<T> = Result<T, FingerprintError>;

/// Errors that can occur while fingerprinting a path.
#[derive(Debug, Error)]
pub enum FingerprintError {
    /// The path does not exist.
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// A file could not be opened or read.
    #[error("failed to read {}: {source}", path.display())]
    ReadError { path: PathBuf, source: io::Error },

    /// The path exists but its kind could not be determined.
    #[error("failed to stat {}: {source}", path.display())]
    StatError { path: PathBuf, source: io::Error },
}

impl FingerprintError {
    /// Map an I/O error from opening or reading `path`.
    ///
    /// `NotFound` is kept distinct so callers can tell a missing target from
    /// an unreadable one.
    pub(crate) fn from_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::ReadError { path, source }
        }
    }

    /// Map an I/O error from querying metadata of `path`.
    pub(crate) fn from_stat(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::StatError { path, source }
        }
    }
}
