//! Error types for archive extraction.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for extraction.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors raised while reading or unpacking an archive.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The archive file could not be opened.
    #[error("failed to open archive {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The archive is not a readable zip file.
    #[error("invalid archive {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    /// An entry would be written outside the destination.
    #[error("archive {} contains unsafe entry '{entry}'", path.display())]
    UnsafeEntry { path: PathBuf, entry: String },

    /// Writing an extracted file failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
