//! Error types for transfers.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Errors that can terminate or prevent a transfer.
///
/// Cloneable so it can be stored in progress snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Another transfer already occupies the slot.
    #[error("a transfer is already in progress ({url})")]
    Busy { url: String },

    /// The request could not be completed.
    #[error("failed to download {url}: {reason}")]
    Http { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("download of {url} failed with status {status}")]
    Status { url: String, status: u16 },

    /// The request timed out.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// The body ended before the announced length.
    #[error("download of {url} ended early: received {received} of {expected} bytes")]
    Incomplete {
        url: String,
        expected: u64,
        received: u64,
    },

    /// Local file I/O failed.
    #[error("I/O error on {}: {reason}", path.display())]
    Io { path: PathBuf, reason: String },
}

impl TransferError {
    /// Build an [`TransferError::Io`] from an I/O error.
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = TransferError::Status {
            url: "https://x/HDN_BASE.zip".to_string(),
            status: 404,
        };
        assert_eq!(
            err.to_string(),
            "download of https://x/HDN_BASE.zip failed with status 404"
        );
    }

    #[test]
    fn test_io_helper() {
        let err = TransferError::io(
            "/tmp/x.part",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert!(err.to_string().contains("disk full"));
        assert!(err.to_string().contains("/tmp/x.part"));
    }
}
