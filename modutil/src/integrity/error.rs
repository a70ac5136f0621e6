//! Error types for integrity checks.

use thiserror::Error;

/// Result type for integrity operations.
pub type IntegrityResult<T> = Result<T, IntegrityError>;

/// Errors that prevent an integrity check from running at all.
///
/// Problems with individual targets are reported inside the
/// [`IntegrityReport`](super::IntegrityReport), not here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// No install directory has been configured.
    #[error("install directory is not set")]
    InstallDirUnset,
}
