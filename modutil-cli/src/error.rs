//! CLI error type.

use std::fmt;

use modutil::config::ConfigError;
use modutil::logging::LoggingError;
use modutil::store::StoreError;
use modutil::sync::SyncError;
use modutil::transfer::TransferError;

/// Errors reported to the user before exiting.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be read, written or understood.
    Config(String),
    /// The log file could not be opened.
    Logging(LoggingError),
    /// An engine operation failed.
    Sync(SyncError),
    /// A command argument was rejected.
    InvalidInput(String),
    /// The integrity check ran and found problems.
    IntegrityFailed { failures: usize },
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::IntegrityFailed { .. } => 1,
            Self::InvalidInput(_) | Self::Config(_) => 2,
            Self::Logging(_) | Self::Sync(_) => 3,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Logging(e) => write!(f, "{}", e),
            Self::Sync(e) => write!(f, "{}", e),
            Self::InvalidInput(msg) => write!(f, "{}", msg),
            Self::IntegrityFailed { failures } => {
                write!(f, "Integrity check failed for {} target(s)", failures)
            }
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(err: LoggingError) -> Self {
        Self::Logging(err)
    }
}

impl From<SyncError> for CliError {
    fn from(err: SyncError) -> Self {
        Self::Sync(err)
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        Self::Sync(SyncError::Store(err))
    }
}

impl From<TransferError> for CliError {
    fn from(err: TransferError) -> Self {
        Self::Sync(SyncError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CliError::IntegrityFailed { failures: 2 };
        assert_eq!(err.to_string(), "Integrity check failed for 2 target(s)");

        let err = CliError::from(SyncError::InstallDirUnset);
        assert_eq!(err.to_string(), "install directory is not set");
    }

    #[test]
    fn test_exit_codes_distinguish_failures() {
        assert_eq!(CliError::IntegrityFailed { failures: 1 }.exit_code(), 1);
        assert_eq!(CliError::InvalidInput("x".to_string()).exit_code(), 2);
        assert_eq!(CliError::from(SyncError::InstallDirUnset).exit_code(), 3);
    }
}
