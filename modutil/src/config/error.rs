//! Configuration errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors reading, writing or editing the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but is not valid INI.
    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// The file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A key holds a value of the wrong shape.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// No such `section.key`.
    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),
}
