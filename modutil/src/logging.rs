//! Process-wide logging setup.
//!
//! Events go to a log file through a non-blocking writer. Warnings and
//! errors are also echoed to stderr; `verbose` lowers that echo to info.
//! `RUST_LOG` overrides the file filter.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use time::macros::format_description;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Filter used for the log file when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,modutil=debug";

/// Errors from logging setup.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log file could not be created.
    #[error("failed to open log file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A global subscriber was already installed.
    #[error("failed to install log subscriber: {0}")]
    Init(String),
}

/// Keeps the background log writer alive.
///
/// Dropping it flushes buffered events, so hold it until the process exits.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _writer: WorkerGuard,
}

/// Install the global subscriber, truncating `log_path`.
pub fn init(log_path: &Path, verbose: bool) -> Result<LogGuard, LoggingError> {
    let file = open_log_file(log_path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ));

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_timer(timer)
        .with_filter(file_filter);

    let echo_level = if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(echo_level);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    tracing::debug!(path = %log_path.display(), verbose, "Logging initialized");
    Ok(LogGuard { _writer: guard })
}

fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    let open_err = |source| LoggingError::Open {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(open_err)?;
    }
    File::create(path).map_err(open_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("logs/nested/output.log");

        open_log_file(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_open_truncates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("output.log");
        fs::write(&path, "previous session").unwrap();

        open_log_file(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_unwritable_location_is_an_error() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();

        let result = init(&blocker.join("output.log"), false);
        assert!(matches!(result, Err(LoggingError::Open { .. })));
    }
}
