//! The single active transfer slot.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info};

use super::error::{TransferError, TransferResult};
use super::progress::TransferProgress;
use super::Fetcher;

/// Identifies a started transfer.
///
/// Cheap to clone; every clone observes the same progress.
#[derive(Debug, Clone)]
pub struct TransferHandle {
    id: u64,
    url: String,
    destination: PathBuf,
    progress: Arc<TransferProgress>,
}

impl TransferHandle {
    /// Tracker-assigned sequence number.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Source URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Final local path.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Capture the current progress.
    pub fn snapshot(&self) -> TransferSnapshot {
        TransferSnapshot {
            url: self.url.clone(),
            destination: self.destination.clone(),
            bytes_transferred: self.progress.transferred(),
            total_bytes: self.progress.total(),
            rate_bytes_per_sec: self.progress.rate(),
            is_complete: self.progress.is_complete(),
            error: self.progress.error(),
        }
    }
}

/// Point-in-time view of a transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSnapshot {
    pub url: String,
    pub destination: PathBuf,
    pub bytes_transferred: u64,
    /// `None` until the server announces a length.
    pub total_bytes: Option<u64>,
    pub rate_bytes_per_sec: f64,
    pub is_complete: bool,
    pub error: Option<TransferError>,
}

impl TransferSnapshot {
    /// A finished transfer that never touched the network.
    pub fn already_present(url: impl Into<String>, destination: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            bytes_transferred: size,
            total_bytes: Some(size),
            rate_bytes_per_sec: 0.0,
            is_complete: true,
            error: None,
        }
    }

    /// Completed without error.
    pub fn succeeded(&self) -> bool {
        self.is_complete && self.error.is_none()
    }

    /// Completed with an error.
    pub fn failed(&self) -> bool {
        self.is_complete && self.error.is_some()
    }

    /// Fraction done in `0.0..=1.0`, if the size is known.
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) => Some(if self.is_complete { 1.0 } else { 0.0 }),
            Some(total) => Some((self.bytes_transferred as f64 / total as f64).min(1.0)),
            None => None,
        }
    }
}

struct ActiveTransfer {
    handle: TransferHandle,
    worker: Option<JoinHandle<()>>,
}

/// Runs at most one transfer at a time on a background thread.
///
/// Callers poll for progress; nothing is pushed to them.
pub struct TransferTracker {
    fetcher: Arc<dyn Fetcher>,
    active: Option<ActiveTransfer>,
    next_id: u64,
}

impl std::fmt::Debug for TransferTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferTracker")
            .field("active", &self.active.as_ref().map(|a| &a.handle))
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl TransferTracker {
    /// Create a tracker that downloads through `fetcher`.
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            active: None,
            next_id: 1,
        }
    }

    /// Whether a transfer is still running.
    pub fn is_busy(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| !a.handle.progress.is_complete())
    }

    /// Begin downloading `url` to `destination` in the background.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Busy`] if a transfer is still running, or
    /// [`TransferError::Io`] if the worker thread cannot be spawned.
    pub fn start(&mut self, url: &str, destination: &Path) -> TransferResult<TransferHandle> {
        if let Some(active) = self.active.as_ref().filter(|_| self.is_busy()) {
            return Err(TransferError::Busy {
                url: active.handle.url.clone(),
            });
        }
        self.reap();

        let handle = TransferHandle {
            id: self.next_id,
            url: url.to_string(),
            destination: destination.to_path_buf(),
            progress: Arc::new(TransferProgress::new()),
        };
        self.next_id += 1;

        let fetcher = Arc::clone(&self.fetcher);
        let worker_handle = handle.clone();
        let worker = thread::Builder::new()
            .name(format!("modutil-transfer-{}", handle.id))
            .spawn(move || {
                let TransferHandle {
                    url,
                    destination,
                    progress,
                    ..
                } = worker_handle;
                // Progress must be settled even if the fetcher panics.
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    fetcher.fetch(&url, &destination, &progress)
                }))
                .unwrap_or_else(|_| {
                    Err(TransferError::Http {
                        url: url.clone(),
                        reason: "transfer worker panicked".to_string(),
                    })
                });
                if let Err(ref e) = result {
                    error!(url = %url, error = %e, "Transfer failed");
                }
                progress.finish(result);
            })
            .map_err(|e| TransferError::io(destination, e))?;

        info!(id = handle.id, url, dest = %destination.display(), "Transfer started");

        self.active = Some(ActiveTransfer {
            handle: handle.clone(),
            worker: Some(worker),
        });
        Ok(handle)
    }

    /// Snapshot of a transfer started by this tracker.
    pub fn poll(&self, handle: &TransferHandle) -> TransferSnapshot {
        handle.snapshot()
    }

    /// Block until the current transfer finishes and return its final snapshot.
    pub fn wait(&mut self) -> Option<TransferSnapshot> {
        let active = self.active.as_mut()?;
        if let Some(worker) = active.worker.take() {
            if worker.join().is_err() {
                debug!(url = %active.handle.url, "Transfer worker exited abnormally");
            }
        }
        Some(active.handle.snapshot())
    }

    /// Join a finished worker so its thread is released.
    fn reap(&mut self) {
        if let Some(mut active) = self.active.take() {
            if let Some(worker) = active.worker.take() {
                if worker.join().is_err() {
                    debug!(url = %active.handle.url, "Previous transfer worker panicked");
                }
            }
        }
    }
}
