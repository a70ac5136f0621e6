//! Single-slot background downloads with polled progress.
//!
//! This module provides:
//! - The network primitive behind a trait (`Fetcher`), with a blocking HTTP
//!   implementation that resumes partial downloads (`HttpFetcher`)
//! - Lock-free progress counters with a sliding-window rate (`TransferProgress`)
//! - The tracker that owns the one active transfer slot (`TransferTracker`)
//!
//! # Architecture
//!
//! ```text
//! TransferTracker ── start(url, dest) ──► worker thread
//!       │                                    │
//!       │ poll(handle)                       ├── Fetcher::fetch
//!       ▼                                    │      (writes dest.part, renames on success)
//! TransferSnapshot ◄── TransferProgress ◄────┘
//!                     (atomics + rate window)
//! ```
//!
//! There is no cancellation: once started, a transfer runs until the fetcher
//! returns.

mod error;
mod http;
mod progress;
mod tracker;

pub use error::{TransferError, TransferResult};
pub use http::{part_path, HttpFetcher, DEFAULT_TIMEOUT_SECS};
pub use progress::{TransferProgress, RATE_WINDOW};
pub use tracker::{TransferHandle, TransferSnapshot, TransferTracker};

use std::path::Path;

/// Downloads a URL to a local file, reporting progress as it goes.
///
/// Implementations must only leave `dest` in place when the full body has
/// been received.
pub trait Fetcher: Send + Sync {
    /// Fetch `url` into `dest`, returning the final size in bytes.
    fn fetch(&self, url: &str, dest: &Path, progress: &TransferProgress) -> TransferResult<u64>;
}
