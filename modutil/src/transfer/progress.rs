//! Progress counters shared between a transfer worker and its pollers.
//!
//! Byte counts are plain atomics so the worker never blocks on a poller.
//! The rate window and the terminal error sit behind short-lived locks.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::error::TransferError;

/// Span of history the transfer rate is averaged over.
pub const RATE_WINDOW: Duration = Duration::from_secs(5);

/// Minimum spacing between rate samples.
const SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Live progress for one transfer.
#[derive(Debug)]
pub struct TransferProgress {
    transferred: AtomicU64,
    total: AtomicU64,
    total_known: AtomicBool,
    complete: AtomicBool,
    error: Mutex<Option<TransferError>>,
    rate: Mutex<RateWindow>,
}

impl Default for TransferProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferProgress {
    /// Create counters for a transfer that has not started.
    pub fn new() -> Self {
        Self {
            transferred: AtomicU64::new(0),
            total: AtomicU64::new(0),
            total_known: AtomicBool::new(false),
            complete: AtomicBool::new(false),
            error: Mutex::new(None),
            rate: Mutex::new(RateWindow::new(RATE_WINDOW)),
        }
    }

    /// Record the expected size once the server announces it.
    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::SeqCst);
        self.total_known.store(true, Ordering::SeqCst);
    }

    /// Record the absolute number of bytes on disk so far.
    ///
    /// Called with the resume offset before the first chunk arrives.
    pub fn set_transferred(&self, bytes: u64) {
        self.transferred.store(bytes, Ordering::SeqCst);
        self.rate.lock().record(Instant::now(), bytes);
    }

    /// Mark the transfer as finished, successfully or not.
    pub fn finish(&self, result: Result<u64, TransferError>) {
        match result {
            Ok(size) => {
                self.transferred.store(size, Ordering::SeqCst);
                if !self.total_known.load(Ordering::SeqCst) {
                    self.set_total(size);
                }
            }
            Err(err) => *self.error.lock() = Some(err),
        }
        self.complete.store(true, Ordering::SeqCst);
    }

    /// Bytes transferred so far.
    pub fn transferred(&self) -> u64 {
        self.transferred.load(Ordering::SeqCst)
    }

    /// Expected size, if known.
    pub fn total(&self) -> Option<u64> {
        if self.total_known.load(Ordering::SeqCst) {
            Some(self.total.load(Ordering::SeqCst))
        } else {
            None
        }
    }

    /// Whether the worker has finished.
    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::SeqCst)
    }

    /// The terminal error, if the transfer failed.
    pub fn error(&self) -> Option<TransferError> {
        self.error.lock().clone()
    }

    /// Average rate over the recent window, in bytes per second.
    ///
    /// Zero once the transfer has finished or stalled.
    pub fn rate(&self) -> f64 {
        if self.is_complete() {
            return 0.0;
        }
        self.rate.lock().rate(Instant::now())
    }
}

/// Sliding window of `(time, absolute bytes)` samples.
///
/// One sample older than the window is retained as the baseline so the
/// average always spans the full window once enough history exists.
#[derive(Debug)]
pub(crate) struct RateWindow {
    window: Duration,
    samples: VecDeque<(Instant, u64)>,
}

impl RateWindow {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    pub(crate) fn record(&mut self, at: Instant, bytes: u64) {
        if let Some(&(last_at, _)) = self.samples.back() {
            if self.samples.len() > 1 && at.duration_since(last_at) < SAMPLE_INTERVAL {
                return;
            }
        }
        self.samples.push_back((at, bytes));

        while self.samples.len() > 2 {
            let second = self.samples[1].0;
            if at.duration_since(second) >= self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub(crate) fn rate(&self, now: Instant) -> f64 {
        let (Some(&(first_at, first_bytes)), Some(&(last_at, last_bytes))) =
            (self.samples.front(), self.samples.back())
        else {
            return 0.0;
        };

        // No new data for a whole window means the transfer is stalled.
        if now.duration_since(last_at) >= self.window {
            return 0.0;
        }

        let elapsed = now.duration_since(first_at).as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }
        last_bytes.saturating_sub(first_bytes) as f64 / elapsed
    }
}
