//! Bounded log of recent user-facing status lines.
//!
//! Each pushed line is also emitted as a `tracing` event, so the file log
//! holds the full history while the ring keeps only what a UI shows.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Local};
use tracing::{error, info, warn};

/// Number of lines kept when no size is configured.
pub const DEFAULT_STATUS_LINES: usize = 4;

/// How serious a status line is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// One timestamped status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub at: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.at.format("%H:%M:%S"))?;
        if self.severity != Severity::Info {
            write!(f, "{}: ", self.severity)?;
        }
        f.write_str(&self.message)
    }
}

/// Ring of the most recent status lines, oldest first.
#[derive(Debug, Clone)]
pub struct StatusLog {
    capacity: usize,
    lines: VecDeque<StatusLine>,
    pushed: u64,
}

impl Default for StatusLog {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_LINES)
    }
}

impl StatusLog {
    /// Create a ring holding at most `capacity` lines (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            lines: VecDeque::with_capacity(capacity),
            pushed: 0,
        }
    }

    /// Append a line, evicting the oldest when full.
    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Info => info!(status = %message),
            Severity::Warning => warn!(status = %message),
            Severity::Error => error!(status = %message),
        }

        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(StatusLine {
            at: Local::now(),
            severity,
            message,
        });
        self.pushed += 1;
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }

    /// Lines in the order they were pushed.
    pub fn lines(&self) -> impl Iterator<Item = &StatusLine> {
        self.lines.iter()
    }

    /// The newest line.
    pub fn latest(&self) -> Option<&StatusLine> {
        self.lines.back()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total lines ever pushed, including evicted ones.
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    /// Lines pushed after the first `seen`, as far as the ring still holds them.
    pub fn since(&self, seen: u64) -> impl Iterator<Item = &StatusLine> {
        let fresh = self.pushed.saturating_sub(seen).min(self.lines.len() as u64) as usize;
        self.lines.iter().skip(self.lines.len() - fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_last_n_lines() {
        let mut log = StatusLog::new(4);
        for i in 1..=6 {
            log.info(format!("line {}", i));
        }

        let messages: Vec<_> = log.lines().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, vec!["line 3", "line 4", "line 5", "line 6"]);
        assert_eq!(log.latest().unwrap().message, "line 6");
    }

    #[test]
    fn test_since_skips_seen_lines() {
        let mut log = StatusLog::new(3);
        log.info("a");
        log.info("b");
        let seen = log.pushed();
        log.info("c");

        let fresh: Vec<_> = log.since(seen).map(|l| l.message.as_str()).collect();
        assert_eq!(fresh, vec!["c"]);

        for m in ["d", "e", "f", "g"] {
            log.info(m);
        }
        let fresh: Vec<_> = log.since(seen).map(|l| l.message.as_str()).collect();
        assert_eq!(fresh, vec!["e", "f", "g"]);
        assert_eq!(log.pushed(), 7);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut log = StatusLog::new(0);
        log.warn("a");
        log.error("b");
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.len(), 1);
        assert_eq!(log.latest().unwrap().severity, Severity::Error);
    }

    #[test]
    fn test_default_capacity() {
        let log = StatusLog::default();
        assert_eq!(log.capacity(), DEFAULT_STATUS_LINES);
        assert!(log.is_empty());
    }

    #[test]
    fn test_display_marks_severity() {
        let mut log = StatusLog::new(2);
        log.info("Base downloaded");
        log.error("Download failed");

        let lines: Vec<_> = log.lines().map(|l| l.to_string()).collect();
        assert!(lines[0].ends_with("] Base downloaded"));
        assert!(lines[1].ends_with("] error: Download failed"));
    }
}
