//! Console output helpers.

use std::thread;
use std::time::Duration;

use console::style;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use modutil::status::{Severity, StatusLine};
use modutil::sync::SyncController;
use modutil::transfer::TransferSnapshot;

use crate::error::CliError;

/// How often a running transfer is polled.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Prints controller status lines that have not been shown yet.
#[derive(Debug, Default)]
pub struct StatusPrinter {
    seen: u64,
}

impl StatusPrinter {
    /// Print every status line pushed since the last flush.
    pub fn flush(&mut self, controller: &SyncController) {
        let log = controller.status_log();
        for line in log.since(self.seen) {
            print_status_line(line);
        }
        self.seen = log.pushed();
    }
}

fn print_status_line(line: &StatusLine) {
    let marker = match line.severity {
        Severity::Info => style("•").cyan(),
        Severity::Warning => style("!").yellow().bold(),
        Severity::Error => style("✗").red().bold(),
    };
    println!("{} {}", marker, line.message);
}

/// Format a rate in human-readable bytes per second.
pub fn format_rate(bytes_per_sec: f64) -> String {
    format!("{}/s", HumanBytes(bytes_per_sec.max(0.0) as u64))
}

fn transfer_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} | {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Poll the active transfer with a progress bar until it finishes.
pub fn follow_transfer(controller: &mut SyncController) -> Result<TransferSnapshot, CliError> {
    let bar = transfer_bar();

    loop {
        let snapshot = match controller.tick() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                bar.finish_and_clear();
                return Err(CliError::InvalidInput(
                    "no download is in progress".to_string(),
                ));
            }
            Err(e) => {
                bar.abandon_with_message("failed");
                return Err(e.into());
            }
        };

        if let Some(total) = snapshot.total_bytes {
            bar.set_length(total);
        }
        bar.set_position(snapshot.bytes_transferred);
        bar.set_message(format_rate(snapshot.rate_bytes_per_sec));

        if snapshot.is_complete {
            bar.finish_with_message("done");
            return Ok(snapshot);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
