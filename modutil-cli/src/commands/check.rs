//! `check` command.

use console::style;
use modutil::integrity::TargetOutcome;
use modutil::sync::SyncController;

use crate::error::CliError;

/// Run the integrity check and print one line per target.
pub fn run(controller: &mut SyncController) -> Result<(), CliError> {
    let report = controller.run_integrity_check()?;

    for result in report.results() {
        match &result.outcome {
            TargetOutcome::Pass => println!("  {} {}", style("✓").green(), result.target),
            TargetOutcome::Mismatch => println!(
                "  {} {} (digest mismatch)",
                style("✗").red(),
                result.target
            ),
            TargetOutcome::Error(reason) => {
                println!("  {} {} ({})", style("✗").red(), result.target, reason)
            }
        }
    }
    println!();

    if report.passed() {
        Ok(())
    } else {
        Err(CliError::IntegrityFailed {
            failures: report.failure_count(),
        })
    }
}
