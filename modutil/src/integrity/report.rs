//! Integrity report types.

use crate::fingerprint::Digest;

/// Outcome of checking a single target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    /// Digest matches the manifest.
    Pass,
    /// Digest computed but differs from the manifest.
    Mismatch,
    /// The target could not be fingerprinted.
    Error(String),
}

/// Result for one manifest target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResult {
    /// Target name as listed in the manifest.
    pub target: String,
    /// Expected digest from the manifest.
    pub expected: String,
    /// Digest actually computed, if fingerprinting succeeded.
    pub actual: Option<Digest>,
    /// Pass/fail outcome.
    pub outcome: TargetOutcome,
}

impl TargetResult {
    /// Whether this target passed.
    pub fn passed(&self) -> bool {
        self.outcome == TargetOutcome::Pass
    }
}

/// Per-target results plus the overall verdict.
///
/// Never persisted; recomputed on every check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    results: Vec<TargetResult>,
}

impl IntegrityReport {
    pub(crate) fn new(results: Vec<TargetResult>) -> Self {
        Self { results }
    }

    /// Results in manifest order.
    pub fn results(&self) -> &[TargetResult] {
        &self.results
    }

    /// Look up the result for a target.
    pub fn get(&self, target: &str) -> Option<&TargetResult> {
        self.results.iter().find(|r| r.target == target)
    }

    /// True only if every target passed.
    pub fn passed(&self) -> bool {
        self.results.iter().all(TargetResult::passed)
    }

    /// Number of failing targets.
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed()).count()
    }

    /// One line per target, for display.
    pub fn summary(&self) -> String {
        self.results
            .iter()
            .map(|r| match &r.outcome {
                TargetOutcome::Pass => format!("{}: ok", r.target),
                TargetOutcome::Mismatch => format!(
                    "{}: FAILED (expected {}, found {})",
                    r.target,
                    r.expected.to_lowercase(),
                    r.actual.map(|d| d.to_hex()).unwrap_or_default()
                ),
                TargetOutcome::Error(reason) => format!("{}: FAILED ({})", r.target, reason),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
