//! The integrity check itself.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use super::error::{IntegrityError, IntegrityResult};
use super::report::{IntegrityReport, TargetOutcome, TargetResult};
use crate::fingerprint::fingerprint;
use crate::store::TrustManifest;

/// Check every manifest target under `install_dir`.
///
/// All targets are evaluated even after a failure. A target that cannot be
/// fingerprinted (missing, unreadable, outside the install root) is recorded
/// as failing.
///
/// # Errors
///
/// Returns [`IntegrityError::InstallDirUnset`] if `install_dir` is empty.
pub fn check(install_dir: &Path, manifest: &TrustManifest) -> IntegrityResult<IntegrityReport> {
    if install_dir.as_os_str().is_empty() {
        return Err(IntegrityError::InstallDirUnset);
    }

    info!(
        install_dir = %install_dir.display(),
        targets = manifest.entries().len(),
        "Running integrity check"
    );

    let results = manifest
        .entries()
        .iter()
        .map(|entry| {
            let (actual, outcome) = match resolve_target(install_dir, &entry.target) {
                Ok(path) => match fingerprint(&path) {
                    Ok(digest) if digest.matches_hex(&entry.digest) => {
                        (Some(digest), TargetOutcome::Pass)
                    }
                    Ok(digest) => (Some(digest), TargetOutcome::Mismatch),
                    Err(e) => (None, TargetOutcome::Error(e.to_string())),
                },
                Err(reason) => (None, TargetOutcome::Error(reason)),
            };

            match &outcome {
                TargetOutcome::Pass => debug!(entry = %entry.target, "Target passed"),
                TargetOutcome::Mismatch => warn!(
                    entry = %entry.target,
                    expected = %entry.digest,
                    actual = %actual.map(|d| d.to_hex()).unwrap_or_default(),
                    "Target digest mismatch"
                ),
                TargetOutcome::Error(reason) => {
                    warn!(entry = %entry.target, reason = %reason, "Target could not be checked")
                }
            }

            TargetResult {
                target: entry.target.clone(),
                expected: entry.digest.clone(),
                actual,
                outcome,
            }
        })
        .collect();

    let report = IntegrityReport::new(results);
    info!(
        passed = report.passed(),
        failures = report.failure_count(),
        "Integrity check finished"
    );
    Ok(report)
}

/// Resolve a manifest target to a path under `root`.
///
/// Targets are relative; leading separators are ignored and either `/` or
/// `\` is accepted as a separator. Targets that would leave the root
/// (`..`, drive prefixes) are rejected.
pub fn resolve_target(root: &Path, target: &str) -> Result<PathBuf, String> {
    let normalized = target.replace('\\', "/");
    let trimmed = normalized.trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(format!("target '{}' is empty", target));
    }

    let relative = Path::new(trimmed);
    for component in relative.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(format!("target '{}' escapes the install directory", target))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(format!("target '{}' is not a relative path", target))
            }
        }
    }

    Ok(root.join(relative))
}
