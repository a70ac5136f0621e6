//! Base and update pack synchronization.
//!
//! [`SyncController`] owns the trust manifest, the install state and the
//! single transfer slot. Callers drive it through explicit actions and a
//! periodic [`SyncController::tick`]:
//!
//! ```text
//! Idle ── download_base ──► FetchingBase ── tick ──► Idle ── install_base ──► Idle (version 1)
//! Idle ── download_update ► FetchingUpdate ─ tick ─► Idle ── install_update ► Idle (version n+1)
//!   any error ──► Failed(reason) ── next action ──► Idle
//! ```
//!
//! The install state version only changes after an archive has been fully
//! extracted, and is persisted immediately.

mod controller;
mod error;
mod package;
mod phase;

pub use controller::{DownloadOutcome, InstallOutcome, SyncController, SyncOptions};
pub use error::{SyncError, SyncResult};
pub use package::{package_url, PackageKind};
pub use phase::SyncPhase;
