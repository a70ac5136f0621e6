//! The sync state machine.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::{SyncError, SyncResult};
use super::package::{package_url, PackageKind};
use super::phase::SyncPhase;
use crate::archive::ArchiveExtractor;
use crate::fingerprint::fingerprint_file;
use crate::integrity::{self, IntegrityError, IntegrityReport};
use crate::status::{StatusLine, StatusLog, DEFAULT_STATUS_LINES};
use crate::store::{InstallState, ManifestStore, TrustManifest};
use crate::transfer::{Fetcher, TransferHandle, TransferSnapshot, TransferTracker};

/// Settings for a [`SyncController`].
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Game id used in package URLs and archive names.
    pub game_id: String,
    /// Directory downloaded archives are kept in.
    pub download_dir: PathBuf,
    /// Size of the status ring.
    pub status_lines: usize,
}

impl SyncOptions {
    pub fn new(game_id: impl Into<String>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            game_id: game_id.into(),
            download_dir: download_dir.into(),
            status_lines: DEFAULT_STATUS_LINES,
        }
    }

    /// Set the number of status lines kept.
    pub fn with_status_lines(mut self, lines: usize) -> Self {
        self.status_lines = lines;
        self
    }
}

/// Result of a download action.
#[derive(Debug, Clone)]
pub enum DownloadOutcome {
    /// Nothing to fetch at the current version.
    NotNeeded,
    /// The archive was already on disk; no network access happened.
    AlreadyPresent(TransferSnapshot),
    /// A background transfer was started; drive it with `tick`.
    Started(TransferHandle),
}

/// Result of an install action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Nothing to install at the current version.
    NotNeeded,
    /// The pack was applied and the new version persisted.
    Installed { version: u32, files: usize },
}

/// The fetch the active transfer belongs to.
#[derive(Debug)]
struct PendingFetch {
    kind: PackageKind,
    handle: TransferHandle,
}

/// Owns the manifest, the install state and the transfer slot.
///
/// Every method takes `&mut self`; the only background work is the
/// transfer thread, observed through [`tick`](Self::tick).
pub struct SyncController {
    store: ManifestStore,
    manifest: TrustManifest,
    state: InstallState,
    tracker: TransferTracker,
    extractor: Box<dyn ArchiveExtractor>,
    options: SyncOptions,
    phase: SyncPhase,
    pending: Option<PendingFetch>,
    last_transfer: Option<TransferSnapshot>,
    status: StatusLog,
}

impl std::fmt::Debug for SyncController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncController")
            .field("store", &self.store)
            .field("state", &self.state)
            .field("phase", &self.phase)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl SyncController {
    /// Load the manifest and install state and build a controller.
    ///
    /// # Errors
    ///
    /// Fails when the manifest is unavailable or the install state is
    /// corrupt; without them no check or sync is possible.
    pub fn open(
        mut store: ManifestStore,
        fetcher: Arc<dyn Fetcher>,
        extractor: Box<dyn ArchiveExtractor>,
        options: SyncOptions,
    ) -> SyncResult<Self> {
        let manifest = store.load_trust_manifest()?;
        let state = store.load_install_state()?;

        info!(
            game = %options.game_id,
            version = state.version(),
            install_dir = %state.install_dir_str(),
            targets = manifest.entries().len(),
            "Sync controller ready"
        );

        let status = StatusLog::new(options.status_lines);
        Ok(Self {
            store,
            manifest,
            state,
            tracker: TransferTracker::new(fetcher),
            extractor,
            options,
            phase: SyncPhase::Idle,
            pending: None,
            last_transfer: None,
            status,
        })
    }

    pub fn install_state(&self) -> &InstallState {
        &self.state
    }

    pub fn manifest(&self) -> &TrustManifest {
        &self.manifest
    }

    pub fn phase(&self) -> &SyncPhase {
        &self.phase
    }

    pub fn game_id(&self) -> &str {
        &self.options.game_id
    }

    /// Recent status lines, oldest first.
    pub fn status_lines(&self) -> impl Iterator<Item = &StatusLine> {
        self.status.lines()
    }

    pub fn status_log(&self) -> &StatusLog {
        &self.status
    }

    /// Local path of a package archive.
    pub fn archive_path(&self, kind: PackageKind) -> PathBuf {
        self.options
            .download_dir
            .join(kind.archive_name(&self.options.game_id))
    }

    /// The pack that would be applied next, or `None` when up to date.
    pub fn next_package(&self) -> Option<PackageKind> {
        if !self.state.has_base() {
            Some(PackageKind::Base)
        } else if self.is_up_to_date() {
            None
        } else {
            self.state.next_version().map(PackageKind::Update)
        }
    }

    /// Change the install directory in memory. Use
    /// [`save_config`](Self::save_config) to persist it.
    pub fn set_install_dir(&mut self, dir: impl Into<String>) {
        let dir = dir.into();
        self.status.info(format!("Install directory set to {}", dir));
        self.state.set_install_dir(dir);
    }

    /// Persist the install state.
    pub fn save_config(&mut self) -> SyncResult<()> {
        match self.store.save_install_state(&self.state) {
            Ok(()) => {
                self.status.info("Settings saved");
                Ok(())
            }
            Err(e) => {
                self.status.error(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Fingerprint the install directory against the manifest.
    pub fn run_integrity_check(&mut self) -> SyncResult<IntegrityReport> {
        let install_dir = self.state.install_dir().unwrap_or_else(|| Path::new(""));
        let report = match integrity::check(install_dir, &self.manifest) {
            Ok(report) => report,
            Err(IntegrityError::InstallDirUnset) => {
                self.status.error("Set the install directory before checking files");
                return Err(SyncError::InstallDirUnset);
            }
        };

        if report.passed() {
            self.status.info("Integrity check passed");
        } else {
            self.status.warn(format!(
                "Integrity check failed for {} of {} targets",
                report.failure_count(),
                report.results().len()
            ));
        }
        Ok(report)
    }

    /// Fetch the base pack. No-op once the base is installed.
    pub fn download_base(&mut self) -> SyncResult<DownloadOutcome> {
        self.begin_action()?;
        if self.state.has_base() {
            self.status.info("Base pack already installed");
            return Ok(DownloadOutcome::NotNeeded);
        }
        self.start_download(PackageKind::Base)
    }

    /// Apply the downloaded base pack and move to version 1.
    pub fn install_base(&mut self) -> SyncResult<InstallOutcome> {
        self.begin_action()?;
        if self.state.has_base() {
            self.status.info("Base pack already installed");
            return Ok(InstallOutcome::NotNeeded);
        }
        self.install_package(PackageKind::Base)
    }

    /// Fetch the update producing version + 1.
    pub fn download_update(&mut self) -> SyncResult<DownloadOutcome> {
        self.begin_action()?;
        match self.update_target() {
            Some(kind) => self.start_download(kind),
            None => Ok(DownloadOutcome::NotNeeded),
        }
    }

    /// Apply the update producing version + 1.
    pub fn install_update(&mut self) -> SyncResult<InstallOutcome> {
        self.begin_action()?;
        match self.update_target() {
            Some(kind) => self.install_package(kind),
            None => Ok(InstallOutcome::NotNeeded),
        }
    }

    /// Progress of the active transfer, or the last finished one.
    pub fn transfer_snapshot(&self) -> Option<TransferSnapshot> {
        match &self.pending {
            Some(pending) => Some(self.tracker.poll(&pending.handle)),
            None => self.last_transfer.clone(),
        }
    }

    /// Observe the active transfer and settle the phase when it finishes.
    ///
    /// Returns the current snapshot. A transfer that just failed is returned
    /// as an error exactly once. Never touches the install state.
    pub fn tick(&mut self) -> SyncResult<Option<TransferSnapshot>> {
        let Some(pending) = &self.pending else {
            return Ok(self.last_transfer.clone());
        };

        let snapshot = self.tracker.poll(&pending.handle);
        if !snapshot.is_complete {
            return Ok(Some(snapshot));
        }

        let kind = pending.kind;
        self.pending = None;
        self.last_transfer = Some(snapshot.clone());

        match snapshot.error.clone() {
            None => {
                self.status.info(format!(
                    "Downloaded {} ({} bytes)",
                    kind, snapshot.bytes_transferred
                ));
                self.set_phase(SyncPhase::Idle);
                Ok(Some(snapshot))
            }
            Some(err) => {
                discard_file(&snapshot.destination);
                Err(self.fail(err.into()))
            }
        }
    }

    /// Block until the active transfer finishes, then [`tick`](Self::tick).
    pub fn wait_for_transfer(&mut self) -> SyncResult<Option<TransferSnapshot>> {
        if self.pending.is_some() {
            self.tracker.wait();
        }
        self.tick()
    }

    fn is_up_to_date(&self) -> bool {
        self.manifest
            .latest()
            .is_some_and(|latest| self.state.version() >= latest)
    }

    fn update_target(&mut self) -> Option<PackageKind> {
        if !self.state.has_base() {
            self.status.warn("Install the base pack before updates");
            return None;
        }
        let next = self.state.next_version().filter(|_| !self.is_up_to_date());
        if next.is_none() {
            self.status
                .info(format!("Up to date at version {}", self.state.version()));
        }
        next.map(PackageKind::Update)
    }

    /// Common entry to every action: settle finished transfers, refuse while
    /// one is running, and leave `Failed`.
    ///
    /// A transfer failure nobody has ticked yet is returned here, once, in
    /// place of running the action.
    fn begin_action(&mut self) -> SyncResult<()> {
        if self.pending.is_some() {
            self.tick()?;
        }

        if let Some(pending) = &self.pending {
            let url = pending.handle.url().to_string();
            self.status.warn("A download is already in progress");
            return Err(SyncError::Busy { url });
        }

        if self.phase.is_failed() {
            self.set_phase(SyncPhase::Idle);
        }
        Ok(())
    }

    fn start_download(&mut self, kind: PackageKind) -> SyncResult<DownloadOutcome> {
        let destination = self.archive_path(kind);
        let url = package_url(self.manifest.server(), &self.options.game_id, kind);

        if let Ok(meta) = fs::metadata(&destination) {
            if meta.is_file() {
                let snapshot = TransferSnapshot::already_present(url, &destination, meta.len());
                self.status.info(format!("{} already downloaded", kind));
                self.last_transfer = Some(snapshot.clone());
                return Ok(DownloadOutcome::AlreadyPresent(snapshot));
            }
        }

        let handle = match self.tracker.start(&url, &destination) {
            Ok(handle) => handle,
            Err(e) => return Err(self.fail(e.into())),
        };

        self.status.info(format!("Downloading {}", kind));
        self.pending = Some(PendingFetch {
            kind,
            handle: handle.clone(),
        });
        self.set_phase(if kind.is_base() {
            SyncPhase::FetchingBase
        } else {
            SyncPhase::FetchingUpdate
        });
        Ok(DownloadOutcome::Started(handle))
    }

    fn install_package(&mut self, kind: PackageKind) -> SyncResult<InstallOutcome> {
        let Some(install_dir) = self.state.install_dir().map(Path::to_path_buf) else {
            return Err(self.fail(SyncError::InstallDirUnset));
        };

        self.set_phase(if kind.is_base() {
            SyncPhase::InstallingBase
        } else {
            SyncPhase::InstallingUpdate
        });

        match self.apply_package(kind, &install_dir) {
            Ok(files) => {
                self.set_phase(SyncPhase::Idle);
                self.status.info(format!(
                    "Installed {}, now at version {}",
                    kind,
                    self.state.version()
                ));
                Ok(InstallOutcome::Installed {
                    version: self.state.version(),
                    files,
                })
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Verify, extract and record one pack. The in-memory state only moves
    /// once the new version is on disk.
    fn apply_package(&mut self, kind: PackageKind, install_dir: &Path) -> SyncResult<usize> {
        let archive = self.archive_path(kind);
        if !archive.is_file() {
            return Err(SyncError::ArchiveMissing { path: archive });
        }

        let archive_name = kind.archive_name(&self.options.game_id);
        if let Some(expected) = self.manifest.package_digest(&archive_name) {
            let actual = fingerprint_file(&archive)?;
            if !actual.matches_hex(expected) {
                // A bad archive would block every retry; drop it so the next
                // download fetches a fresh copy.
                discard_file(&archive);
                return Err(SyncError::ChecksumMismatch {
                    archive,
                    expected: expected.to_string(),
                    actual: actual.to_hex(),
                });
            }
            debug!(archive = %archive.display(), "Archive digest verified");
        }

        let files = self
            .extractor
            .extract(&archive, install_dir)
            .map_err(|source| SyncError::Install {
                archive: archive.clone(),
                source,
            })?;

        let mut next = self.state.clone();
        next.set_version(kind.target_version());
        self.store.save_install_state(&next)?;
        self.state = next;

        info!(
            package = %kind,
            version = self.state.version(),
            files,
            "Package installed"
        );
        Ok(files)
    }

    fn set_phase(&mut self, phase: SyncPhase) {
        if self.phase != phase {
            debug!(from = %self.phase, to = %phase, "Sync phase changed");
            self.phase = phase;
        }
    }

    /// Record `err` as the reason for `Failed` and hand it back.
    fn fail(&mut self, err: SyncError) -> SyncError {
        let reason = err.to_string();
        self.status.error(reason.clone());
        self.set_phase(SyncPhase::Failed(reason));
        err
    }
}

fn discard_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed untrusted file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove untrusted file"),
    }
}
