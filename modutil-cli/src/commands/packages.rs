//! Download, install and sync commands.

use modutil::sync::{DownloadOutcome, InstallOutcome, PackageKind, SyncController};
use tracing::info;

use crate::error::CliError;
use crate::output::{follow_transfer, StatusPrinter};

/// Wait for a started download; other outcomes need no waiting.
fn finish_download(
    controller: &mut SyncController,
    outcome: DownloadOutcome,
) -> Result<bool, CliError> {
    match outcome {
        DownloadOutcome::NotNeeded => Ok(false),
        DownloadOutcome::AlreadyPresent(_) => Ok(true),
        DownloadOutcome::Started(_) => {
            follow_transfer(controller)?;
            Ok(true)
        }
    }
}

pub fn download_base(controller: &mut SyncController) -> Result<(), CliError> {
    let outcome = controller.download_base()?;
    finish_download(controller, outcome).map(|_| ())
}

pub fn download_update(controller: &mut SyncController) -> Result<(), CliError> {
    let outcome = controller.download_update()?;
    finish_download(controller, outcome).map(|_| ())
}

pub fn install_base(controller: &mut SyncController) -> Result<(), CliError> {
    controller.install_base()?;
    Ok(())
}

pub fn install_update(controller: &mut SyncController) -> Result<(), CliError> {
    controller.install_update()?;
    Ok(())
}

/// Apply one pack; returns the installed version if anything changed.
fn sync_once(
    controller: &mut SyncController,
    kind: PackageKind,
) -> Result<Option<u32>, CliError> {
    let outcome = match kind {
        PackageKind::Base => controller.download_base()?,
        PackageKind::Update(_) => controller.download_update()?,
    };
    if !finish_download(controller, outcome)? {
        return Ok(None);
    }

    let installed = match kind {
        PackageKind::Base => controller.install_base()?,
        PackageKind::Update(_) => controller.install_update()?,
    };
    Ok(match installed {
        InstallOutcome::Installed { version, .. } => Some(version),
        InstallOutcome::NotNeeded => None,
    })
}

/// Download and install the next pack, or every pack up to `latest`.
pub fn sync(
    controller: &mut SyncController,
    printer: &mut StatusPrinter,
    all: bool,
) -> Result<(), CliError> {
    let latest_known = controller.manifest().latest().is_some();
    if all && !latest_known {
        println!("The server does not publish a latest version; applying one pack.");
    }

    while let Some(kind) = controller.next_package() {
        info!(package = %kind, "Syncing");
        let installed = sync_once(controller, kind)?;
        printer.flush(controller);

        if installed.is_none() || !all || !latest_known {
            return Ok(());
        }
    }

    println!("Up to date at version {}.", controller.install_state().version());
    Ok(())
}
