//! Subcommand implementations.

pub mod check;
pub mod config;
pub mod init;
pub mod packages;
pub mod status;

use std::sync::Arc;

use modutil::archive::ZipExtractor;
use modutil::config::ConfigFile;
use modutil::store::{HttpManifestSource, ManifestStore};
use modutil::sync::{SyncController, SyncOptions};
use modutil::transfer::HttpFetcher;

use crate::error::CliError;

/// Build the production controller from configuration.
pub fn open_controller(config: &ConfigFile) -> Result<SyncController, CliError> {
    let source = HttpManifestSource::new(config.timeout())?;
    let store = ManifestStore::new(
        &config.paths.data_dir,
        config.manifest_url(),
        Box::new(source),
    )
    .with_policy(config.manifest.refresh);

    let fetcher = HttpFetcher::with_timeout(config.timeout())?;
    let options = SyncOptions::new(&config.game.id, config.download_dir())
        .with_status_lines(config.ui.status_lines);

    Ok(SyncController::open(
        store,
        Arc::new(fetcher),
        Box::new(ZipExtractor::new()),
        options,
    )?)
}
