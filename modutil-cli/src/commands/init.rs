//! Init command - initialize configuration file.

use std::fs;
use std::path::Path;

use modutil::config::ConfigFile;

use crate::error::CliError;

/// Write the configuration file and create the data directory.
pub fn run(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        println!("Configuration file already exists: {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    let config = ConfigFile::default();
    config.save_to(path)?;
    fs::create_dir_all(&config.paths.data_dir).map_err(|e| {
        CliError::Config(format!(
            "failed to create data directory {}: {}",
            config.paths.data_dir.display(),
            e
        ))
    })?;

    println!("Configuration file: {}", path.display());
    println!("Data directory:     {}", config.paths.data_dir.display());
    println!();
    println!("Next, point ModUtil at your game:");
    println!("  modutil set-dir <path-to-game>");
    Ok(())
}
