//! `status` and `set-dir` commands.

use std::path::Path;

use console::style;
use modutil::sync::SyncController;

use crate::error::CliError;

/// Print the current install and sync state.
pub fn run(controller: &SyncController) -> Result<(), CliError> {
    let state = controller.install_state();
    let manifest = controller.manifest();

    println!("{}", style("ModUtil Status").bold());
    println!("===============");
    println!();
    println!("  Game:          {}", controller.game_id());
    match state.install_dir() {
        Some(dir) => println!("  Install dir:   {}", dir.display()),
        None => println!("  Install dir:   {}", style("(not set)").yellow()),
    }
    println!("  Version:       {}", describe_version(state.version()));
    println!("  Server:        {}", manifest.server());
    if let Some(latest) = manifest.latest() {
        println!("  Latest:        {}", latest);
    }
    println!("  Tracked:       {} target(s)", manifest.entries().len());
    match controller.next_package() {
        Some(kind) => println!("  Next:          {}", kind),
        None => println!("  Next:          {}", style("up to date").green()),
    }
    println!("  State:         {}", controller.phase());

    if let Some(snapshot) = controller.transfer_snapshot() {
        println!(
            "  Last transfer: {} ({} bytes)",
            snapshot.destination.display(),
            snapshot.bytes_transferred
        );
    }
    Ok(())
}

fn describe_version(version: u32) -> String {
    match version {
        0 => "0 (nothing installed)".to_string(),
        1 => "1 (base pack)".to_string(),
        n => format!("{} (base pack + {} update(s))", n, n - 1),
    }
}

/// Validate, set and persist the install directory.
pub fn set_dir(controller: &mut SyncController, path: &Path) -> Result<(), CliError> {
    if !path.is_dir() {
        return Err(CliError::InvalidInput(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    let absolute = path.canonicalize().map_err(|e| {
        CliError::InvalidInput(format!("cannot resolve {}: {}", path.display(), e))
    })?;

    controller.set_install_dir(absolute.to_string_lossy().into_owned());
    controller.save_config()?;
    Ok(())
}
