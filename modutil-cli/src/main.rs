//! ModUtil CLI - Command-line interface
//!
//! Verifies an installed game's mod content against the server's trust
//! manifest and downloads/applies the base and update packs.

mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;
use modutil::config::{config_file_path, ConfigFile};
use modutil::logging;
use tracing::info;

use commands::config::ConfigCommands;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "modutil", version, about, long_about = None)]
struct Cli {
    /// Echo informational log messages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this configuration file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show install directory, content version and sync state
    Status,

    /// Set and save the game install directory
    SetDir {
        /// Game install directory
        path: PathBuf,
    },

    /// Verify installed files against the trust manifest
    Check,

    /// Download the base pack
    DownloadBase,

    /// Install the downloaded base pack
    InstallBase,

    /// Download the next update pack
    DownloadUpdate,

    /// Install the downloaded update pack
    InstallUpdate,

    /// Download and install whatever pack comes next
    Sync {
        /// Keep going until the latest published version is installed
        #[arg(long)]
        all: bool,
    },

    /// View or change configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Write a configuration file with default settings
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.unwrap_or_else(config_file_path);

    // Configuration commands never touch the engine or the log file.
    let command = match cli.command {
        Commands::Config(command) => return commands::config::run(command, &config_path),
        Commands::Init { force } => return commands::init::run(&config_path, force),
        other => other,
    };

    let config = ConfigFile::load_from(&config_path)?;
    let _log_guard = logging::init(&config.log_file(), cli.verbose)?;
    info!(
        version = modutil::VERSION,
        config = %config_path.display(),
        "modutil starting"
    );

    let mut controller = commands::open_controller(&config)?;
    let mut printer = output::StatusPrinter::default();

    let result = match command {
        Commands::Status => commands::status::run(&controller),
        Commands::SetDir { path } => commands::status::set_dir(&mut controller, &path),
        Commands::Check => commands::check::run(&mut controller),
        Commands::DownloadBase => commands::packages::download_base(&mut controller),
        Commands::InstallBase => commands::packages::install_base(&mut controller),
        Commands::DownloadUpdate => commands::packages::download_update(&mut controller),
        Commands::InstallUpdate => commands::packages::install_update(&mut controller),
        Commands::Sync { all } => commands::packages::sync(&mut controller, &mut printer, all),
        Commands::Config(_) | Commands::Init { .. } => Ok(()),
    };

    printer.flush(&controller);
    result
}
