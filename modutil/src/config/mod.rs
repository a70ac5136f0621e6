//! Application configuration (`config.ini`).
//!
//! ```ini
//! [server]
//! url = https://mods.netrve.net/
//! manifest_file = modutil.xml
//! timeout = 300
//!
//! [game]
//! id = HDN
//!
//! [paths]
//! data_dir = ~/.config/modutil
//! log_file =
//!
//! [manifest]
//! refresh = always
//!
//! [ui]
//! status_lines = 4
//! ```
//!
//! Missing keys fall back to their defaults; unknown keys are ignored.

mod error;
mod file;
mod keys;

pub use error::ConfigError;
pub use file::{
    config_file_path, default_data_dir, join_url, ConfigFile, GameSettings, ManifestSettings,
    PathSettings, ServerSettings, UiSettings, DEFAULT_GAME_ID, DEFAULT_LOG_FILE,
    DEFAULT_SERVER_URL,
};
pub use keys::ConfigKey;
