//! The INI-backed configuration file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;

use super::error::ConfigError;
use super::keys::ConfigKey;
use crate::status::DEFAULT_STATUS_LINES;
use crate::store::{ManifestPolicy, MANIFEST_FILE};
use crate::transfer::DEFAULT_TIMEOUT_SECS;

/// Server queried for the manifest on first run.
pub const DEFAULT_SERVER_URL: &str = "https://mods.netrve.net/";

/// Game shipped with the default configuration.
pub const DEFAULT_GAME_ID: &str = "HDN";

/// Log file name inside the data directory.
pub const DEFAULT_LOG_FILE: &str = "output.log";

const CONFIG_FILE_NAME: &str = "config.ini";
const APP_DIR: &str = "modutil";

/// Platform config directory for the application.
///
/// Falls back to `./.modutil` when the platform has no config directory.
pub fn default_data_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(".modutil"))
}

/// Default location of `config.ini`.
pub fn config_file_path() -> PathBuf {
    default_data_dir().join(CONFIG_FILE_NAME)
}

/// Join URL segments with exactly one `/` between them.
pub fn join_url(base: &str, segments: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for segment in segments {
        let segment = segment.trim_matches('/');
        if !segment.is_empty() {
            url.push('/');
            url.push_str(segment);
        }
    }
    url
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Bootstrap server the manifest is fetched from.
    pub url: String,
    /// Manifest file name on the server.
    pub manifest_file: String,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

/// `[game]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    /// Id used in download URLs and archive names.
    pub id: String,
}

/// `[paths]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSettings {
    /// Where the XML records and downloaded archives live.
    pub data_dir: PathBuf,
    /// Log file; `output.log` under `data_dir` when unset.
    pub log_file: Option<PathBuf>,
}

/// `[manifest]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSettings {
    pub refresh: ManifestPolicy,
}

/// `[ui]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiSettings {
    /// Number of status lines kept for display.
    pub status_lines: usize,
}

/// Parsed `config.ini`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub server: ServerSettings,
    pub game: GameSettings,
    pub paths: PathSettings,
    pub manifest: ManifestSettings,
    pub ui: UiSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                url: DEFAULT_SERVER_URL.to_string(),
                manifest_file: MANIFEST_FILE.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
            game: GameSettings {
                id: DEFAULT_GAME_ID.to_string(),
            },
            paths: PathSettings {
                data_dir: default_data_dir(),
                log_file: None,
            },
            manifest: ManifestSettings {
                refresh: ManifestPolicy::default(),
            },
            ui: UiSettings {
                status_lines: DEFAULT_STATUS_LINES,
            },
        }
    }
}

impl ConfigFile {
    /// Load from the default location, or defaults if the file is absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, or defaults if the file is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            if let Some(raw) = ini.get_from(Some(key.section()), key.key_name()) {
                key.set(&mut config, raw)?;
            }
        }
        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini.write_to_file(path).map_err(write_err)
    }

    /// Full URL of the trust manifest.
    pub fn manifest_url(&self) -> String {
        join_url(&self.server.url, &[&self.server.manifest_file])
    }

    /// HTTP timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    /// Effective log file path.
    pub fn log_file(&self) -> PathBuf {
        self.paths
            .log_file
            .clone()
            .unwrap_or_else(|| self.paths.data_dir.join(DEFAULT_LOG_FILE))
    }

    /// Directory downloaded archives are kept in.
    pub fn download_dir(&self) -> PathBuf {
        self.paths.data_dir.join("downloads")
    }
}
