//! Addressable `section.key` settings.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::error::ConfigError;
use super::file::ConfigFile;
use crate::store::ManifestPolicy;

/// Every setting `config get/set` can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ServerUrl,
    ServerManifestFile,
    ServerTimeout,
    GameId,
    PathsDataDir,
    PathsLogFile,
    ManifestRefresh,
    UiStatusLines,
}

const ALL_KEYS: [ConfigKey; 8] = [
    ConfigKey::ServerUrl,
    ConfigKey::ServerManifestFile,
    ConfigKey::ServerTimeout,
    ConfigKey::GameId,
    ConfigKey::PathsDataDir,
    ConfigKey::PathsLogFile,
    ConfigKey::ManifestRefresh,
    ConfigKey::UiStatusLines,
];

impl ConfigKey {
    /// All keys, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        &ALL_KEYS
    }

    /// INI section.
    pub fn section(&self) -> &'static str {
        match self {
            Self::ServerUrl | Self::ServerManifestFile | Self::ServerTimeout => "server",
            Self::GameId => "game",
            Self::PathsDataDir | Self::PathsLogFile => "paths",
            Self::ManifestRefresh => "manifest",
            Self::UiStatusLines => "ui",
        }
    }

    /// Key within the section.
    pub fn key_name(&self) -> &'static str {
        match self {
            Self::ServerUrl => "url",
            Self::ServerManifestFile => "manifest_file",
            Self::ServerTimeout => "timeout",
            Self::GameId => "id",
            Self::PathsDataDir => "data_dir",
            Self::PathsLogFile => "log_file",
            Self::ManifestRefresh => "refresh",
            Self::UiStatusLines => "status_lines",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            Self::ServerUrl => config.server.url.clone(),
            Self::ServerManifestFile => config.server.manifest_file.clone(),
            Self::ServerTimeout => config.server.timeout_secs.to_string(),
            Self::GameId => config.game.id.clone(),
            Self::PathsDataDir => config.paths.data_dir.display().to_string(),
            Self::PathsLogFile => config
                .paths
                .log_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            Self::ManifestRefresh => config.manifest.refresh.to_string(),
            Self::UiStatusLines => config.ui.status_lines.to_string(),
        }
    }

    /// Parse `value` and store it.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = |reason: String| ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason,
        };

        match self {
            Self::ServerUrl => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(invalid("expected an http(s) URL".to_string()));
                }
                config.server.url = value.to_string();
            }
            Self::ServerManifestFile => {
                if value.is_empty() {
                    return Err(invalid("must not be empty".to_string()));
                }
                config.server.manifest_file = value.to_string();
            }
            Self::ServerTimeout => {
                config.server.timeout_secs = match value.parse::<u64>() {
                    Ok(secs) if secs > 0 => secs,
                    _ => return Err(invalid("expected a positive number of seconds".to_string())),
                };
            }
            Self::GameId => {
                if value.is_empty() || value.contains(['/', '\\']) {
                    return Err(invalid("expected a non-empty id without slashes".to_string()));
                }
                config.game.id = value.to_string();
            }
            Self::PathsDataDir => {
                if value.is_empty() {
                    return Err(invalid("must not be empty".to_string()));
                }
                config.paths.data_dir = PathBuf::from(value);
            }
            Self::PathsLogFile => {
                config.paths.log_file = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            Self::ManifestRefresh => {
                config.manifest.refresh = value.parse::<ManifestPolicy>().map_err(invalid)?;
            }
            Self::UiStatusLines => {
                config.ui.status_lines = match value.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => return Err(invalid("expected a positive integer".to_string())),
                };
            }
        }
        Ok(())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique_and_parse_back() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
        }
        let mut names: Vec<_> = ConfigKey::all().iter().map(|k| k.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ConfigKey::all().len());
    }

    #[test]
    fn test_unknown_key() {
        assert!(matches!(
            "server.port".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_set_and_get() {
        let mut config = ConfigFile::default();
        ConfigKey::GameId.set(&mut config, " ABC ").unwrap();
        ConfigKey::ManifestRefresh.set(&mut config, "cached").unwrap();
        ConfigKey::UiStatusLines.set(&mut config, "8").unwrap();

        assert_eq!(ConfigKey::GameId.get(&config), "ABC");
        assert_eq!(ConfigKey::ManifestRefresh.get(&config), "cached");
        assert_eq!(config.ui.status_lines, 8);
    }

    #[test]
    fn test_log_file_clears_with_empty_value() {
        let mut config = ConfigFile::default();
        ConfigKey::PathsLogFile.set(&mut config, "/tmp/m.log").unwrap();
        assert_eq!(config.paths.log_file, Some(PathBuf::from("/tmp/m.log")));

        ConfigKey::PathsLogFile.set(&mut config, "").unwrap();
        assert_eq!(config.paths.log_file, None);
        assert_eq!(ConfigKey::PathsLogFile.get(&config), "");
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = ConfigFile::default();
        assert!(ConfigKey::ServerUrl.set(&mut config, "ftp://x").is_err());
        assert!(ConfigKey::ServerTimeout.set(&mut config, "0").is_err());
        assert!(ConfigKey::GameId.set(&mut config, "a/b").is_err());
        assert!(ConfigKey::UiStatusLines.set(&mut config, "-1").is_err());
        assert!(ConfigKey::ManifestRefresh.set(&mut config, "never").is_err());
        assert_eq!(config, ConfigFile::default());
    }
}
