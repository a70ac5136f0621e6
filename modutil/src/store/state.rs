//! Local install state: where the game lives and what is installed.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::manifest::to_pretty_xml;

/// The user's install directory and applied content version.
///
/// Version semantics:
/// - `0` - nothing installed
/// - `1` - base pack applied
/// - `n > 1` - base pack plus `n - 1` update packs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "config")]
pub struct InstallState {
    /// Install directory; empty when unset.
    #[serde(rename = "idir", default)]
    install_dir: String,

    /// Applied content version.
    #[serde(rename = "vers", default)]
    version: u32,
}

impl InstallState {
    /// Create a state with the given directory and version.
    pub fn new(install_dir: impl Into<String>, version: u32) -> Self {
        Self {
            install_dir: install_dir.into(),
            version,
        }
    }

    /// The install directory, or `None` if unset.
    pub fn install_dir(&self) -> Option<&Path> {
        if self.install_dir.trim().is_empty() {
            None
        } else {
            Some(Path::new(&self.install_dir))
        }
    }

    /// The install directory exactly as stored (empty when unset).
    pub fn install_dir_str(&self) -> &str {
        &self.install_dir
    }

    /// Applied content version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Whether the base pack has been applied.
    pub fn has_base(&self) -> bool {
        self.version >= 1
    }

    /// The version the next update pack would produce, or `None` once the
    /// version counter is exhausted.
    pub fn next_version(&self) -> Option<u32> {
        self.version.checked_add(1)
    }

    /// Change the install directory. Does not persist.
    pub fn set_install_dir(&mut self, dir: impl Into<String>) {
        self.install_dir = dir.into();
    }

    /// Record a successfully applied version.
    pub(crate) fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    /// Parse from the XML form.
    pub(crate) fn from_xml(xml: &str) -> Result<Self, String> {
        quick_xml::de::from_str(xml).map_err(|e| e.to_string())
    }

    /// Serialize to the XML form.
    pub(crate) fn to_xml(&self) -> Result<String, String> {
        to_pretty_xml(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = InstallState::default();
        assert_eq!(state.version(), 0);
        assert!(state.install_dir().is_none());
        assert!(!state.has_base());
        assert_eq!(state.next_version(), Some(1));
    }

    #[test]
    fn test_blank_dir_is_unset() {
        let state = InstallState::new("   ", 0);
        assert!(state.install_dir().is_none());
    }

    #[test]
    fn test_set_install_dir() {
        let mut state = InstallState::default();
        state.set_install_dir("/games/x");
        assert_eq!(state.install_dir(), Some(Path::new("/games/x")));
    }

    #[test]
    fn test_xml_round_trip() {
        let state = InstallState::new("/games/x", 2);
        let xml = state.to_xml().unwrap();

        assert!(xml.contains("<idir>/games/x</idir>"));
        assert!(xml.contains("<vers>2</vers>"));
        assert_eq!(InstallState::from_xml(&xml).unwrap(), state);
    }

    #[test]
    fn test_legacy_guid_is_ignored() {
        let xml = "<config><guid>HDN</guid><idir>C:\\Games\\HDN\\</idir><vers>1</vers></config>";
        let state = InstallState::from_xml(xml).unwrap();

        assert_eq!(state.install_dir_str(), "C:\\Games\\HDN\\");
        assert_eq!(state.version(), 1);
    }

    #[test]
    fn test_next_version_at_counter_limit() {
        let state = InstallState::from_xml("<config><idir/><vers>4294967295</vers></config>").unwrap();

        assert_eq!(state.version(), u32::MAX);
        assert_eq!(state.next_version(), None);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(InstallState::from_xml("<config><vers>many</vers></config>").is_err());
    }
}
