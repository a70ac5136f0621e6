//! Loading and persisting records in the data directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::error::{StoreError, StoreResult};
use super::manifest::TrustManifest;
use super::source::{ManifestPolicy, ManifestSource};
use super::state::InstallState;

/// File name of the cached trust manifest.
pub const MANIFEST_FILE: &str = "modutil.xml";

/// File name of the persisted install state.
pub const STATE_FILE: &str = "config.xml";

/// Loads and saves the trust manifest and the install state.
///
/// The manifest is fetched from `manifest_url` according to the configured
/// [`ManifestPolicy`]; with the default policy the store goes to the network
/// once per session and falls back to the cached copy when offline.
pub struct ManifestStore {
    data_dir: PathBuf,
    manifest_url: String,
    policy: ManifestPolicy,
    source: Box<dyn ManifestSource>,
    refreshed: bool,
}

impl std::fmt::Debug for ManifestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestStore")
            .field("data_dir", &self.data_dir)
            .field("manifest_url", &self.manifest_url)
            .field("policy", &self.policy)
            .field("refreshed", &self.refreshed)
            .finish_non_exhaustive()
    }
}

impl ManifestStore {
    /// Create a store rooted at `data_dir`.
    pub fn new(
        data_dir: impl Into<PathBuf>,
        manifest_url: impl Into<String>,
        source: Box<dyn ManifestSource>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            manifest_url: manifest_url.into(),
            policy: ManifestPolicy::default(),
            source,
            refreshed: false,
        }
    }

    /// Set the manifest refresh policy.
    pub fn with_policy(mut self, policy: ManifestPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Directory holding the records.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// URL the manifest is fetched from.
    pub fn manifest_url(&self) -> &str {
        &self.manifest_url
    }

    /// Path of the cached manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.data_dir.join(MANIFEST_FILE)
    }

    /// Path of the install state file.
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE)
    }

    /// Load the trust manifest.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ManifestUnavailable`] when neither the network
    /// nor the local copy yields a valid manifest.
    pub fn load_trust_manifest(&mut self) -> StoreResult<TrustManifest> {
        let path = self.manifest_path();
        let has_local = path.exists();

        let should_fetch = match self.policy {
            ManifestPolicy::AlwaysRefresh => !self.refreshed || !has_local,
            ManifestPolicy::PreferCached => !has_local,
        };

        let mut fetch_failure = None;
        if should_fetch {
            match self.fetch_remote() {
                Ok(manifest) => {
                    self.refreshed = true;
                    if let Err(e) = manifest
                        .to_xml()
                        .and_then(|xml| write_atomic(&path, xml.as_bytes()))
                    {
                        warn!(error = %e, "Could not cache trust manifest");
                    }
                    info!(
                        url = %self.manifest_url,
                        targets = manifest.entries().len(),
                        "Trust manifest refreshed"
                    );
                    return Ok(manifest);
                }
                Err(e) => {
                    warn!(url = %self.manifest_url, error = %e, "Trust manifest fetch failed");
                    fetch_failure = Some(e.to_string());
                }
            }
        }

        self.read_local(&path).map_err(|local| {
            let reason = match fetch_failure {
                Some(remote) => format!("{}; local copy: {}", remote, local),
                None => format!("local copy: {}", local),
            };
            StoreError::ManifestUnavailable {
                url: self.manifest_url.clone(),
                reason,
            }
        })
    }

    fn fetch_remote(&self) -> StoreResult<TrustManifest> {
        let xml = self.source.fetch(&self.manifest_url)?;
        TrustManifest::from_xml(&xml)
    }

    fn read_local(&self, path: &Path) -> StoreResult<TrustManifest> {
        let xml = fs::read_to_string(path).map_err(|e| StoreError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        let manifest = TrustManifest::from_xml(&xml)?;
        debug!(path = %path.display(), "Loaded cached trust manifest");
        Ok(manifest)
    }

    /// Load the install state, creating and persisting a default on first run.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CorruptState`] if the file exists but cannot be
    /// parsed. The file is left untouched.
    pub fn load_install_state(&self) -> StoreResult<InstallState> {
        let path = self.state_path();

        let xml = match fs::read_to_string(&path) {
            Ok(xml) => xml,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let state = InstallState::default();
                self.save_install_state(&state)?;
                info!(path = %path.display(), "Created default install state");
                return Ok(state);
            }
            Err(e) => return Err(StoreError::ReadFailed { path, source: e }),
        };

        InstallState::from_xml(&xml).map_err(|reason| StoreError::CorruptState { path, reason })
    }

    /// Persist the install state atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PersistenceError`] if the file cannot be written.
    pub fn save_install_state(&self, state: &InstallState) -> StoreResult<()> {
        let path = self.state_path();
        let xml = state
            .to_xml()
            .map_err(|reason| StoreError::PersistenceError {
                path: path.clone(),
                reason,
            })?;
        write_atomic(&path, xml.as_bytes())?;
        debug!(
            path = %path.display(),
            version = state.version(),
            "Install state saved"
        );
        Ok(())
    }
}

/// Write `contents` to a temp file next to `path`, then rename it into place.
fn write_atomic(path: &Path, contents: &[u8]) -> StoreResult<()> {
    let persistence = |reason: String| StoreError::PersistenceError {
        path: path.to_path_buf(),
        reason,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| persistence(e.to_string()))?;

    let mut temp = NamedTempFile::new_in(&parent).map_err(|e| persistence(e.to_string()))?;
    temp.write_all(contents)
        .map_err(|e| persistence(e.to_string()))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| persistence(e.to_string()))?;
    temp.persist(path)
        .map_err(|e| persistence(e.error.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ManifestEntry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    const DIGEST: &str = "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed";
    const URL: &str = "https://mods.example.net/HDN/modutil.xml";

    /// Source returning a fixed document (or failing) and counting calls.
    struct FakeSource {
        body: Option<String>,
        calls: Arc<AtomicUsize>,
    }

    impl ManifestSource for FakeSource {
        fn fetch(&self, url: &str) -> StoreResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.body
                .clone()
                .ok_or_else(|| StoreError::ManifestUnavailable {
                    url: url.to_string(),
                    reason: "offline".to_string(),
                })
        }
    }

    fn manifest(server: &str) -> TrustManifest {
        TrustManifest::new(server, vec![ManifestEntry::new("Mods", DIGEST)])
    }

    fn store_with(
        dir: &Path,
        body: Option<String>,
        policy: ManifestPolicy,
    ) -> (ManifestStore, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FakeSource {
            body,
            calls: Arc::clone(&calls),
        };
        let store = ManifestStore::new(dir, URL, Box::new(source)).with_policy(policy);
        (store, calls)
    }

    #[test]
    fn test_fetches_and_caches_manifest() {
        let temp = TempDir::new().unwrap();
        let remote = manifest("https://remote/").to_xml().unwrap();
        let (mut store, calls) =
            store_with(temp.path(), Some(remote), ManifestPolicy::AlwaysRefresh);

        let loaded = store.load_trust_manifest().unwrap();

        assert_eq!(loaded.server(), "https://remote/");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.manifest_path().exists());
    }

    #[test]
    fn test_always_refresh_fetches_once_per_session() {
        let temp = TempDir::new().unwrap();
        let remote = manifest("https://remote/").to_xml().unwrap();
        let (mut store, calls) =
            store_with(temp.path(), Some(remote), ManifestPolicy::AlwaysRefresh);

        store.load_trust_manifest().unwrap();
        store.load_trust_manifest().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_always_refresh_replaces_stale_cache() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(MANIFEST_FILE),
            manifest("https://stale/").to_xml().unwrap(),
        )
        .unwrap();
        let remote = manifest("https://fresh/").to_xml().unwrap();
        let (mut store, _) = store_with(temp.path(), Some(remote), ManifestPolicy::AlwaysRefresh);

        assert_eq!(store.load_trust_manifest().unwrap().server(), "https://fresh/");
        let cached = fs::read_to_string(store.manifest_path()).unwrap();
        assert!(cached.contains("https://fresh/"));
    }

    #[test]
    fn test_offline_falls_back_to_cache() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(MANIFEST_FILE),
            manifest("https://cached/").to_xml().unwrap(),
        )
        .unwrap();
        let (mut store, _) = store_with(temp.path(), None, ManifestPolicy::AlwaysRefresh);

        assert_eq!(store.load_trust_manifest().unwrap().server(), "https://cached/");
    }

    #[test]
    fn test_prefer_cached_skips_network() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(MANIFEST_FILE),
            manifest("https://cached/").to_xml().unwrap(),
        )
        .unwrap();
        let remote = manifest("https://remote/").to_xml().unwrap();
        let (mut store, calls) =
            store_with(temp.path(), Some(remote), ManifestPolicy::PreferCached);

        assert_eq!(store.load_trust_manifest().unwrap().server(), "https://cached/");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unavailable_when_offline_without_cache() {
        let temp = TempDir::new().unwrap();
        let (mut store, _) = store_with(temp.path(), None, ManifestPolicy::AlwaysRefresh);

        let err = store.load_trust_manifest().unwrap_err();
        assert!(matches!(err, StoreError::ManifestUnavailable { .. }));
        assert!(err.to_string().contains("offline"));
    }

    #[test]
    fn test_invalid_remote_falls_back_to_cache() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(MANIFEST_FILE),
            manifest("https://cached/").to_xml().unwrap(),
        )
        .unwrap();
        let (mut store, _) = store_with(
            temp.path(),
            Some("<html>maintenance</html>".to_string()),
            ManifestPolicy::AlwaysRefresh,
        );

        assert_eq!(store.load_trust_manifest().unwrap().server(), "https://cached/");
    }

    #[test]
    fn test_first_run_creates_default_state() {
        let temp = TempDir::new().unwrap();
        let (store, _) = store_with(temp.path(), None, ManifestPolicy::AlwaysRefresh);

        let state = store.load_install_state().unwrap();

        assert_eq!(state, InstallState::default());
        assert!(store.state_path().exists());
        assert_eq!(store.load_install_state().unwrap(), state);
    }

    #[test]
    fn test_state_round_trip() {
        let temp = TempDir::new().unwrap();
        let (store, _) = store_with(temp.path(), None, ManifestPolicy::AlwaysRefresh);
        let state = InstallState::new("/games/x", 2);

        store.save_install_state(&state).unwrap();

        assert_eq!(store.load_install_state().unwrap(), state);
    }

    #[test]
    fn test_corrupt_state_is_reported_and_kept() {
        let temp = TempDir::new().unwrap();
        let (store, _) = store_with(temp.path(), None, ManifestPolicy::AlwaysRefresh);
        fs::write(store.state_path(), "<config><vers>lots</vers>").unwrap();

        let err = store.load_install_state().unwrap_err();

        assert!(matches!(err, StoreError::CorruptState { .. }));
        assert_eq!(
            fs::read_to_string(store.state_path()).unwrap(),
            "<config><vers>lots</vers>"
        );
    }

    #[test]
    fn test_save_creates_data_dir() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b");
        let (store, _) = store_with(&nested, None, ManifestPolicy::AlwaysRefresh);

        store
            .save_install_state(&InstallState::new("/g", 1))
            .unwrap();

        assert!(nested.join(STATE_FILE).exists());
    }
}
