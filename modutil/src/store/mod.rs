//! Durable records: the trust manifest and the install state.
//!
//! Both records are stored as XML files in the data directory, in the same
//! shape the server publishes:
//!
//! - `modutil.xml` - the [`TrustManifest`] (server URL, expected digests)
//! - `config.xml` - the [`InstallState`] (install directory, content version)
//!
//! The [`ManifestStore`] owns loading and saving. Each record has its own
//! typed load function; there is no filename-based dispatch.

mod error;
mod manifest;
mod persist;
mod source;
mod state;

pub use error::{StoreError, StoreResult};
pub use manifest::{ManifestEntry, PackageDigest, TrustManifest};
pub use persist::{ManifestStore, MANIFEST_FILE, STATE_FILE};
pub use source::{HttpManifestSource, ManifestPolicy, ManifestSource};
pub use state::InstallState;
