//! The trust manifest published by the mod server.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::{StoreError, StoreResult};
use crate::fingerprint::Digest;

/// Expected digest for one tracked target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// File or directory, relative to the install root.
    pub target: String,
    /// Expected SHA-1, hex.
    pub digest: String,
}

impl ManifestEntry {
    /// Create a new entry.
    pub fn new(target: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            digest: digest.into(),
        }
    }
}

/// Expected digest for a downloadable package archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDigest {
    /// Archive file name, e.g. `HDN_BASE.zip`.
    pub name: String,
    /// Expected SHA-1, hex.
    pub digest: String,
}

/// Server-published record of expected content digests.
///
/// Immutable once loaded; a refresh replaces the whole manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustManifest {
    server: String,
    entries: Vec<ManifestEntry>,
    latest: Option<u32>,
    packages: Vec<PackageDigest>,
}

impl TrustManifest {
    /// Create a manifest from a server URL and target entries.
    pub fn new(server: impl Into<String>, entries: Vec<ManifestEntry>) -> Self {
        Self {
            server: server.into(),
            entries,
            latest: None,
            packages: Vec::new(),
        }
    }

    /// Set the highest published content version.
    pub fn with_latest(mut self, latest: u32) -> Self {
        self.latest = Some(latest);
        self
    }

    /// Publish an expected digest for a package archive.
    pub fn with_package(mut self, name: impl Into<String>, digest: impl Into<String>) -> Self {
        self.packages.push(PackageDigest {
            name: name.into(),
            digest: digest.into(),
        });
        self
    }

    /// Base URL packages are downloaded from.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Tracked targets in manifest order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Highest published content version, if the server announces one.
    pub fn latest(&self) -> Option<u32> {
        self.latest
    }

    /// Expected digest for a package archive, if published.
    pub fn package_digest(&self, name: &str) -> Option<&str> {
        self.packages
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.digest.as_str())
    }

    /// Check the invariants every loaded manifest must satisfy.
    ///
    /// - the server URL is non-empty
    /// - every digest is 40 hex characters
    /// - no target appears twice
    pub fn validate(&self) -> StoreResult<()> {
        if self.server.trim().is_empty() {
            return Err(StoreError::InvalidManifest(
                "server URL is empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &self.entries {
            if entry.target.trim().is_empty() {
                return Err(StoreError::InvalidManifest(
                    "entry with empty target".to_string(),
                ));
            }
            if !seen.insert(entry.target.as_str()) {
                return Err(StoreError::InvalidManifest(format!(
                    "duplicate target '{}'",
                    entry.target
                )));
            }
            check_digest(&entry.target, &entry.digest)?;
        }

        for package in &self.packages {
            check_digest(&package.name, &package.digest)?;
        }

        Ok(())
    }

    /// Parse and validate a manifest from its XML form.
    pub fn from_xml(xml: &str) -> StoreResult<Self> {
        let doc: ManifestDoc = quick_xml::de::from_str(xml)
            .map_err(|e| StoreError::InvalidManifest(format!("malformed XML: {}", e)))?;

        let manifest = Self {
            server: doc.server.trim().to_string(),
            entries: doc
                .hashes
                .into_iter()
                .map(|h| ManifestEntry::new(h.hash.target.trim(), h.hash.value.trim()))
                .collect(),
            latest: doc.latest,
            packages: doc
                .packages
                .into_iter()
                .map(|p| PackageDigest {
                    name: p.name.trim().to_string(),
                    digest: p.digest.trim().to_string(),
                })
                .collect(),
        };

        manifest.validate()?;
        Ok(manifest)
    }

    /// Serialize to the XML form the server publishes.
    pub fn to_xml(&self) -> StoreResult<String> {
        let doc = ManifestDoc {
            server: self.server.clone(),
            latest: self.latest,
            hashes: self
                .entries
                .iter()
                .map(|e| HashesDoc {
                    hash: HashDoc {
                        value: e.digest.clone(),
                        target: e.target.clone(),
                    },
                })
                .collect(),
            packages: self
                .packages
                .iter()
                .map(|p| PackageDoc {
                    name: p.name.clone(),
                    digest: p.digest.clone(),
                })
                .collect(),
        };

        to_pretty_xml(&doc).map_err(StoreError::InvalidManifest)
    }
}

fn check_digest(owner: &str, digest: &str) -> StoreResult<()> {
    digest.parse::<Digest>().map(|_| ()).map_err(|e| {
        StoreError::InvalidManifest(format!("bad digest for '{}': {}", owner, e))
    })
}

/// Serialize a record with four-space indentation.
pub(crate) fn to_pretty_xml<T: Serialize>(value: &T) -> Result<String, String> {
    let mut buffer = String::new();
    let mut serializer = quick_xml::se::Serializer::new(&mut buffer);
    serializer.indent(' ', 4);
    value.serialize(serializer).map_err(|e| e.to_string())?;
    buffer.push('\n');
    Ok(buffer)
}

// On-disk shape, kept compatible with manifests already published:
//
// <modutil>
//     <server>https://mods.example.net/</server>
//     <hashes><hash><Value>..sha1..</Value><Target>Mods</Target></hash></hashes>
// </modutil>

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "modutil")]
struct ManifestDoc {
    server: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latest: Option<u32>,
    #[serde(rename = "hashes", default)]
    hashes: Vec<HashesDoc>,
    #[serde(rename = "package", default)]
    packages: Vec<PackageDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct HashesDoc {
    hash: HashDoc,
}

#[derive(Debug, Serialize, Deserialize)]
struct HashDoc {
    #[serde(rename = "Value")]
    value: String,
    #[serde(rename = "Target")]
    target: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct PackageDoc {
    name: String,
    digest: String,
}
