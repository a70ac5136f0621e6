//! Remote source for the trust manifest.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use super::error::{StoreError, StoreResult};

/// Where a fresh copy of the trust manifest comes from.
pub trait ManifestSource: Send + Sync {
    /// Fetch the raw manifest document at `url`.
    fn fetch(&self, url: &str) -> StoreResult<String>;
}

/// When the store goes to the network for the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifestPolicy {
    /// Fetch once per session; fall back to the local copy if offline.
    #[default]
    AlwaysRefresh,
    /// Use the local copy when present; fetch only when it is missing.
    PreferCached,
}

impl ManifestPolicy {
    /// Config-file spelling of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlwaysRefresh => "always",
            Self::PreferCached => "cached",
        }
    }
}

impl fmt::Display for ManifestPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ManifestPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "always" | "refresh" => Ok(Self::AlwaysRefresh),
            "cached" | "cache" => Ok(Self::PreferCached),
            other => Err(format!(
                "unknown manifest policy '{}' (expected 'always' or 'cached')",
                other
            )),
        }
    }
}

/// Fetches the manifest over HTTP.
#[derive(Debug)]
pub struct HttpManifestSource {
    client: Client,
}

impl HttpManifestSource {
    /// Create a source with the given request timeout.
    pub fn new(timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            StoreError::ManifestUnavailable {
                url: String::new(),
                reason: format!("failed to create HTTP client: {}", e),
            }
        })?;
        Ok(Self { client })
    }
}

impl ManifestSource for HttpManifestSource {
    fn fetch(&self, url: &str) -> StoreResult<String> {
        debug!(url, "Fetching trust manifest");

        let unavailable = |reason: String| StoreError::ManifestUnavailable {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("server returned {}", status)));
        }

        response.text().map_err(|e| unavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "always".parse::<ManifestPolicy>(),
            Ok(ManifestPolicy::AlwaysRefresh)
        );
        assert_eq!(
            " Cached ".parse::<ManifestPolicy>(),
            Ok(ManifestPolicy::PreferCached)
        );
        assert!("sometimes".parse::<ManifestPolicy>().is_err());
    }

    #[test]
    fn test_policy_display_round_trips() {
        for policy in [ManifestPolicy::AlwaysRefresh, ManifestPolicy::PreferCached] {
            assert_eq!(policy.to_string().parse::<ManifestPolicy>(), Ok(policy));
        }
    }

    #[test]
    fn test_http_source_new() {
        assert!(HttpManifestSource::new(Duration::from_secs(5)).is_ok());
    }
}
