//! Package naming.

use std::fmt;

use crate::config::join_url;

/// Extension of every package archive.
const ARCHIVE_EXT: &str = "zip";

/// A downloadable content pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// Foundational content, brings version 0 to 1.
    Base,
    /// Incremental content producing the given version.
    Update(u32),
}

impl PackageKind {
    /// Archive file name, e.g. `HDN_BASE.zip` or `HDN_UPDATE_2.zip`.
    pub fn archive_name(&self, game_id: &str) -> String {
        match self {
            Self::Base => format!("{}_BASE.{}", game_id, ARCHIVE_EXT),
            Self::Update(version) => format!("{}_UPDATE_{}.{}", game_id, version, ARCHIVE_EXT),
        }
    }

    /// Install state version after this pack is applied.
    pub fn target_version(&self) -> u32 {
        match self {
            Self::Base => 1,
            Self::Update(version) => *version,
        }
    }

    pub fn is_base(&self) -> bool {
        matches!(self, Self::Base)
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => f.write_str("base pack"),
            Self::Update(version) => write!(f, "update {}", version),
        }
    }
}

/// Download URL of a package: `<server>/<game_id>/<archive>`.
pub fn package_url(server: &str, game_id: &str, kind: PackageKind) -> String {
    join_url(server, &[game_id, &kind.archive_name(game_id)])
}
