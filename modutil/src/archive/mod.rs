//! Package archive extraction.
//!
//! Extraction sits behind [`ArchiveExtractor`] so the sync engine can be
//! driven by a fake in tests. [`ZipExtractor`] is the production format.

mod error;
mod zipfile;

pub use error::{ExtractError, ExtractResult};
pub use zipfile::ZipExtractor;

use std::path::Path;

/// Unpacks a package archive over a directory.
pub trait ArchiveExtractor: Send + Sync {
    /// Extract every entry of `archive` into `dest_dir`, overwriting
    /// existing files. Returns the number of files written.
    ///
    /// Archives containing entries that would land outside `dest_dir` are
    /// rejected before anything is written.
    fn extract(&self, archive: &Path, dest_dir: &Path) -> ExtractResult<usize>;
}
