//! Zip archive extraction.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::ZipArchive;

use super::error::{ExtractError, ExtractResult};
use super::ArchiveExtractor;

/// In-process zip extractor.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl ZipExtractor {
    /// Create a new zip extractor.
    pub fn new() -> Self {
        Self
    }

    fn open(&self, archive: &Path) -> ExtractResult<ZipArchive<BufReader<File>>> {
        let file = File::open(archive).map_err(|e| ExtractError::Open {
            path: archive.to_path_buf(),
            source: e,
        })?;
        ZipArchive::new(BufReader::new(file)).map_err(|e| ExtractError::Invalid {
            path: archive.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Resolve every entry to its relative output path.
    ///
    /// Directory entries resolve to `None`.
    fn plan(
        &self,
        archive_path: &Path,
        zip: &mut ZipArchive<BufReader<File>>,
    ) -> ExtractResult<Vec<Option<PathBuf>>> {
        let mut plan = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let entry = zip.by_index(i).map_err(|e| ExtractError::Invalid {
                path: archive_path.to_path_buf(),
                reason: e.to_string(),
            })?;

            let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
                return Err(ExtractError::UnsafeEntry {
                    path: archive_path.to_path_buf(),
                    entry: entry.name().to_string(),
                });
            };

            plan.push(if entry.is_dir() { None } else { Some(relative) });
        }
        Ok(plan)
    }
}

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, archive: &Path, dest_dir: &Path) -> ExtractResult<usize> {
        let mut zip = self.open(archive)?;
        let plan = self.plan(archive, &mut zip)?;

        fs::create_dir_all(dest_dir).map_err(|e| ExtractError::Write {
            path: dest_dir.to_path_buf(),
            source: e,
        })?;

        let mut written = 0;
        for (i, relative) in plan.into_iter().enumerate() {
            let Some(relative) = relative else {
                continue;
            };
            let out_path = dest_dir.join(&relative);
            let write_err = |e: io::Error| ExtractError::Write {
                path: out_path.clone(),
                source: e,
            };

            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }

            let mut entry = zip.by_index(i).map_err(|e| ExtractError::Invalid {
                path: archive.to_path_buf(),
                reason: e.to_string(),
            })?;
            let mut writer = BufWriter::new(File::create(&out_path).map_err(write_err)?);
            io::copy(&mut entry, &mut writer).map_err(write_err)?;
            writer.flush().map_err(write_err)?;

            debug!(entry = %relative.display(), "Extracted");
            written += 1;
        }

        info!(
            archive = %archive.display(),
            dest = %dest_dir.display(),
            files = written,
            "Archive extracted"
        );
        Ok(written)
    }
}
