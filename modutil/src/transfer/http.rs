//! HTTP fetcher with resume support.
//!
//! Bytes are streamed into `<destination>.part`. If a partial file is left
//! over from an earlier attempt, a Range request picks up where it stopped;
//! servers that ignore the range get a fresh download. The partial file is
//! renamed onto the destination only after the full body has arrived.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, CONTENT_RANGE, RANGE};
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use super::error::{TransferError, TransferResult};
use super::progress::TransferProgress;
use super::Fetcher;

/// Default timeout for HTTP requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// Buffer size for reading/writing during downloads (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Path of the in-progress file for `dest`.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

/// First byte offset of a `Content-Range: bytes <start>-<end>/<len>` header.
fn content_range_start(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_RANGE)?
        .to_str()
        .ok()?
        .trim()
        .strip_prefix("bytes ")?
        .split('-')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Blocking HTTP implementation of [`Fetcher`].
#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with the default timeout.
    pub fn new() -> TransferResult<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a fetcher with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> TransferResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransferError::Http {
                url: String::new(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, timeout })
    }

    fn request_error(&self, url: &str, err: reqwest::Error) -> TransferError {
        if err.is_timeout() {
            TransferError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            TransferError::Http {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }

    /// Stream the response body into `file`, returning the new total on disk.
    fn stream_body(
        &self,
        url: &str,
        response: &mut Response,
        file: File,
        part: &Path,
        start_byte: u64,
        progress: &TransferProgress,
    ) -> TransferResult<u64> {
        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut written = start_byte;

        loop {
            let bytes_read = response.read(&mut buffer).map_err(|e| TransferError::Http {
                url: url.to_string(),
                reason: format!("read error: {}", e),
            })?;

            if bytes_read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..bytes_read])
                .map_err(|e| TransferError::io(part, e))?;

            written += bytes_read as u64;
            progress.set_transferred(written);
        }

        writer.flush().map_err(|e| TransferError::io(part, e))?;
        Ok(written)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path, progress: &TransferProgress) -> TransferResult<u64> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| TransferError::io(parent, e))?;
        }

        let part = part_path(dest);
        let existing = fs::metadata(&part).map(|m| m.len()).unwrap_or(0);

        let mut request = self.client.get(url);
        if existing > 0 {
            debug!(url, offset = existing, "Resuming partial download");
            request = request.header(RANGE, format!("bytes={}-", existing));
        }

        let mut response = request.send().map_err(|e| self.request_error(url, e))?;
        let status = response.status();

        if status == StatusCode::RANGE_NOT_SATISFIABLE && existing > 0 {
            warn!(url, offset = existing, "Server rejected resume offset, restarting");
            fs::remove_file(&part).map_err(|e| TransferError::io(&part, e))?;
            return self.fetch(url, dest, progress);
        }

        if !status.is_success() {
            return Err(TransferError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let resumed = existing > 0 && status == StatusCode::PARTIAL_CONTENT;
        if resumed && content_range_start(response.headers()) != Some(existing) {
            warn!(url, offset = existing, "Server resumed at a different offset, restarting");
            drop(response);
            fs::remove_file(&part).map_err(|e| TransferError::io(&part, e))?;
            return self.fetch(url, dest, progress);
        }
        let start_byte = if resumed { existing } else { 0 };
        let body_len = response.content_length();
        if let Some(len) = body_len {
            progress.set_total(start_byte + len);
        }

        let file = if resumed {
            OpenOptions::new().append(true).open(&part)
        } else {
            File::create(&part)
        }
        .map_err(|e| TransferError::io(&part, e))?;

        progress.set_transferred(start_byte);
        let written = self.stream_body(url, &mut response, file, &part, start_byte, progress)?;

        if let Some(len) = body_len {
            let expected = start_byte + len;
            if written != expected {
                return Err(TransferError::Incomplete {
                    url: url.to_string(),
                    expected,
                    received: written,
                });
            }
        }

        fs::rename(&part, dest).map_err(|e| TransferError::io(dest, e))?;

        info!(url, dest = %dest.display(), bytes = written, resumed, "Download complete");
        Ok(written)
    }
}
