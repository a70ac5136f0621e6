//! Content fingerprints for files and directory trees.
//!
//! A fingerprint is a SHA-1 [`Digest`] of content:
//!
//! - a file's digest is the SHA-1 of its bytes
//! - a directory's digest aggregates every regular file beneath it, ordered
//!   by relative path, so the result does not depend on the order in which
//!   the filesystem happens to list entries
//!
//! ```text
//! fingerprint(path)
//!     ├── file      → fingerprint_file      (streamed SHA-1)
//!     └── directory → fingerprint_directory (sorted "path\0digest" records)
//! ```

mod digest;
mod error;
mod hasher;

pub use digest::{Digest, DigestParseError, DIGEST_LEN};
pub use error::{FingerprintError, FingerprintResult};
pub use hasher::{fingerprint, fingerprint_directory, fingerprint_file};
