//! SHA-1 fingerprint calculation for files and directory trees.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sha1::{Digest as _, Sha1};
use tracing::{debug, trace};
use walkdir::WalkDir;

use super::digest::{Digest, DIGEST_LEN};
use super::error::{FingerprintError, FingerprintResult};

/// Buffer size for reading files during hashing (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Fingerprint a file or a directory, depending on what `path` is.
///
/// # Errors
///
/// Returns [`FingerprintError::StatError`] if the path kind cannot be
/// determined, or whatever the file/directory variant returns.
pub fn fingerprint(path: &Path) -> FingerprintResult<Digest> {
    let metadata = fs::metadata(path).map_err(|e| FingerprintError::from_stat(path, e))?;

    if metadata.is_dir() {
        fingerprint_directory(path)
    } else {
        fingerprint_file(path)
    }
}

/// Calculate the SHA-1 digest of a file's contents.
///
/// The file is streamed through the hasher and never loaded fully into memory.
///
/// # Errors
///
/// Returns [`FingerprintError::NotFound`] if the file does not exist, or
/// [`FingerprintError::ReadError`] if it cannot be read.
pub fn fingerprint_file(path: &Path) -> FingerprintResult<Digest> {
    let mut file = File::open(path).map_err(|e| FingerprintError::from_read(path, e))?;

    let mut hasher = Sha1::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| FingerprintError::from_read(path, e))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(finish(hasher))
}

/// Calculate an aggregate digest of every regular file under `root`.
///
/// Files are ordered by their path relative to `root` (components joined with
/// `/`, compared byte-wise) and each contributes `relative_path NUL
/// file_digest` to a single SHA-1. Renaming, adding, removing or editing any
/// file changes the result. Symlinks are not followed and empty directories
/// contribute nothing.
///
/// # Errors
///
/// Returns [`FingerprintError::NotFound`] if `root` does not exist, and
/// [`FingerprintError::ReadError`] if any member cannot be listed or read.
/// There is no partial result.
pub fn fingerprint_directory(root: &Path) -> FingerprintResult<Digest> {
    let metadata = fs::metadata(root).map_err(|e| FingerprintError::from_stat(root, e))?;
    if !metadata.is_dir() {
        return Err(FingerprintError::ReadError {
            path: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        });
    }

    let files = collect_files(root)?;
    debug!(root = %root.display(), files = files.len(), "Fingerprinting directory");

    let mut hasher = Sha1::new();
    for (relative, path) in &files {
        let file_digest = fingerprint_file(path)?;
        trace!(file = %String::from_utf8_lossy(relative), digest = %file_digest, "Hashed member");

        hasher.update(relative);
        hasher.update([0u8]);
        hasher.update(file_digest.as_bytes());
    }

    Ok(finish(hasher))
}

/// Raw bytes of one path component.
///
/// Unix names are hashed exactly as stored. Elsewhere names go through a
/// lossy UTF-8 conversion, so names that are not valid Unicode may collide.
#[cfg(unix)]
fn component_bytes(name: &OsStr) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    name.as_bytes().to_vec()
}

#[cfg(not(unix))]
fn component_bytes(name: &OsStr) -> Vec<u8> {
    name.to_string_lossy().into_owned().into_bytes()
}

/// List regular files under `root` as `(relative_path, absolute_path)`,
/// sorted by relative path.
fn collect_files(root: &Path) -> FingerprintResult<Vec<(Vec<u8>, PathBuf)>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop"));
            FingerprintError::from_read(path, source)
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .components()
            .map(|c| component_bytes(c.as_os_str()))
            .collect::<Vec<_>>()
            .join(&b'/');

        files.push((relative, entry.into_path()));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

fn finish(hasher: Sha1) -> Digest {
    let mut bytes = [0u8; DIGEST_LEN];
    bytes.copy_from_slice(&hasher.finalize());
    Digest::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    /// SHA-1 of "hello world".
    const HELLO_SHA1: &str = "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed";

    /// SHA-1 of the empty string.
    const EMPTY_SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    fn sample_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "alpha").unwrap();
        fs::create_dir_all(temp.path().join("sub/deeper")).unwrap();
        fs::write(temp.path().join("sub/b.txt"), "beta").unwrap();
        fs::write(temp.path().join("sub/deeper/c.bin"), [0u8, 1, 2, 3]).unwrap();
        temp
    }

    #[test]
    fn test_fingerprint_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hello.txt");
        fs::write(&path, "hello world").unwrap();

        assert_eq!(fingerprint_file(&path).unwrap().to_hex(), HELLO_SHA1);
    }

    #[test]
    fn test_fingerprint_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty");
        File::create(&path).unwrap();

        assert_eq!(fingerprint_file(&path).unwrap().to_hex(), EMPTY_SHA1);
    }

    #[test]
    fn test_fingerprint_large_file_streams() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("large.bin");
        fs::write(&path, vec![0xABu8; BUFFER_SIZE * 3 + 17]).unwrap();

        let first = fingerprint_file(&path).unwrap();
        let second = fingerprint_file(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fingerprint_missing_file() {
        let result = fingerprint_file(Path::new("/nonexistent/file.txt"));
        assert!(matches!(result, Err(FingerprintError::NotFound { .. })));
    }

    #[test]
    fn test_directory_is_deterministic() {
        let tree = sample_tree();
        let first = fingerprint_directory(tree.path()).unwrap();
        let second = fingerprint_directory(tree.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_directory_detects_byte_change() {
        let tree = sample_tree();
        let before = fingerprint_directory(tree.path()).unwrap();

        fs::write(tree.path().join("sub/deeper/c.bin"), [0u8, 1, 2, 4]).unwrap();

        assert_ne!(before, fingerprint_directory(tree.path()).unwrap());
    }

    #[test]
    fn test_directory_detects_rename() {
        let tree = sample_tree();
        let before = fingerprint_directory(tree.path()).unwrap();

        fs::rename(tree.path().join("a.txt"), tree.path().join("z.txt")).unwrap();

        assert_ne!(before, fingerprint_directory(tree.path()).unwrap());
    }

    #[test]
    fn test_directory_detects_addition_and_removal() {
        let tree = sample_tree();
        let before = fingerprint_directory(tree.path()).unwrap();

        fs::write(tree.path().join("extra.txt"), "").unwrap();
        let added = fingerprint_directory(tree.path()).unwrap();
        assert_ne!(before, added);

        fs::remove_file(tree.path().join("extra.txt")).unwrap();
        assert_eq!(before, fingerprint_directory(tree.path()).unwrap());
    }

    #[test]
    fn test_directory_ignores_empty_dirs() {
        let tree = sample_tree();
        let before = fingerprint_directory(tree.path()).unwrap();

        fs::create_dir(tree.path().join("empty")).unwrap();

        assert_eq!(before, fingerprint_directory(tree.path()).unwrap());
    }

    #[test]
    fn test_directory_same_content_same_digest() {
        let one = sample_tree();
        let two = sample_tree();
        assert_eq!(
            fingerprint_directory(one.path()).unwrap(),
            fingerprint_directory(two.path()).unwrap()
        );
    }

    #[test]
    fn test_directory_missing_root() {
        let temp = TempDir::new().unwrap();
        let result = fingerprint_directory(&temp.path().join("nope"));
        assert!(matches!(result, Err(FingerprintError::NotFound { .. })));
    }

    #[test]
    fn test_directory_rejects_file_root() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file");
        fs::write(&path, "x").unwrap();

        let result = fingerprint_directory(&path);
        assert!(matches!(result, Err(FingerprintError::ReadError { .. })));
    }

    #[test]
    fn test_fingerprint_dispatches_on_kind() {
        let tree = sample_tree();
        let file = tree.path().join("a.txt");

        assert_eq!(fingerprint(&file).unwrap(), fingerprint_file(&file).unwrap());
        assert_eq!(
            fingerprint(tree.path()).unwrap(),
            fingerprint_directory(tree.path()).unwrap()
        );
    }

    #[test]
    fn test_fingerprint_missing_path() {
        let temp = TempDir::new().unwrap();
        let result = fingerprint(&temp.path().join("gone"));
        assert!(matches!(result, Err(FingerprintError::NotFound { .. })));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_directory_distinguishes_non_utf8_names() {
        use std::os::unix::ffi::OsStrExt;

        let tree_with = |name: &[u8]| {
            let temp = TempDir::new().unwrap();
            fs::write(temp.path().join(OsStr::from_bytes(name)), "same").unwrap();
            temp
        };
        let one = tree_with(b"mod\xff.lua");
        let two = tree_with(b"mod\xfe.lua");

        assert_ne!(
            fingerprint_directory(one.path()).unwrap(),
            fingerprint_directory(two.path()).unwrap()
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_single_byte_flip_changes_directory_digest(
            content in proptest::collection::vec(any::<u8>(), 1..512),
            index in any::<prop::sample::Index>(),
        ) {
            let temp = TempDir::new().unwrap();
            let path = temp.path().join("data.bin");
            fs::write(&path, &content).unwrap();
            let before = fingerprint_directory(temp.path()).unwrap();

            let mut changed = content.clone();
            let i = index.index(changed.len());
            changed[i] ^= 0xFF;
            fs::write(&path, &changed).unwrap();

            prop_assert_ne!(before, fingerprint_directory(temp.path()).unwrap());
        }
    }
}
