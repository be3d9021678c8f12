//! Utility functions for retime
//!
//! File hashing, path-key normalisation and atomic file replacement shared by
//! the walker, the fingerprinter and the snapshot store.
//!
//! ## Path keys
//!
//! Snapshot keys are relative paths in forward-slash form with no leading
//! separator. They are always derived structurally from path components
//! (`strip_prefix` followed by joining normal components), never by searching
//! for the project path inside a longer string. A project path that happens
//! to recur deeper in the tree (`/data/app/vendor/data/app/x.txt`) therefore
//! still produces the right key.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use crate::utils::{hash_file_md5, relative_key};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hash = hash_file_md5(Path::new("README.md"))?;
//! assert_eq!(hash.len(), 32);
//!
//! let key = relative_key(Path::new("src/utils/util.py"));
//! assert_eq!(key, "src/utils/util.py");
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, RetimeError};
use md5::{Digest, Md5};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::trace;

/// Read buffer size used while hashing
pub const HASH_CHUNK_SIZE: usize = 4096;

/// Hash a file's content using MD5
///
/// The file is streamed through a fixed 4 KiB buffer, so memory use does not
/// depend on file size.
///
/// # Errors
///
/// Returns the raw `io::Error` so callers can tell a vanished file
/// (`ErrorKind::NotFound`) from other read faults.
pub fn hash_file_md5(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    let mut buffer = [0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hash in-memory data using MD5
#[cfg(test)]
pub fn hash_data_md5(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Make a path relative to a base path
///
/// Tries a lexical strip first and falls back to canonicalising both paths
/// when the lexical form differs (relative components, `.`/`..`).
pub fn make_relative(path: &Path, base: &Path) -> Result<PathBuf> {
    if let Ok(relative) = path.strip_prefix(base) {
        return Ok(relative.to_path_buf());
    }

    let path_canon = path.canonicalize()?;
    let base_canon = base.canonicalize()?;

    path_canon
        .strip_prefix(&base_canon)
        .map(|p| p.to_path_buf())
        .map_err(|_| {
            RetimeError::internal(format!(
                "Path {:?} is not relative to {:?}",
                path_canon, base_canon
            ))
        })
}

/// Normalise a relative path into a snapshot key
///
/// Root, prefix and `.` components are dropped, so the result never starts
/// with a separator and always uses `/`.
pub fn relative_key(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            Component::RootDir | Component::Prefix(_) | Component::CurDir => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a key into its directory part and base name
///
/// `"src/utils/util.py"` becomes `("src/utils", "util.py")`; root-level keys
/// get an empty directory.
pub fn split_key(key: &str) -> (&str, &str) {
    match key.rfind('/') {
        Some(idx) => (&key[..idx], &key[idx + 1..]),
        None => ("", key),
    }
}

/// Join a key onto a project root
///
/// Returns `None` when a segment is not a plain name (`..`, `.` or a drive
/// prefix), so the result always stays below `root`.
pub fn key_to_path(root: &Path, key: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for part in key.split('/').filter(|part| !part.is_empty()) {
        let mut components = Path::new(part).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => path.push(name),
            _ => return None,
        }
    }
    Some(path)
}

/// Render an absolute path with forward slashes
pub fn to_forward_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Atomic file write (write to temp file then rename)
///
/// The temp file lives in the target's directory so the final rename never
/// crosses a filesystem. Content is flushed and synced before the rename; on
/// any failure the temp file is removed and the previous target, if any, is
/// left untouched.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content)?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    trace!("Atomically wrote {} bytes to {:?}", content.len(), path);
    Ok(())
}
