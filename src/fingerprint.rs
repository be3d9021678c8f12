//! Content fingerprinting
//!
//! Produces a [`FileRecord`] for a single file: streamed MD5 of its bytes
//! plus size, attribute code and the three file times.
//!
//! A file disappearing between enumeration and hashing is an expected race,
//! reported as [`Fingerprint::NotFound`]. Any other I/O fault becomes
//! [`Fingerprint::ReadError`] so the caller can log it and carry on with the
//! rest of the batch.

use crate::attributes;
use crate::error::{Result, RetimeError};
use crate::timestamp;
use crate::types::{FileRecord, ProgressInfo};
use crate::utils;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::trace;

/// Outcome of fingerprinting one file
#[derive(Debug)]
pub enum Fingerprint {
    /// File was read completely
    Found(FileRecord),
    /// File no longer exists
    NotFound,
    /// File exists but could not be read
    ReadError(io::Error),
}

impl Fingerprint {
    /// The record, if the file was read
    pub fn record(&self) -> Option<&FileRecord> {
        match self {
            Fingerprint::Found(record) => Some(record),
            _ => None,
        }
    }
}

/// Fingerprint one file
///
/// `key` is the file's path relative to the project root; it determines the
/// record's `path` and `name` fields.
pub fn fingerprint(absolute_path: &Path, key: &str) -> Fingerprint {
    match read_record(absolute_path, key) {
        Ok(record) => Fingerprint::Found(record),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            trace!("'{}' vanished before it could be hashed", key);
            Fingerprint::NotFound
        }
        Err(e) => Fingerprint::ReadError(e),
    }
}

fn read_record(absolute_path: &Path, key: &str) -> io::Result<FileRecord> {
    let metadata = fs::metadata(absolute_path)?;
    if !metadata.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{:?} is not a regular file", absolute_path),
        ));
    }

    let md5 = utils::hash_file_md5(absolute_path)?;
    let modified = metadata.modified()?;
    let created = created_time(&metadata)?;
    let accessed = metadata.accessed().unwrap_or(modified);
    let (dir, name) = utils::split_key(key);

    Ok(FileRecord {
        md5,
        path: dir.to_string(),
        name: name.to_string(),
        size: metadata.len(),
        attr: attributes::file_attributes(&metadata),
        modified: timestamp::from_system_time(modified),
        created: timestamp::from_system_time(created),
        accessed: timestamp::from_system_time_clamped(accessed),
    })
}

/// Creation time, falling back to the inode change time
fn created_time(metadata: &fs::Metadata) -> io::Result<SystemTime> {
    match metadata.created() {
        Ok(time) => Ok(time),
        Err(_) => changed_time(metadata),
    }
}

#[cfg(unix)]
fn changed_time(metadata: &fs::Metadata) -> io::Result<SystemTime> {
    use std::os::unix::fs::MetadataExt;
    let secs = metadata.ctime();
    if secs < 0 {
        return Ok(UNIX_EPOCH);
    }
    Ok(UNIX_EPOCH + Duration::new(secs as u64, metadata.ctime_nsec() as u32))
}

#[cfg(not(unix))]
fn changed_time(metadata: &fs::Metadata) -> io::Result<SystemTime> {
    metadata.modified()
}

/// Fingerprint many files of one project in parallel
///
/// Results come back in the order of `keys`. Each worker only produces its
/// own item, so nothing is shared apart from the progress counter.
pub fn fingerprint_all<F>(
    root: &Path,
    keys: &[String],
    parallel_workers: usize,
    progress_callback: Option<F>,
) -> Result<Vec<(String, Fingerprint)>>
where
    F: Fn(ProgressInfo) + Send + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallel_workers.max(1))
        .build()
        .map_err(|e| RetimeError::ThreadPool(e.to_string()))?;

    let processed = AtomicUsize::new(0);
    let total = keys.len();

    let results: Vec<(String, Fingerprint)> = pool.install(|| {
        keys.par_iter()
            .map(|key| {
                let outcome = match utils::key_to_path(root, key) {
                    Some(path) => fingerprint(&path, key),
                    None => Fingerprint::ReadError(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "path leaves the project root",
                    )),
                };
                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(ref callback) = progress_callback {
                    callback(ProgressInfo {
                        operation: "Hashing files".to_string(),
                        current_item: Some(key.clone()),
                        processed: done,
                        total: Some(total),
                    });
                }
                (key.clone(), outcome)
            })
            .collect()
    });

    Ok(results)
}
