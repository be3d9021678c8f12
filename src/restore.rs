//! Re-applying recorded modification times
//!
//! Each snapshot entry is checked against the file currently on disk. The
//! stored modification time is written back only when the content hash still
//! matches; a file whose content changed keeps its current time.
//!
//! ```text
//! entry ──► outside root?   ──► OutsideProject
//!       └─► missing?        ──► Missing
//!       └─► fingerprint     ──► ReadFailed
//!           hash differs?   ──► ContentChanged
//!           same mtime?     ──► UpToDate
//!           set mtime       ──► Restored | WriteFailed
//! ```
//!
//! Access time is never touched. Per-file problems are reported as outcomes
//! and never abort the batch.

use crate::fingerprint::{fingerprint, Fingerprint};
use crate::timestamp;
use crate::types::{FileRecord, RestoreResult, SnapshotDocument};
use crate::utils;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What happened to one snapshot entry during restore
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Key points outside the project root; never touched
    OutsideProject,
    /// No file at the recorded path
    Missing,
    /// File exists but could not be fingerprinted
    ReadFailed(String),
    /// Content differs from the snapshot; left alone
    ContentChanged,
    /// Modification time already equals the recorded one
    UpToDate,
    /// Modification time was rewritten
    Restored,
    /// Setting the modification time failed
    WriteFailed(String),
}

/// Restore the modification time of one entry
pub fn restore_entry(project_root: &Path, key: &str, stored: &FileRecord) -> RestoreOutcome {
    let Some(full_path) = utils::key_to_path(project_root, key) else {
        return RestoreOutcome::OutsideProject;
    };

    let current = match fingerprint(&full_path, key) {
        Fingerprint::Found(record) => record,
        Fingerprint::NotFound => return RestoreOutcome::Missing,
        Fingerprint::ReadError(e) => return RestoreOutcome::ReadFailed(e.to_string()),
    };

    if current.md5 != stored.md5 {
        return RestoreOutcome::ContentChanged;
    }

    let stored_text = timestamp::format_time(&stored.modified);
    if timestamp::format_in_offset_of(&current.modified, &stored.modified) == stored_text {
        return RestoreOutcome::UpToDate;
    }

    match filetime::set_file_mtime(&full_path, timestamp::to_file_time(&stored.modified)) {
        Ok(()) => RestoreOutcome::Restored,
        Err(e) => RestoreOutcome::WriteFailed(e.to_string()),
    }
}

/// Restore every entry of a snapshot
///
/// Entries are visited in key order so logs are stable between runs.
pub fn restore_entries(project_root: &Path, document: &SnapshotDocument) -> RestoreResult {
    let start = Instant::now();
    let mut result = RestoreResult {
        project: utils::to_forward_slash(project_root),
        ..Default::default()
    };

    let mut keys: Vec<&String> = document.metadata.keys().collect();
    keys.sort();

    for key in keys {
        let stored = &document.metadata[key];
        match restore_entry(project_root, key, stored) {
            RestoreOutcome::OutsideProject => {
                warn!("'{}' points outside the project, skipped", key);
                result.warnings.push(format!("{}: outside the project root", key));
                result.files_failed += 1;
            }
            RestoreOutcome::Missing => {
                debug!("'{}' not found in project", key);
                result.files_missing += 1;
            }
            RestoreOutcome::ReadFailed(reason) => {
                warn!("'{}' could not be read: {}", key, reason);
                result.warnings.push(format!("{}: {}", key, reason));
                result.files_failed += 1;
            }
            RestoreOutcome::ContentChanged => {
                debug!("'{}' unchanged [md5 hash is different]", key);
                result.files_changed += 1;
            }
            RestoreOutcome::UpToDate => {
                debug!("'{}' unchanged [modification date is up-to-date]", key);
                result.files_up_to_date += 1;
            }
            RestoreOutcome::Restored => {
                info!("'{}' update modification date", key);
                result.files_restored += 1;
            }
            RestoreOutcome::WriteFailed(reason) => {
                warn!("'{}' modification date could not be set: {}", key, reason);
                result.warnings.push(format!("{}: {}", key, reason));
                result.files_failed += 1;
            }
        }
    }

    result.duration_ms = start.elapsed().as_millis() as u64;
    result
}
