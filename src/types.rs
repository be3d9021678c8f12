//! Core data types used throughout the retime library
//!
//! ## Overview
//!
//! The types in this module represent:
//! - **Snapshot state**: [`FileRecord`], [`FileMap`], [`ScanInfo`], [`SnapshotDocument`]
//! - **Walk configuration and output**: [`ExcludeRules`], [`WalkResult`]
//! - **Operation results**: [`ChangeStats`], [`ScanResult`], [`RestoreResult`]
//! - **Progress reporting**: [`ProgressInfo`], [`ProgressCallback`]
//!
//! ## Examples
//!
//! ```rust
//! use retime::types::ExcludeRules;
//!
//! let rules = ExcludeRules {
//!     folder: vec![".git".to_string(), "node_modules".to_string()],
//!     files: vec!["*.tmp".to_string()],
//! };
//! assert!(!rules.is_empty());
//! ```

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Metadata captured for one tracked file
///
/// Records are keyed by their path relative to the project root (forward
/// slashes, no leading separator). Only `md5` takes part in change detection;
/// everything else is what gets preserved for unchanged content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    /// MD5 of the file content, 32 lowercase hex characters
    pub md5: String,
    /// Directory part of the key ("" for files at the project root)
    pub path: String,
    /// File base name
    pub name: String,
    /// Size in bytes at scan time
    pub size: u64,
    /// Opaque attribute code (see [`crate::attributes`])
    pub attr: String,
    /// Last modification time
    #[serde(with = "crate::timestamp::serde_format")]
    pub modified: DateTime<FixedOffset>,
    /// Creation time (inode change time where creation is unavailable)
    #[serde(with = "crate::timestamp::serde_format")]
    pub created: DateTime<FixedOffset>,
    /// Last access time
    #[serde(rename = "access", with = "crate::timestamp::serde_format")]
    pub accessed: DateTime<FixedOffset>,
}

/// Mapping from relative path key to file record
pub type FileMap = HashMap<String, FileRecord>;

/// Glob-based exclusion rules, matched against entry names only
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExcludeRules {
    /// Directory name patterns; a matching directory is pruned entirely
    pub folder: Vec<String>,
    /// File name patterns
    pub files: Vec<String>,
}

impl ExcludeRules {
    /// Exclusion set used when the settings do not provide one
    pub fn recommended() -> Self {
        Self {
            folder: vec![
                ".git".to_string(),
                ".venv".to_string(),
                "__pycache__".to_string(),
                "__MACOSX".to_string(),
            ],
            files: vec!["desktop.ini".to_string(), "folderico*.ico".to_string()],
        }
    }
}

/// Descriptive summary stored alongside the metadata
///
/// Not consulted when merging; it documents how the snapshot was taken.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanInfo {
    /// Local ISO-8601 time of the scan
    pub date: String,
    /// Absolute project path, forward-slash form
    pub path: String,
    /// Number of files enumerated by the walk
    pub files: usize,
    /// Exclusion rules active during the scan
    pub ignore: ExcludeRules,
}

/// The persisted unit of state for one project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotDocument {
    /// Scan summary
    pub scan: ScanInfo,
    /// Per-file metadata keyed by relative path
    #[serde(serialize_with = "serialize_sorted")]
    pub metadata: FileMap,
}

/// Write the metadata map with sorted keys so snapshot files diff cleanly
fn serialize_sorted<S>(map: &FileMap, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let sorted: BTreeMap<&String, &FileRecord> = map.iter().collect();
    sorted.serialize(serializer)
}

/// Output of a tree walk
///
/// All paths are relative to the anchor, forward-slash separated, without a
/// leading slash. Errors name the entry that could not be visited ("" is the
/// anchor itself).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkResult {
    /// Regular files, in depth-first order
    pub files: Vec<String>,
    /// Directories that were descended into
    pub directories: Vec<String>,
    /// Entries skipped because they could not be read
    pub errors: Vec<String>,
}

/// Statistics about what a scan changed relative to the previous snapshot
///
/// # Examples
///
/// ```rust
/// # use retime::types::ChangeStats;
/// let stats = ChangeStats {
///     files_added: 2,
///     files_modified: 1,
///     files_unchanged: 10,
///     files_deleted: 3,
/// };
///
/// assert!(stats.has_changes());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStats {
    /// Keys present only in the fresh scan
    pub files_added: usize,
    /// Keys present in both with a different hash
    pub files_modified: usize,
    /// Keys present in both with the same hash (old record kept)
    pub files_unchanged: usize,
    /// Keys present only in the old snapshot (dropped)
    pub files_deleted: usize,
}

impl ChangeStats {
    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.files_added > 0 || self.files_modified > 0 || self.files_deleted > 0
    }
}

/// Result of scanning one project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Project root that was scanned
    pub project: String,
    /// Files enumerated by the walk
    pub files_scanned: usize,
    /// Records written to the snapshot
    pub files_recorded: usize,
    /// Files that vanished between walk and hashing
    pub files_vanished: usize,
    /// Files that could not be read
    pub read_errors: usize,
    /// Entries the walk could not visit
    pub walk_errors: usize,
    /// Changes relative to the previous snapshot
    pub stats: ChangeStats,
    /// Whether the previous snapshot was ignored
    pub reset: bool,
    /// Time taken in milliseconds
    pub duration_ms: u64,
    /// Human-readable notes about skipped entries
    pub warnings: Vec<String>,
}

/// Result of restoring timestamps for one project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestoreResult {
    /// Project root that was restored
    pub project: String,
    /// Files whose modification time was rewritten
    pub files_restored: usize,
    /// Files whose modification time already matched
    pub files_up_to_date: usize,
    /// Files whose content differs from the snapshot
    pub files_changed: usize,
    /// Files listed in the snapshot but absent on disk
    pub files_missing: usize,
    /// Files that could not be read or updated
    pub files_failed: usize,
    /// Time taken in milliseconds
    pub duration_ms: u64,
    /// Human-readable notes about failed entries
    pub warnings: Vec<String>,
}

impl RestoreResult {
    /// Number of snapshot entries that were examined
    pub fn total_entries(&self) -> usize {
        self.files_restored
            + self.files_up_to_date
            + self.files_changed
            + self.files_missing
            + self.files_failed
    }
}

/// Progress callback for long-running operations
pub type ProgressCallback = Arc<dyn Fn(ProgressInfo) + Send + Sync>;

/// Information passed to progress callbacks
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Operation being performed
    pub operation: String,
    /// Current item being processed
    pub current_item: Option<String>,
    /// Items processed so far
    pub processed: usize,
    /// Total items to process (if known)
    pub total: Option<usize>,
}

/// Which pipeline a batch run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Walk, fingerprint, reconcile and save the snapshot
    Scan,
    /// Load the snapshot and re-apply stored modification times
    Restore,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Scan => write!(f, "scan"),
            Mode::Restore => write!(f, "restore"),
        }
    }
}
