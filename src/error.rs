//! Error types for the retime library
//!
//! Only structural faults travel through this type: a snapshot that cannot be
//! parsed or written, a project that does not exist, a broken settings file.
//! Per-file conditions (vanished files, unreadable files, changed content) are
//! modelled as result variants in [`crate::fingerprint`] and [`crate::restore`]
//! and never surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the retime library
pub type Result<T> = std::result::Result<T, RetimeError>;

/// Main error type for all retime operations
#[derive(Debug, Error)]
pub enum RetimeError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot file exists but does not hold a valid document
    #[error("Malformed snapshot {path:?}: {source}")]
    SnapshotParse {
        /// Path to the snapshot file
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot could not be written or committed
    #[error("Failed to write snapshot {path:?}: {source}")]
    SnapshotWrite {
        /// Path to the snapshot file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No snapshot exists for the project
    #[error("No snapshot found at {0:?}")]
    SnapshotNotFound(PathBuf),

    /// Project root does not exist
    #[error("Project not found: {0:?}")]
    ProjectNotFound(PathBuf),

    /// Glob pattern in the exclusion rules could not be compiled
    #[error("Invalid ignore pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Offending pattern
        pattern: String,
        /// Reason reported by the glob compiler
        reason: String,
    },

    /// Settings file missing or invalid
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Thread pool error
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RetimeError {
    /// Create a configuration error with a custom message
    pub fn config(msg: impl Into<String>) -> Self {
        RetimeError::Config(msg.into())
    }

    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        RetimeError::Internal(msg.into())
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            RetimeError::SnapshotNotFound(path) => {
                format!("No snapshot at {:?}. Run a scan (--read) first.", path)
            }
            RetimeError::SnapshotParse { path, .. } => {
                format!(
                    "Snapshot {:?} is corrupted. Delete it and rescan, or restore it from a backup.",
                    path
                )
            }
            RetimeError::ProjectNotFound(path) => {
                format!("Project {:?} not found. Check 'repos' in the settings file.", path)
            }
            RetimeError::InvalidPattern { pattern, .. } => {
                format!("Ignore pattern '{}' is not a valid glob. Check 'ignore_list'.", pattern)
            }
            _ => self.to_string(),
        }
    }
}
