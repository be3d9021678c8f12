//! Snapshot persistence
//!
//! Each project keeps exactly one snapshot file, `.timestamps.json`, at its
//! root. The document is pretty-printed JSON with the metadata keys sorted.
//!
//! Saves go through a temp file in the project root followed by a rename, so
//! a crash mid-write leaves the previous snapshot intact.
//!
//! ```text
//! project_root/
//! ├── .timestamps.json
//! └── ...
//! ```

use crate::error::{Result, RetimeError};
use crate::types::SnapshotDocument;
use crate::utils;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// File name of the snapshot inside a project root
pub const SNAPSHOT_FILE_NAME: &str = ".timestamps.json";

/// Reads and writes the snapshot of one project
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Store for the project rooted at `project_root`
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            path: project_root.as_ref().join(SNAPSHOT_FILE_NAME),
        }
    }

    /// Location of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a snapshot file is present
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the snapshot
    ///
    /// Returns `Ok(None)` when no snapshot exists yet. A file that is present
    /// but does not parse is an error, never an empty snapshot.
    pub fn load(&self) -> Result<Option<SnapshotDocument>> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No snapshot at {:?}", self.path);
                return Ok(None);
            }
            Err(e) => return Err(RetimeError::Io(e)),
        };

        let document: SnapshotDocument =
            serde_json::from_slice(&content).map_err(|source| RetimeError::SnapshotParse {
                path: self.path.clone(),
                source,
            })?;

        debug!(
            "Loaded snapshot {:?} with {} entries",
            self.path,
            document.metadata.len()
        );
        Ok(Some(document))
    }

    /// Load the snapshot, treating absence as an error
    pub fn load_required(&self) -> Result<SnapshotDocument> {
        self.load()?
            .ok_or_else(|| RetimeError::SnapshotNotFound(self.path.clone()))
    }

    /// Replace the snapshot atomically
    pub fn save(&self, document: &SnapshotDocument) -> Result<()> {
        let mut json = serde_json::to_vec_pretty(document)?;
        json.push(b'\n');

        utils::atomic_write(&self.path, &json).map_err(|source| RetimeError::SnapshotWrite {
            path: self.path.clone(),
            source,
        })?;

        trace!("Saved {} entries to {:?}", document.metadata.len(), self.path);
        Ok(())
    }
}
