//! # Retime - Modification-time preservation for project trees
//!
//! Version control checkouts, copies and sync tools rewrite file modification
//! times even when the content did not change. Retime records, per project,
//! the content hash and times of every file, and later puts the recorded
//! modification time back on each file whose content is still the same.
//!
//! ## Overview
//!
//! - **Scan** walks a project, fingerprints every file and merges the result
//!   into the project's snapshot (`.timestamps.json` at the project root).
//!   Files with unchanged content keep the record captured when they were
//!   first seen.
//! - **Restore** reads the snapshot and rewrites the modification time of
//!   every file whose MD5 still matches. Access times are left alone.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use retime::{Mode, RetimeBuilder, config::Settings};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load(Path::new("settings/repos.yaml"))?;
//! let retime = RetimeBuilder::new()
//!     .exclude_rules(settings.ignore_list.clone())
//!     .build()?;
//!
//! let report = retime.run_batch(Mode::Scan, Path::new("/mnt/data"), &settings.repos);
//! println!("{} project(s) failed", report.failed_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## Snapshot Format
//!
//! ```text
//! {
//!   "scan": { "date": ..., "path": ..., "files": N, "ignore": {...} },
//!   "metadata": {
//!     "src/main.rs": {
//!       "md5": "...", "path": "src", "name": "main.rs", "size": 12, "attr": "",
//!       "modified": "2024-01-01 10:00:00.000000+0100", "created": ..., "access": ...
//!     }
//!   }
//! }
//! ```
//!
//! Timestamps carry microseconds and an explicit UTC offset, so they parse
//! back to the exact instant that was recorded.
//!
//! ## Error Handling
//!
//! Per-file conditions (vanished, unreadable or changed files) never abort an
//! operation; they are counted in [`ScanResult`] and [`RestoreResult`].
//! Structural faults such as a malformed snapshot fail one project with a
//! [`RetimeError`], and a batch continues with the next project.
//!
//! ## Module Organization
//!
//! - [`file_tracking`]: tree walk with name-glob exclusions
//! - [`fingerprint`]: MD5 plus attributes and times for one file
//! - [`snapshot`]: loading and atomically saving `.timestamps.json`
//! - [`reconcile`]: merging a fresh scan into the previous snapshot
//! - [`restore`]: re-applying recorded modification times
//! - [`retime`]: the [`Retime`] runner and its builder
//! - [`config`]: YAML settings with the project list
//! - [`timestamp`], [`attributes`]: value formats stored in records
//! - [`types`], [`error`]: shared data types and errors

// Public API modules
pub mod attributes;
pub mod config;
pub mod error;
pub mod file_tracking;
pub mod fingerprint;
pub mod reconcile;
pub mod restore;
pub mod retime;
pub mod snapshot;
pub mod timestamp;
pub mod types;

// Internal modules (not part of public API)
mod utils;

// Re-export main types for convenience
pub use config::{Project, Settings};
pub use error::{Result, RetimeError};
pub use retime::{BatchReport, ProjectOutcome, ProjectReport, Retime, RetimeBuilder};
pub use snapshot::{SnapshotStore, SNAPSHOT_FILE_NAME};
pub use types::*;
