//! Main Retime API implementation
//!
//! [`Retime`] ties the pipeline together for one project at a time and for a
//! whole project list:
//!
//! - **scan**: walk the tree, fingerprint every file in parallel, reconcile
//!   against the previous snapshot and save the result.
//! - **restore**: load the snapshot and re-apply recorded modification times
//!   to files whose content is unchanged.
//!
//! ## Example
//!
//! ```rust,no_run
//! use retime::{RetimeBuilder, types::ExcludeRules};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let retime = RetimeBuilder::new()
//!     .exclude_rules(ExcludeRules::recommended())
//!     .parallel_workers(4)
//!     .build()?;
//!
//! // After a checkout or copy that rewrote modification times:
//! let scan = retime.scan_project(Path::new("./my_project"))?;
//! println!("{} files recorded", scan.files_recorded);
//!
//! let restore = retime.restore_project(Path::new("./my_project"))?;
//! println!("{} timestamp(s) updated", restore.files_restored);
//! # Ok(())
//! # }
//! ```

use crate::config::Project;
use crate::error::{Result, RetimeError};
use crate::file_tracking::{build_glob_set, TreeWalker};
use crate::fingerprint::{fingerprint_all, Fingerprint};
use crate::reconcile::{change_stats, reconcile};
use crate::restore::restore_entries;
use crate::snapshot::{SnapshotStore, SNAPSHOT_FILE_NAME};
use crate::timestamp;
use crate::types::{
    ExcludeRules, FileMap, Mode, ProgressCallback, ProgressInfo, RestoreResult, ScanInfo,
    ScanResult, SnapshotDocument,
};
use crate::utils;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

type ProgressFn<'a> = &'a (dyn Fn(ProgressInfo) + Send + Sync);

/// Scans and restores projects with a fixed configuration
pub struct Retime {
    exclude: ExcludeRules,
    follow_symlinks: bool,
    parallel_workers: usize,
    reset: bool,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for Retime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retime")
            .field("exclude", &self.exclude)
            .field("follow_symlinks", &self.follow_symlinks)
            .field("parallel_workers", &self.parallel_workers)
            .field("reset", &self.reset)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// What happened to one project of a batch
#[derive(Debug)]
pub enum ProjectOutcome {
    /// Snapshot written
    Scanned(ScanResult),
    /// Snapshot applied
    Restored(RestoreResult),
    /// Project was skipped or aborted
    Failed(RetimeError),
}

/// Per-project entry of a [`BatchReport`]
#[derive(Debug)]
pub struct ProjectReport {
    /// Project as listed in the settings
    pub project: Project,
    /// Resolved project root
    pub root: PathBuf,
    /// Result for this project
    pub outcome: ProjectOutcome,
}

/// Result of [`Retime::run_batch`]
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per project, in input order
    pub projects: Vec<ProjectReport>,
}

impl BatchReport {
    /// Number of projects that failed
    pub fn failed_count(&self) -> usize {
        self.projects
            .iter()
            .filter(|p| matches!(p.outcome, ProjectOutcome::Failed(_)))
            .count()
    }

    /// Whether every project succeeded
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }
}

impl Retime {
    /// Scan a project and write its snapshot
    ///
    /// Unless the instance was built with `reset`, records of files whose
    /// content hash is unchanged are carried over from the previous snapshot.
    ///
    /// # Errors
    ///
    /// - [`RetimeError::ProjectNotFound`] if `root` is not a directory
    /// - [`RetimeError::SnapshotParse`] if the previous snapshot is malformed
    /// - [`RetimeError::SnapshotWrite`] if the new snapshot cannot be saved
    #[instrument(skip(self))]
    pub fn scan_project(&self, root: &Path) -> Result<ScanResult> {
        match self.progress.as_ref() {
            Some(callback) => self.scan_inner(root, Some(callback.as_ref())),
            None => self.scan_inner(root, None),
        }
    }

    /// Scan a project, reporting hashing progress to `progress_callback`
    #[instrument(skip(self, progress_callback))]
    pub fn scan_project_with_progress<F>(&self, root: &Path, progress_callback: F) -> Result<ScanResult>
    where
        F: Fn(ProgressInfo) + Send + Sync,
    {
        let callback: ProgressFn<'_> = &progress_callback;
        self.scan_inner(root, Some(callback))
    }

    fn scan_inner(&self, root: &Path, progress: Option<ProgressFn<'_>>) -> Result<ScanResult> {
        let start = Instant::now();
        let mut warnings = Vec::new();

        let walk = TreeWalker::new(root.to_path_buf())
            .with_exclude_rules(self.exclude.clone())
            .with_follow_symlinks(self.follow_symlinks)
            .with_reserved_files(vec![SNAPSHOT_FILE_NAME.to_string()])
            .walk()?;

        for entry in &walk.errors {
            warnings.push(format!("{}: not accessible", entry));
        }

        let hashed = fingerprint_all(root, &walk.files, self.parallel_workers, progress)?;

        let mut fresh = FileMap::with_capacity(hashed.len());
        let mut files_vanished = 0;
        let mut read_errors = 0;
        for (key, outcome) in hashed {
            match outcome {
                Fingerprint::Found(record) => {
                    fresh.insert(key, record);
                }
                Fingerprint::NotFound => {
                    debug!("'{}' disappeared during scan", key);
                    files_vanished += 1;
                }
                Fingerprint::ReadError(e) => {
                    warn!("'{}' could not be read: {}", key, e);
                    warnings.push(format!("{}: {}", key, e));
                    read_errors += 1;
                }
            }
        }

        let store = SnapshotStore::new(root);
        let old = if self.reset {
            FileMap::new()
        } else {
            store.load()?.map(|doc| doc.metadata).unwrap_or_default()
        };

        let stats = change_stats(&old, &fresh);
        let metadata = reconcile(&old, fresh);
        let files_recorded = metadata.len();

        let document = SnapshotDocument {
            scan: ScanInfo {
                date: timestamp::now_iso(),
                path: utils::to_forward_slash(root),
                files: walk.files.len(),
                ignore: self.exclude.clone(),
            },
            metadata,
        };
        store.save(&document)?;

        info!("'{}' {} files", root.display(), walk.files.len());

        Ok(ScanResult {
            project: utils::to_forward_slash(root),
            files_scanned: walk.files.len(),
            files_recorded,
            files_vanished,
            read_errors,
            walk_errors: walk.errors.len(),
            stats,
            reset: self.reset,
            duration_ms: start.elapsed().as_millis() as u64,
            warnings,
        })
    }

    /// Re-apply recorded modification times for a project
    ///
    /// # Errors
    ///
    /// - [`RetimeError::ProjectNotFound`] if `root` is not a directory
    /// - [`RetimeError::SnapshotNotFound`] if the project was never scanned
    /// - [`RetimeError::SnapshotParse`] if the snapshot is malformed
    #[instrument(skip(self))]
    pub fn restore_project(&self, root: &Path) -> Result<RestoreResult> {
        if !root.is_dir() {
            return Err(RetimeError::ProjectNotFound(root.to_path_buf()));
        }

        let document = SnapshotStore::new(root).load_required()?;
        let result = restore_entries(root, &document);

        info!(
            "'{}' {} timestamp(s) updated",
            root.display(),
            result.files_restored
        );
        Ok(result)
    }

    /// Run one mode over a list of projects below `anchor`
    ///
    /// A failing project is logged and recorded in the report; the remaining
    /// projects are still processed.
    #[instrument(skip(self, projects), fields(count = projects.len()))]
    pub fn run_batch(&self, mode: Mode, anchor: &Path, projects: &[Project]) -> BatchReport {
        let mut report = BatchReport::default();

        for project in projects {
            let root = project.root(anchor);

            let outcome = if !root.is_dir() {
                error!("repo '{}' not found", root.display());
                ProjectOutcome::Failed(RetimeError::ProjectNotFound(root.clone()))
            } else {
                let result = match mode {
                    Mode::Scan => self.scan_project(&root).map(ProjectOutcome::Scanned),
                    Mode::Restore => self.restore_project(&root).map(ProjectOutcome::Restored),
                };
                result.unwrap_or_else(|e| {
                    error!("'{}' {} failed: {}", root.display(), mode, e);
                    ProjectOutcome::Failed(e)
                })
            };

            report.projects.push(ProjectReport {
                project: project.clone(),
                root,
                outcome,
            });
        }

        debug!(
            "{} run finished: {} project(s), {} failed",
            mode,
            report.projects.len(),
            report.failed_count()
        );
        report
    }
}

/// Builder for configuring [`Retime`]
pub struct RetimeBuilder {
    exclude: ExcludeRules,
    follow_symlinks: bool,
    parallel_workers: usize,
    reset: bool,
    progress: Option<ProgressCallback>,
}

impl RetimeBuilder {
    /// Create a new builder with default settings
    ///
    /// Defaults: no exclusions, links not followed, one worker per CPU,
    /// reconciliation enabled.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use retime::RetimeBuilder;
    ///
    /// let retime = RetimeBuilder::new().build().unwrap();
    /// ```
    pub fn new() -> Self {
        Self {
            exclude: ExcludeRules::default(),
            follow_symlinks: false,
            parallel_workers: num_cpus::get(),
            reset: false,
            progress: None,
        }
    }

    /// Set exclusion rules
    ///
    /// Folder patterns prune whole directories, file patterns drop single
    /// files. Both match entry names only.
    pub fn exclude_rules(mut self, rules: ExcludeRules) -> Self {
        self.exclude = rules;
        self
    }

    /// Set whether to follow symbolic links
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set number of hashing threads (minimum 1)
    pub fn parallel_workers(mut self, count: usize) -> Self {
        self.parallel_workers = count.max(1);
        self
    }

    /// Ignore the previous snapshot when scanning
    ///
    /// Every record is then taken from the fresh scan, which discards the
    /// preserved times of unchanged files.
    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Receive hashing progress during scans
    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Build the instance
    ///
    /// # Errors
    ///
    /// [`RetimeError::InvalidPattern`] if an exclusion glob does not compile,
    /// so a broken configuration is rejected before any project runs.
    pub fn build(self) -> Result<Retime> {
        build_glob_set(&self.exclude.folder)?;
        build_glob_set(&self.exclude.files)?;

        Ok(Retime {
            exclude: self.exclude,
            follow_symlinks: self.follow_symlinks,
            parallel_workers: self.parallel_workers,
            reset: self.reset,
            progress: self.progress,
        })
    }
}

impl Default for RetimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
