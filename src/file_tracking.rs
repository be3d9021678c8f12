//! Tree walking for retime
//!
//! Enumerates the files of a project tree, depth first, returning paths
//! relative to the anchor directory in forward-slash form.
//!
//! ## Exclusion rules
//!
//! Two independent glob sets are applied to entry *names* (never to full
//! paths):
//!
//! - `folder` patterns prune directories: a matching directory is not
//!   descended into, so nothing below it appears in the result.
//! - `files` patterns drop individual files.
//!
//! Patterns use shell-glob syntax (`*`, `?`, `[abc]`, `[!abc]`).
//!
//! ## Failure policy
//!
//! An entry that cannot be visited (permission denied, broken link, symlink
//! loop) is recorded in [`WalkResult::errors`] and
//! skipped. The walk itself only fails when the anchor does not exist or a
//! pattern does not compile.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use retime::file_tracking::TreeWalker;
//! use retime::types::ExcludeRules;
//! use std::path::PathBuf;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let walk = TreeWalker::new(PathBuf::from("./my_project"))
//!     .with_exclude_rules(ExcludeRules {
//!         folder: vec![".git".to_string(), "target".to_string()],
//!         files: vec!["*.tmp".to_string()],
//!     })
//!     .walk()?;
//!
//! println!("{} files, {} errors", walk.files.len(), walk.errors.len());
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, RetimeError};
use crate::types::{ExcludeRules, WalkResult};
use crate::utils;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Recursive directory walker with name-based exclusions
///
/// ## Configuration Options
///
/// - `root_path`: anchor directory; all results are relative to it
/// - `exclude`: folder and file glob sets
/// - `follow_symlinks`: descend through symbolic links (loops become errors)
/// - `reserved_files`: root-level file names that are never reported
#[derive(Debug, Clone)]
pub struct TreeWalker {
    /// Anchor directory
    root_path: PathBuf,
    /// Exclusion patterns
    exclude: ExcludeRules,
    /// Whether to follow symbolic links during traversal
    follow_symlinks: bool,
    /// File names at the anchor root that are always skipped
    reserved_files: Vec<String>,
}

impl TreeWalker {
    /// Create a walker with no exclusions that does not follow links
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            exclude: ExcludeRules::default(),
            follow_symlinks: false,
            reserved_files: Vec::new(),
        }
    }

    /// Set exclusion rules
    pub fn with_exclude_rules(mut self, rules: ExcludeRules) -> Self {
        self.exclude = rules;
        self
    }

    /// Set symbolic link following behavior
    ///
    /// When disabled, links are neither files nor directories and are
    /// skipped. When enabled, link targets are classified instead, and a
    /// link that points back into its own ancestry is reported as an error.
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Skip these file names when they appear directly under the anchor
    pub fn with_reserved_files(mut self, names: Vec<String>) -> Self {
        self.reserved_files = names;
        self
    }

    /// Anchor directory of this walker
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Walk the tree
    ///
    /// # Errors
    ///
    /// - [`RetimeError::ProjectNotFound`] if the anchor is not a directory
    /// - [`RetimeError::InvalidPattern`] if an exclusion glob is malformed
    pub fn walk(&self) -> Result<WalkResult> {
        let start = Instant::now();

        if !self.root_path.is_dir() {
            return Err(RetimeError::ProjectNotFound(self.root_path.clone()));
        }

        let folder_set = build_glob_set(&self.exclude.folder)?;
        let file_set = build_glob_set(&self.exclude.files)?;
        let mut result = WalkResult::default();

        let walker = WalkDir::new(&self.root_path)
            .min_depth(1)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.file_type().is_dir() && folder_set.is_match(entry.file_name()) {
                    trace!("Pruning excluded directory {:?}", entry.path());
                    return false;
                }
                true
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let relative = err
                        .path()
                        .map(|p| self.key_for(p))
                        .unwrap_or_default();
                    match err.loop_ancestor() {
                        Some(ancestor) => warn!("Symlink loop at '{}' back to {:?}", relative, ancestor),
                        None => warn!("Walk error at '{}': {}", relative, err),
                    }
                    result.errors.push(relative);
                    continue;
                }
            };

            let file_type = entry.file_type();
            let relative = self.key_for(entry.path());

            if file_type.is_dir() {
                result.directories.push(relative);
            } else if file_type.is_file() {
                let name = entry.file_name().to_string_lossy();
                if entry.depth() == 1 && self.reserved_files.iter().any(|r| r.as_str() == name.as_ref()) {
                    continue;
                }
                if file_set.is_match(entry.file_name()) {
                    trace!("Skipping excluded file '{}'", relative);
                    continue;
                }
                result.files.push(relative);
            } else if entry.path_is_symlink() && fs::metadata(entry.path()).is_err() {
                warn!("Broken symlink at '{}'", relative);
                result.errors.push(relative);
            } else {
                trace!("Skipping non-regular entry '{}'", relative);
            }
        }

        debug!(
            "Walked {:?}: {} folders, {} files, {} errors in {:?}",
            self.root_path,
            result.directories.len(),
            result.files.len(),
            result.errors.len(),
            start.elapsed()
        );

        Ok(result)
    }

    /// Relative key of a path below the anchor
    fn key_for(&self, path: &Path) -> String {
        match utils::make_relative(path, &self.root_path) {
            Ok(relative) => utils::relative_key(&relative),
            Err(_) => utils::to_forward_slash(path),
        }
    }
}

/// Compile a list of shell-glob patterns into one matcher
pub fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| RetimeError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.kind().to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| RetimeError::InvalidPattern {
        pattern: patterns.join(", "),
        reason: e.to_string(),
    })
}
