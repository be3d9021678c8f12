//! Settings file
//!
//! A YAML document listing the projects to process and, optionally, the
//! exclusion rules applied while scanning:
//!
//! ```yaml
//! repos:
//!   - name: retime
//!     path: Rust
//!   - name: notes
//!     path: Documents/private
//!
//! ignore_list:
//!   folder: [".git", "target"]
//!   files: ["*.tmp"]
//! ```
//!
//! When `ignore_list` is missing, an `ignore.yaml` next to the settings file
//! provides it; failing that, [`ExcludeRules::recommended`] is used.
//!
//! A project's root is `<anchor>/<path>/<name>`.

use crate::error::{Result, RetimeError};
use crate::types::ExcludeRules;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default settings location, relative to the working directory
pub const DEFAULT_SETTINGS_PATH: &str = "settings/repos.yaml";

/// Companion file holding only exclusion rules
pub const IGNORE_FILE_NAME: &str = "ignore.yaml";

/// One project entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    /// Directory name of the project
    pub name: String,
    /// Parent directory, relative to the anchor
    #[serde(default)]
    pub path: String,
}

impl Project {
    /// Absolute root of the project below `anchor`
    pub fn root(&self, anchor: &Path) -> PathBuf {
        anchor.join(&self.path).join(&self.name)
    }
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    repos: Vec<Project>,
    ignore_list: Option<ExcludeRules>,
}

#[derive(Debug, Deserialize)]
struct IgnoreFile {
    ignore_list: ExcludeRules,
}

/// Parsed settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Projects to process, in file order
    pub repos: Vec<Project>,
    /// Exclusion rules for scans
    pub ignore_list: ExcludeRules,
}

impl Settings {
    /// Load settings from a YAML file
    ///
    /// # Errors
    ///
    /// [`RetimeError::Config`] when the file is missing or not valid YAML of
    /// the expected shape.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => RetimeError::config(format!("setting {:?} not exist", path)),
            _ => RetimeError::config(format!("cannot read {:?}: {}", path, e)),
        })?;

        let file: SettingsFile = serde_yaml_ng::from_str(&text)
            .map_err(|e| RetimeError::config(format!("{:?}: {}", path, e)))?;

        let ignore_list = match file.ignore_list {
            Some(rules) => rules,
            None => Self::load_companion_ignore(path)?,
        };

        debug!(
            "Loaded {} project(s) from {:?}",
            file.repos.len(),
            path
        );
        Ok(Self {
            repos: file.repos,
            ignore_list,
        })
    }

    /// Parse settings from YAML text, with no companion lookup
    pub fn from_yaml(text: &str) -> Result<Self> {
        let file: SettingsFile =
            serde_yaml_ng::from_str(text).map_err(|e| RetimeError::config(e.to_string()))?;
        Ok(Self {
            repos: file.repos,
            ignore_list: file.ignore_list.unwrap_or_else(ExcludeRules::recommended),
        })
    }

    fn load_companion_ignore(settings_path: &Path) -> Result<ExcludeRules> {
        let companion = settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(IGNORE_FILE_NAME);

        if companion == settings_path || !companion.is_file() {
            return Ok(ExcludeRules::recommended());
        }

        let text = fs::read_to_string(&companion)
            .map_err(|e| RetimeError::config(format!("cannot read {:?}: {}", companion, e)))?;
        let file: IgnoreFile = serde_yaml_ng::from_str(&text)
            .map_err(|e| RetimeError::config(format!("{:?}: {}", companion, e)))?;

        debug!("Exclusion rules taken from {:?}", companion);
        Ok(file.ignore_list)
    }
}
