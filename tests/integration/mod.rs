//! Integration tests for Retime
//!
//! Exercises whole projects end to end: settings loading, batch scans over
//! several projects, checkout-style rewrites and restores.

use ::retime::*;
use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::info;

pub const JAN_2024: i64 = 1_704_067_200;
pub const JUN_2024: i64 = 1_717_200_000;

/// An anchor directory holding several projects and a settings file
pub struct WorkspaceHarness {
    pub anchor: TempDir,
    pub settings_path: PathBuf,
}

impl WorkspaceHarness {
    /// Create projects `work/<name>` and a settings file listing them
    pub fn new(names: &[&str]) -> Self {
        let anchor = TempDir::new().unwrap();
        let mut yaml = String::from("repos:\n");
        for name in names {
            fs::create_dir_all(anchor.path().join("work").join(name)).unwrap();
            yaml.push_str(&format!("  - name: {}\n    path: work\n", name));
        }
        yaml.push_str(
            "ignore_list:\n  folder: ['.git', '__pycache__', 'node_modules']\n  files: ['*.tmp', 'desktop.ini']\n",
        );

        let settings_path = anchor.path().join("repos.yaml");
        fs::write(&settings_path, yaml).unwrap();

        Self { anchor, settings_path }
    }

    pub fn project_root(&self, name: &str) -> PathBuf {
        self.anchor.path().join("work").join(name)
    }

    /// Write a file and pin its modification time
    pub fn write(&self, project: &str, rel: &str, content: &str, mtime: i64) -> PathBuf {
        let path = self.project_root(project).join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(mtime, 0)).unwrap();
        path
    }

    pub fn settings(&self) -> Settings {
        Settings::load(&self.settings_path).unwrap()
    }

    pub fn retime(&self) -> Retime {
        RetimeBuilder::new()
            .exclude_rules(self.settings().ignore_list)
            .parallel_workers(2)
            .build()
            .unwrap()
    }

    pub fn run(&self, mode: Mode) -> BatchReport {
        let settings = self.settings();
        self.retime().run_batch(mode, self.anchor.path(), &settings.repos)
    }
}

pub fn mtime_secs(path: &Path) -> i64 {
    FileTime::from_last_modification_time(&fs::metadata(path).unwrap()).unix_seconds()
}

/// Simulate a checkout: rewrite every listed file with `content` and a new time
pub fn checkout(paths: &[(&Path, &str)], mtime: i64) {
    for (path, content) in paths {
        fs::write(path, content).unwrap();
        set_file_mtime(path, FileTime::from_unix_time(mtime, 0)).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_checkout_round_trip_across_projects() {
        let ws = WorkspaceHarness::new(&["alpha", "beta"]);
        let a_main = ws.write("alpha", "src/main.rs", "fn main() {}", JAN_2024);
        let a_readme = ws.write("alpha", "README.md", "# alpha", JAN_2024 + 3600);
        let b_lib = ws.write("beta", "lib/util.py", "print(1)", JAN_2024 + 7200);

        let report = ws.run(Mode::Scan);
        assert!(report.is_success());
        assert!(logs_contain("2 files"));

        checkout(
            &[
                (&a_main, "fn main() {}"),
                (&a_readme, "# alpha, edited"),
                (&b_lib, "print(1)"),
            ],
            JUN_2024,
        );

        let report = ws.run(Mode::Restore);
        assert!(report.is_success());
        info!("restore report: {:?}", report);

        assert_eq!(mtime_secs(&a_main), JAN_2024);
        assert_eq!(mtime_secs(&a_readme), JUN_2024);
        assert_eq!(mtime_secs(&b_lib), JAN_2024 + 7200);
        assert!(logs_contain("timestamp(s) updated"));
    }

    #[test]
    fn test_excluded_entries_never_recorded() {
        let ws = WorkspaceHarness::new(&["proj"]);
        ws.write("proj", "keep.txt", "k", JAN_2024);
        ws.write("proj", ".git/HEAD", "ref", JAN_2024);
        ws.write("proj", "deep/nested/.git/config", "x", JAN_2024);
        ws.write("proj", "pkg/__pycache__/m.pyc", "x", JAN_2024);
        ws.write("proj", "pkg/scratch.tmp", "x", JAN_2024);
        ws.write("proj", "pkg/desktop.ini", "x", JAN_2024);
        ws.write("proj", "pkg/mod.py", "x", JAN_2024);

        assert!(ws.run(Mode::Scan).is_success());

        let doc = SnapshotStore::new(ws.project_root("proj")).load().unwrap().unwrap();
        let mut keys: Vec<_> = doc.metadata.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["keep.txt", "pkg/mod.py"]);
        assert_eq!(doc.metadata["pkg/mod.py"].path, "pkg");
        assert_eq!(doc.metadata["pkg/mod.py"].name, "mod.py");
    }

    #[test]
    fn test_rescan_preserves_original_record_for_unchanged_content() {
        let ws = WorkspaceHarness::new(&["proj"]);
        let stable = ws.write("proj", "stable.txt", "same", JAN_2024);
        let edited = ws.write("proj", "edited.txt", "v1", JAN_2024);
        let removed = ws.write("proj", "removed.txt", "bye", JAN_2024);
        ws.run(Mode::Scan);

        checkout(&[(&stable, "same"), (&edited, "v2")], JUN_2024);
        fs::remove_file(&removed).unwrap();
        ws.write("proj", "added.txt", "new", JUN_2024);

        let report = ws.run(Mode::Scan);
        match &report.projects[0].outcome {
            ProjectOutcome::Scanned(result) => {
                assert_eq!(result.stats.files_unchanged, 1);
                assert_eq!(result.stats.files_modified, 1);
                assert_eq!(result.stats.files_added, 1);
                assert_eq!(result.stats.files_deleted, 1);
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let doc = SnapshotStore::new(ws.project_root("proj")).load().unwrap().unwrap();
        assert_eq!(doc.metadata["stable.txt"].modified.timestamp(), JAN_2024);
        assert_eq!(doc.metadata["edited.txt"].modified.timestamp(), JUN_2024);
        assert!(!doc.metadata.contains_key("removed.txt"));
        assert_eq!(doc.scan.files, 3);
    }

    #[test]
    fn test_restore_reports_missing_project_and_continues() {
        let ws = WorkspaceHarness::new(&["present"]);
        ws.write("present", "a.txt", "a", JAN_2024);
        ws.run(Mode::Scan);

        let mut settings = ws.settings();
        settings.repos.insert(
            0,
            Project {
                name: "ghost".to_string(),
                path: "work".to_string(),
            },
        );
        let report = ws.retime().run_batch(Mode::Restore, ws.anchor.path(), &settings.repos);

        assert_eq!(report.failed_count(), 1);
        assert!(matches!(
            report.projects[0].outcome,
            ProjectOutcome::Failed(RetimeError::ProjectNotFound(_))
        ));
        assert!(matches!(report.projects[1].outcome, ProjectOutcome::Restored(_)));
    }

    #[test]
    fn test_restore_never_rescans_snapshot() {
        let ws = WorkspaceHarness::new(&["proj"]);
        ws.write("proj", "a.txt", "a", JAN_2024);
        ws.run(Mode::Scan);

        let snapshot = ws.project_root("proj").join(SNAPSHOT_FILE_NAME);
        let before = fs::read_to_string(&snapshot).unwrap();
        ws.run(Mode::Restore);
        assert_eq!(fs::read_to_string(&snapshot).unwrap(), before);
    }

    #[test]
    fn test_snapshot_records_scan_info() {
        let ws = WorkspaceHarness::new(&["proj"]);
        ws.write("proj", "a.txt", "abc", JAN_2024);
        ws.run(Mode::Scan);

        let text = fs::read_to_string(ws.project_root("proj").join(SNAPSHOT_FILE_NAME)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(json["scan"]["files"], 1);
        assert!(json["scan"]["path"].as_str().unwrap().ends_with("work/proj"));
        assert_eq!(json["scan"]["ignore"]["files"][0], "*.tmp");
        let entry = &json["metadata"]["a.txt"];
        assert_eq!(entry["md5"], "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(entry["path"], "");
        assert_eq!(entry["size"], 3);
        assert!(entry["access"].is_string());
    }
}
