//! Property-based testing for Retime
//!
//! Uses proptest to check the timestamp format, the reconciliation merge and
//! the scan/restore pipeline over randomly generated inputs.

use ::retime::reconcile::{change_stats, reconcile};
use ::retime::timestamp::{format_time, parse_time};
use ::retime::*;
use chrono::{DateTime, FixedOffset};
use filetime::{set_file_mtime, FileTime};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Instants between 1970 and 2100 with microsecond resolution
fn instant_strategy() -> impl Strategy<Value = DateTime<FixedOffset>> {
    (0i64..4_102_444_800_000_000, -720i32..=840).prop_map(|(micros, offset_minutes)| {
        let offset = FixedOffset::east_opt(offset_minutes * 60).unwrap();
        DateTime::from_timestamp_micros(micros)
            .unwrap()
            .with_timezone(&offset)
    })
}

fn record_strategy() -> impl Strategy<Value = FileRecord> {
    (
        "[0-9a-f]{32}",
        "[a-z]{1,8}(/[a-z]{1,8}){0,2}",
        "[a-z]{1,8}\\.(txt|rs|md)",
        any::<u32>(),
        instant_strategy(),
        instant_strategy(),
        instant_strategy(),
    )
        .prop_map(|(md5, path, name, size, modified, created, accessed)| FileRecord {
            md5,
            path,
            name,
            size: size as u64,
            attr: String::new(),
            modified,
            created,
            accessed,
        })
}

fn file_map_strategy() -> impl Strategy<Value = FileMap> {
    prop::collection::hash_map("[a-z]{1,6}(/[a-z]{1,6}){0,2}", record_strategy(), 0..40)
}

/// Generate random relative file paths
fn path_strategy() -> impl Strategy<Value = PathBuf> {
    let dir_strategy = prop::collection::vec("[a-z]{1,6}", 0..=3);
    let filename_strategy = "file[0-9]{1,3}\\.(txt|rs|md)";

    (dir_strategy, filename_strategy).prop_map(|(dirs, filename)| {
        let mut path = PathBuf::new();
        for dir in dirs {
            path = path.join(dir);
        }
        path.join(filename)
    })
}

/// Write a tree of files, skipping paths that collide with an existing entry
fn write_tree(root: &Path, files: &[(PathBuf, Vec<u8>)]) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut written = BTreeMap::new();
    for (path, content) in files {
        let full = root.join(path);
        let blocked = path
            .ancestors()
            .skip(1)
            .any(|a| !a.as_os_str().is_empty() && root.join(a).is_file());
        if blocked || full.is_dir() {
            continue;
        }
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full, content).unwrap();
        written.insert(path.clone(), content.clone());
    }
    written
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Formatting and parsing a timestamp yields the same instant
    #[test]
    fn timestamp_round_trip(time in instant_strategy()) {
        let text = format_time(&time);
        let parsed = parse_time(&text).unwrap();

        prop_assert_eq!(parsed.timestamp_micros(), time.timestamp_micros());
        prop_assert_eq!(parsed.offset(), time.offset());
        prop_assert_eq!(format_time(&parsed), text);
    }

    /// Reconciling a mapping with itself changes nothing
    #[test]
    fn reconcile_is_idempotent(map in file_map_strategy()) {
        prop_assert_eq!(reconcile(&map, map.clone()), map.clone());
        prop_assert!(!change_stats(&map, &map).has_changes());
    }

    /// The scanned set decides the keys; matching hashes keep old records
    #[test]
    fn reconcile_keys_follow_new_scan(old in file_map_strategy(), new in file_map_strategy()) {
        let merged = reconcile(&old, new.clone());

        prop_assert_eq!(merged.len(), new.len());
        for (key, record) in &merged {
            let fresh = &new[key];
            prop_assert_eq!(&record.md5, &fresh.md5);
            match old.get(key) {
                Some(previous) if previous.md5 == fresh.md5 => {
                    prop_assert_eq!(record, previous);
                }
                _ => {
                    prop_assert_eq!(record, fresh);
                }
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// A file tree scanned once survives a time-scrambling copy
    #[test]
    fn scan_then_restore_recovers_times(
        files in prop::collection::vec(
            (path_strategy(), prop::collection::vec(any::<u8>(), 0..2048)),
            1..20
        ),
        base in 1_000_000_000i64..1_600_000_000,
    ) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let written = write_tree(root, &files);

        for (i, path) in written.keys().enumerate() {
            set_file_mtime(root.join(path), FileTime::from_unix_time(base + i as i64 * 60, 0)).unwrap();
        }

        let retime = RetimeBuilder::new().parallel_workers(2).build().unwrap();
        let scan = retime.scan_project(root).unwrap();
        prop_assert_eq!(scan.files_recorded, written.len());

        for path in written.keys() {
            set_file_mtime(root.join(path), FileTime::from_unix_time(1_700_000_000, 0)).unwrap();
        }

        let restore = retime.restore_project(root).unwrap();
        prop_assert_eq!(restore.files_restored, written.len());

        for (i, path) in written.keys().enumerate() {
            let mtime = FileTime::from_last_modification_time(&fs::metadata(root.join(path)).unwrap());
            prop_assert_eq!(mtime.unix_seconds(), base + i as i64 * 60);
        }
    }
}
