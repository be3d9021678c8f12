//! Merging a fresh scan with the previous snapshot
//!
//! The freshly scanned set decides which keys exist. For each of them the old
//! record survives verbatim when its content hash is unchanged, so the
//! originally recorded times are carried forward across scans.

use crate::types::{ChangeStats, FileMap};
use tracing::debug;

/// Merge `new` against `old`
///
/// Keys present only in `old` are dropped. An empty `old` yields `new`.
pub fn reconcile(old: &FileMap, new: FileMap) -> FileMap {
    if old.is_empty() {
        return new;
    }

    new.into_iter()
        .map(|(key, fresh)| match old.get(&key) {
            Some(previous) if previous.md5 == fresh.md5 => (key, previous.clone()),
            _ => (key, fresh),
        })
        .collect()
}

/// Count how `new` differs from `old`, by key and content hash
pub fn change_stats(old: &FileMap, new: &FileMap) -> ChangeStats {
    let mut stats = ChangeStats::default();

    for (key, current) in new {
        match old.get(key) {
            Some(previous) if previous.md5 == current.md5 => stats.files_unchanged += 1,
            Some(_) => stats.files_modified += 1,
            None => stats.files_added += 1,
        }
    }

    stats.files_deleted = old.keys().filter(|key| !new.contains_key(*key)).count();

    debug!(
        "{} added, {} modified, {} unchanged, {} dropped",
        stats.files_added, stats.files_modified, stats.files_unchanged, stats.files_deleted
    );
    stats
}
