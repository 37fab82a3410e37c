// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cleanup and garbage collection: expiring cache entries, pruning
//! downloads/logs by age, and removing stale scratch directories. Every
//! deletion acquires that entry's build lock first; per-entry errors are
//! logged and skipped rather than aborting the whole sweep.

use crate::blob::MachineBlob;
use fingertip_lock::Lockset;
use fingertip_paths::Paths;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of one cleanup sweep.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, String)>,
}

impl CleanupReport {
    fn merge(&mut self, other: CleanupReport) {
        self.removed.extend(other.removed);
        self.skipped.extend(other.skipped);
    }
}

/// Expire cache entries under `paths.machines()`. `max_age` of `None` means
/// "all" (spec's `cleanup machines all`); `Some(age)` removes entries whose
/// recorded expiration deadline is more than `age` in the past relative to
/// `now_ms`.
pub fn expire_machines(
    paths: &Paths,
    lockset: &Lockset,
    max_age: Option<Duration>,
    now_ms: u64,
) -> CleanupReport {
    let mut report = CleanupReport::default();
    let machines_dir = paths.machines();

    let Ok(entries) = std::fs::read_dir(&machines_dir) else {
        return report;
    };

    for entry in entries.flatten() {
        let entry_path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        // Symlinks are the published names; real entries (named
        // `<tag>.<id>`, per `finalize`) are what we GC. Scratch
        // directories and lock files never carry a `machine.json` and are
        // filtered out by that check alone.
        if file_type.is_symlink() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !entry_path.join("machine.json").exists() {
            continue;
        }

        if let Some(max_age) = max_age {
            match MachineBlob::load(&entry_path) {
                Ok(blob) => {
                    let deadline_ms = blob.expiration.deadline_ms();
                    if deadline_ms > now_ms {
                        continue;
                    }
                    let age_ms = now_ms - deadline_ms;
                    if age_ms < max_age.as_millis() as u64 {
                        continue;
                    }
                }
                Err(e) => {
                    tracing::warn!(entry = %entry_path.display(), error = %e, "failed to read entry during expiry scan, skipping");
                    report.skipped.push((entry_path, e.to_string()));
                    continue;
                }
            }
        }

        report.merge(remove_entry(&machines_dir, &name, lockset));
    }

    report
}

fn remove_entry(machines_dir: &Path, name: &str, lockset: &Lockset) -> CleanupReport {
    let mut report = CleanupReport::default();
    let entry_path = machines_dir.join(name);
    let lock_path = machines_dir.join(format!(".{name}-lock"));

    let _guard = match lockset.acquire(&lock_path, Some(Duration::from_secs(30))) {
        Ok(guard) => guard,
        Err(e) => {
            tracing::warn!(entry = %entry_path.display(), error = %e, "could not acquire lock for cleanup, skipping");
            report.skipped.push((entry_path, e.to_string()));
            return report;
        }
    };

    // Unlink any symlink published under the bare tag: a real entry is
    // named `<tag>.<id>`, so split off the trailing `.<id>` suffix.
    if let Some(tag) = name.rsplit_once('.').map(|(tag, _id)| tag) {
        let symlink_path = machines_dir.join(tag);
        if symlink_path.symlink_metadata().is_ok() {
            let _ = std::fs::remove_file(&symlink_path);
        }
    }

    match std::fs::remove_dir_all(&entry_path) {
        Ok(()) => report.removed.push(entry_path),
        Err(e) => {
            tracing::warn!(entry = %entry_path.display(), error = %e, "failed to remove cache entry");
            report.skipped.push((entry_path, e.to_string()));
        }
    }

    let _ = std::fs::remove_file(&lock_path);

    report
}

/// Remove files directly under `dir` older than `max_age` (by mtime).
/// Used for `downloads/` and `logs/`.
pub fn prune_by_age(dir: &Path, max_age: Duration, now_ms: u64) -> CleanupReport {
    let mut report = CleanupReport::default();

    let Ok(entries) = std::fs::read_dir(dir) else {
        return report;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let mtime_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        if now_ms.saturating_sub(mtime_ms) < max_age.as_millis() as u64 {
            continue;
        }

        let result = if metadata.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };

        match result {
            Ok(()) => report.removed.push(path),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to prune");
                report.skipped.push((path, e.to_string()));
            }
        }
    }

    report
}

/// Remove scratch directories left behind by crashed processes: any entry
/// directly under `machines/` whose name starts with the scratch prefix and
/// is older than `min_age`.
pub const SCRATCH_PREFIX: &str = ".scratch-";

pub fn prune_stale_scratch_dirs(paths: &Paths, min_age: Duration, now_ms: u64) -> CleanupReport {
    let mut report = CleanupReport::default();
    let machines_dir = paths.machines();

    let Ok(entries) = std::fs::read_dir(&machines_dir) else {
        return report;
    };

    for entry in entries.flatten() {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !name.starts_with(SCRATCH_PREFIX) {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let mtime_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        if now_ms.saturating_sub(mtime_ms) < min_age.as_millis() as u64 {
            continue;
        }

        let path = entry.path();
        match std::fs::remove_dir_all(&path) {
            Ok(()) => report.removed.push(path),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to prune stale scratch dir");
                report.skipped.push((path, e.to_string()));
            }
        }
    }

    report
}

#[cfg(test)]
#[path = "gc_tests.rs"]
mod tests;
