// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Freshness tracking: a wall-clock deadline plus a set of file
//! dependencies (mtime + content digest), either of which can invalidate
//! a cache entry.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::units::{parse_interval, UnitError};

/// Recorded state for one file this entry depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFingerprint {
    pub mtime_ms: u64,
    pub content_hash: String,
}

/// A deadline plus a set of file dependencies that together determine
/// whether a cache entry is still fresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expiration {
    deadline_ms: u64,
    deps: BTreeMap<PathBuf, FileFingerprint>,
}

impl Expiration {
    /// Create an expiration with deadline `now + expire_in`.
    pub fn new(now_ms: u64, expire_in: Duration) -> Self {
        Self {
            deadline_ms: now_ms.saturating_add(expire_in.as_millis() as u64),
            deps: BTreeMap::new(),
        }
    }

    pub fn from_interval(now_ms: u64, interval: &str) -> Result<Self, UnitError> {
        Ok(Self::new(now_ms, parse_interval(interval)?))
    }

    pub fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }

    /// Lower the deadline to `min(current, now + interval)`. Never raises it.
    pub fn cap(&mut self, now_ms: u64, interval: Duration) {
        let candidate = now_ms.saturating_add(interval.as_millis() as u64);
        self.deadline_ms = self.deadline_ms.min(candidate);
    }

    /// Record the current mtime and content digest of `path`.
    pub fn depend_on_file(&mut self, path: &Path) -> std::io::Result<()> {
        if is_ignored_system_path(path) {
            return Ok(());
        }
        let metadata = std::fs::metadata(path)?;
        let mtime_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let content_hash = hash_file(path)?;
        self.deps.insert(
            path.to_path_buf(),
            FileFingerprint {
                mtime_ms,
                content_hash,
            },
        );
        Ok(())
    }

    /// Best-effort snapshot of the running binary itself, standing in for
    /// "every loaded source file": a compiled Rust process has no dynamic
    /// module table to walk, so the closest analogue is the executable's
    /// own image on disk.
    pub fn depend_on_current_executable(&mut self) {
        if let Ok(exe) = std::env::current_exe() {
            let _ = self.depend_on_file(&exe);
        }
    }

    /// Whether this entry is still fresh: the deadline hasn't passed, and
    /// every recorded file dependency still exists with an unchanged mtime
    /// or unchanged content digest.
    ///
    /// `ignore_code_changes` mirrors `FINGERTIP_IGNORE_CODE_CHANGES=1`: when
    /// set, a changed mtime alone never invalidates freshness (the content
    /// digest is still authoritative).
    pub fn is_fresh(&self, now_ms: u64, ignore_code_changes: bool) -> bool {
        if now_ms >= self.deadline_ms {
            return false;
        }

        for (path, recorded) in &self.deps {
            let Ok(metadata) = std::fs::metadata(path) else {
                return false;
            };
            let mtime_ms = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0);

            if mtime_ms == recorded.mtime_ms {
                continue;
            }
            if ignore_code_changes {
                continue;
            }
            match hash_file(path) {
                Ok(hash) if hash == recorded.content_hash => continue,
                _ => return false,
            }
        }

        true
    }
}

fn hash_file(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{digest:x}"))
}

/// Files under system library directories are excluded from dependency
/// tracking unless they live under the tool's own source tree (identified
/// by `FINGERTIP_SRC_ROOT`, set by the build/dev environment; absent in a
/// normal install, so nothing under e.g. `/usr/lib` is ever tracked there).
fn is_ignored_system_path(path: &Path) -> bool {
    const SYSTEM_PREFIXES: &[&str] = &["/usr/lib", "/usr/local/lib", "/lib"];

    if let Ok(src_root) = std::env::var("FINGERTIP_SRC_ROOT") {
        if path.starts_with(&src_root) {
            return false;
        }
    }

    SYSTEM_PREFIXES.iter().any(|p| path.starts_with(p))
}

#[cfg(test)]
#[path = "expiration_tests.rs"]
mod tests;
