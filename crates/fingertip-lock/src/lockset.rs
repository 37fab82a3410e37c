// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A named lock combining a cross-process file lock with a cross-thread
//! mutex keyed by the same path, so two threads in one process and two
//! processes sharing a cache directory both serialize correctly on the
//! same build lock.

use fs2::FileExt;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("timed out acquiring lock at {0}")]
    Timeout(PathBuf),
    #[error("I/O error locking {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// In-process named mutex: one per lock-file path, shared between threads
/// via the [`Lockset`] registry.
struct NamedMutexInner {
    locked: Mutex<bool>,
    cv: Condvar,
}

impl NamedMutexInner {
    fn new() -> Self {
        Self {
            locked: Mutex::new(false),
            cv: Condvar::new(),
        }
    }

    /// Block until the in-process slot is free, honoring an optional
    /// deadline. Returns `false` on timeout.
    fn acquire(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut guard = self.locked.lock();
        while *guard {
            match deadline {
                None => self.cv.wait(&mut guard),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    let result = self.cv.wait_for(&mut guard, deadline - now);
                    if result.timed_out() && *guard {
                        return false;
                    }
                }
            }
        }
        *guard = true;
        true
    }

    fn release(&self) {
        let mut guard = self.locked.lock();
        *guard = false;
        self.cv.notify_one();
    }
}

/// Registry of named locks for one process. Each distinct path gets its own
/// cross-thread mutex and cross-process file lock; different paths never
/// contend with each other.
#[derive(Default)]
pub struct Lockset {
    threads: Mutex<HashMap<PathBuf, Arc<NamedMutexInner>>>,
}

/// Holds both layers of a named lock for as long as it's alive; dropping it
/// releases the file lock (implicitly, via `File`'s `Drop`) and then the
/// in-process mutex.
pub struct LockGuard {
    thread_mutex: Option<Arc<NamedMutexInner>>,
    _file: Option<File>,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self._file.take();
        if let Some(mutex) = self.thread_mutex.take() {
            mutex.release();
        }
    }
}

impl Lockset {
    pub fn new() -> Self {
        Self::default()
    }

    fn thread_mutex_for(&self, path: &Path) -> Arc<NamedMutexInner> {
        let mut threads = self.threads.lock();
        threads
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(NamedMutexInner::new()))
            .clone()
    }

    /// Acquire the named lock at `path`, blocking until `timeout` elapses
    /// (or indefinitely if `None`, the default per spec §5).
    pub fn acquire(&self, path: &Path, timeout: Option<Duration>) -> Result<LockGuard, LockError> {
        let start = Instant::now();
        let thread_mutex = self.thread_mutex_for(path);

        if !thread_mutex.acquire(timeout) {
            return Err(LockError::Timeout(path.to_path_buf()));
        }

        let remaining = timeout.map(|t| t.saturating_sub(start.elapsed()));

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LockError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| {
                thread_mutex.release();
                LockError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        if !acquire_file_lock(&file, remaining) {
            thread_mutex.release();
            return Err(LockError::Timeout(path.to_path_buf()));
        }

        if Instant::now().duration_since(start) > Duration::from_millis(250) {
            tracing::info!(path = %path.display(), "acquired lock after a wait");
        } else {
            tracing::debug!(path = %path.display(), "acquired lock");
        }

        Ok(LockGuard {
            thread_mutex: Some(thread_mutex),
            _file: Some(file),
        })
    }

    /// A lock that never blocks and does nothing on drop: used for steps
    /// that must not be gated on the build lock (the `always`-transient
    /// policy, spec §4.I).
    pub fn no_lock() -> LockGuard {
        LockGuard {
            thread_mutex: None,
            _file: None,
        }
    }
}

fn acquire_file_lock(file: &File, timeout: Option<Duration>) -> bool {
    match timeout {
        None => file.lock_exclusive().is_ok(),
        Some(timeout) => {
            let deadline = Instant::now() + timeout;
            loop {
                if file.try_lock_exclusive().is_ok() {
                    return true;
                }
                if Instant::now() >= deadline {
                    return false;
                }
                std::thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

#[cfg(test)]
#[path = "lockset_tests.rs"]
mod tests;
