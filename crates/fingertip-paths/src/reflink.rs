// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Copy-on-write copy, O(1) when the underlying filesystem supports
//! reflinks, falling back to a full byte copy otherwise.

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReflinkError {
    #[error("failed to reflink {from} to {to}: {source}")]
    Reflink {
        from: std::path::PathBuf,
        to: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: std::path::PathBuf,
        to: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to preserve metadata on {0}: {1}")]
    Metadata(std::path::PathBuf, std::io::Error),
    #[error("I/O error walking directory tree at {0}: {1}")]
    Io(std::path::PathBuf, std::io::Error),
}

/// Copy `src` to `dst`, reflinking when the filesystem supports it and
/// falling back to a full copy otherwise. When `preserve_metadata` is set,
/// permissions and modification time are copied onto the destination
/// (reflink already preserves these; the fallback path does not).
pub fn reflink_copy(src: &Path, dst: &Path, preserve_metadata: bool) -> Result<(), ReflinkError> {
    match reflink_copy::reflink(src, dst) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(src, dst).map_err(|source| ReflinkError::Copy {
                from: src.to_path_buf(),
                to: dst.to_path_buf(),
                source,
            })?;
            if preserve_metadata {
                let metadata = std::fs::metadata(src)
                    .map_err(|e| ReflinkError::Metadata(src.to_path_buf(), e))?;
                std::fs::set_permissions(dst, metadata.permissions())
                    .map_err(|e| ReflinkError::Metadata(dst.to_path_buf(), e))?;
            }
            Ok(())
        }
    }
}

/// Reflink-copy an entire directory tree: every regular file is reflinked
/// (falling back to a full copy per file as [`reflink_copy`] does);
/// directories are recreated. `dst` must not already exist.
pub fn reflink_copy_tree(src: &Path, dst: &Path) -> Result<(), ReflinkError> {
    std::fs::create_dir_all(dst).map_err(|e| ReflinkError::Io(dst.to_path_buf(), e))?;

    let entries =
        std::fs::read_dir(src).map_err(|e| ReflinkError::Io(src.to_path_buf(), e))?;

    for entry in entries {
        let entry = entry.map_err(|e| ReflinkError::Io(src.to_path_buf(), e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| ReflinkError::Io(entry.path(), e))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if file_type.is_dir() {
            reflink_copy_tree(&src_path, &dst_path)?;
        } else if file_type.is_symlink() {
            let target =
                std::fs::read_link(&src_path).map_err(|e| ReflinkError::Io(src_path.clone(), e))?;
            #[cfg(unix)]
            std::os::unix::fs::symlink(&target, &dst_path)
                .map_err(|e| ReflinkError::Io(dst_path.clone(), e))?;
            #[cfg(not(unix))]
            return Err(ReflinkError::Io(
                dst_path.clone(),
                std::io::Error::other("symlink cloning is only supported on unix"),
            ));
        } else {
            reflink_copy(&src_path, &dst_path, true)?;
        }
    }

    Ok(())
}

/// Whether `dir` sits on a filesystem that supports reflinks, determined by
/// a trial reflink of a throwaway file. An I/O error whose message contains
/// "Operation not supported" (`ENOTSUP`) is treated as a definitive
/// negative; any other error is treated as inconclusive (also `false`, but
/// logged so a flaky probe doesn't silently look like "no support").
pub fn supports_reflink(dir: &Path) -> bool {
    let probe_src = dir.join(".fingertip-reflink-probe-src");
    let probe_dst = dir.join(".fingertip-reflink-probe-dst");

    let result = std::fs::write(&probe_src, b"probe")
        .and_then(|()| reflink_copy::reflink(&probe_src, &probe_dst));

    let _ = std::fs::remove_file(&probe_src);
    let _ = std::fs::remove_file(&probe_dst);

    match result {
        Ok(()) => true,
        Err(e) => {
            if !e.to_string().contains("Operation not supported") {
                tracing::debug!(error = %e, dir = %dir.display(), "reflink probe inconclusive, assuming unsupported");
            }
            false
        }
    }
}

#[cfg(test)]
#[path = "reflink_tests.rs"]
mod tests;
