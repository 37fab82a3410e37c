// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The on-disk machine blob: one JSON document per cache entry directory,
//! written atomically (write to `.tmp`, fsync, rename, fsync the parent
//! directory), grounded in the same durability sequence used elsewhere in
//! this codebase for checkpointed state.

use fingertip_core::{CacheCorruption, Expiration, ExtensionMap, HookRegistry, MachineState};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Bump when the blob's shape changes incompatibly. A blob that doesn't
/// match this version fails to load as a fatal [`CacheCorruption`] — there
/// is no running process coordinating a live migration for a cache that
/// many independent processes may read concurrently.
pub const CURRENT_FORMAT_VERSION: u32 = 1;

pub const BLOB_FILE_NAME: &str = "machine.json";

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Corruption(#[from] CacheCorruption),
}

/// The serializable shape of a machine, persisted at
/// `<entry-dir>/machine.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineBlob {
    pub format_version: u32,
    pub path: PathBuf,
    pub parent_path: PathBuf,
    pub link_target: Option<PathBuf>,
    pub state: MachineState,
    pub up_counter: u32,
    pub transient: bool,
    pub sealed: bool,
    pub expiration: Expiration,
    pub hooks: HookRegistry,
    pub backend: String,
    pub extensions: ExtensionMap,
}

impl MachineBlob {
    /// Write this blob into `dir` as `machine.json`, atomically: write to a
    /// temp file, fsync it, rename into place, then fsync the containing
    /// directory so the rename itself is durable.
    pub fn save(&self, dir: &Path) -> Result<(), BlobError> {
        std::fs::create_dir_all(dir).map_err(|source| BlobError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let final_path = dir.join(BLOB_FILE_NAME);
        let tmp_path = dir.join(format!("{BLOB_FILE_NAME}.tmp"));

        let json = serde_json::to_vec_pretty(self).map_err(|source| BlobError::Io {
            path: tmp_path.clone(),
            source: std::io::Error::other(source),
        })?;

        std::fs::write(&tmp_path, &json).map_err(|source| BlobError::Io {
            path: tmp_path.clone(),
            source,
        })?;

        {
            let file = File::open(&tmp_path).map_err(|source| BlobError::Io {
                path: tmp_path.clone(),
                source,
            })?;
            file.sync_all().map_err(|source| BlobError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        }

        std::fs::rename(&tmp_path, &final_path).map_err(|source| BlobError::Io {
            path: final_path.clone(),
            source,
        })?;

        let dir_handle = File::open(dir).map_err(|source| BlobError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        dir_handle.sync_all().map_err(|source| BlobError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        Ok(())
    }

    /// Parse and version-check the blob in `dir` without validating its
    /// `path`/`parent_path` fields against `dir`. Only meant for the brief
    /// window during cloning where a freshly copied blob still carries its
    /// source directory's path fields, before they're rewritten to the new
    /// scratch location; everywhere else use [`MachineBlob::load`].
    pub fn load_raw(dir: &Path) -> Result<Self, BlobError> {
        let blob_path = dir.join(BLOB_FILE_NAME);
        let bytes = std::fs::read(&blob_path).map_err(|source| BlobError::Io {
            path: blob_path.clone(),
            source,
        })?;

        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|source| CacheCorruption::Malformed {
                path: blob_path.clone(),
                source,
            })?;

        let format_version = value
            .get("format_version")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| CacheCorruption::MissingField {
                path: blob_path.clone(),
                field: "format_version".to_string(),
            })? as u32;

        if format_version != CURRENT_FORMAT_VERSION {
            return Err(CacheCorruption::UnsupportedVersion {
                path: blob_path.clone(),
                found: format_version,
                expected: CURRENT_FORMAT_VERSION,
            }
            .into());
        }

        let blob: MachineBlob =
            serde_json::from_value(value).map_err(|source| CacheCorruption::Malformed {
                path: blob_path.clone(),
                source,
            })?;

        Ok(blob)
    }

    /// Load and validate the blob in `dir`. `path` must equal `dir` and
    /// `parent_path` must equal the realpath of `dir`'s parent — any
    /// mismatch, missing field, or unsupported format version is a fatal
    /// [`CacheCorruption`].
    pub fn load(dir: &Path) -> Result<Self, BlobError> {
        let blob_path = dir.join(BLOB_FILE_NAME);
        let blob = Self::load_raw(dir)?;

        let canonical_dir = std::fs::canonicalize(dir).map_err(|source| BlobError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        if blob.path != canonical_dir && blob.path != dir {
            return Err(CacheCorruption::PathMismatch {
                path: blob_path.clone(),
                found: blob.path.display().to_string(),
                expected: dir.display().to_string(),
            }
            .into());
        }

        if let Some(parent) = dir.parent() {
            let canonical_parent =
                std::fs::canonicalize(parent).map_err(|source| BlobError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            if blob.parent_path != canonical_parent && blob.parent_path != parent {
                return Err(CacheCorruption::ParentPathMismatch {
                    path: blob_path.clone(),
                    found: blob.parent_path.display().to_string(),
                    expected: parent.display().to_string(),
                }
                .into());
            }
        }

        Ok(blob)
    }
}

#[cfg(test)]
#[path = "blob_tests.rs"]
mod tests;
