// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The five error kinds spec'd for the system (§7), shared across crate
//! boundaries so callers can match on one vocabulary regardless of which
//! layer raised them. Layer-specific detail is wrapped via `#[source]`.

use std::path::PathBuf;
use thiserror::Error;

/// A step declared itself transient but returned a persistable machine, or
/// any other violation of the state machine's transition graph.
#[derive(Debug, Error)]
pub enum StateMachineViolation {
    #[error("apply() called on machine in state {0}, expected loaded or spun_up")]
    InvalidApplyState(String),
    #[error("scope entered twice without matching exit (double spin-up)")]
    DoubleSpinUp,
    #[error("step {0:?} is declared transient but returned a persistable machine")]
    TransientStepReturnedMachine(String),
    #[error("step {0:?} returned None but is not transient")]
    NonTransientStepReturnedNone(String),
}

/// A cache entry's on-disk blob failed to validate on load. Fatal: the
/// caller should run `fingertip cleanup machines all` to recover.
#[derive(Debug, Error)]
pub enum CacheCorruption {
    #[error("machine blob at {path} has path {found:?}, expected {expected:?}")]
    PathMismatch {
        path: PathBuf,
        found: String,
        expected: String,
    },
    #[error("machine blob at {path} has parent_path {found:?}, expected {expected:?}")]
    ParentPathMismatch {
        path: PathBuf,
        found: String,
        expected: String,
    },
    #[error("machine blob at {path} is missing required field {field:?}")]
    MissingField { path: PathBuf, field: String },
    #[error("machine blob at {path} has unreadable format_version {found}, expected {expected}")]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
    #[error("failed to parse machine blob at {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// `finalize` observed a pre-existing, still-fresh destination while
/// holding the build lock. Should not happen under correct locking.
#[derive(Debug, Error)]
#[error("finalize refused to overwrite fresh destination {path}")]
pub struct FreshnessConflict {
    pub path: PathBuf,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
