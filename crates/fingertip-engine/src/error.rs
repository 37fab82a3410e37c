// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One error enum at the engine boundary, wrapping the lower layers'
//! errors via `#[from]`, the same way `LifecycleError` wraps
//! `WalError`/`SnapshotError` elsewhere in this codebase.

use fingertip_core::{CacheCorruption, ExtensionError, FreshnessConflict, StateMachineViolation};
use fingertip_lock::LockError;
use fingertip_paths::ReflinkError;
use fingertip_steps::ResolveError;
use fingertip_store::BlobError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    StateMachine(#[from] StateMachineViolation),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error(transparent)]
    Corruption(#[from] CacheCorruption),
    #[error(transparent)]
    Freshness(#[from] FreshnessConflict),
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error(transparent)]
    Reflink(#[from] ReflinkError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Extension(#[from] ExtensionError),
    #[error("step {name:?} failed: {message}")]
    StepFailed {
        name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<fingertip_core::StepError> for EngineError {
    fn from(err: fingertip_core::StepError) -> Self {
        match err {
            fingertip_core::StepError::Failed {
                name,
                message,
                source,
            } => EngineError::StepFailed {
                name,
                message,
                source,
            },
        }
    }
}
