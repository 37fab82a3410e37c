// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fingertip-store: machine blob persistence and cleanup/GC.

pub mod blob;
pub mod gc;

pub use blob::{BlobError, MachineBlob, BLOB_FILE_NAME, CURRENT_FORMAT_VERSION};
pub use gc::{
    expire_machines, prune_by_age, prune_stale_scratch_dirs, CleanupReport, SCRATCH_PREFIX,
};
