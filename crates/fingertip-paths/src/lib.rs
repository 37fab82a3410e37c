// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fingertip-paths: the XDG-based cache layout and copy-on-write file
//! operations the rest of the engine builds on.

pub mod paths;
pub mod reflink;

pub use paths::{Paths, ENV_CACHE_DIR};
pub use reflink::{reflink_copy, reflink_copy_tree, supports_reflink, ReflinkError};
