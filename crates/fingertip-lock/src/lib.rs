// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fingertip-lock: the combined cross-process + cross-thread named lock
//! used to serialize concurrent builds of the same cache tag.

pub mod lockset;

pub use lockset::{LockError, LockGuard, Lockset};
