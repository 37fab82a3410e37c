// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fingertip-engine: the in-process machine object, its scoped-acquisition
//! guard, and the cache-aware executor that ties the lower-level crates
//! (paths, locking, step registry, persistence) into the one algorithm
//! spec'd in full at the module boundary below.

pub mod error;
pub mod executor;
pub mod machine;
pub mod transient;

pub use error::EngineError;
pub use executor::{ApplyResult, Executor};
pub use machine::{fire_hooks, step_descriptor, Machine, MachineScope};
pub use transient::{resolve_transient_wrappers, PipelineStep, SerializableStepArg};
