// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in steps. A small, thin set demonstrating the executor end to
//! end; real backend, OS and SSH plugins are out of scope here.

mod backend_stub;
mod exec;
mod os_stub;
mod script;
mod ssh_stub;

pub use backend_stub::BackendStubStep;
pub use exec::{ExecResult, ExecStep};
pub use os_stub::{OsInfo, OsStubStep};
pub use script::ScriptRunStep;
pub use ssh_stub::SshStubStep;

use crate::registry::StepRegistry;
use std::sync::Arc;

/// Populate a fresh registry with all built-in steps.
pub fn register_builtins(registry: &mut StepRegistry) {
    registry.register(Arc::new(ExecStep));
    registry.register(Arc::new(BackendStubStep));
    registry.register(Arc::new(OsStubStep));
    registry.register(Arc::new(SshStubStep));
    registry.register(Arc::new(ScriptRunStep));
}
