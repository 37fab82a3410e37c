// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `backend.stub`: a placeholder standing in for a real backend plugin
//! (`backend.qemu`, `backend.podman`). Real backends boot an actual VM or
//! container and return a fresh machine; this one just signals the
//! executor to spawn one, recording the requested backend id so later
//! steps can branch on `m.backend()` the way `os.fedora` branches on
//! `hasattr(m, 'qemu')` / `hasattr(m, 'container')`.

use fingertip_core::{MachineHandle, Step, StepArg, StepError, StepOutcome};

pub struct BackendStubStep;

impl Step for BackendStubStep {
    fn name(&self) -> &str {
        "backend.stub"
    }

    fn call(
        &self,
        _machine: &mut dyn MachineHandle,
        args: &[StepArg],
    ) -> Result<StepOutcome, StepError> {
        let backend = args
            .iter()
            .find_map(|arg| match arg {
                StepArg::Positional(v) => Some(v.clone()),
                StepArg::Named(k, v) if k == "backend" => Some(v.clone()),
                StepArg::Named(_, _) => None,
            })
            .unwrap_or_else(|| "stub".to_string());

        Ok(StepOutcome::Spawned { backend })
    }
}

#[cfg(test)]
#[path = "backend_stub_tests.rs"]
mod tests;
