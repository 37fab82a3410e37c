// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ssh.stub`: a placeholder standing in for the real `ssh` plugin, which
//! waits for the guest's SSH server to come up and runs a command over it.
//! This just records that an SSH round-trip was requested, so pipelines
//! exercising the executor don't need a live backend to apply the step.

use fingertip_core::{MachineHandle, Step, StepArg, StepError, StepOutcome};

pub struct SshStubStep;

impl Step for SshStubStep {
    fn name(&self) -> &str {
        "ssh.stub"
    }

    fn call(
        &self,
        machine: &mut dyn MachineHandle,
        args: &[StepArg],
    ) -> Result<StepOutcome, StepError> {
        let command = args
            .iter()
            .find_map(|arg| match arg {
                StepArg::Positional(v) => Some(v.clone()),
                StepArg::Named(_, _) => None,
            })
            .unwrap_or_else(|| "true".to_string());

        machine
            .extensions_mut()
            .set("ssh_last_command", &command)
            .map_err(|e| StepError::Failed {
                name: "ssh.stub".to_string(),
                message: e.to_string(),
                source: None,
            })?;

        Ok(StepOutcome::Mutated)
    }
}

#[cfg(test)]
#[path = "ssh_stub_tests.rs"]
mod tests;
