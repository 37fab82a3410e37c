// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `exec`: run a shell command against the machine, recording its result.
//! A thin, synchronous demonstration of a cacheable step — real backend
//! execution (QEMU guest exec, SSH, podman exec) is out of scope for this
//! crate and is left to backend adapters.

use fingertip_core::{MachineHandle, Step, StepArg, StepError, StepOutcome};
use serde::{Deserialize, Serialize};
use std::process::Command;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecResult {
    pub retcode: i32,
    pub out: String,
    pub err: String,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.retcode == 0
    }
}

pub struct ExecStep;

impl Step for ExecStep {
    fn name(&self) -> &str {
        "exec"
    }

    fn call(
        &self,
        machine: &mut dyn MachineHandle,
        args: &[StepArg],
    ) -> Result<StepOutcome, StepError> {
        let mut command_parts = Vec::new();
        let mut check = true;

        for arg in args {
            match arg {
                StepArg::Positional(v) => command_parts.push(v.clone()),
                StepArg::Named(k, v) if k == "check" => {
                    check = !matches!(v.as_str(), "False" | "false" | "0");
                }
                StepArg::Named(_, _) => {}
            }
        }

        let command_line = command_parts.join(" ");

        let output = Command::new("sh")
            .arg("-c")
            .arg(&command_line)
            .output()
            .map_err(|e| StepError::Failed {
                name: "exec".to_string(),
                message: format!("failed to spawn {command_line:?}: {e}"),
                source: Some(Box::new(e)),
            })?;

        let result = ExecResult {
            retcode: output.status.code().unwrap_or(-1),
            out: String::from_utf8_lossy(&output.stdout).into_owned(),
            err: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if check && !result.success() {
            return Err(StepError::Failed {
                name: "exec".to_string(),
                message: format!(
                    "command {command_line:?} exited with {}",
                    result.retcode
                ),
                source: None,
            });
        }

        machine
            .extensions_mut()
            .set("exec_last_result", &result)
            .map_err(|e| StepError::Failed {
                name: "exec".to_string(),
                message: e.to_string(),
                source: None,
            })?;

        Ok(StepOutcome::Mutated)
    }
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
