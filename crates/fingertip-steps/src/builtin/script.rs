// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `script.run`: execute a local script against the machine. Its transient
//! policy is a `Callable`, grounded in
//! `original_source/fingertip/plugins/script.py`'s `_should_be_transient`:
//! without a `cache` interval the step caches for the duration of one
//! pipeline but is transient if it's the pipeline's last step (no point
//! persisting a result nothing will ever reuse); any truthy `cache`
//! argument turns that off and the result is always cached.

use fingertip_core::{MachineHandle, Step, StepArg, StepError, StepOutcome, TransientPolicy};
use std::process::Command;

pub struct ScriptRunStep;

impl Step for ScriptRunStep {
    fn name(&self) -> &str {
        "script.run"
    }

    fn transient_policy(&self) -> TransientPolicy {
        TransientPolicy::Callable(should_be_transient)
    }

    fn call(
        &self,
        machine: &mut dyn MachineHandle,
        args: &[StepArg],
    ) -> Result<StepOutcome, StepError> {
        let scriptpath = args
            .iter()
            .find_map(|arg| match arg {
                StepArg::Positional(v) => Some(v.clone()),
                StepArg::Named(k, v) if k == "scriptpath" => Some(v.clone()),
                StepArg::Named(_, _) => None,
            })
            .ok_or_else(|| StepError::Failed {
                name: "script.run".to_string(),
                message: "script.run requires a scriptpath argument".to_string(),
                source: None,
            })?;

        let output = Command::new(&scriptpath)
            .output()
            .map_err(|e| StepError::Failed {
                name: "script.run".to_string(),
                message: format!("failed to run {scriptpath:?}: {e}"),
                source: Some(Box::new(e)),
            })?;

        if !output.status.success() {
            return Err(StepError::Failed {
                name: "script.run".to_string(),
                message: format!(
                    "script {scriptpath:?} exited with {:?}",
                    output.status.code()
                ),
                source: None,
            });
        }

        machine
            .extensions_mut()
            .set("script_run_last_path", &scriptpath)
            .map_err(|e| StepError::Failed {
                name: "script.run".to_string(),
                message: e.to_string(),
                source: None,
            })?;

        Ok(StepOutcome::Mutated)
    }
}

fn should_be_transient(args: &[StepArg], _is_last_step: bool) -> TransientPolicy {
    let cache_requested = args.iter().any(|arg| match arg {
        StepArg::Named(k, v) if k == "cache" => {
            !matches!(v.as_str(), "0" | "" | "False" | "false")
        }
        _ => false,
    });

    if cache_requested {
        TransientPolicy::Never
    } else {
        TransientPolicy::Last
    }
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
