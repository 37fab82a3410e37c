// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `os.stub`: a placeholder standing in for a real OS installer plugin
//! (`os.fedora`, `os.alpine`). Records the requested distro/version under
//! the `os` extension instead of actually provisioning anything.

use fingertip_core::{MachineHandle, Step, StepArg, StepError, StepOutcome};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsInfo {
    pub distro: String,
    pub version: Option<String>,
}

pub struct OsStubStep;

impl Step for OsStubStep {
    fn name(&self) -> &str {
        "os.stub"
    }

    fn call(
        &self,
        machine: &mut dyn MachineHandle,
        args: &[StepArg],
    ) -> Result<StepOutcome, StepError> {
        let mut distro = None;
        let mut version = None;

        for arg in args {
            match arg {
                StepArg::Positional(v) if distro.is_none() => distro = Some(v.clone()),
                StepArg::Named(k, v) if k == "version" => version = Some(v.clone()),
                _ => {}
            }
        }

        let info = OsInfo {
            distro: distro.unwrap_or_else(|| "stub".to_string()),
            version,
        };

        machine
            .extensions_mut()
            .set("os", &info)
            .map_err(|e| StepError::Failed {
                name: "os.stub".to_string(),
                message: e.to_string(),
                source: None,
            })?;

        Ok(StepOutcome::Mutated)
    }
}

#[cfg(test)]
#[path = "os_stub_tests.rs"]
mod tests;
