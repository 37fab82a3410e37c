// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fingertip_core::ExtensionMap;
use std::path::{Path, PathBuf};

struct FakeMachine {
    extensions: ExtensionMap,
    backend: String,
    log_path: PathBuf,
}

impl FakeMachine {
    fn new() -> Self {
        Self {
            extensions: ExtensionMap::new(),
            backend: String::new(),
            log_path: PathBuf::from("/tmp/fingertip-backend-stub-test.log"),
        }
    }
}

impl MachineHandle for FakeMachine {
    fn extensions(&self) -> &ExtensionMap {
        &self.extensions
    }

    fn extensions_mut(&mut self) -> &mut ExtensionMap {
        &mut self.extensions
    }

    fn backend(&self) -> &str {
        &self.backend
    }

    fn set_backend(&mut self, backend: String) {
        self.backend = backend;
    }

    fn is_sealed(&self) -> bool {
        false
    }

    fn log_path(&self) -> &Path {
        &self.log_path
    }
}

#[test]
fn defaults_to_stub_backend() {
    let mut machine = FakeMachine::new();
    let outcome = BackendStubStep.call(&mut machine, &[]).unwrap();
    match outcome {
        StepOutcome::Spawned { backend } => assert_eq!(backend, "stub"),
        _ => panic!("expected a spawn outcome"),
    }
}

#[test]
fn honors_explicit_backend_name() {
    let mut machine = FakeMachine::new();
    let outcome = BackendStubStep
        .call(&mut machine, &[StepArg::Positional("qemu".into())])
        .unwrap();
    match outcome {
        StepOutcome::Spawned { backend } => assert_eq!(backend, "qemu"),
        _ => panic!("expected a spawn outcome"),
    }
}
