// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-process machine object and its scoped-acquisition RAII guard.
//! Grounded in `original_source/fingertip/machine.py`'s `UnsaveableMachine`
//! (`__enter__`/`__exit__` state assertions) and spec §4.F/§9's Design
//! Notes directive to replace the Python context-manager protocol with an
//! RAII guard.

use fingertip_core::{
    Expiration, ExtensionMap, HookAction, HookName, HookRegistry, MachineHandle, MachineState,
    SerializableArg, StateMachineViolation, StepArg,
};
use fingertip_steps::StepRegistry;
use fingertip_store::MachineBlob;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::EngineError;

/// How much longer an unsealed machine's result may be trusted: a
/// network-dependent build can no longer vouch for its own reproducibility,
/// so the cache entry is only good for a short revalidation window rather
/// than whatever deadline it had while sealed.
const UNSEAL_EXPIRATION_CAP: Duration = Duration::from_secs(300);

/// A loaded machine instance: the reproducible environment snapshot plus
/// (while `state == SpunUp`) the live process it represents.
#[derive(Debug)]
pub struct Machine {
    path: PathBuf,
    parent_path: PathBuf,
    link_target: Option<PathBuf>,
    state: MachineState,
    up_counter: u32,
    transient: bool,
    sealed: bool,
    expiration: Expiration,
    hooks: HookRegistry,
    backend: String,
    extensions: ExtensionMap,
    log_path: PathBuf,
}

impl Machine {
    /// Construct a freshly loaded machine rooted at `path`, with no history
    /// (used by `build()`'s first step, which has no prior cache entry).
    pub fn new_loaded(
        path: PathBuf,
        parent_path: PathBuf,
        expiration: Expiration,
        backend: impl Into<String>,
    ) -> Self {
        let log_path = path.join("log.txt");
        Self {
            path,
            parent_path,
            link_target: None,
            state: MachineState::Loaded,
            up_counter: 0,
            transient: false,
            sealed: true,
            expiration,
            hooks: HookRegistry::new(),
            backend: backend.into(),
            extensions: ExtensionMap::new(),
            log_path,
        }
    }

    pub fn from_blob(blob: MachineBlob, log_path: PathBuf) -> Self {
        Self {
            path: blob.path,
            parent_path: blob.parent_path,
            link_target: blob.link_target,
            state: blob.state,
            up_counter: blob.up_counter,
            transient: blob.transient,
            sealed: blob.sealed,
            expiration: blob.expiration,
            hooks: blob.hooks,
            backend: blob.backend,
            extensions: blob.extensions,
            log_path,
        }
    }

    pub fn to_blob(&self) -> MachineBlob {
        MachineBlob {
            format_version: fingertip_store::CURRENT_FORMAT_VERSION,
            path: self.path.clone(),
            parent_path: self.parent_path.clone(),
            link_target: self.link_target.clone(),
            state: self.state,
            up_counter: self.up_counter,
            transient: self.transient,
            sealed: self.sealed,
            expiration: self.expiration.clone(),
            hooks: self.hooks.clone(),
            backend: self.backend.clone(),
            extensions: self.extensions.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_path(&mut self, path: PathBuf) {
        self.log_path = path.join("log.txt");
        self.path = path;
    }

    pub fn parent_path(&self) -> &Path {
        &self.parent_path
    }

    pub fn set_parent_path(&mut self, parent_path: PathBuf) {
        self.parent_path = parent_path;
    }

    pub fn link_target(&self) -> Option<&Path> {
        self.link_target.as_deref()
    }

    pub fn set_link_target(&mut self, link_target: Option<PathBuf>) {
        self.link_target = link_target;
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn up_counter(&self) -> u32 {
        self.up_counter
    }

    pub fn transient(&self) -> bool {
        self.transient
    }

    pub fn set_transient(&mut self, transient: bool) {
        self.transient = transient;
    }

    pub fn expiration(&self) -> &Expiration {
        &self.expiration
    }

    pub fn expiration_mut(&mut self) -> &mut Expiration {
        &mut self.expiration
    }

    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    pub(crate) fn set_state(&mut self, state: MachineState) {
        self.state = state;
    }

    /// Fire the `unseal` hooks and flip the one-way `sealed` flag, capping
    /// expiration the way a network-dependent unseal must (spec glossary:
    /// "unsealing caps expiration").
    pub fn unseal(&mut self, registry: &StepRegistry, now_ms: u64) -> Result<(), EngineError> {
        if !self.sealed {
            return Ok(());
        }
        fire_hooks(self, registry, HookName::Unseal, now_ms)?;
        self.sealed = false;
        self.expiration.cap(now_ms, UNSEAL_EXPIRATION_CAP);
        Ok(())
    }
}

impl fingertip_core::MachineHandle for Machine {
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
        self.sealed
    }

    fn log_path(&self) -> &Path {
        &self.log_path
    }
}

/// Apply one hook action against `machine`. A `Step` action looks the
/// descriptor up in the registry and calls it with no caching; a `Method`
/// action does the same with an empty argument list (the Rust-native
/// analogue of a bound-method hook callback), except `hooks.unseal`/`unseal`
/// which route straight to [`Machine::unseal`] rather than the registry,
/// since unsealing is a built-in method of the machine itself and not a
/// registered step; an `Assign` action writes straight through the
/// extension map.
pub(crate) fn apply_hook_action(
    machine: &mut Machine,
    registry: &StepRegistry,
    action: &HookAction,
    now_ms: u64,
) -> Result<(), EngineError> {
    match action {
        HookAction::Step(descriptor) => {
            let args: Vec<StepArg> = descriptor.args.iter().map(StepArg::from).collect();
            match registry.get(&descriptor.name) {
                Some(step) => {
                    step.call(machine, &args)?;
                }
                None => {
                    tracing::warn!(step = %descriptor.name, "hook referenced unknown step, skipping");
                }
            }
        }
        HookAction::Method { path } if path == "hooks.unseal" || path == "unseal" => {
            machine.unseal(registry, now_ms)?;
        }
        HookAction::Method { path } => match registry.get(path) {
            Some(step) => {
                step.call(machine, &[])?;
            }
            None => {
                tracing::debug!(method = %path, "hook method has no backing step, skipping");
            }
        },
        HookAction::Assign { path, value } => {
            machine
                .extensions_mut()
                .assign_path(path, value)
                .map_err(EngineError::from)?;
        }
    }
    Ok(())
}

/// Fire every action registered under `name`, in the order
/// [`HookName::fires_forward`] dictates.
pub fn fire_hooks(
    machine: &mut Machine,
    registry: &StepRegistry,
    name: HookName,
    now_ms: u64,
) -> Result<(), EngineError> {
    let actions: Vec<HookAction> = machine
        .hooks
        .ordered_actions(name)
        .into_iter()
        .cloned()
        .collect();
    for action in actions {
        apply_hook_action(machine, registry, &action, now_ms)?;
    }
    Ok(())
}

/// RAII guard for one scoped acquisition of a machine (spec §4.F's "scope
/// enter"/"scope exit"), replacing the Python context manager. Dropping the
/// guard fires `down` (clean exit) or `drop` (transient, or unwinding due to
/// a panic) hooks and transitions state accordingly; it never finalizes —
/// that's the executor's explicit responsibility (see `crate::executor`),
/// since finalize needs to know the caller's intended cache target, not
/// just that a scope closed.
#[derive(Debug)]
pub struct MachineScope<'a> {
    machine: &'a mut Machine,
    registry: &'a StepRegistry,
    failed: bool,
    now_ms: u64,
}

impl<'a> MachineScope<'a> {
    pub fn enter(
        machine: &'a mut Machine,
        registry: &'a StepRegistry,
        now_ms: u64,
    ) -> Result<Self, EngineError> {
        let first_entry = machine.up_counter == 0;
        let state_ok = match (machine.state, first_entry) {
            (MachineState::Loaded, true) => true,
            (MachineState::SpunUp, false) => true,
            _ => false,
        };
        if !state_ok {
            return Err(
                StateMachineViolation::InvalidApplyState(machine.state.to_string()).into(),
            );
        }

        if first_entry {
            fire_hooks(machine, registry, HookName::Up, now_ms)?;
            machine.state = MachineState::SpunUp;
        }
        machine.up_counter += 1;

        Ok(Self {
            machine,
            registry,
            failed: false,
            now_ms,
        })
    }

    pub fn machine(&self) -> &Machine {
        self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        self.machine
    }

    /// Mark this exit as a failure (a step returned an error rather than
    /// unwinding via panic), so `Drop` takes the same `drop`-hook path it
    /// would for a panic or a transient machine.
    pub fn fail(&mut self) {
        self.failed = true;
    }
}

impl Drop for MachineScope<'_> {
    fn drop(&mut self) {
        self.machine.up_counter -= 1;
        if self.machine.up_counter != 0 {
            return;
        }

        let take_drop_path = self.machine.transient || self.failed || std::thread::panicking();
        let hook = if take_drop_path {
            HookName::Drop
        } else {
            HookName::Down
        };

        if let Err(e) = fire_hooks(self.machine, self.registry, hook, self.now_ms) {
            tracing::warn!(error = %e, "hook firing failed while closing machine scope");
        }

        self.machine.state = if take_drop_path {
            MachineState::Dropped
        } else {
            MachineState::SpunDown
        };
    }
}

/// Convert a registered step invocation plus its arguments into a
/// serializable [`StepDescriptor`], for callers registering a hook that
/// invokes a step by name.
pub fn step_descriptor(
    name: impl Into<String>,
    args: &[StepArg],
) -> fingertip_core::StepDescriptor {
    fingertip_core::StepDescriptor {
        name: name.into(),
        args: args
            .iter()
            .map(|a| match a {
                StepArg::Positional(v) => SerializableArg::Positional(v.clone()),
                StepArg::Named(k, v) => SerializableArg::Named(k.clone(), v.clone()),
            })
            .collect(),
    }
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
