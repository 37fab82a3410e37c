// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The cache-aware executor: resolve a step, decide whether its result is
//! already on disk and fresh, build it if not, and hand back a freshly
//! loaded clone either way. Grounded in
//! `original_source/fingertip/machine.py`'s `_cache_aware_apply`/`build`
//! and `util/temp.py`'s `unique_dir`/`disappearing_dir`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fingertip_core::{
    Clock, Expiration, HookName, IdGen, MachineHandle, MachineState, Step, StateMachineViolation,
    StepArg, StepOutcome, TransientPolicy,
};
use fingertip_lock::{LockGuard, Lockset};
use fingertip_paths::{reflink_copy_tree, Paths};
use fingertip_steps::{Resolution, StepRegistry};
use fingertip_store::{MachineBlob, SCRATCH_PREFIX};

use crate::error::EngineError;
use crate::machine::{apply_hook_action, fire_hooks, Machine, MachineScope};

/// What applying one pipeline token against a machine produced: either the
/// machine was mutated in place with no new cache entry (an in-place
/// `.path=value`/`.method` token), or it was replaced by a freshly loaded
/// clone of a cache entry.
pub enum ApplyResult {
    InPlace,
    Replaced(Machine),
}

/// Bundles everything the cache-aware algorithm needs that isn't carried by
/// the machine or the step arguments themselves.
pub struct Executor<C: Clock, G: IdGen> {
    registry: StepRegistry,
    paths: Paths,
    locks: Lockset,
    clock: C,
    ids: G,
    lock_timeout: Option<Duration>,
    ignore_code_changes: bool,
}

impl<C: Clock, G: IdGen> Executor<C, G> {
    pub fn new(registry: StepRegistry, paths: Paths, clock: C, ids: G) -> Self {
        Self {
            registry,
            paths,
            locks: Lockset::new(),
            clock,
            ids,
            lock_timeout: None,
            ignore_code_changes: false,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_ignore_code_changes(mut self, ignore: bool) -> Self {
        self.ignore_code_changes = ignore;
        self
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// `build(first_step, args…)`: the same algorithm as [`Self::apply`]
    /// with an implicit initial parent (the cache root) and no prior
    /// machine — a fresh, empty scratch machine stands in for `m`.
    pub fn build(
        &self,
        first_step: &str,
        args: &[StepArg],
        is_last: bool,
        force_transient: bool,
    ) -> Result<Machine, EngineError> {
        std::fs::create_dir_all(self.paths.machines()).map_err(|source| EngineError::Io {
            path: self.paths.machines(),
            source,
        })?;
        let scratch = self
            .paths
            .machines()
            .join(format!("{SCRATCH_PREFIX}{}", self.ids.next()));
        std::fs::create_dir_all(&scratch).map_err(|source| EngineError::Io {
            path: scratch.clone(),
            source,
        })?;

        let mut initial = Machine::new_loaded(
            scratch,
            self.paths.machines(),
            Expiration::new(self.clock.epoch_ms(), Duration::from_secs(24 * 3600)),
            "none",
        );

        match self.apply(&mut initial, first_step, args, is_last, force_transient)? {
            ApplyResult::Replaced(next) => Ok(next),
            ApplyResult::InPlace => Ok(initial),
        }
    }

    /// `apply(m, step, args, is_last)`: spec §4.H steps 1–7.
    ///
    /// `force_transient` is the pipeline-level transient wrapper of spec
    /// §4.I's closing sentence: when set, this invocation is treated as
    /// transient regardless of the step's own declared policy, and a
    /// persistable result is discarded gracefully rather than raising the
    /// contract-violation that a step's *own* declared `always` policy
    /// would.
    pub fn apply(
        &self,
        m: &mut Machine,
        descriptor: &str,
        args: &[StepArg],
        is_last: bool,
        force_transient: bool,
    ) -> Result<ApplyResult, EngineError> {
        match self.registry.resolve(descriptor, args)? {
            Resolution::InPlace(action) => {
                apply_hook_action(m, &self.registry, &action, self.clock.epoch_ms())?;
                Ok(ApplyResult::InPlace)
            }
            Resolution::Registered { step, tag } => {
                let next =
                    self.apply_registered(m, step, &tag, args, is_last, force_transient)?;
                Ok(ApplyResult::Replaced(next))
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_registered(
        &self,
        m: &mut Machine,
        step: Arc<dyn Step>,
        tag: &str,
        args: &[StepArg],
        is_last: bool,
        force_transient: bool,
    ) -> Result<Machine, EngineError> {
        let target = m.parent_path().join(tag);
        let lockfile = Paths::lock_file_for(m.parent_path(), tag);
        let policy = step.transient_policy().resolve(args, is_last);
        let is_transient = force_transient || policy.is_transient(args, is_last);
        let graceful_discard = force_transient || (policy == TransientPolicy::Last && is_last);

        let lock_guard: LockGuard = if policy == TransientPolicy::Always {
            Lockset::no_lock()
        } else {
            self.locks.acquire(&lockfile, self.lock_timeout)?
        };

        let reuse = !is_transient && self.target_is_fresh(&target)?;

        let clone_source = if reuse {
            self.drop_scratch(m)?;
            target.clone()
        } else {
            self.build_step(m, step.as_ref(), args, is_transient, graceful_discard, &target)?
        };

        drop(lock_guard);

        self.clone_and_load(&clone_source)
    }

    /// Run the step inside a scope and resolve its outcome into a cache
    /// location per the bullets of spec §4.H step 5.
    fn build_step(
        &self,
        m: &mut Machine,
        step: &dyn Step,
        args: &[StepArg],
        is_transient: bool,
        graceful_discard: bool,
        target: &Path,
    ) -> Result<PathBuf, EngineError> {
        m.set_transient(is_transient);

        let outcome = {
            let mut scope = MachineScope::enter(m, &self.registry, self.clock.epoch_ms())?;
            match step.call(scope.machine_mut(), args) {
                Ok(outcome) => Ok(outcome),
                Err(e) => {
                    scope.fail();
                    Err(e)
                }
            }
        }
        .map_err(EngineError::from)?;

        match outcome {
            StepOutcome::Transient => {
                if !is_transient {
                    return Err(
                        StateMachineViolation::NonTransientStepReturnedNone(
                            step.name().to_string(),
                        )
                        .into(),
                    );
                }
                Ok(m.parent_path().to_path_buf())
            }
            StepOutcome::Mutated | StepOutcome::Spawned { .. } => {
                if let StepOutcome::Spawned { backend } = &outcome {
                    m.set_backend(backend.clone());
                }

                if !is_transient {
                    self.finalize(m, Some(target), false)?;
                    return Ok(target.to_path_buf());
                }

                if graceful_discard {
                    self.finalize(m, None, true)?;
                    return Ok(m.parent_path().to_path_buf());
                }

                Err(StateMachineViolation::TransientStepReturnedMachine(step.name().to_string()).into())
            }
        }
    }

    fn target_is_fresh(&self, target: &Path) -> Result<bool, EngineError> {
        if !target.exists() {
            return Ok(false);
        }
        let blob = MachineBlob::load(target)?;
        Ok(blob.expiration.is_fresh(self.clock.epoch_ms(), self.ignore_code_changes))
    }

    /// Delete `m`'s own scratch directory without touching the cache entry
    /// it was about to (but no longer needs to) produce.
    fn drop_scratch(&self, m: &mut Machine) -> Result<(), EngineError> {
        remove_dir_if_present(m.path())?;
        m.set_state(MachineState::Dropped);
        Ok(())
    }

    /// `finalize(link_target, name_hint)` (spec §4.F): publish `m`'s scratch
    /// directory as a new cache entry when `link_target` is set and the
    /// machine reached `spun_down`; otherwise discard it, optionally
    /// preserving just the log file (the "transient-when-last" case of
    /// spec §4.H step 5's third bullet).
    fn finalize(
        &self,
        m: &mut Machine,
        link_target: Option<&Path>,
        preserve_log: bool,
    ) -> Result<(), EngineError> {
        let should_persist = link_target.is_some() && m.state() == MachineState::SpunDown;

        if should_persist {
            #[allow(clippy::unwrap_used)]
            let link_target = link_target.unwrap();
            fire_hooks(m, &self.registry, HookName::Save, self.clock.epoch_ms())?;
            m.expiration_mut().depend_on_current_executable();

            if load_existing_fresh(link_target, self.clock.epoch_ms(), self.ignore_code_changes)?.is_some() {
                return Err(fingertip_core::FreshnessConflict {
                    path: link_target.to_path_buf(),
                }
                .into());
            }

            let parent = link_target.parent().unwrap_or(link_target);
            let unique_name = format!(
                "{}.{}",
                link_target.file_name().and_then(|n| n.to_str()).unwrap_or("entry"),
                self.ids.next()
            );
            let final_dir = parent.join(unique_name);

            std::fs::rename(m.path(), &final_dir).map_err(|source| EngineError::Io {
                path: final_dir.clone(),
                source,
            })?;

            m.set_path(final_dir.clone());
            m.set_parent_path(parent.to_path_buf());
            m.set_state(MachineState::Saving);

            let blob = m.to_blob();
            blob.save(&final_dir)?;

            replace_symlink(link_target, &final_dir)?;

            m.set_state(MachineState::Saved);
            return Ok(());
        }

        if preserve_log {
            self.preserve_log(m)?;
        }
        remove_dir_if_present(m.path())?;
        if let Some(link_target) = link_target {
            // "point the symlink (if any) at parent_path": only if one
            // already exists — a discard never conjures a symlink out of
            // nothing. A live dangling symlink (lexists but not exists) is
            // unlinked the same way a stale live one is.
            if link_target.symlink_metadata().is_ok() {
                std::fs::remove_file(link_target).map_err(|source| EngineError::Io {
                    path: link_target.to_path_buf(),
                    source,
                })?;
                symlink_to(link_target, m.parent_path())?;
            }
        }
        m.set_state(MachineState::Dropped);
        Ok(())
    }

    fn preserve_log(&self, m: &Machine) -> Result<(), EngineError> {
        let log_path = m.log_path();
        if !log_path.exists() {
            return Ok(());
        }
        std::fs::create_dir_all(self.paths.logs()).map_err(|source| EngineError::Io {
            path: self.paths.logs(),
            source,
        })?;
        let dest = self.paths.logs().join(format!("{}.log", self.ids.next()));
        std::fs::copy(log_path, &dest).map_err(|source| EngineError::Io {
            path: dest,
            source,
        })?;
        Ok(())
    }

    /// `clone_and_load(clone_source)` (spec §4.H step 7): reflink-copy the
    /// cache entry into a fresh nested scratch directory, fire `clone`
    /// hooks on the copy, re-serialize, then fire `load` hooks and
    /// transition to `loaded`.
    fn clone_and_load(&self, source: &Path) -> Result<Machine, EngineError> {
        // Reflink-copy into a staging directory *beside* `source` first,
        // then move it inside: copying straight into `source.join(id)`
        // would race the directory listing against the destination it is
        // itself creating, since the destination is nested inside the
        // source tree being walked.
        let hint = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("clone");
        let staging = source
            .parent()
            .unwrap_or(source)
            .join(format!(".{hint}-staging-{}", self.ids.next()));
        reflink_copy_tree(source, &staging)?;

        let scratch = source.join(self.ids.next());
        std::fs::rename(&staging, &scratch).map_err(|source_err| EngineError::Io {
            path: scratch.clone(),
            source: source_err,
        })?;

        let blob = MachineBlob::load_raw(&scratch)?;
        let log_path = scratch.join("log.txt");
        let mut machine = Machine::from_blob(blob, log_path);
        machine.set_path(scratch.clone());
        machine.set_parent_path(source.to_path_buf());

        fire_hooks(&mut machine, &self.registry, HookName::Clone, self.clock.epoch_ms())?;

        let blob = machine.to_blob();
        blob.save(&scratch)?;

        fire_hooks(&mut machine, &self.registry, HookName::Load, self.clock.epoch_ms())?;
        machine.set_state(MachineState::Loaded);

        Ok(machine)
    }
}

fn load_existing_fresh(
    path: &Path,
    now_ms: u64,
    ignore_code_changes: bool,
) -> Result<Option<MachineBlob>, EngineError> {
    if !path.exists() {
        return Ok(None);
    }
    let blob = MachineBlob::load(path)?;
    if blob.expiration.is_fresh(now_ms, ignore_code_changes) {
        Ok(Some(blob))
    } else {
        Ok(None)
    }
}

fn remove_dir_if_present(path: &Path) -> Result<(), EngineError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn replace_symlink(link: &Path, target: &Path) -> Result<(), EngineError> {
    if link.symlink_metadata().is_ok() {
        std::fs::remove_file(link).map_err(|source| EngineError::Io {
            path: link.to_path_buf(),
            source,
        })?;
    }
    symlink_to(link, target)
}

#[cfg(unix)]
fn symlink_to(link: &Path, target: &Path) -> Result<(), EngineError> {
    std::os::unix::fs::symlink(target, link).map_err(|source| EngineError::Io {
        path: link.to_path_buf(),
        source,
    })
}

#[cfg(not(unix))]
fn symlink_to(link: &Path, target: &Path) -> Result<(), EngineError> {
    std::fs::create_dir_all(link).map_err(|source| EngineError::Io {
        path: link.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
