// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The contract a step implements, and the narrow view of a machine it is
//! allowed to see. `MachineHandle` exists so this crate — and the step
//! registry built on top of it — never needs to know about the concrete
//! `Machine` type (which lives above this crate, in the engine), only the
//! handful of things a step is allowed to touch.

use crate::extensions::ExtensionMap;
use crate::tag::StepArg;
use std::path::Path;
use thiserror::Error;

/// The operations a step is allowed to perform against the machine it's
/// applied to.
pub trait MachineHandle: Send {
    fn extensions(&self) -> &ExtensionMap;
    fn extensions_mut(&mut self) -> &mut ExtensionMap;
    fn backend(&self) -> &str;
    fn set_backend(&mut self, backend: String);
    fn is_sealed(&self) -> bool;
    fn log_path(&self) -> &Path;
}

/// What a step produced.
#[derive(Debug)]
pub enum StepOutcome {
    /// The step mutated the machine in place (the common case: most steps
    /// adjust extension state or run a command against the existing
    /// machine).
    Mutated,
    /// The step ran but produced nothing persistable (legal only when the
    /// step is transient).
    Transient,
    /// The step wants a fresh machine built from scratch (e.g. a
    /// `backend.*` step being applied as the first step of a pipeline),
    /// carrying the backend id the new machine should record.
    Spawned { backend: String },
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error("step {name:?} failed: {message}")]
    Failed {
        name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// How a step's cache entries are treated. Per spec §4.I:
/// - `Always`: never cached, runs outside the build lock.
/// - `Last`: cached if another step follows; transient if this is the last
///   step of the pipeline.
/// - `Never` (the default): always cached.
/// - `Callable`: evaluated with the step's own arguments plus whether it's
///   the last step, producing one of the three literals above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientPolicy {
    Always,
    Last,
    Never,
    Callable(fn(&[StepArg], bool) -> TransientPolicy),
}

impl Default for TransientPolicy {
    fn default() -> Self {
        TransientPolicy::Never
    }
}

impl TransientPolicy {
    /// Reduce a `Callable` down to one of the three literal policies by
    /// invoking it with the step's own arguments and whether it's the last
    /// step of the pipeline; a literal policy resolves to itself.
    pub fn resolve(self, args: &[StepArg], is_last_step: bool) -> TransientPolicy {
        match self {
            TransientPolicy::Callable(f) => f(args, is_last_step).resolve(args, is_last_step),
            other => other,
        }
    }

    /// Resolve whether a step invocation should be treated as transient,
    /// given its own arguments and whether it's the last step of the
    /// pipeline.
    pub fn is_transient(self, args: &[StepArg], is_last_step: bool) -> bool {
        match self.resolve(args, is_last_step) {
            TransientPolicy::Always => true,
            TransientPolicy::Last => is_last_step,
            TransientPolicy::Never | TransientPolicy::Callable(_) => false,
        }
    }
}

/// A registered, callable step.
pub trait Step: Send + Sync {
    /// The dotted name this step is resolved under, e.g. `"exec"` or
    /// `"os.fedora"`.
    fn name(&self) -> &str;

    fn call(
        &self,
        machine: &mut dyn MachineHandle,
        args: &[crate::tag::StepArg],
    ) -> Result<StepOutcome, StepError>;

    /// This step's declared transient policy. Most steps are `Never`
    /// (cached); a pipeline-level transient wrapper can still force the
    /// *next* step's policy to `Always` regardless of what it declares.
    fn transient_policy(&self) -> TransientPolicy {
        TransientPolicy::Never
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
