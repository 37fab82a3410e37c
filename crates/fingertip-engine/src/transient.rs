// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline-level transient wrapper (spec §4.I's closing sentence):
//! recognizing the literal `transient` pipeline token and forcing the step
//! that follows it to run with `force_transient = true`.
//!
//! Grounded in `original_source/fingertip/plugins/transient.py`, which
//! achieves the same effect with a step declared `always`-transient whose
//! body calls `m.apply(next_plugin, ...)` on the following token. That
//! shape doesn't translate directly here: a [`fingertip_core::Step`] only
//! ever sees a [`fingertip_core::MachineHandle`], so it has no way to
//! recurse back into the executor applying it. Recognizing the wrapper at
//! the pipeline-token level gets the same externally observable effect
//! (the wrapped step's result is never cached) without that cycle.

use fingertip_core::StepArg;

pub const TRANSIENT_WRAPPER: &str = "transient";

/// One token of a parsed pipeline: a step descriptor plus its arguments,
/// with `force_transient` set when the previous token was the `transient`
/// wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStep {
    pub descriptor: String,
    pub args: Vec<SerializableStepArg>,
    pub force_transient: bool,
}

/// A `StepArg` that can be compared and cloned freely, for use in
/// pipeline-planning data structures built ahead of execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializableStepArg {
    Positional(String),
    Named(String, String),
}

impl From<&StepArg> for SerializableStepArg {
    fn from(arg: &StepArg) -> Self {
        match arg {
            StepArg::Positional(v) => SerializableStepArg::Positional(v.clone()),
            StepArg::Named(k, v) => SerializableStepArg::Named(k.clone(), v.clone()),
        }
    }
}

impl From<&SerializableStepArg> for StepArg {
    fn from(arg: &SerializableStepArg) -> Self {
        match arg {
            SerializableStepArg::Positional(v) => StepArg::Positional(v.clone()),
            SerializableStepArg::Named(k, v) => StepArg::Named(k.clone(), v.clone()),
        }
    }
}

/// Collapse `transient + <step>` token pairs into a single [`PipelineStep`]
/// with `force_transient` set, leaving every other step untouched. A
/// trailing, argument-less `transient` token (nothing follows it) is
/// dropped: it has no step left to wrap.
pub fn resolve_transient_wrappers(
    steps: Vec<(String, Vec<StepArg>)>,
) -> Vec<PipelineStep> {
    let mut resolved = Vec::with_capacity(steps.len());
    let mut iter = steps.into_iter();
    while let Some((descriptor, args)) = iter.next() {
        if descriptor == TRANSIENT_WRAPPER {
            if let Some((inner_descriptor, inner_args)) = iter.next() {
                resolved.push(PipelineStep {
                    descriptor: inner_descriptor,
                    args: inner_args.iter().map(SerializableStepArg::from).collect(),
                    force_transient: true,
                });
            }
            continue;
        }
        resolved.push(PipelineStep {
            descriptor,
            args: args.iter().map(SerializableStepArg::from).collect(),
            force_transient: false,
        });
    }
    resolved
}

#[cfg(test)]
#[path = "transient_tests.rs"]
mod tests;
