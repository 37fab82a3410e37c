// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The step registry and the resolver that turns a step descriptor into
//! either a registered, cacheable step or an in-place mutation of the
//! machine (spec §4.E).
//!
//! There is no dynamic module loading here (no analogue of Python's
//! `importlib`): a string descriptor is looked up by its exact dotted name
//! in a registry populated once at startup.

use fingertip_core::{build_tag, HookAction, Step, StepArg};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no step registered under {0:?}")]
    NotFound(String),
    #[error("in-place descriptor {0:?} is missing an action (expected `.method` or `.path=value`)")]
    MalformedInPlace(String),
}

/// A resolved step: either a registered, cacheable step with its tag, or an
/// in-place mutation applied directly to the machine (never cached).
pub enum Resolution {
    Registered { step: Arc<dyn Step>, tag: String },
    InPlace(HookAction),
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Registered { step, tag } => f
                .debug_struct("Registered")
                .field("step", &step.name())
                .field("tag", tag)
                .finish(),
            Resolution::InPlace(action) => f.debug_tuple("InPlace").field(action).finish(),
        }
    }
}

/// Static table of steps, populated once at startup from the built-in set
/// (and, in a fuller deployment, from backend-provided plugins).
#[derive(Default, Clone)]
pub struct StepRegistry {
    steps: HashMap<String, Arc<dyn Step>>,
}

impl std::fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRegistry")
            .field("steps", &self.steps.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, step: Arc<dyn Step>) {
        self.steps.insert(step.name().to_string(), step);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Step>> {
        self.steps.get(name).cloned()
    }

    /// Resolve a descriptor string plus its arguments into a [`Resolution`].
    ///
    /// A descriptor starting with `.` is an in-place mutation
    /// (`.hooks.unseal` -> a method call, `.ram.size=2G` -> an attribute
    /// assignment) and never touches the registry or the cache.
    pub fn resolve(&self, descriptor: &str, args: &[StepArg]) -> Result<Resolution, ResolveError> {
        if let Some(in_place) = descriptor.strip_prefix('.') {
            return parse_in_place(in_place).map(Resolution::InPlace);
        }

        let step = self
            .get(descriptor)
            .ok_or_else(|| ResolveError::NotFound(descriptor.to_string()))?;

        let tag = build_tag(descriptor, args);
        Ok(Resolution::Registered { step, tag })
    }
}

fn parse_in_place(path: &str) -> Result<HookAction, ResolveError> {
    if path.is_empty() {
        return Err(ResolveError::MalformedInPlace(format!(".{path}")));
    }
    if let Some((lhs, rhs)) = path.split_once('=') {
        if lhs.is_empty() {
            return Err(ResolveError::MalformedInPlace(format!(".{path}")));
        }
        return Ok(HookAction::Assign {
            path: lhs.to_string(),
            value: rhs.to_string(),
        });
    }
    Ok(HookAction::Method {
        path: path.to_string(),
    })
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
