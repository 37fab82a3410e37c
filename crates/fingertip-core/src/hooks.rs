// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hooks as data rather than closures: a registry mapping a hook name to an
//! ordered list of actions, all of it plain serializable structs so a
//! machine blob round-trips through disk without pickling anything.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::tag::StepArg;

/// A step descriptor: either a registered step name with its arguments, or
/// an in-place mutation of the machine (`.hooks.unseal`, `.ram.size=2G`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDescriptor {
    pub name: String,
    pub args: Vec<SerializableArg>,
}

/// Serializable mirror of [`StepArg`] (which intentionally doesn't derive
/// `Serialize`/`Deserialize` itself, to keep the tag module free of serde).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SerializableArg {
    Positional(String),
    Named(String, String),
}

impl From<&SerializableArg> for StepArg {
    fn from(arg: &SerializableArg) -> Self {
        match arg {
            SerializableArg::Positional(v) => StepArg::Positional(v.clone()),
            SerializableArg::Named(k, v) => StepArg::Named(k.clone(), v.clone()),
        }
    }
}

/// One entry in a hook list: a registered step to invoke, a method to call
/// on the machine or one of its extensions, or a plain attribute
/// assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HookAction {
    Step(StepDescriptor),
    Method { path: String },
    Assign { path: String, value: String },
}

/// The canonical hook names and the direction they fire in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookName {
    Load,
    Up,
    Down,
    Drop,
    Save,
    Clone,
    Unseal,
    Disrupt,
    Timesync,
}

impl HookName {
    /// `true` for hooks that fire in registration order, `false` for hooks
    /// that fire in reverse registration order.
    pub fn fires_forward(self) -> bool {
        !matches!(
            self,
            HookName::Down | HookName::Drop | HookName::Save
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HookName::Load => "load",
            HookName::Up => "up",
            HookName::Down => "down",
            HookName::Drop => "drop",
            HookName::Save => "save",
            HookName::Clone => "clone",
            HookName::Unseal => "unseal",
            HookName::Disrupt => "disrupt",
            HookName::Timesync => "timesync",
        }
    }
}

/// An ordered list of actions per hook name. Registration order is
/// preserved; firing direction is decided by [`HookName::fires_forward`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookRegistry {
    hooks: BTreeMap<HookName, Vec<HookAction>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: HookName, action: HookAction) {
        self.hooks.entry(name).or_default().push(action);
    }

    /// Actions for `name`, in the order they should fire (already reversed
    /// for reverse-firing hooks).
    pub fn ordered_actions(&self, name: HookName) -> Vec<&HookAction> {
        let Some(actions) = self.hooks.get(&name) else {
            return Vec::new();
        };
        if name.fires_forward() {
            actions.iter().collect()
        } else {
            actions.iter().rev().collect()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.values().all(|v| v.is_empty())
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
