// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The machine lifecycle state, shared between the in-process `Machine`
//! object and anything that needs to reason about it (persistence, tests).

use serde::{Deserialize, Serialize};

/// A machine's position in its lifecycle.
///
/// ```text
/// clone/build -> Loaded -> (scope enter) -> SpunUp
///   SpunUp -> scope exit (normal, persistent) -> SpunDown -> finalize -> Saving -> Saved
///   SpunUp -> scope exit (exception OR transient) -> Dropped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineState {
    /// Deserialized from disk (or freshly cloned), not yet entered a scope
    /// in this process.
    Loaded,
    /// `up_counter > 0`: live in this process.
    SpunUp,
    /// Resting state between a successful `down` and persistence/discard.
    SpunDown,
    /// Transient state entered only by `finalize`, while writing to disk.
    Saving,
    /// Informational label only; carries no transition logic of its own.
    /// The canonical terminal states are `Dropped` and "published"
    /// (inferable from the on-disk symlink).
    Saved,
    /// Terminal: scratch directory has been removed.
    Dropped,
}

impl MachineState {
    /// True for the two states a scoped acquisition may enter from, per the
    /// state machine invariant: "`loaded` state machine never spun up in
    /// current process; must scope-acquire to mutate."
    pub fn can_enter_scope(self) -> bool {
        matches!(self, MachineState::Loaded | MachineState::SpunUp)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, MachineState::Dropped)
    }
}

impl std::fmt::Display for MachineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MachineState::Loaded => "loaded",
            MachineState::SpunUp => "spun_up",
            MachineState::SpunDown => "spun_down",
            MachineState::Saving => "saving",
            MachineState::Saved => "saved",
            MachineState::Dropped => "dropped",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
