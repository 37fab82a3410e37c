// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    loaded   = { MachineState::Loaded, true },
    spun_up  = { MachineState::SpunUp, true },
    spun_down = { MachineState::SpunDown, false },
    saving   = { MachineState::Saving, false },
    saved    = { MachineState::Saved, false },
    dropped  = { MachineState::Dropped, false },
)]
fn scope_entry_allowed_only_from_loaded_or_spun_up(state: MachineState, expected: bool) {
    assert_eq!(state.can_enter_scope(), expected);
}

#[test]
fn only_dropped_is_terminal() {
    assert!(MachineState::Dropped.is_terminal());
    assert!(!MachineState::Saved.is_terminal());
    assert!(!MachineState::SpunDown.is_terminal());
}

#[test]
fn display_matches_snake_case_serde() {
    assert_eq!(MachineState::SpunUp.to_string(), "spun_up");
    assert_eq!(
        serde_json::to_string(&MachineState::SpunUp).unwrap(),
        "\"spun_up\""
    );
}

#[test]
fn serde_roundtrip() {
    for state in [
        MachineState::Loaded,
        MachineState::SpunUp,
        MachineState::SpunDown,
        MachineState::Saving,
        MachineState::Saved,
        MachineState::Dropped,
    ] {
        let json = serde_json::to_string(&state).unwrap();
        let back: MachineState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
