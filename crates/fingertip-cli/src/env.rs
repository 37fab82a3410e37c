// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variables the CLI reads, one function per variable. Mirrors
//! the flat free-function style of `oj-cli`'s own `env.rs`.

/// `FINGERTIP_DEBUG=1` — verbose logging.
pub fn debug() -> bool {
    is_set_to_one("FINGERTIP_DEBUG")
}

/// `FINGERTIP_IGNORE_CODE_CHANGES=1` — disable source-file fingerprint
/// checks in `Expiration::is_fresh`.
pub fn ignore_code_changes() -> bool {
    is_set_to_one("FINGERTIP_IGNORE_CODE_CHANGES")
}

/// `FINGERTIP_SETUP` — CoW-FS wizard behavior. The wizard itself lives
/// outside the core; this only exposes the mode so a future wizard
/// invocation point can read it without its own env plumbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupMode {
    Auto,
    Suggest,
    Never,
}

pub fn setup_mode() -> SetupMode {
    match std::env::var("FINGERTIP_SETUP").as_deref() {
        Ok("suggest") => SetupMode::Suggest,
        Ok("never") => SetupMode::Never,
        _ => SetupMode::Auto,
    }
}

/// `FINGERTIP_SETUP_SIZE` — backing-file size for the wizard, default `25G`.
pub fn setup_size() -> String {
    std::env::var("FINGERTIP_SETUP_SIZE").unwrap_or_else(|_| "25G".to_string())
}

/// `FINGERTIP_SAVIOUR` — mirror source chain, out of scope for the core;
/// exposed only so callers can pass it through to an external fetcher.
pub fn saviour() -> Option<String> {
    std::env::var("FINGERTIP_SAVIOUR").ok()
}

fn is_set_to_one(name: &str) -> bool {
    std::env::var(name).as_deref() == Ok("1")
}
