// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cache tag construction: `module.path:pos0:pos1:key=val:...`, with long
//! or filename-unsafe argument tails collapsed to a short digest.

use sha2::{Digest, Sha224};

const MAX_TAIL_LEN: usize = 20;

/// A positional or named step argument, already rendered to its canonical
/// string form by the caller.
#[derive(Debug, Clone)]
pub enum StepArg {
    Positional(String),
    Named(String, String),
}

/// Weak hash used for collapsing long/unsafe tag tails: the first 8 hex
/// characters of a SHA-224 digest.
pub fn weak_hash(s: &str) -> String {
    let digest = Sha224::digest(s.as_bytes());
    let hex = format!("{digest:x}");
    hex[..8].to_string()
}

/// Build the canonical cache tag for a step `name` given its positional and
/// named arguments. Named arguments are sorted by key before joining, per
/// the canonical grammar.
pub fn build_tag(name: &str, args: &[StepArg]) -> String {
    let mut positionals = Vec::new();
    let mut named: Vec<(String, String)> = Vec::new();

    for arg in args {
        match arg {
            StepArg::Positional(v) => positionals.push(v.clone()),
            StepArg::Named(k, v) => named.push((k.clone(), v.clone())),
        }
    }
    named.sort_by(|a, b| a.0.cmp(&b.0));

    let mut parts: Vec<String> = positionals;
    parts.extend(named.into_iter().map(|(k, v)| format!("{k}={v}")));

    let mut args_str = parts.join(":");

    if !args_str.is_empty() && needs_collapsing(&args_str) {
        args_str = format!("::{}", weak_hash(&args_str));
    }

    if args_str.is_empty() {
        name.to_string()
    } else {
        format!("{name}:{args_str}")
    }
}

fn needs_collapsing(s: &str) -> bool {
    s.contains(' ') || s.contains('/') || s.len() > MAX_TAIL_LEN
}

#[cfg(test)]
#[path = "tag_tests.rs"]
mod tests;
