// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline-token grammar and the driver that runs a parsed pipeline
//! through the cache-aware executor. Grounded in
//! `original_source/fingertip/main.py`'s `parse_subcmd`/`parse_kwarg`:
//! `+` groups tokens into steps, bare tokens are positional arguments,
//! `--key=val` are named arguments, a bare `--key` is `key=True`, and
//! `--no-key` is `key=False`.

use fingertip_core::{StepArg, SystemClock, UuidIdGen};
use fingertip_engine::{resolve_transient_wrappers, ApplyResult, Executor};
use fingertip_paths::Paths;
use fingertip_steps::{register_builtins, StepRegistry};

use crate::env;
use crate::exit_error::ExitError;

/// Group raw tokens on the literal `+` separator, then parse each group
/// into a step descriptor plus its arguments.
fn parse_steps(tokens: &[String]) -> Vec<(String, Vec<StepArg>)> {
    let mut groups: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for token in tokens {
        if token == "+" {
            if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
        } else {
            current.push(token.as_str());
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }

    groups
        .into_iter()
        .filter_map(|group| {
            let mut tokens = group.into_iter();
            let descriptor = tokens.next()?.to_string();
            let args = tokens.map(parse_arg).collect();
            Some((descriptor, args))
        })
        .collect()
}

fn parse_arg(token: &str) -> StepArg {
    let Some(flag) = token.strip_prefix("--") else {
        return StepArg::Positional(token.to_string());
    };

    if let Some(key) = flag.strip_prefix("no-") {
        return StepArg::Named(key.replace('-', "_"), "False".to_string());
    }
    match flag.split_once('=') {
        Some((key, val)) => StepArg::Named(key.replace('-', "_"), val.to_string()),
        None => StepArg::Named(flag.replace('-', "_"), "True".to_string()),
    }
}

/// Run the pipeline described by `tokens` to completion.
pub fn run(tokens: &[String]) -> anyhow::Result<()> {
    let resolved = resolve_transient_wrappers(parse_steps(tokens));
    let mut steps = resolved.into_iter();
    let Some(first) = steps.next() else {
        return Err(ExitError::new(1, "no step specified").into());
    };
    let rest: Vec<_> = steps.collect();

    let paths = Paths::resolve();
    paths.ensure_base_dirs()?;
    let mut registry = StepRegistry::new();
    register_builtins(&mut registry);
    let executor = Executor::new(registry, paths, SystemClock, UuidIdGen)
        .with_ignore_code_changes(env::ignore_code_changes());

    let last_index = rest.len().saturating_sub(1);
    let first_args: Vec<StepArg> = first.args.iter().map(StepArg::from).collect();
    let mut machine = executor.build(
        &first.descriptor,
        &first_args,
        rest.is_empty(),
        first.force_transient,
    )?;

    for (index, step) in rest.into_iter().enumerate() {
        let args: Vec<StepArg> = step.args.iter().map(StepArg::from).collect();
        if let ApplyResult::Replaced(next) = executor.apply(
            &mut machine,
            &step.descriptor,
            &args,
            index == last_index,
            step.force_transient,
        )? {
            machine = next;
        }
    }

    tracing::info!(path = %machine.path().display(), "pipeline complete");
    Ok(())
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
