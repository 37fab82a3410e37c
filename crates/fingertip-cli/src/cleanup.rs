// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fingertip cleanup` — expire cache entries, prune downloads/logs by
//! age, and remove stale scratch directories. Grounded in
//! `original_source/fingertip/plugins/cleanup.py`'s `machines`/`downloads`/
//! `logs` sub-dispatch, reimplemented here as a typed subcommand (spec §4.J)
//! rather than a registered pipeline step, since there is no pipeline to
//! build against a bare `cleanup` invocation.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::{Args, Subcommand};
use fingertip_core::parse_interval;
use fingertip_lock::Lockset;
use fingertip_paths::Paths;
use fingertip_store::{expire_machines, prune_by_age, prune_stale_scratch_dirs, CleanupReport};

#[derive(Args)]
pub struct CleanupArgs {
    #[command(subcommand)]
    pub what: CleanupTarget,
}

#[derive(Subcommand)]
pub enum CleanupTarget {
    /// Expire cache entries older than an interval, or `all` of them
    Machines {
        /// `all`, or an interval like `7d`, `4h`, `30m` (default: `0`)
        older_than: Option<String>,
    },
    /// Prune the HTTP/git download mirror cache
    Downloads {
        /// Interval like `7d`, `4h`, `30m` (default: `0`)
        older_than: Option<String>,
    },
    /// Prune persisted run logs
    Logs {
        /// Interval like `7d`, `4h`, `30m` (default: `0`)
        older_than: Option<String>,
    },
    /// Remove scratch directories left behind by crashed processes
    Tmp,
}

pub fn run(args: CleanupArgs) -> anyhow::Result<()> {
    let paths = Paths::resolve();
    paths.ensure_base_dirs()?;
    let lockset = Lockset::new();
    let now_ms = now_ms();

    let report = match args.what {
        CleanupTarget::Machines { older_than } => {
            let max_age = match older_than.as_deref() {
                None => Some(Duration::ZERO),
                Some("all") => None,
                Some(interval) => Some(parse_interval(interval)?),
            };
            expire_machines(&paths, &lockset, max_age, now_ms)
        }
        CleanupTarget::Downloads { older_than } => {
            let max_age = parse_interval(older_than.as_deref().unwrap_or("0"))?;
            prune_by_age(&paths.downloads(), max_age, now_ms)
        }
        CleanupTarget::Logs { older_than } => {
            let max_age = parse_interval(older_than.as_deref().unwrap_or("0"))?;
            prune_by_age(&paths.logs(), max_age, now_ms)
        }
        CleanupTarget::Tmp => prune_stale_scratch_dirs(&paths, Duration::ZERO, now_ms),
    };

    report_outcome(&report);
    Ok(())
}

fn report_outcome(report: &CleanupReport) {
    for path in &report.removed {
        tracing::info!(path = %path.display(), "removed");
    }
    for (path, reason) in &report.skipped {
        tracing::warn!(path = %path.display(), reason, "skipped");
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "cleanup_tests.rs"]
mod tests;
