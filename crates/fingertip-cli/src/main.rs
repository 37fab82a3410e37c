// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fingertip - construct, cache, and re-use ephemeral machines as
//! composable build artifacts.

mod cleanup;
mod env;
mod exit_error;
mod pipeline;

use clap::{Parser, Subcommand};

use exit_error::ExitError;

#[derive(Parser)]
#[command(
    name = "fingertip",
    version,
    about = "Construct, cache, and re-use ephemeral machines as composable build artifacts"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Expire or prune entries from the cache
    Cleanup(cleanup::CleanupArgs),
    /// A pipeline of step descriptors, e.g. `backend.qemu + os.fedora --version=40`
    #[command(external_subcommand)]
    Pipeline(Vec<String>),
}

fn main() {
    init_tracing();
    if let Err(e) = run() {
        let code = e.downcast_ref::<ExitError>().map_or(1, |exit| exit.code);
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {msg}");
        }
        std::process::exit(code);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        None => Err(ExitError::new(1, "no step specified").into()),
        Some(Commands::Cleanup(args)) => cleanup::run(args),
        Some(Commands::Pipeline(tokens)) => pipeline::run(&tokens),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if env::debug() { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// Format an anyhow error, deduplicating the source chain when the
/// top-level message already contains it (common with `#[from]` variants).
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();
    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {i}: {cause}"));
    }
    buf
}
