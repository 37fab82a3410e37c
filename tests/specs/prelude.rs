//! Test helpers for black-box behavioral specifications: invoke the
//! `fingertip` binary against an isolated, per-test cache root and assert
//! on stdout/stderr/exit code and the resulting on-disk cache layout.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::Command;

/// Returns the path to the `fingertip` binary, the way `cargo test` lays
/// out the workspace's target directory.
fn binary_path() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let standard = manifest_dir.join("target/debug/fingertip");
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join("fingertip");
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// Recursively walk `dir`, collecting every directory that is itself a
/// real cache entry (carries `machine.json`), including ones nested inside
/// another entry's directory.
fn collect_cache_entries(dir: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() || path.is_symlink() {
            continue;
        }
        if path.join("machine.json").exists() {
            found.push(path.clone());
        }
        collect_cache_entries(&path, found);
    }
}

/// A fresh cache root for one test, plus a builder for `fingertip`
/// invocations scoped to it.
pub struct Cache {
    root: tempfile::TempDir,
}

impl Cache {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn machines_dir(&self) -> PathBuf {
        self.path().join("machines")
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.path().join("downloads")
    }

    /// Real, non-symlink cache entries anywhere under `machines/`, including
    /// ones nested inside a predecessor step's own cache entry.
    pub fn cache_entries(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        collect_cache_entries(&self.machines_dir(), &mut found);
        found
    }

    pub fn fingertip(&self) -> CliBuilder {
        cli().env("FINGERTIP_CACHE_DIR", self.path())
    }
}

pub struct CliBuilder {
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((
            key.to_string(),
            value.as_ref().to_string_lossy().to_string(),
        ));
        self
    }

    pub fn command(self) -> Command {
        let mut cmd = Command::new(binary_path());
        cmd.args(&self.args);
        cmd.env_remove("FINGERTIP_CACHE_DIR");
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    pub fn run(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("fingertip should spawn");
        RunAssert { output }
    }

    pub fn passes(self) -> RunAssert {
        let assert = self.run();
        assert!(
            assert.output.status.success(),
            "expected success, got exit code {:?}\nstdout: {}\nstderr: {}",
            assert.output.status.code(),
            assert.stdout(),
            assert.stderr()
        );
        assert
    }

    pub fn fails(self) -> RunAssert {
        let assert = self.run();
        assert!(
            !assert.output.status.success(),
            "expected failure, but it passed\nstdout: {}",
            assert.stdout()
        );
        assert
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    pub fn code_eq(self, expected: i32) -> Self {
        assert_eq!(self.code(), Some(expected));
        self
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        assert!(
            self.stdout().contains(expected),
            "stdout does not contain {:?}\nstdout: {}",
            expected,
            self.stdout()
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        assert!(
            self.stderr().contains(expected),
            "stderr does not contain {:?}\nstderr: {}",
            expected,
            self.stderr()
        );
        self
    }
}
