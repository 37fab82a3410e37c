// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;
use std::time::Duration;

#[test]
fn fresh_before_deadline() {
    let exp = Expiration::new(1_000, Duration::from_secs(10));
    assert!(exp.is_fresh(1_500, false));
}

#[test]
fn stale_after_deadline() {
    let exp = Expiration::new(1_000, Duration::from_secs(10));
    assert!(!exp.is_fresh(11_001, false));
}

#[test]
fn cap_only_lowers_deadline() {
    let mut exp = Expiration::new(0, Duration::from_secs(100));
    let before = exp.deadline_ms();
    exp.cap(0, Duration::from_secs(10_000));
    assert_eq!(exp.deadline_ms(), before, "cap must never raise the deadline");

    exp.cap(0, Duration::from_secs(5));
    assert_eq!(exp.deadline_ms(), 5_000);
}

#[test]
fn unchanged_file_stays_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("setup.sh");
    fs::write(&file, b"echo hi").unwrap();

    let mut exp = Expiration::new(0, Duration::from_secs(3600));
    exp.depend_on_file(&file).unwrap();

    assert!(exp.is_fresh(1_000, false));
}

#[test]
fn changed_content_invalidates_even_with_kill_switch_off() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("setup.sh");
    fs::write(&file, b"echo hi").unwrap();

    let mut exp = Expiration::new(0, Duration::from_secs(3600));
    exp.depend_on_file(&file).unwrap();

    fs::write(&file, b"echo changed").unwrap();
    assert!(!exp.is_fresh(1_000, false));
}

#[test]
fn mtime_only_change_with_kill_switch_does_not_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("setup.sh");
    fs::write(&file, b"echo hi").unwrap();

    let mut exp = Expiration::new(0, Duration::from_secs(3600));
    exp.depend_on_file(&file).unwrap();

    // touch: rewrite identical content, which may still change mtime.
    fs::write(&file, b"echo hi").unwrap();

    assert!(exp.is_fresh(1_000, true));
}

#[test]
fn deleted_dependency_invalidates() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("setup.sh");
    fs::write(&file, b"echo hi").unwrap();

    let mut exp = Expiration::new(0, Duration::from_secs(3600));
    exp.depend_on_file(&file).unwrap();

    fs::remove_file(&file).unwrap();
    assert!(!exp.is_fresh(1_000, false));
}

#[test]
fn system_lib_paths_are_ignored() {
    assert!(is_ignored_system_path(Path::new("/usr/lib/python3/foo.py")));
    assert!(!is_ignored_system_path(Path::new("/home/user/project/foo.py")));
}
