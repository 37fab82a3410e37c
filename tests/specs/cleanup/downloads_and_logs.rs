use crate::prelude::Cache;
use std::fs;

#[test]
fn cleanup_downloads_with_a_generous_interval_spares_fresh_files() {
    let cache = Cache::new();
    let downloads = cache.downloads_dir();
    fs::create_dir_all(&downloads).unwrap();
    fs::write(downloads.join("mirror.tar"), b"data").unwrap();

    cache
        .fingertip()
        .args(&["cleanup", "downloads", "1h"])
        .passes();

    assert!(downloads.join("mirror.tar").exists());
}

#[test]
fn cleanup_downloads_with_zero_interval_removes_everything() {
    let cache = Cache::new();
    let downloads = cache.downloads_dir();
    fs::create_dir_all(&downloads).unwrap();
    fs::write(downloads.join("mirror.tar"), b"data").unwrap();

    cache.fingertip().args(&["cleanup", "downloads"]).passes();

    assert!(!downloads.join("mirror.tar").exists());
}

#[test]
fn cleanup_logs_rejects_an_unparseable_interval() {
    let cache = Cache::new();
    cache
        .fingertip()
        .args(&["cleanup", "logs", "not-an-interval"])
        .fails();
}
