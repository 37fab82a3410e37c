use crate::prelude::Cache;
use std::fs;

#[test]
fn cleanup_tmp_removes_leftover_scratch_directories() {
    let cache = Cache::new();
    let machines = cache.machines_dir();
    fs::create_dir_all(machines.join(format!("{}abandoned", fingertip_store::SCRATCH_PREFIX))).unwrap();

    cache.fingertip().args(&["cleanup", "tmp"]).passes();

    assert!(!machines.join(format!("{}abandoned", fingertip_store::SCRATCH_PREFIX)).exists());
}
