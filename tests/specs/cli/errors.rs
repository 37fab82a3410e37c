use crate::prelude::Cache;

#[test]
fn a_failing_step_propagates_a_nonzero_exit_code() {
    let cache = Cache::new();
    cache
        .fingertip()
        .args(&["exec", "false"])
        .fails()
        .stderr_has("Error:");
}

#[test]
fn an_unparseable_cleanup_interval_is_reported_and_fails() {
    let cache = Cache::new();
    cache
        .fingertip()
        .args(&["cleanup", "downloads", "not-an-interval"])
        .fails()
        .stderr_has("Error:");
}

#[test]
fn unknown_pipeline_descriptor_fails_rather_than_silently_succeeding() {
    let cache = Cache::new();
    cache
        .fingertip()
        .args(&["no.such.step"])
        .fails();
}
