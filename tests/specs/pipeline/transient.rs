use crate::prelude::Cache;

#[test]
fn a_transient_wrapped_step_leaves_no_cache_entry() {
    let cache = Cache::new();
    cache
        .fingertip()
        .args(&["backend.stub", "+", "transient", "exec", "true"])
        .passes();

    assert_eq!(
        cache.cache_entries().len(),
        1,
        "only backend.stub should be cached; the transient-wrapped exec must not persist"
    );
}

#[test]
fn a_trailing_transient_token_with_nothing_to_wrap_is_dropped() {
    let cache = Cache::new();
    cache
        .fingertip()
        .args(&["backend.stub", "+", "transient"])
        .passes();

    assert_eq!(cache.cache_entries().len(), 1);
}
