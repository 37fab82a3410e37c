use crate::prelude::Cache;

#[test]
fn rerunning_the_same_step_reuses_the_cache_entry() {
    let cache = Cache::new();
    cache.fingertip().args(&["exec", "true"]).passes();
    let after_first = cache.cache_entries();
    assert_eq!(after_first.len(), 1);

    cache.fingertip().args(&["exec", "true"]).passes();
    let after_second = cache.cache_entries();
    assert_eq!(
        after_second, after_first,
        "identical pipeline should reuse the existing cache entry rather than building a new one"
    );
}

#[test]
fn differing_arguments_produce_distinct_cache_entries() {
    let cache = Cache::new();
    cache.fingertip().args(&["exec", "true"]).passes();
    cache.fingertip().args(&["exec", "--check=False", "false"]).passes();

    assert_eq!(cache.cache_entries().len(), 2);
}

#[test]
fn plus_separated_pipeline_nests_a_cache_entry_per_step() {
    let cache = Cache::new();
    cache
        .fingertip()
        .args(&["backend.stub", "+", "exec", "true"])
        .passes();

    assert_eq!(
        cache.cache_entries().len(),
        2,
        "backend.stub and exec should each leave their own cache entry"
    );
}
