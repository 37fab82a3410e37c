use crate::prelude::Cache;

#[test]
fn cleanup_machines_all_removes_every_cache_entry() {
    let cache = Cache::new();
    cache.fingertip().args(&["exec", "true"]).passes();
    assert_eq!(cache.cache_entries().len(), 1);

    cache.fingertip().args(&["cleanup", "machines", "all"]).passes();
    assert!(cache.cache_entries().is_empty());
}

#[test]
fn cleanup_machines_with_no_interval_only_expires_entries_past_their_deadline() {
    let cache = Cache::new();
    cache.fingertip().args(&["exec", "true"]).passes();
    assert_eq!(cache.cache_entries().len(), 1);

    cache.fingertip().args(&["cleanup", "machines"]).passes();
    assert_eq!(
        cache.cache_entries().len(),
        1,
        "a freshly built entry has not reached its default expiration deadline yet"
    );
}
