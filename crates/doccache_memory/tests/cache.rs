// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `InMemoryCache`.

use std::thread::sleep;
use std::time::Duration;

use doccache_memory::{InMemoryCache, InMemoryCacheBuilder};
use doccache_tier::{BlockingCache, CacheItem, ErrorKind};

fn block_on<F: Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

#[test]
fn new_creates_empty_cache() {
    assert_eq!(InMemoryCache::<i32>::new().entry_count(), 0);
    assert_eq!(InMemoryCache::<i32>::default().entry_count(), 0);
    assert_eq!(InMemoryCache::<i32>::with_capacity(10).entry_count(), 0);
}

#[test]
fn set_get_and_overwrite() {
    let cache = InMemoryCache::<String>::new();

    cache.set(CacheItem::without_ttl("k", "a".to_string())).unwrap();
    assert_eq!(cache.get("k").unwrap().as_deref(), Some("a"));

    cache.set(CacheItem::without_ttl("k", "b".to_string())).unwrap();
    assert_eq!(cache.get("k").unwrap().as_deref(), Some("b"));
    assert_eq!(cache.entry_count(), 1);
}

#[test]
fn missing_key_is_absent() {
    let cache = InMemoryCache::<i32>::new();

    let result = cache.get_result("missing").unwrap();
    assert!(!result.has_value());
    assert_eq!(result.value_or_default(), 0);
    assert!(!cache.exists("missing").unwrap());
}

#[test]
fn empty_key_is_rejected() {
    let cache = InMemoryCache::<i32>::new();

    let errors = [
        cache.set(CacheItem::without_ttl("", 1)).unwrap_err(),
        cache.add(CacheItem::without_ttl("", 1)).unwrap_err(),
        cache.get("").unwrap_err(),
        cache.exists("").unwrap_err(),
        cache.remove("").unwrap_err(),
        cache.key_expire("", Duration::from_secs(1)).unwrap_err(),
        block_on(doccache_tier::Cache::set(&cache, CacheItem::without_ttl("", 1))).unwrap_err(),
    ];

    for error in errors {
        assert_eq!(error.kind(), ErrorKind::InvalidKey);
    }
    assert_eq!(cache.entry_count(), 0);
}

#[test]
fn add_conflicts_with_live_entry() {
    let cache = InMemoryCache::<i32>::new();

    cache.add(CacheItem::without_ttl("k", 1)).unwrap();
    let error = cache.add(CacheItem::without_ttl("k", 2)).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Conflict);
    assert_eq!(cache.get("k").unwrap(), Some(1));
}

#[test]
fn remove_is_idempotent() {
    let cache = InMemoryCache::<i32>::new();
    cache.remove("never-written").unwrap();

    cache.set(CacheItem::without_ttl("k", 1)).unwrap();
    cache.remove("k").unwrap();
    cache.remove("k").unwrap();

    assert!(!cache.exists("k").unwrap());
    assert_eq!(cache.entry_count(), 0);
}

#[test]
fn item_ttl_overrides_default_ttl() {
    let cache = InMemoryCacheBuilder::<i32>::new()
        .default_ttl(Duration::from_millis(100))
        .build();

    cache.set(CacheItem::new("long", 1, Duration::from_secs(60))).unwrap();
    cache.set(CacheItem::without_ttl("default", 2)).unwrap();
    cache.set(CacheItem::new("never", 3, Duration::MAX)).unwrap();

    sleep(Duration::from_millis(300));

    assert!(cache.exists("long").unwrap());
    assert!(!cache.exists("default").unwrap());
    assert!(!cache.exists("never").unwrap());
}

#[test]
fn short_item_ttl_expires() {
    let cache = InMemoryCache::<i32>::new();

    cache.set(CacheItem::new("short", 1, Duration::from_millis(50))).unwrap();
    cache.set(CacheItem::without_ttl("forever", 2)).unwrap();
    sleep(Duration::from_millis(250));

    assert_eq!(cache.get("short").unwrap(), None);
    assert_eq!(cache.get("forever").unwrap(), Some(2));

    cache.add(CacheItem::without_ttl("short", 3)).unwrap();
    assert_eq!(cache.get("short").unwrap(), Some(3));
}

#[test]
fn key_expire_restarts_lifetime() {
    let cache = InMemoryCache::<i32>::new();

    cache.set(CacheItem::without_ttl("k", 1)).unwrap();
    cache.key_expire("k", Duration::from_millis(50)).unwrap();
    cache.key_expire("absent", Duration::from_millis(50)).unwrap();

    assert_eq!(cache.get("k").unwrap(), Some(1));
    assert!(!cache.exists("absent").unwrap());

    sleep(Duration::from_millis(250));
    assert!(!cache.exists("k").unwrap());
}

#[test]
fn async_form_matches_blocking_form() {
    use doccache_tier::Cache;

    let cache = InMemoryCache::<String>::new();

    block_on(Cache::set(&cache, CacheItem::without_ttl("k", "v".to_string()))).unwrap();
    assert_eq!(BlockingCache::get(&cache, "k").unwrap().as_deref(), Some("v"));
    assert!(block_on(Cache::exists(&cache, "k")).unwrap());

    let error = block_on(Cache::add(&cache, CacheItem::without_ttl("k", "w".to_string()))).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Conflict);

    block_on(Cache::remove(&cache, "k")).unwrap();
    assert_eq!(block_on(Cache::get(&cache, "k")).unwrap(), None);
}

#[test]
fn clones_share_entries() {
    let cache = InMemoryCache::<i32>::builder().name("shared").build();
    let handle = cache.clone();

    handle.set(CacheItem::without_ttl("k", 5)).unwrap();
    assert_eq!(cache.get("k").unwrap(), Some(5));
}

#[test]
fn capacity_bound_evicts() {
    let cache = InMemoryCacheBuilder::<u32>::new().max_capacity(10).initial_capacity(10).build();

    for i in 0..100 {
        cache.set(CacheItem::without_ttl(format!("k{i}"), i)).unwrap();
    }

    assert!(cache.entry_count() <= 10);
}
