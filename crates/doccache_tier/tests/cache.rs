// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the default methods of the cache traits.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use doccache_tier::{BlockingCache, Cache, CacheItem, CacheResult, Error, ErrorKind, Result};

/// Minimal implementation that only provides required methods.
struct MinimalCache {
    data: Mutex<HashMap<String, i32>>,
}

impl MinimalCache {
    fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }

    fn lookup(&self, key: &str) -> CacheResult<i32> {
        self.data.lock().expect("lock poisoned").get(key).copied().into()
    }

    fn write(&self, item: CacheItem<i32>, only_if_absent: bool) -> Result<()> {
        let mut data = self.data.lock().expect("lock poisoned");
        if only_if_absent && data.contains_key(item.key()) {
            return Err(Error::from_kind(ErrorKind::Conflict));
        }
        let (key, value, _) = item.into_parts();
        data.insert(key, value);
        Ok(())
    }
}

impl Cache<i32> for MinimalCache {
    async fn get_result(&self, key: &str) -> Result<CacheResult<i32>> {
        Ok(self.lookup(key))
    }

    async fn set(&self, item: CacheItem<i32>) -> Result<()> {
        self.write(item, false)
    }

    async fn add(&self, item: CacheItem<i32>) -> Result<()> {
        self.write(item, true)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.data.lock().expect("lock poisoned").remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.lookup(key).has_value())
    }

    async fn key_expire(&self, _key: &str, _ttl: Duration) -> Result<()> {
        Err(Error::from_kind(ErrorKind::Unsupported))
    }
}

impl BlockingCache<i32> for MinimalCache {
    fn get_result(&self, key: &str) -> Result<CacheResult<i32>> {
        Ok(self.lookup(key))
    }

    fn set(&self, item: CacheItem<i32>) -> Result<()> {
        self.write(item, false)
    }

    fn add(&self, item: CacheItem<i32>) -> Result<()> {
        self.write(item, true)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.data.lock().expect("lock poisoned").remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.lookup(key).has_value())
    }

    fn key_expire(&self, _key: &str, _ttl: Duration) -> Result<()> {
        Err(Error::from_kind(ErrorKind::Unsupported))
    }
}

#[tokio::test]
async fn default_get_unwraps_result() {
    let cache = MinimalCache::new();
    assert_eq!(Cache::get(&cache, "key").await.expect("get"), None);

    Cache::set(&cache, CacheItem::without_ttl("key", 42)).await.expect("set");
    assert_eq!(Cache::get(&cache, "key").await.expect("get"), Some(42));
}

#[test]
fn default_blocking_get_unwraps_result() {
    let cache = MinimalCache::new();
    assert_eq!(BlockingCache::get(&cache, "key").expect("get"), None);

    BlockingCache::set(&cache, CacheItem::without_ttl("key", 7)).expect("set");
    assert_eq!(BlockingCache::get(&cache, "key").expect("get"), Some(7));
}

#[tokio::test]
async fn both_forms_observe_the_same_state() {
    let cache = MinimalCache::new();
    BlockingCache::add(&cache, CacheItem::without_ttl("shared", 1)).expect("add");

    let error = Cache::add(&cache, CacheItem::without_ttl("shared", 2)).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Conflict);
    assert!(Cache::exists(&cache, "shared").await.expect("exists"));

    Cache::remove(&cache, "shared").await.expect("remove");
    assert!(!BlockingCache::exists(&cache, "shared").expect("exists"));
}

#[tokio::test]
async fn unsupported_key_expire_is_detectable() {
    let cache = MinimalCache::new();
    let error = Cache::key_expire(&cache, "key", Duration::from_secs(1)).await.unwrap_err();
    assert!(error.is_unsupported());
}
