// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock cache implementation for testing.
//!
//! This module provides `MockCache`, an in-memory implementation of both cache
//! traits that records all operations and supports failure injection for
//! testing error paths in code written against the cache contract.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{BlockingCache, Cache, CacheItem, CacheResult, Error, ErrorKind, Result};

/// Recorded cache operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp<V> {
    /// A read (`get`, `get_result` or `exists`) of the given key.
    Get(String),
    /// A `set` of the given item.
    Set(CacheItem<V>),
    /// An `add` of the given item.
    Add(CacheItem<V>),
    /// A `remove` of the given key.
    Remove(String),
    /// A `key_expire` of the given key.
    KeyExpire {
        /// The key whose expiry was changed.
        key: String,
        /// The requested TTL.
        ttl: Duration,
    },
}

type FailPredicate<V> = Box<dyn Fn(&CacheOp<V>) -> Option<ErrorKind> + Send + Sync>;

/// A configurable mock cache for testing.
///
/// Values are stored without expiry; the TTL of each write is available
/// through [`MockCache::operations`]. Clones share state, so a test can keep a
/// handle for inspection while handing another to the code under test.
///
/// # Examples
///
/// ```
/// use doccache_tier::testing::{CacheOp, MockCache};
/// use doccache_tier::{BlockingCache, CacheItem, ErrorKind};
///
/// let cache = MockCache::<i32>::new();
/// cache.set(CacheItem::without_ttl("key", 42)).unwrap();
/// assert_eq!(cache.get("key").unwrap(), Some(42));
///
/// cache.fail_when(|op| matches!(op, CacheOp::Get(_)).then_some(ErrorKind::Throttled));
/// assert_eq!(cache.get("key").unwrap_err().kind(), ErrorKind::Throttled);
/// ```
pub struct MockCache<V> {
    data: Arc<Mutex<HashMap<String, V>>>,
    operations: Arc<Mutex<Vec<CacheOp<V>>>>,
    fail_when: Arc<Mutex<Option<FailPredicate<V>>>>,
}

impl<V: std::fmt::Debug> std::fmt::Debug for MockCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCache")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl<V> Clone for MockCache<V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl<V> Default for MockCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MockCache<V> {
    /// Creates a new empty mock cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns `true` if an entry is stored for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Sets a predicate deciding which operations fail and with which kind.
    ///
    /// Failed operations are still recorded but leave the stored data untouched.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&CacheOp<V>) -> Option<ErrorKind> + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }
}

impl<V: Clone> MockCache<V> {
    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<CacheOp<V>> {
        self.operations.lock().clone()
    }

    fn record(&self, op: CacheOp<V>) -> Result<()> {
        let failure = self.fail_when.lock().as_ref().and_then(|predicate| predicate(&op));
        self.operations.lock().push(op);
        match failure {
            Some(kind) => Err(Error::from_cause(kind, "mock: injected failure")),
            None => Ok(()),
        }
    }

    fn do_get(&self, key: &str) -> Result<CacheResult<V>> {
        self.record(CacheOp::Get(key.to_string()))?;
        Ok(self.data.lock().get(key).cloned().into())
    }

    fn do_set(&self, item: CacheItem<V>) -> Result<()> {
        self.record(CacheOp::Set(item.clone()))?;
        let (key, value, _) = item.into_parts();
        self.data.lock().insert(key, value);
        Ok(())
    }

    fn do_add(&self, item: CacheItem<V>) -> Result<()> {
        self.record(CacheOp::Add(item.clone()))?;
        let (key, value, _) = item.into_parts();
        let mut data = self.data.lock();
        if data.contains_key(&key) {
            return Err(Error::from_cause(ErrorKind::Conflict, format!("mock: key '{key}' already exists")));
        }
        data.insert(key, value);
        Ok(())
    }

    fn do_remove(&self, key: &str) -> Result<()> {
        self.record(CacheOp::Remove(key.to_string()))?;
        self.data.lock().remove(key);
        Ok(())
    }

    fn do_exists(&self, key: &str) -> Result<bool> {
        self.record(CacheOp::Get(key.to_string()))?;
        Ok(self.data.lock().contains_key(key))
    }

    fn do_key_expire(&self, key: &str, ttl: Duration) -> Result<()> {
        self.record(CacheOp::KeyExpire {
            key: key.to_string(),
            ttl,
        })
    }
}

impl<V> Cache<V> for MockCache<V>
where
    V: Clone + Send + Sync,
{
    async fn get_result(&self, key: &str) -> Result<CacheResult<V>> {
        self.do_get(key)
    }

    async fn set(&self, item: CacheItem<V>) -> Result<()> {
        self.do_set(item)
    }

    async fn add(&self, item: CacheItem<V>) -> Result<()> {
        self.do_add(item)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.do_remove(key)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.do_exists(key)
    }

    async fn key_expire(&self, key: &str, ttl: Duration) -> Result<()> {
        self.do_key_expire(key, ttl)
    }
}

impl<V> BlockingCache<V> for MockCache<V>
where
    V: Clone + Send + Sync,
{
    fn get_result(&self, key: &str) -> Result<CacheResult<V>> {
        self.do_get(key)
    }

    fn set(&self, item: CacheItem<V>) -> Result<()> {
        self.do_set(item)
    }

    fn add(&self, item: CacheItem<V>) -> Result<()> {
        self.do_add(item)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.do_remove(key)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        self.do_exists(key)
    }

    fn key_expire(&self, key: &str, ttl: Duration) -> Result<()> {
        self.do_key_expire(key, ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn records_operations_in_order() {
        let cache = MockCache::<String>::new();
        let item = CacheItem::new("a", "x".to_string(), Duration::from_secs(3));

        block_on(Cache::set(&cache, item.clone())).unwrap();
        assert_eq!(block_on(Cache::get(&cache, "a")).unwrap().as_deref(), Some("x"));
        BlockingCache::remove(&cache, "a").unwrap();

        assert_eq!(
            cache.operations(),
            vec![CacheOp::Set(item), CacheOp::Get("a".to_string()), CacheOp::Remove("a".to_string())]
        );
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn add_conflicts_on_existing_key() {
        let cache = MockCache::<i32>::new();
        BlockingCache::add(&cache, CacheItem::without_ttl("k", 1)).unwrap();

        let error = BlockingCache::add(&cache, CacheItem::without_ttl("k", 2)).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Conflict);
        assert_eq!(BlockingCache::get(&cache, "k").unwrap(), Some(1));
    }

    #[test]
    fn injected_failures_leave_data_untouched() {
        let cache = MockCache::<i32>::new();
        cache.fail_when(|op| matches!(op, CacheOp::Set(_)).then_some(ErrorKind::StoreUnavailable));

        let error = block_on(Cache::set(&cache, CacheItem::without_ttl("k", 1))).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::StoreUnavailable);
        assert!(!cache.contains_key("k"));
        assert_eq!(cache.operations().len(), 1);

        cache.clear_failures();
        block_on(Cache::set(&cache, CacheItem::without_ttl("k", 1))).unwrap();
        assert!(cache.contains_key("k"));
    }

    #[test]
    fn key_expire_is_recorded() {
        let cache = MockCache::<i32>::new();
        block_on(Cache::key_expire(&cache, "k", Duration::from_secs(9))).unwrap();
        assert_eq!(
            cache.operations(),
            vec![CacheOp::KeyExpire {
                key: "k".to_string(),
                ttl: Duration::from_secs(9)
            }]
        );

        cache.clear_operations();
        assert!(cache.operations().is_empty());
    }

    #[test]
    fn clones_share_state() {
        let cache = MockCache::<i32>::default();
        let handle = cache.clone();
        BlockingCache::set(&handle, CacheItem::without_ttl("k", 5)).unwrap();
        assert!(BlockingCache::exists(&cache, "k").unwrap());
    }
}
