// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory cache implementation using moka.

use std::time::{Duration, Instant};

use doccache_tier::{BlockingCache, Cache, CacheItem, CacheResult, Error, ErrorKind, Result, validate_key};
use moka::Expiry;
use moka::ops::compute::Op;
use moka::sync::Cache as MokaCache;

use crate::builder::InMemoryCacheBuilder;

#[derive(Clone, Debug)]
struct Slot<V> {
    value: V,
    ttl: Option<Duration>,
}

/// Expires each entry after its own TTL, falling back to the cache default.
#[derive(Debug)]
struct SlotExpiry {
    default_ttl: Option<Duration>,
}

impl SlotExpiry {
    fn ttl<V>(&self, slot: &Slot<V>) -> Option<Duration> {
        slot.ttl.or(self.default_ttl)
    }
}

impl<V> Expiry<String, Slot<V>> for SlotExpiry {
    fn expire_after_create(&self, _key: &String, value: &Slot<V>, _created_at: Instant) -> Option<Duration> {
        self.ttl(value)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Slot<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        self.ttl(value)
    }
}

/// A concurrent in-memory cache with per-item TTL, backed by moka.
///
/// Items written with a TTL expire after it; items written without one take
/// the builder's default TTL, or never expire when none is configured. Unlike
/// document-backed caches, [`key_expire`](BlockingCache::key_expire) is
/// supported: it keeps the value and restarts its lifetime with the new TTL.
///
/// Every operation rejects an empty key with
/// [`ErrorKind::InvalidKey`](doccache_tier::ErrorKind::InvalidKey).
///
/// Clones share the same entries.
///
/// # Examples
///
/// ```
/// use doccache_memory::InMemoryCache;
/// use doccache_tier::{BlockingCache, CacheItem};
/// use std::time::Duration;
///
/// let cache = InMemoryCache::<i32>::new();
/// cache.set(CacheItem::new("key", 42, Duration::from_secs(60)))?;
/// assert_eq!(cache.get("key")?, Some(42));
/// # Ok::<(), doccache_tier::Error>(())
/// ```
#[derive(Clone)]
pub struct InMemoryCache<V> {
    inner: MokaCache<String, Slot<V>>,
}

impl<V> std::fmt::Debug for InMemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCache")
            .field("name", &self.inner.name())
            .field("entry_count", &self.inner.entry_count())
            .finish_non_exhaustive()
    }
}

impl<V> Default for InMemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> InMemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates an unbounded cache without a default TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a cache holding at most `max_capacity` entries.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self::builder().max_capacity(max_capacity).build()
    }

    /// Creates a builder for configuring an in-memory cache.
    #[must_use]
    pub fn builder() -> InMemoryCacheBuilder<V> {
        InMemoryCacheBuilder::new()
    }

    pub(crate) fn from_builder(builder: &InMemoryCacheBuilder<V>) -> Self {
        let mut moka_builder = MokaCache::builder().expire_after(SlotExpiry {
            default_ttl: builder.default_ttl,
        });

        if let Some(capacity) = builder.max_capacity {
            moka_builder = moka_builder.max_capacity(capacity);
        }

        if let Some(capacity) = builder.initial_capacity {
            moka_builder = moka_builder.initial_capacity(capacity);
        }

        if let Some(name) = builder.name.as_deref() {
            moka_builder = moka_builder.name(name);
        }

        Self {
            inner: moka_builder.build(),
        }
    }

    /// Returns the approximate number of live entries.
    ///
    /// Expired and removed entries are reclaimed lazily, so the count may lag
    /// behind recent writes.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }

    fn do_get(&self, key: &str) -> Result<CacheResult<V>> {
        validate_key(key)?;
        Ok(self.inner.get(key).map(|slot| slot.value).into())
    }

    fn do_set(&self, item: CacheItem<V>) -> Result<()> {
        validate_key(item.key())?;
        let (key, value, ttl) = item.into_parts();
        self.inner.insert(key, Slot { value, ttl });
        Ok(())
    }

    fn do_add(&self, item: CacheItem<V>) -> Result<()> {
        validate_key(item.key())?;
        let (key, value, ttl) = item.into_parts();
        let entry = self.inner.entry(key).or_insert_with(|| Slot { value, ttl });

        if entry.is_fresh() {
            Ok(())
        } else {
            Err(Error::from_cause(
                ErrorKind::Conflict,
                format!("key '{}' already exists", entry.key()),
            ))
        }
    }

    fn do_remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.inner.invalidate(key);
        Ok(())
    }

    fn do_exists(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.inner.contains_key(key))
    }

    /// Restarts the lifetime of a live entry with `ttl`. Absent keys are left absent.
    fn do_key_expire(&self, key: &str, ttl: Duration) -> Result<()> {
        validate_key(key)?;
        self.inner.entry(key.to_string()).and_compute_with(|existing| match existing {
            Some(entry) => Op::Put(Slot {
                value: entry.into_value().value,
                ttl: (ttl != Duration::MAX).then_some(ttl),
            }),
            None => Op::Nop,
        });
        Ok(())
    }
}

impl<V> Cache<V> for InMemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
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

impl<V> BlockingCache<V> for InMemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
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

    #[test]
    fn item_ttl_wins_over_default() {
        let expiry = SlotExpiry {
            default_ttl: Some(Duration::from_secs(2)),
        };

        let own = Slot {
            value: 1,
            ttl: Some(Duration::from_secs(6)),
        };
        let inherited = Slot { value: 2, ttl: None };

        assert_eq!(expiry.ttl(&own), Some(Duration::from_secs(6)));
        assert_eq!(expiry.ttl(&inherited), Some(Duration::from_secs(2)));
        assert_eq!(SlotExpiry { default_ttl: None }.ttl(&inherited), None);
    }

    #[test]
    fn debug_shows_name() {
        let cache = InMemoryCache::<i32>::builder().name("named").build();
        assert!(format!("{cache:?}").contains("named"));
    }
}
