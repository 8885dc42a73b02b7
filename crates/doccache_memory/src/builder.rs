// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring in-memory caches.
//!
//! The builder keeps moka's types out of the public API.

use std::marker::PhantomData;
use std::time::Duration;

use crate::cache::InMemoryCache;

/// Builder for configuring an [`InMemoryCache`].
///
/// # Examples
///
/// ```
/// use doccache_memory::InMemoryCache;
/// use std::time::Duration;
///
/// let cache = InMemoryCache::<i32>::builder()
///     .max_capacity(1000)
///     .default_ttl(Duration::from_secs(300))
///     .initial_capacity(100)
///     .name("my-cache")
///     .build();
/// ```
#[derive(Debug)]
pub struct InMemoryCacheBuilder<V> {
    pub(crate) max_capacity: Option<u64>,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) default_ttl: Option<Duration>,
    pub(crate) name: Option<String>,
    _value: PhantomData<fn() -> V>,
}

impl<V> Default for InMemoryCacheBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> InMemoryCacheBuilder<V> {
    /// Creates a builder for an unbounded cache whose entries never expire
    /// unless written with their own TTL.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_capacity: None,
            initial_capacity: None,
            default_ttl: None,
            name: None,
            _value: PhantomData,
        }
    }

    /// Sets the maximum number of entries.
    ///
    /// Once reached, entries are evicted with moka's `TinyLFU` policy.
    #[must_use]
    pub fn max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Sets the initial capacity (pre-allocation hint) for the cache.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Sets the TTL of entries written without their own TTL.
    ///
    /// An item's own TTL always takes precedence, whether it is shorter or
    /// longer than this default.
    #[must_use]
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Sets a name for the cache, shown in moka's debugging output.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the configured [`InMemoryCache`].
    #[must_use]
    pub fn build(self) -> InMemoryCache<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        InMemoryCache::from_builder(&self)
    }
}
