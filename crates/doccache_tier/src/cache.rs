// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The cache contract every backend implements.
//!
//! Each operation exists in two first-class forms: [`Cache`] suspends the
//! calling task while the backend works, [`BlockingCache`] blocks the calling
//! thread. Backends implement both from shared encoding logic; neither form is
//! a wrapper that drives the other to completion.

use std::time::Duration;

use crate::{CacheItem, CacheResult, Result};

/// Asynchronous cache operations keyed by string.
///
/// Implementations must give every operation the same outcome as the
/// corresponding [`BlockingCache`] method.
pub trait Cache<V>: Send + Sync {
    /// Looks up `key`, returning `None` when it is absent or expired.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<V>>> + Send {
        async move { self.get_result(key).await.map(CacheResult::into_value) }
    }

    /// Looks up `key`, reporting a miss as a [`CacheResult`] without a value.
    ///
    /// A missing key is never an error.
    fn get_result(&self, key: &str) -> impl Future<Output = Result<CacheResult<V>>> + Send;

    /// Writes `item`, replacing any existing entry with the same key.
    fn set(&self, item: CacheItem<V>) -> impl Future<Output = Result<()>> + Send;

    /// Writes `item` only if no entry exists for its key.
    ///
    /// Fails with [`ErrorKind::Conflict`](crate::ErrorKind::Conflict) if the key is present.
    fn add(&self, item: CacheItem<V>) -> impl Future<Output = Result<()>> + Send;

    /// Removes `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Returns `true` if `key` is present and not expired.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Changes the remaining lifetime of `key` without rewriting its value.
    ///
    /// Backends without an efficient way to do this fail with
    /// [`ErrorKind::Unsupported`](crate::ErrorKind::Unsupported).
    fn key_expire(&self, key: &str, ttl: Duration) -> impl Future<Output = Result<()>> + Send;
}

/// Blocking cache operations keyed by string.
///
/// The semantics of every method match the [`Cache`] method of the same name.
pub trait BlockingCache<V>: Send + Sync {
    /// Looks up `key`, returning `None` when it is absent or expired.
    fn get(&self, key: &str) -> Result<Option<V>> {
        self.get_result(key).map(CacheResult::into_value)
    }

    /// Looks up `key`, reporting a miss as a [`CacheResult`] without a value.
    fn get_result(&self, key: &str) -> Result<CacheResult<V>>;

    /// Writes `item`, replacing any existing entry with the same key.
    fn set(&self, item: CacheItem<V>) -> Result<()>;

    /// Writes `item` only if no entry exists for its key.
    fn add(&self, item: CacheItem<V>) -> Result<()>;

    /// Removes `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<()>;

    /// Returns `true` if `key` is present and not expired.
    fn exists(&self, key: &str) -> Result<bool>;

    /// Changes the remaining lifetime of `key` without rewriting its value.
    fn key_expire(&self, key: &str, ttl: Duration) -> Result<()>;
}
