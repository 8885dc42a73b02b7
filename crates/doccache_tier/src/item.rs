// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::{Error, ErrorKind, Result};

/// A value to be written to a cache, together with its key and expiry.
///
/// `CacheItem` is immutable once constructed. The item-level TTL is optional:
/// when absent, expiry is governed entirely by the backend's default policy
/// (for document-backed caches, the container's default TTL).
///
/// [`Duration::MAX`] is accepted as the "never expire at the item level"
/// sentinel and is normalized to "no item TTL".
///
/// # Examples
///
/// ```
/// use doccache_tier::CacheItem;
/// use std::time::Duration;
///
/// let item = CacheItem::new("session:42", "payload".to_string(), Duration::from_secs(30));
/// assert_eq!(item.key(), "session:42");
/// assert_eq!(item.ttl(), Some(Duration::from_secs(30)));
///
/// let item = CacheItem::without_ttl("config", 7);
/// assert_eq!(item.ttl(), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheItem<V> {
    key: String,
    value: V,
    ttl: Option<Duration>,
}

impl<V> CacheItem<V> {
    /// Creates an item that expires `ttl` after it is written.
    ///
    /// Passing [`Duration::MAX`] is equivalent to [`CacheItem::without_ttl`].
    ///
    /// Backends may store TTLs at a coarser resolution and round up. Document
    /// stores count whole seconds, so a TTL of 1.2s is kept for 2s and
    /// [`Duration::ZERO`] is kept for one second rather than expiring at once.
    pub fn new(key: impl Into<String>, value: V, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            value,
            ttl: (ttl != Duration::MAX).then_some(ttl),
        }
    }

    /// Creates an item with no item-level expiry.
    ///
    /// The backend's default expiry policy applies to this item.
    pub fn without_ttl(key: impl Into<String>, value: V) -> Self {
        Self {
            key: key.into(),
            value,
            ttl: None,
        }
    }

    /// Returns the cache key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns a reference to the value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the item-level TTL, or `None` when the item defers to the
    /// backend default.
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Consumes the item and returns its parts.
    #[must_use]
    pub fn into_parts(self) -> (String, V, Option<Duration>) {
        (self.key, self.value, self.ttl)
    }
}

/// Checks that `key` satisfies the key rules shared by every backend.
///
/// Keys must not be empty. Backends may reject further keys, for example
/// ones containing characters their storage cannot address.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidKey`] when `key` is empty.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::from_cause(ErrorKind::InvalidKey, "cache key must not be empty"));
    }
    Ok(())
}
