// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! In-memory backend for the `doccache_tier` cache contract, backed by moka.
//!
//! [`InMemoryCache`] implements both [`Cache`](doccache_tier::Cache) and
//! [`BlockingCache`](doccache_tier::BlockingCache) with per-item TTLs, an
//! optional default TTL and an optional capacity bound. It is a drop-in
//! stand-in for a document-backed cache in code written against the contract.
//!
//! # Quick Start
//!
//! ```
//! use doccache_memory::InMemoryCacheBuilder;
//! use doccache_tier::{Cache, CacheItem};
//! use std::time::Duration;
//!
//! # futures::executor::block_on(async {
//! let cache = InMemoryCacheBuilder::<String>::new()
//!     .max_capacity(1000)
//!     .default_ttl(Duration::from_secs(300))
//!     .build();
//!
//! cache.set(CacheItem::without_ttl("key", "value".to_string())).await?;
//! assert_eq!(cache.get("key").await?.as_deref(), Some("value"));
//! # Ok::<(), doccache_tier::Error>(())
//! # });
//! ```

pub mod builder;
pub mod cache;

#[doc(inline)]
pub use builder::InMemoryCacheBuilder;
#[doc(inline)]
pub use cache::InMemoryCache;
