// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A cache whose entries live in a document database.
//!
//! Each logical cache is one container of the store. Entries are documents
//! keyed by the cache key, and expiry is delegated to the store's native
//! time-to-live support: every document carries either its own TTL or the
//! container default.
//!
//! - [`DocumentCacheFactory`] validates the requested value type against the
//!   configured [`Encoding`], provisions the container and hands out caches.
//! - [`CollectionProvisioner`] creates each container once per name with the
//!   indexing, partitioning, throughput and TTL policy of the
//!   [`CacheFactorySettings`].
//! - [`DocumentCache`] implements the [`Cache`] and [`BlockingCache`] traits of
//!   `doccache_tier` over any store implementing
//!   [`DocumentStore`](doccache_store::DocumentStore) or
//!   [`BlockingDocumentStore`](doccache_store::BlockingDocumentStore).
//!
//! # Examples
//!
//! ```
//! use doccache::{CacheFactorySettings, DocumentCacheFactory, Encoding};
//! use doccache_store::testing::InMemoryDocumentStore;
//! use doccache_tier::{Cache, CacheItem};
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//! use tick::Clock;
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Profile {
//!     name: String,
//! }
//!
//! # futures::executor::block_on(async {
//! let clock = Clock::new_frozen();
//! let settings = CacheFactorySettings::default()
//!     .with_encoding(Encoding::DocumentDirect)
//!     .with_default_ttl(Some(Duration::from_secs(60)));
//! let factory = DocumentCacheFactory::new(InMemoryDocumentStore::new(clock.clone()), "cache-db", settings, clock)?;
//!
//! let profiles = factory.create::<Profile>("profiles").await?;
//! profiles.set(CacheItem::without_ttl("u1", Profile { name: "Ada".to_string() })).await?;
//!
//! assert_eq!(profiles.get("u1").await?, Some(Profile { name: "Ada".to_string() }));
//! assert!(!profiles.exists("u2").await?);
//! # Ok::<(), doccache::Error>(())
//! # });
//! ```
//!
//! # Telemetry
//!
//! With [`CacheFactorySettings::with_logs`] every operation emits a `tracing`
//! event carrying `cache.name`, `cache.operation`, `cache.activity` and
//! `cache.duration_ns`. The `metrics` feature adds OpenTelemetry counters and
//! duration histograms through `DocumentCacheFactory::with_metrics`.

mod cache;
mod encoding;
mod factory;
mod names;
mod provisioner;
mod settings;
mod shape;
mod telemetry;
mod ttl;

#[doc(inline)]
pub use cache::DocumentCache;
#[doc(inline)]
pub use doccache_tier::{BlockingCache, Cache, CacheItem, CacheResult, Error, ErrorKind, Result};
#[doc(inline)]
pub use factory::DocumentCacheFactory;
#[doc(inline)]
pub use provisioner::{CollectionProvisioner, ContainerDescriptor};
#[doc(inline)]
pub use settings::{CacheFactorySettings, DEFAULT_CONTAINER_THROUGHPUT, Encoding, Indexing, MultiRegion, Partitioning, Throughput};
