// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Backend-agnostic cache contract.
//!
//! This crate defines the value types shared by every cache backend in the
//! workspace ([`CacheItem`], [`CacheResult`], [`Error`]) and the two traits a
//! backend implements: [`Cache`] for asynchronous callers and [`BlockingCache`]
//! for callers that block the current thread.
//!
//! # Overview
//!
//! Keys are strings. Values are of a caller-chosen type `V`. Each written item
//! may carry its own TTL; when it does not, the backend's default expiry
//! applies. Reads never fail because a key is missing: absence is reported
//! through `None` or [`CacheResult::missing`].
//!
//! # Implementing a Backend
//!
//! ```
//! use doccache_tier::{BlockingCache, CacheItem, CacheResult, Error, ErrorKind, Result};
//! use std::collections::HashMap;
//! use std::sync::Mutex;
//! use std::time::Duration;
//!
//! struct SimpleCache(Mutex<HashMap<String, String>>);
//!
//! impl BlockingCache<String> for SimpleCache {
//!     fn get_result(&self, key: &str) -> Result<CacheResult<String>> {
//!         Ok(self.0.lock().unwrap().get(key).cloned().into())
//!     }
//!
//!     fn set(&self, item: CacheItem<String>) -> Result<()> {
//!         let (key, value, _) = item.into_parts();
//!         self.0.lock().unwrap().insert(key, value);
//!         Ok(())
//!     }
//!
//!     fn add(&self, item: CacheItem<String>) -> Result<()> {
//!         let mut map = self.0.lock().unwrap();
//!         if map.contains_key(item.key()) {
//!             return Err(Error::from_kind(ErrorKind::Conflict));
//!         }
//!         let (key, value, _) = item.into_parts();
//!         map.insert(key, value);
//!         Ok(())
//!     }
//!
//!     fn remove(&self, key: &str) -> Result<()> {
//!         self.0.lock().unwrap().remove(key);
//!         Ok(())
//!     }
//!
//!     fn exists(&self, key: &str) -> Result<bool> {
//!         Ok(self.0.lock().unwrap().contains_key(key))
//!     }
//!
//!     fn key_expire(&self, _key: &str, _ttl: Duration) -> Result<()> {
//!         Err(Error::from_kind(ErrorKind::Unsupported))
//!     }
//! }
//!
//! let cache = SimpleCache(Mutex::new(HashMap::new()));
//! cache.set(CacheItem::without_ttl("k", "v".to_string())).unwrap();
//! assert_eq!(cache.get("k").unwrap().as_deref(), Some("v"));
//! ```
//!
//! # Testing
//!
//! Enable the `test-util` feature for [`testing::MockCache`], a recording
//! in-memory implementation of both traits with failure injection.

mod cache;
pub mod error;
mod item;
mod result;
#[cfg(any(feature = "test-util", test))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub mod testing;

#[doc(inline)]
pub use cache::{BlockingCache, Cache};
#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use item::{CacheItem, validate_key};
#[doc(inline)]
pub use result::CacheResult;
