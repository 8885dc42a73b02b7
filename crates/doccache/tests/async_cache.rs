// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The awaitable cache API, including request timeouts.

use std::time::Duration;

use doccache::{Cache, CacheFactorySettings, CacheItem, DocumentCache, DocumentCacheFactory, Encoding, ErrorKind};
use doccache_store::testing::InMemoryDocumentStore;
use doccache_store::{ContainerAddress, ContainerSpec, Document, DocumentStore, StoreError};
use serde::{Deserialize, Serialize};
use tick::{Clock, ClockControl};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Profile {
    name: String,
    age: u8,
}

/// A store that provisions instantly but never answers document requests.
#[derive(Debug)]
struct UnresponsiveStore;

impl DocumentStore for UnresponsiveStore {
    async fn create_database_if_not_exists(&self, _database: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_container_if_not_exists(&self, database: &str, spec: &ContainerSpec) -> Result<ContainerAddress, StoreError> {
        Ok(ContainerAddress::new(database, spec.name()))
    }

    async fn read_document(&self, _container: &ContainerAddress, _id: &str, _partition_key: Option<&str>) -> Result<Document, StoreError> {
        std::future::pending().await
    }

    async fn upsert_document(&self, _container: &ContainerAddress, _document: Document, _partition_key: Option<&str>) -> Result<(), StoreError> {
        std::future::pending().await
    }

    async fn create_document(&self, _container: &ContainerAddress, _document: Document, _partition_key: Option<&str>) -> Result<(), StoreError> {
        std::future::pending().await
    }

    async fn delete_document(&self, _container: &ContainerAddress, _id: &str, _partition_key: Option<&str>) -> Result<(), StoreError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn async_operations() {
    let clock = Clock::new_frozen();
    let factory = DocumentCacheFactory::new(InMemoryDocumentStore::new(clock.clone()), "db", CacheFactorySettings::default(), clock).unwrap();
    let cache: DocumentCache<String, _> = factory.create("strings").await.unwrap();

    assert_eq!(cache.get("k").await.unwrap(), None);
    cache.add(CacheItem::without_ttl("k", "v".to_string())).await.unwrap();
    assert_eq!(
        cache.add(CacheItem::without_ttl("k", "w".to_string())).await.unwrap_err().kind(),
        ErrorKind::Conflict
    );
    cache.set(CacheItem::without_ttl("k", "w".to_string())).await.unwrap();

    let result = cache.get_result("k").await.unwrap();
    assert!(result.has_value());
    assert_eq!(result.value().map(String::as_str), Some("w"));
    assert!(cache.exists("k").await.unwrap());

    cache.remove("k").await.unwrap();
    cache.remove("k").await.unwrap();
    assert!(!cache.exists("k").await.unwrap());
    assert_eq!(
        cache.key_expire("k", Duration::from_secs(1)).await.unwrap_err().kind(),
        ErrorKind::Unsupported
    );
}

#[test]
fn async_and_blocking_forms_agree() {
    let control = ClockControl::new();
    let settings = CacheFactorySettings::default()
        .with_encoding(Encoding::DocumentDirect)
        .with_default_ttl(Some(Duration::from_secs(2)));
    let factory = DocumentCacheFactory::new(InMemoryDocumentStore::new(control.to_clock()), "db", settings, control.to_clock()).unwrap();

    let cache: DocumentCache<Profile, _> = factory.create_default_blocking().unwrap();
    let ada = Profile {
        name: "Ada".to_string(),
        age: 36,
    };

    futures::executor::block_on(Cache::set(&cache, CacheItem::new("ada", ada.clone(), Duration::from_secs(6)))).unwrap();
    assert_eq!(doccache::BlockingCache::get(&cache, "ada").unwrap(), Some(ada));

    control.advance(Duration::from_secs(4));
    assert!(futures::executor::block_on(Cache::exists(&cache, "ada")).unwrap());
    assert!(doccache::BlockingCache::exists(&cache, "ada").unwrap());

    control.advance(Duration::from_secs(4));
    assert!(!futures::executor::block_on(Cache::exists(&cache, "ada")).unwrap());
}

#[tokio::test]
async fn requests_exceeding_the_timeout_are_cancelled() {
    let settings = CacheFactorySettings::default().with_request_timeout(Some(Duration::from_millis(50)));
    let factory = DocumentCacheFactory::new(UnresponsiveStore, "db", settings, Clock::new_tokio()).unwrap();
    let cache: DocumentCache<String, _> = factory.create("strings").await.unwrap();

    let read = cache.get("k").await.unwrap_err();
    assert_eq!(read.kind(), ErrorKind::Cancelled);

    let write = cache.set(CacheItem::without_ttl("k", "v".to_string())).await.unwrap_err();
    assert_eq!(write.kind(), ErrorKind::Cancelled);

    let exists = cache.exists("k").await.unwrap_err();
    assert_eq!(exists.kind(), ErrorKind::Cancelled);
}
