// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

use doccache_store::{BlockingDocumentStore, ContainerAddress, Document, DocumentStore, StoreError, StoreErrorKind};
use doccache_tier::{BlockingCache, Cache, CacheItem, CacheResult, Error, ErrorKind, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tick::FutureExt;

use crate::names::validate_key;
use crate::telemetry::{CacheActivity, CacheOperation, CacheTelemetry};
use crate::{ContainerDescriptor, Encoding};

/// Maps a store failure to the cache error taxonomy.
pub(crate) fn store_error(error: StoreError) -> Error {
    let kind = match error.kind() {
        StoreErrorKind::Conflict => ErrorKind::Conflict,
        StoreErrorKind::Throttled => ErrorKind::Throttled,
        StoreErrorKind::Timeout | StoreErrorKind::Cancelled => ErrorKind::Cancelled,
        _ => ErrorKind::StoreUnavailable,
    };
    Error::from_cause(kind, error)
}

/// A cache whose entries are documents in one container of a document store.
///
/// Created by [`DocumentCacheFactory`](crate::DocumentCacheFactory). The cache
/// holds no entries itself; every operation is one request to the store. It
/// implements [`Cache`] when the store implements [`DocumentStore`] and
/// [`BlockingCache`] when it implements [`BlockingDocumentStore`].
///
/// Explicit item TTLs override the container default. Items written without a
/// TTL take the container default. `key_expire` is not supported because the
/// store cannot change a document's TTL without rewriting it.
pub struct DocumentCache<T, S> {
    name: String,
    store: Arc<S>,
    container: ContainerDescriptor,
    encoding: Encoding,
    request_timeout: Option<Duration>,
    telemetry: CacheTelemetry,
    _value: PhantomData<fn() -> T>,
}

impl<T, S> std::fmt::Debug for DocumentCache<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCache")
            .field("name", &self.name)
            .field("container", &self.container)
            .field("encoding", &self.encoding)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl<T, S> Clone for DocumentCache<T, S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            store: Arc::clone(&self.store),
            container: self.container.clone(),
            encoding: self.encoding,
            request_timeout: self.request_timeout,
            telemetry: self.telemetry.clone(),
            _value: PhantomData,
        }
    }
}

impl<T, S> DocumentCache<T, S> {
    pub(crate) fn new(
        name: String,
        store: Arc<S>,
        container: ContainerDescriptor,
        encoding: Encoding,
        request_timeout: Option<Duration>,
        telemetry: CacheTelemetry,
    ) -> Self {
        Self {
            name,
            store,
            container,
            encoding,
            request_timeout,
            telemetry,
            _value: PhantomData,
        }
    }

    /// Returns the logical cache name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the address of the backing container.
    #[must_use]
    pub fn address(&self) -> &ContainerAddress {
        self.container.address()
    }

    /// Returns the backing container and its policy.
    #[must_use]
    pub fn container(&self) -> &ContainerDescriptor {
        &self.container
    }

    /// Returns how values are laid out in documents.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn partition_key<'k>(&self, key: &'k str) -> Option<&'k str> {
        self.container.partitioned().then_some(key)
    }

    fn started(&self) -> Instant {
        self.telemetry.clock().instant()
    }

    fn record(&self, operation: CacheOperation, activity: CacheActivity, started: Instant) {
        self.telemetry
            .record(&self.name, operation, activity, self.telemetry.elapsed(started));
    }

    fn fail<R>(&self, operation: CacheOperation, started: Instant, error: Error) -> Result<R> {
        self.record(operation, CacheActivity::Error, started);
        Err(error)
    }

    fn unsupported_key_expire(&self) -> Result<()> {
        self.record(CacheOperation::KeyExpire, CacheActivity::Unsupported, self.started());
        Err(Error::from_cause(
            ErrorKind::Unsupported,
            "document stores cannot change a document's TTL without rewriting it; write the item again with the new TTL",
        ))
    }

    fn finish_read(&self, started: Instant, outcome: std::result::Result<Document, StoreError>) -> Result<CacheResult<T>>
    where
        T: DeserializeOwned,
    {
        match outcome {
            Ok(document) => match self.encoding.decode(document) {
                Ok(value) => {
                    self.record(CacheOperation::Get, CacheActivity::Hit, started);
                    Ok(CacheResult::found(value))
                }
                Err(error) => self.fail(CacheOperation::Get, started, error),
            },
            Err(error) if error.is_not_found() => {
                self.record(CacheOperation::Get, CacheActivity::Miss, started);
                Ok(CacheResult::missing())
            }
            Err(error) => self.fail(CacheOperation::Get, started, store_error(error)),
        }
    }

    fn finish_exists(&self, started: Instant, outcome: std::result::Result<Document, StoreError>) -> Result<bool> {
        match outcome {
            Ok(_) => {
                self.record(CacheOperation::Exists, CacheActivity::Hit, started);
                Ok(true)
            }
            Err(error) if error.is_not_found() => {
                self.record(CacheOperation::Exists, CacheActivity::Miss, started);
                Ok(false)
            }
            Err(error) => self.fail(CacheOperation::Exists, started, store_error(error)),
        }
    }

    fn finish_write(&self, operation: CacheOperation, started: Instant, outcome: std::result::Result<(), StoreError>) -> Result<()> {
        match outcome {
            Ok(()) => {
                self.record(operation, CacheActivity::Inserted, started);
                Ok(())
            }
            Err(error) => self.fail(operation, started, store_error(error)),
        }
    }

    fn finish_remove(&self, started: Instant, outcome: std::result::Result<(), StoreError>) -> Result<()> {
        match outcome {
            Ok(()) => {
                self.record(CacheOperation::Remove, CacheActivity::Removed, started);
                Ok(())
            }
            Err(error) if error.is_not_found() => {
                self.record(CacheOperation::Remove, CacheActivity::Miss, started);
                Ok(())
            }
            Err(error) => self.fail(CacheOperation::Remove, started, store_error(error)),
        }
    }

    /// Validates the key and builds the document for `item`.
    fn encode(&self, item: &CacheItem<T>) -> Result<Document>
    where
        T: Serialize,
    {
        validate_key(item.key())?;
        self.encoding
            .encode(item.key(), item.value(), item.ttl(), self.container.default_ttl())
    }

    /// Runs a store request, abandoning it after the configured timeout.
    async fn request<R>(&self, request: impl Future<Output = std::result::Result<R, StoreError>> + Send) -> std::result::Result<R, StoreError> {
        match self.request_timeout {
            Some(timeout) => match request.timeout(self.telemetry.clock(), timeout).await {
                Ok(outcome) => outcome,
                Err(elapsed) => Err(StoreError::from_cause(StoreErrorKind::Cancelled, elapsed)),
            },
            None => request.await,
        }
    }
}

impl<T, S> Cache<T> for DocumentCache<T, S>
where
    T: Serialize + DeserializeOwned + Send + Sync,
    S: DocumentStore,
{
    async fn get_result(&self, key: &str) -> Result<CacheResult<T>> {
        validate_key(key)?;
        let started = self.started();
        let outcome = self
            .request(self.store.read_document(self.address(), key, self.partition_key(key)))
            .await;
        self.finish_read(started, outcome)
    }

    async fn set(&self, item: CacheItem<T>) -> Result<()> {
        let document = self.encode(&item)?;
        let started = self.started();
        let outcome = self
            .request(self.store.upsert_document(self.address(), document, self.partition_key(item.key())))
            .await;
        self.finish_write(CacheOperation::Set, started, outcome)
    }

    async fn add(&self, item: CacheItem<T>) -> Result<()> {
        let document = self.encode(&item)?;
        let started = self.started();
        let outcome = self
            .request(self.store.create_document(self.address(), document, self.partition_key(item.key())))
            .await;
        self.finish_write(CacheOperation::Add, started, outcome)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let started = self.started();
        let outcome = self
            .request(self.store.delete_document(self.address(), key, self.partition_key(key)))
            .await;
        self.finish_remove(started, outcome)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        let started = self.started();
        let outcome = self
            .request(self.store.read_document(self.address(), key, self.partition_key(key)))
            .await;
        self.finish_exists(started, outcome)
    }

    async fn key_expire(&self, key: &str, _ttl: Duration) -> Result<()> {
        validate_key(key)?;
        self.unsupported_key_expire()
    }
}

impl<T, S> BlockingCache<T> for DocumentCache<T, S>
where
    T: Serialize + DeserializeOwned + Send + Sync,
    S: BlockingDocumentStore,
{
    fn get_result(&self, key: &str) -> Result<CacheResult<T>> {
        validate_key(key)?;
        let started = self.started();
        let outcome = self.store.read_document(self.address(), key, self.partition_key(key));
        self.finish_read(started, outcome)
    }

    fn set(&self, item: CacheItem<T>) -> Result<()> {
        let document = self.encode(&item)?;
        let started = self.started();
        let outcome = self.store.upsert_document(self.address(), document, self.partition_key(item.key()));
        self.finish_write(CacheOperation::Set, started, outcome)
    }

    fn add(&self, item: CacheItem<T>) -> Result<()> {
        let document = self.encode(&item)?;
        let started = self.started();
        let outcome = self.store.create_document(self.address(), document, self.partition_key(item.key()));
        self.finish_write(CacheOperation::Add, started, outcome)
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let started = self.started();
        let outcome = self.store.delete_document(self.address(), key, self.partition_key(key));
        self.finish_remove(started, outcome)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        let started = self.started();
        let outcome = self.store.read_document(self.address(), key, self.partition_key(key));
        self.finish_exists(started, outcome)
    }

    fn key_expire(&self, key: &str, _ttl: Duration) -> Result<()> {
        validate_key(key)?;
        self.unsupported_key_expire()
    }
}
