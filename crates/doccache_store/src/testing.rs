// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory document store for testing.
//!
//! [`InMemoryDocumentStore`] implements both store traits against process
//! memory while following the rules of the real service closely enough for
//! cache tests to be meaningful:
//!
//! - Containers keep the indexing policy, partition key, default TTL and
//!   throughput offer they were created with. Creating an existing container
//!   returns it unchanged.
//! - A container created without a throughput request shares the database's
//!   offer when the database has one, and otherwise gets a dedicated offer of
//!   [`DEFAULT_THROUGHPUT`] request units.
//! - Document expiry follows the container default TTL and the document `ttl`
//!   field, measured from the last write with the store's [`Clock`], so tests
//!   can move time forward with `tick::ClockControl`.
//! - Partitioned containers require every request to carry the partition key
//!   value, and unpartitioned containers reject one.
//! - Every request is recorded, and failures can be injected per request.
//!
//! The asynchronous methods yield to the executor once before doing their work
//! so that concurrently running tasks interleave.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde_json::Value;
use tick::Clock;

use crate::{
    BlockingDocumentStore, ConnectionPolicy, ContainerAddress, ContainerSpec, Document, DocumentStore, StoreError, StoreErrorKind,
};

/// Throughput given to a container that neither requests its own nor can share the database's.
pub const DEFAULT_THROUGHPUT: u32 = 400;

/// A request received by an [`InMemoryDocumentStore`].
#[derive(Clone, Debug, PartialEq)]
pub enum StoreOp {
    /// `create_database_if_not_exists`.
    CreateDatabase(String),
    /// `create_container_if_not_exists`.
    CreateContainer {
        /// The database holding the container.
        database: String,
        /// The container name.
        container: String,
    },
    /// `read_document`.
    Read {
        /// The addressed container.
        container: ContainerAddress,
        /// The document id.
        id: String,
        /// The partition key value sent with the request.
        partition_key: Option<String>,
    },
    /// `upsert_document`.
    Upsert {
        /// The addressed container.
        container: ContainerAddress,
        /// The document as sent.
        document: Document,
        /// The partition key value sent with the request.
        partition_key: Option<String>,
    },
    /// `create_document`.
    Create {
        /// The addressed container.
        container: ContainerAddress,
        /// The document as sent.
        document: Document,
        /// The partition key value sent with the request.
        partition_key: Option<String>,
    },
    /// `delete_document`.
    Delete {
        /// The addressed container.
        container: ContainerAddress,
        /// The document id.
        id: String,
        /// The partition key value sent with the request.
        partition_key: Option<String>,
    },
}

impl StoreOp {
    /// Returns `true` for database and container creation requests.
    #[must_use]
    pub fn is_provisioning(&self) -> bool {
        matches!(self, Self::CreateDatabase(_) | Self::CreateContainer { .. })
    }
}

type FailPredicate = Box<dyn Fn(&StoreOp) -> Option<StoreErrorKind> + Send + Sync>;

type DocumentKey = (Option<String>, String);

#[derive(Debug)]
struct StoredDocument {
    document: Document,
    written_at: SystemTime,
    sequence: u64,
}

#[derive(Debug)]
struct ContainerState {
    spec: ContainerSpec,
    offer: Option<u32>,
    documents: HashMap<DocumentKey, StoredDocument>,
}

#[derive(Debug, Default)]
struct DatabaseState {
    offer: Option<u32>,
    containers: HashMap<String, ContainerState>,
}

#[derive(Debug, Default)]
struct State {
    databases: HashMap<String, DatabaseState>,
    sequence: u64,
}

struct Inner {
    clock: Clock,
    connection_policy: ConnectionPolicy,
    state: Mutex<State>,
    operations: Mutex<Vec<StoreOp>>,
    fail_when: Mutex<Option<FailPredicate>>,
}

/// An in-memory emulation of a document database.
///
/// Clones share state, so a test can keep a handle for inspection while a
/// cache factory owns another.
///
/// # Examples
///
/// ```
/// use doccache_store::testing::InMemoryDocumentStore;
/// use doccache_store::{BlockingDocumentStore, ContainerSpec, Document};
/// use serde_json::Map;
/// use tick::Clock;
///
/// let store = InMemoryDocumentStore::new(Clock::new_frozen());
/// store.create_database_if_not_exists("db").unwrap();
/// let address = store
///     .create_container_if_not_exists("db", &ContainerSpec::new("items"))
///     .unwrap();
///
/// store.upsert_document(&address, Document::new("a", Map::new()), None).unwrap();
/// assert_eq!(store.read_document(&address, "a", None).unwrap().id(), "a");
/// ```
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("connection_policy", &self.inner.connection_policy)
            .field("state", &self.inner.state)
            .field("operations", &self.inner.operations.lock().len())
            .finish_non_exhaustive()
    }
}

impl InMemoryDocumentStore {
    /// Creates an empty store whose documents age according to `clock`.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self::with_connection_policy(clock, ConnectionPolicy::default())
    }

    /// Creates an empty store as if connected with `connection_policy`.
    #[must_use]
    pub fn with_connection_policy(clock: Clock, connection_policy: ConnectionPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                clock,
                connection_policy,
                state: Mutex::new(State::default()),
                operations: Mutex::new(Vec::new()),
                fail_when: Mutex::new(None),
            }),
        }
    }

    /// Returns the connection policy the store was created with.
    #[must_use]
    pub fn connection_policy(&self) -> &ConnectionPolicy {
        &self.inner.connection_policy
    }

    /// Creates or replaces `database`, optionally with provisioned throughput
    /// that its containers can share.
    ///
    /// This is a setup helper and is not recorded as an operation.
    pub fn create_database(&self, database: &str, throughput: Option<u32>) {
        self.inner.state.lock().databases.insert(
            database.to_string(),
            DatabaseState {
                offer: throughput,
                containers: HashMap::new(),
            },
        );
    }

    /// Returns `true` if `database` exists.
    #[must_use]
    pub fn has_database(&self, database: &str) -> bool {
        self.inner.state.lock().databases.contains_key(database)
    }

    /// Returns the names of the containers in `database`, sorted.
    #[must_use]
    pub fn container_names(&self, database: &str) -> Vec<String> {
        let state = self.inner.state.lock();
        let mut names: Vec<String> = state
            .databases
            .get(database)
            .map(|db| db.containers.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Returns the spec a container was created with.
    #[must_use]
    pub fn container_spec(&self, container: &ContainerAddress) -> Option<ContainerSpec> {
        let state = self.inner.state.lock();
        container_state(&state, container).ok().map(|c| c.spec.clone())
    }

    /// Returns the dedicated throughput offer of a container, or `None` when
    /// it shares the database's throughput or does not exist.
    #[must_use]
    pub fn container_offer(&self, container: &ContainerAddress) -> Option<u32> {
        let state = self.inner.state.lock();
        container_state(&state, container).ok().and_then(|c| c.offer)
    }

    /// Returns the throughput offer of a database, if it has one.
    #[must_use]
    pub fn database_offer(&self, database: &str) -> Option<u32> {
        self.inner.state.lock().databases.get(database).and_then(|db| db.offer)
    }

    /// Returns a document exactly as last written, ignoring expiry.
    #[must_use]
    pub fn stored_document(&self, container: &ContainerAddress, id: &str, partition_key: Option<&str>) -> Option<Document> {
        let state = self.inner.state.lock();
        let key = (partition_key.map(str::to_string), id.to_string());
        container_state(&state, container)
            .ok()
            .and_then(|c| c.documents.get(&key))
            .map(|stored| stored.document.clone())
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.inner.operations.lock().clone()
    }

    /// Returns the number of recorded operations matching `predicate`.
    #[must_use]
    pub fn count_operations(&self, predicate: impl Fn(&StoreOp) -> bool) -> usize {
        self.inner.operations.lock().iter().filter(|op| predicate(op)).count()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.inner.operations.lock().clear();
    }

    /// Sets a predicate deciding which requests fail and with which kind.
    ///
    /// Failed requests are recorded but do not change the stored state.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp) -> Option<StoreErrorKind> + Send + Sync + 'static,
    {
        *self.inner.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate.
    pub fn clear_failures(&self) {
        *self.inner.fail_when.lock() = None;
    }
}

impl Inner {
    fn begin(&self, op: StoreOp) -> Result<(), StoreError> {
        let failure = self.fail_when.lock().as_ref().and_then(|predicate| predicate(&op));
        self.operations.lock().push(op);
        match failure {
            Some(kind) => Err(StoreError::from_cause(kind, "in-memory store: injected failure")),
            None => Ok(()),
        }
    }

    fn create_database_if_not_exists(&self, database: &str) -> Result<(), StoreError> {
        self.begin(StoreOp::CreateDatabase(database.to_string()))?;
        if database.is_empty() {
            return Err(StoreError::from_cause(StoreErrorKind::BadRequest, "database name must not be empty"));
        }
        self.state.lock().databases.entry(database.to_string()).or_default();
        Ok(())
    }

    fn create_container_if_not_exists(&self, database: &str, spec: &ContainerSpec) -> Result<ContainerAddress, StoreError> {
        self.begin(StoreOp::CreateContainer {
            database: database.to_string(),
            container: spec.name().to_string(),
        })?;
        validate_spec(spec)?;

        let mut state = self.state.lock();
        let db = state
            .databases
            .get_mut(database)
            .ok_or_else(|| StoreError::from_cause(StoreErrorKind::NotFound, format!("database '{database}' does not exist")))?;

        let database_offer = db.offer;
        db.containers.entry(spec.name().to_string()).or_insert_with(|| ContainerState {
            spec: spec.clone(),
            offer: match (spec.throughput(), database_offer) {
                (Some(dedicated), _) => Some(dedicated),
                (None, Some(_)) => None,
                (None, None) => Some(DEFAULT_THROUGHPUT),
            },
            documents: HashMap::new(),
        });

        Ok(ContainerAddress::new(database, spec.name()))
    }

    fn read_document(&self, container: &ContainerAddress, id: &str, partition_key: Option<&str>) -> Result<Document, StoreError> {
        self.begin(StoreOp::Read {
            container: container.clone(),
            id: id.to_string(),
            partition_key: partition_key.map(str::to_string),
        })?;

        let now = self.clock.system_time();
        let mut state = self.state.lock();
        let target = container_state_mut(&mut state, container)?;
        check_partition_address(&target.spec, partition_key)?;

        let key = (partition_key.map(str::to_string), id.to_string());
        let stored = live_document(target, &key, now).ok_or_else(|| not_found(container, id))?;

        let mut document = stored.document.clone();
        let seconds = stored.written_at.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        let body = document.body_mut();
        body.insert("_rid".to_string(), Value::from(format!("{:x}", stored.sequence)));
        body.insert("_self".to_string(), Value::from(format!("{container}/docs/{id}")));
        body.insert("_etag".to_string(), Value::from(format!("\"{:08x}\"", stored.sequence)));
        body.insert("_attachments".to_string(), Value::from("attachments/"));
        body.insert("_ts".to_string(), Value::from(seconds));
        Ok(document)
    }

    fn write_document(&self, container: &ContainerAddress, document: Document, partition_key: Option<&str>, create: bool) -> Result<(), StoreError> {
        let op = if create {
            StoreOp::Create {
                container: container.clone(),
                document: document.clone(),
                partition_key: partition_key.map(str::to_string),
            }
        } else {
            StoreOp::Upsert {
                container: container.clone(),
                document: document.clone(),
                partition_key: partition_key.map(str::to_string),
            }
        };
        self.begin(op)?;
        validate_document(&document)?;

        let now = self.clock.system_time();
        let mut state = self.state.lock();
        state.sequence += 1;
        let sequence = state.sequence;

        let target = container_state_mut(&mut state, container)?;
        check_partition_address(&target.spec, partition_key)?;
        check_partition_value(&target.spec, &document, partition_key)?;

        let key = (partition_key.map(str::to_string), document.id().to_string());
        if create && live_document(target, &key, now).is_some() {
            return Err(StoreError::from_cause(
                StoreErrorKind::Conflict,
                format!("document '{}' already exists in {container}", document.id()),
            ));
        }

        target.documents.insert(
            key,
            StoredDocument {
                document,
                written_at: now,
                sequence,
            },
        );
        Ok(())
    }

    fn delete_document(&self, container: &ContainerAddress, id: &str, partition_key: Option<&str>) -> Result<(), StoreError> {
        self.begin(StoreOp::Delete {
            container: container.clone(),
            id: id.to_string(),
            partition_key: partition_key.map(str::to_string),
        })?;

        let now = self.clock.system_time();
        let mut state = self.state.lock();
        let target = container_state_mut(&mut state, container)?;
        check_partition_address(&target.spec, partition_key)?;

        let key = (partition_key.map(str::to_string), id.to_string());
        live_document(target, &key, now).ok_or_else(|| not_found(container, id))?;
        target.documents.remove(&key);
        Ok(())
    }
}

fn container_state<'a>(state: &'a State, container: &ContainerAddress) -> Result<&'a ContainerState, StoreError> {
    state
        .databases
        .get(container.database())
        .and_then(|db| db.containers.get(container.container()))
        .ok_or_else(|| StoreError::from_cause(StoreErrorKind::NotFound, format!("container {container} does not exist")))
}

fn container_state_mut<'a>(state: &'a mut State, container: &ContainerAddress) -> Result<&'a mut ContainerState, StoreError> {
    state
        .databases
        .get_mut(container.database())
        .and_then(|db| db.containers.get_mut(container.container()))
        .ok_or_else(|| StoreError::from_cause(StoreErrorKind::NotFound, format!("container {container} does not exist")))
}

fn not_found(container: &ContainerAddress, id: &str) -> StoreError {
    StoreError::from_cause(StoreErrorKind::NotFound, format!("document '{id}' does not exist in {container}"))
}

/// Returns the lifetime of a document, or `None` if it never expires.
fn lifetime(container_ttl: Option<i32>, document_ttl: Option<i32>) -> Option<Duration> {
    let container_ttl = container_ttl?;
    let seconds = document_ttl.unwrap_or(container_ttl);
    u64::try_from(seconds).ok().map(Duration::from_secs)
}

/// Looks up a document, purging it if it has expired.
fn live_document<'a>(container: &'a mut ContainerState, key: &DocumentKey, now: SystemTime) -> Option<&'a StoredDocument> {
    let expired = container.documents.get(key).is_some_and(|stored| {
        lifetime(container.spec.default_ttl(), stored.document.ttl())
            .is_some_and(|lifetime| now.duration_since(stored.written_at).unwrap_or_default() >= lifetime)
    });

    if expired {
        container.documents.remove(key);
        return None;
    }

    container.documents.get(key)
}

fn validate_ttl(ttl: Option<i32>, what: &str) -> Result<(), StoreError> {
    match ttl {
        Some(value) if value == 0 || value < -1 => Err(StoreError::from_cause(
            StoreErrorKind::BadRequest,
            format!("{what} ttl must be -1 or a positive number of seconds, got {value}"),
        )),
        _ => Ok(()),
    }
}

fn validate_path(path: &str) -> Result<(), StoreError> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(StoreError::from_cause(
            StoreErrorKind::BadRequest,
            format!("path '{path}' must start with '/'"),
        ))
    }
}

fn validate_spec(spec: &ContainerSpec) -> Result<(), StoreError> {
    if spec.name().is_empty() {
        return Err(StoreError::from_cause(StoreErrorKind::BadRequest, "container name must not be empty"));
    }
    validate_ttl(spec.default_ttl(), "container default")?;

    let policy = spec.indexing_policy();
    policy
        .included_paths()
        .iter()
        .chain(policy.excluded_paths())
        .try_for_each(|path| validate_path(path))?;

    if let Some(partition_key) = spec.partition_key() {
        if partition_key.paths().is_empty() {
            return Err(StoreError::from_cause(StoreErrorKind::BadRequest, "partition key needs a path"));
        }
        partition_key.paths().iter().try_for_each(|path| validate_path(path))?;
    }
    Ok(())
}

fn validate_document(document: &Document) -> Result<(), StoreError> {
    if document.id().is_empty() {
        return Err(StoreError::from_cause(StoreErrorKind::BadRequest, "document id must not be empty"));
    }
    validate_ttl(document.ttl(), "document")
}

fn check_partition_address(spec: &ContainerSpec, partition_key: Option<&str>) -> Result<(), StoreError> {
    match (spec.partition_key(), partition_key) {
        (Some(_), None) => Err(StoreError::from_cause(
            StoreErrorKind::BadRequest,
            format!("container '{}' is partitioned; a partition key value is required", spec.name()),
        )),
        (None, Some(_)) => Err(StoreError::from_cause(
            StoreErrorKind::BadRequest,
            format!("container '{}' is not partitioned; no partition key value is accepted", spec.name()),
        )),
        _ => Ok(()),
    }
}

fn check_partition_value(spec: &ContainerSpec, document: &Document, partition_key: Option<&str>) -> Result<(), StoreError> {
    let (Some(definition), Some(expected)) = (spec.partition_key(), partition_key) else {
        return Ok(());
    };

    let matches = definition.paths().iter().all(|path| {
        let field = path.trim_start_matches('/');
        if field == crate::ID_FIELD {
            document.id() == expected
        } else {
            document.body().get(field).and_then(Value::as_str) == Some(expected)
        }
    });

    if matches {
        Ok(())
    } else {
        Err(StoreError::from_cause(
            StoreErrorKind::BadRequest,
            format!("partition key value '{expected}' does not match document '{}'", document.id()),
        ))
    }
}

/// Yields to the executor exactly once.
#[derive(Debug, Default)]
struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

impl DocumentStore for InMemoryDocumentStore {
    async fn create_database_if_not_exists(&self, database: &str) -> Result<(), StoreError> {
        YieldNow::default().await;
        self.inner.create_database_if_not_exists(database)
    }

    async fn create_container_if_not_exists(&self, database: &str, spec: &ContainerSpec) -> Result<ContainerAddress, StoreError> {
        YieldNow::default().await;
        self.inner.create_container_if_not_exists(database, spec)
    }

    async fn read_document(&self, container: &ContainerAddress, id: &str, partition_key: Option<&str>) -> Result<Document, StoreError> {
        YieldNow::default().await;
        self.inner.read_document(container, id, partition_key)
    }

    async fn upsert_document(&self, container: &ContainerAddress, document: Document, partition_key: Option<&str>) -> Result<(), StoreError> {
        YieldNow::default().await;
        self.inner.write_document(container, document, partition_key, false)
    }

    async fn create_document(&self, container: &ContainerAddress, document: Document, partition_key: Option<&str>) -> Result<(), StoreError> {
        YieldNow::default().await;
        self.inner.write_document(container, document, partition_key, true)
    }

    async fn delete_document(&self, container: &ContainerAddress, id: &str, partition_key: Option<&str>) -> Result<(), StoreError> {
        YieldNow::default().await;
        self.inner.delete_document(container, id, partition_key)
    }
}

impl BlockingDocumentStore for InMemoryDocumentStore {
    fn create_database_if_not_exists(&self, database: &str) -> Result<(), StoreError> {
        self.inner.create_database_if_not_exists(database)
    }

    fn create_container_if_not_exists(&self, database: &str, spec: &ContainerSpec) -> Result<ContainerAddress, StoreError> {
        self.inner.create_container_if_not_exists(database, spec)
    }

    fn read_document(&self, container: &ContainerAddress, id: &str, partition_key: Option<&str>) -> Result<Document, StoreError> {
        self.inner.read_document(container, id, partition_key)
    }

    fn upsert_document(&self, container: &ContainerAddress, document: Document, partition_key: Option<&str>) -> Result<(), StoreError> {
        self.inner.write_document(container, document, partition_key, false)
    }

    fn create_document(&self, container: &ContainerAddress, document: Document, partition_key: Option<&str>) -> Result<(), StoreError> {
        self.inner.write_document(container, document, partition_key, true)
    }

    fn delete_document(&self, container: &ContainerAddress, id: &str, partition_key: Option<&str>) -> Result<(), StoreError> {
        self.inner.delete_document(container, id, partition_key)
    }
}
