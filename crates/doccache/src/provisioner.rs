// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! One-time creation of the container behind each logical cache name.
//!
//! Resolutions are memoized per name. Concurrent first resolutions of the same
//! name are serialized on a per-name gate, so only one of them talks to the
//! store; the others wait and observe the stored result. Failures are not
//! memoized and the next resolution tries again.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use doccache_store::{
    BlockingDocumentStore, ContainerAddress, ContainerSpec, DocumentStore, ID_FIELD, IndexingPolicy, PartitionKeyDefinition, StoreError,
};
use doccache_tier::{Error, ErrorKind, Result};
use tick::Clock;

use crate::telemetry::{CacheActivity, CacheOperation, CacheTelemetry};
use crate::{CacheFactorySettings, Indexing, Partitioning, Throughput, ttl};

/// A provisioned container and the policy it was created with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerDescriptor {
    address: ContainerAddress,
    spec: ContainerSpec,
}

impl ContainerDescriptor {
    /// Returns the container's address.
    #[must_use]
    pub fn address(&self) -> &ContainerAddress {
        &self.address
    }

    /// Returns the policy the container was requested with.
    #[must_use]
    pub fn spec(&self) -> &ContainerSpec {
        &self.spec
    }

    /// Returns `true` if documents are addressed by partition key as well as id.
    #[must_use]
    pub fn partitioned(&self) -> bool {
        self.spec.partition_key().is_some()
    }

    /// Returns the container default TTL in store seconds; `None` when expiry is disabled.
    #[must_use]
    pub fn default_ttl(&self) -> Option<i32> {
        self.spec.default_ttl()
    }
}

#[derive(Default)]
struct ContainerSlot {
    descriptor: OnceLock<ContainerDescriptor>,
    async_gate: futures::lock::Mutex<()>,
    blocking_gate: parking_lot::Mutex<()>,
}

/// Ensures a container exists for each logical cache name and remembers its address.
///
/// Every container is created inside one database with the partitioning,
/// indexing, throughput and default TTL policy of the
/// [`CacheFactorySettings`]. The first resolution of a name fixes its policy.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use doccache::{CacheFactorySettings, CollectionProvisioner};
/// use doccache_store::testing::InMemoryDocumentStore;
/// use tick::Clock;
///
/// let clock = Clock::new_frozen();
/// let store = Arc::new(InMemoryDocumentStore::new(clock.clone()));
/// let provisioner = CollectionProvisioner::new(store, "cache-db", CacheFactorySettings::default(), clock);
///
/// let first = provisioner.resolve_blocking("sessions", None).unwrap();
/// let second = provisioner.resolve_blocking("sessions", None).unwrap();
/// assert_eq!(first.address(), second.address());
/// assert_eq!(first.address().to_string(), "dbs/cache-db/colls/sessions");
/// ```
pub struct CollectionProvisioner<S> {
    store: Arc<S>,
    database: String,
    settings: CacheFactorySettings,
    pub(crate) telemetry: CacheTelemetry,
    slots: DashMap<String, Arc<ContainerSlot>>,
}

impl<S> std::fmt::Debug for CollectionProvisioner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionProvisioner")
            .field("database", &self.database)
            .field("settings", &self.settings)
            .field("resolved", &self.resolved_names())
            .finish_non_exhaustive()
    }
}

impl<S> CollectionProvisioner<S> {
    /// Creates a provisioner for containers in `database`.
    pub fn new(store: Arc<S>, database: impl Into<String>, settings: CacheFactorySettings, clock: Clock) -> Self {
        let telemetry = CacheTelemetry::new(settings.logs(), clock);
        Self::with_telemetry(store, database.into(), settings, telemetry)
    }

    pub(crate) fn with_telemetry(store: Arc<S>, database: String, settings: CacheFactorySettings, telemetry: CacheTelemetry) -> Self {
        Self {
            store,
            database,
            settings,
            telemetry,
            slots: DashMap::new(),
        }
    }

    /// Returns the database holding the containers.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns the container spec requested for `name` with the given default TTL.
    ///
    /// Without configured index paths the store's default indexing is used.
    /// [`Indexing::KeyValueStore`] disables indexing and container expiry.
    #[must_use]
    pub fn container_spec(&self, name: &str, default_ttl: Option<Duration>) -> ContainerSpec {
        let (indexing_policy, expiry_enabled) = match self.settings.indexing() {
            Indexing::Paths { included, excluded } if !(included.is_empty() && excluded.is_empty()) => {
                (IndexingPolicy::with_paths(included.clone(), excluded.clone()), true)
            }
            Indexing::KeyValueStore => (IndexingPolicy::disabled(), false),
            Indexing::Default | Indexing::Paths { .. } => (IndexingPolicy::default(), true),
        };

        let partition_key = match self.settings.partitioning() {
            Partitioning::ByKey => Some(PartitionKeyDefinition::new(format!("/{ID_FIELD}"))),
            Partitioning::None => None,
        };

        let throughput = match self.settings.throughput() {
            Throughput::Dedicated(request_units) => Some(request_units),
            Throughput::Shared => None,
        };

        ContainerSpec::new(name)
            .with_indexing_policy(indexing_policy)
            .with_partition_key(partition_key)
            .with_default_ttl(ttl::container_ttl(default_ttl, expiry_enabled))
            .with_throughput(throughput)
    }

    /// Returns the descriptor of `name` if it has been resolved.
    #[must_use]
    pub fn resolved(&self, name: &str) -> Option<ContainerDescriptor> {
        self.slots.get(name).and_then(|slot| slot.descriptor.get().cloned())
    }

    fn resolved_names(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter(|entry| entry.value().descriptor.get().is_some())
            .map(|entry| entry.key().clone())
            .collect()
    }

    fn slot(&self, name: &str) -> Arc<ContainerSlot> {
        Arc::clone(self.slots.entry(name.to_string()).or_default().value())
    }

    fn reuse(&self, existing: &ContainerDescriptor, requested: &ContainerSpec) -> ContainerDescriptor {
        if existing.spec.default_ttl() != requested.default_ttl() {
            tracing::warn!(
                cache.name = requested.name(),
                existing_ttl = ?existing.spec.default_ttl(),
                requested_ttl = ?requested.default_ttl(),
                "container already resolved with a different default TTL; reusing it unchanged"
            );
        }
        existing.clone()
    }

    fn finish(&self, spec: ContainerSpec, outcome: std::result::Result<ContainerAddress, StoreError>, started: Instant) -> Result<ContainerDescriptor> {
        let duration = self.telemetry.elapsed(started);
        match outcome {
            Ok(address) => {
                self.telemetry
                    .record(spec.name(), CacheOperation::Provision, CacheActivity::Provisioned, duration);
                Ok(ContainerDescriptor { address, spec })
            }
            Err(error) => {
                self.telemetry.record(spec.name(), CacheOperation::Provision, CacheActivity::Error, duration);
                Err(Error::from_cause(ErrorKind::ProvisioningFailure, error))
            }
        }
    }
}

impl<S: DocumentStore> CollectionProvisioner<S> {
    /// Resolves `name` to its container, creating the database and container
    /// on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ProvisioningFailure`] if the store rejects the
    /// database or container creation.
    pub async fn resolve(&self, name: &str, default_ttl: Option<Duration>) -> Result<ContainerDescriptor> {
        let spec = self.container_spec(name, default_ttl);
        let slot = self.slot(name);
        if let Some(existing) = slot.descriptor.get() {
            return Ok(self.reuse(existing, &spec));
        }

        let _gate = slot.async_gate.lock().await;
        if let Some(existing) = slot.descriptor.get() {
            return Ok(self.reuse(existing, &spec));
        }

        let started = self.telemetry.clock().instant();
        let outcome = match self.store.create_database_if_not_exists(&self.database).await {
            Ok(()) => self.store.create_container_if_not_exists(&self.database, &spec).await,
            Err(error) => Err(error),
        };

        let descriptor = self.finish(spec, outcome, started)?;
        Ok(slot.descriptor.get_or_init(|| descriptor).clone())
    }
}

impl<S: BlockingDocumentStore> CollectionProvisioner<S> {
    /// Blocking form of [`CollectionProvisioner::resolve`].
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ProvisioningFailure`] if the store rejects the
    /// database or container creation.
    pub fn resolve_blocking(&self, name: &str, default_ttl: Option<Duration>) -> Result<ContainerDescriptor> {
        let spec = self.container_spec(name, default_ttl);
        let slot = self.slot(name);
        if let Some(existing) = slot.descriptor.get() {
            return Ok(self.reuse(existing, &spec));
        }

        let _gate = slot.blocking_gate.lock();
        if let Some(existing) = slot.descriptor.get() {
            return Ok(self.reuse(existing, &spec));
        }

        let started = self.telemetry.clock().instant();
        let outcome = self
            .store
            .create_database_if_not_exists(&self.database)
            .and_then(|()| self.store.create_container_if_not_exists(&self.database, &spec));

        let descriptor = self.finish(spec, outcome, started)?;
        Ok(slot.descriptor.get_or_init(|| descriptor).clone())
    }
}
