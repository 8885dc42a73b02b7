// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;
use std::time::Duration;

use doccache_store::{BlockingDocumentStore, ConnectionPolicy, ContainerAddress, DocumentStore, StoreError};
use doccache_tier::{Error, ErrorKind, Result};
#[cfg(feature = "metrics")]
use opentelemetry::metrics::MeterProvider;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tick::Clock;

use crate::names::{short_type_name, validate_name};
use crate::telemetry::CacheTelemetry;
use crate::{CacheFactorySettings, CollectionProvisioner, ContainerDescriptor, DocumentCache, Encoding, shape};

/// Creates [`DocumentCache`] instances backed by containers of one database.
///
/// The factory owns the store handle for its whole lifetime and shares it with
/// every cache it creates. Each logical cache name maps to one container,
/// created on first use and remembered afterwards, so creating the same cache
/// again (or from many tasks at once) is cheap and yields the same container.
///
/// # Examples
///
/// ```
/// use doccache::{CacheFactorySettings, DocumentCacheFactory};
/// use doccache_store::testing::InMemoryDocumentStore;
/// use doccache_tier::{BlockingCache, CacheItem};
/// use std::time::Duration;
/// use tick::Clock;
///
/// let clock = Clock::new_frozen();
/// let store = InMemoryDocumentStore::new(clock.clone());
/// let factory = DocumentCacheFactory::new(store, "cache-db", CacheFactorySettings::default(), clock)?;
///
/// let cache = factory.create_blocking::<String>("greetings")?;
/// cache.set(CacheItem::new("k1", "hello".to_string(), Duration::from_secs(5)))?;
/// assert_eq!(cache.get("k1")?.as_deref(), Some("hello"));
/// # Ok::<(), doccache_tier::Error>(())
/// ```
pub struct DocumentCacheFactory<S> {
    store: Arc<S>,
    settings: CacheFactorySettings,
    provisioner: CollectionProvisioner<S>,
    telemetry: CacheTelemetry,
}

impl<S> std::fmt::Debug for DocumentCacheFactory<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCacheFactory")
            .field("database", &self.provisioner.database())
            .field("settings", &self.settings)
            .field("provisioner", &self.provisioner)
            .finish_non_exhaustive()
    }
}

impl<S> DocumentCacheFactory<S> {
    /// Creates a factory over an already connected store.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidConfiguration`] if the settings are invalid
    /// or `database` is not a valid database name.
    pub fn new(store: S, database: impl Into<String>, settings: CacheFactorySettings, clock: Clock) -> Result<Self> {
        let database = database.into();
        settings.validate()?;
        validate_name(&database)?;

        let store = Arc::new(store);
        let telemetry = CacheTelemetry::new(settings.logs(), clock);
        let provisioner = CollectionProvisioner::with_telemetry(Arc::clone(&store), database, settings.clone(), telemetry.clone());

        Ok(Self {
            store,
            settings,
            provisioner,
            telemetry,
        })
    }

    /// Validates the settings, then connects to the store through `connector`
    /// using the connection policy derived from them.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidConfiguration`] for invalid settings without
    /// calling `connector`, and [`ErrorKind::StoreUnavailable`] if the
    /// connection fails.
    pub fn connect<F>(database: impl Into<String>, settings: CacheFactorySettings, clock: Clock, connector: F) -> Result<Self>
    where
        F: FnOnce(&ConnectionPolicy) -> std::result::Result<S, StoreError>,
    {
        let database = database.into();
        settings.validate()?;
        validate_name(&database)?;

        let policy = settings.connection_policy()?;
        let store = connector(&policy).map_err(|error| Error::from_cause(ErrorKind::StoreUnavailable, error))?;
        Self::new(store, database, settings, clock)
    }

    /// Also reports cache metrics to `provider`, for every cache created afterwards.
    #[cfg(feature = "metrics")]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    #[must_use]
    pub fn with_metrics(mut self, provider: &dyn MeterProvider) -> Self {
        self.telemetry = self.telemetry.with_metrics(provider);
        self.provisioner.telemetry = self.telemetry.clone();
        self
    }

    /// Returns the store handle shared by every cache of this factory.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the settings the factory was created with.
    #[must_use]
    pub fn settings(&self) -> &CacheFactorySettings {
        &self.settings
    }

    /// Returns the database holding the cache containers.
    #[must_use]
    pub fn database(&self) -> &str {
        self.provisioner.database()
    }

    /// Returns the container address of `name` if a cache of that name has been created.
    #[must_use]
    pub fn container_address(&self, name: &str) -> Option<ContainerAddress> {
        self.provisioner.resolved(name).map(|descriptor| descriptor.address().clone())
    }

    /// Checks the name and that `T` can be stored under the configured encoding.
    fn check<T: DeserializeOwned>(&self, name: &str) -> Result<()> {
        validate_name(name)?;

        if self.settings.encoding() == Encoding::DocumentDirect && !shape::is_structured::<T>() {
            return Err(Error::from_cause(
                ErrorKind::InvalidConfiguration,
                format!(
                    "{} cannot be stored with document-direct encoding; only types serialized as maps can be merged into a document",
                    short_type_name::<T>()
                ),
            ));
        }

        Ok(())
    }

    fn cache<T>(&self, name: &str, container: ContainerDescriptor) -> DocumentCache<T, S> {
        DocumentCache::new(
            name.to_string(),
            Arc::clone(&self.store),
            container,
            self.settings.encoding(),
            self.settings.request_timeout(),
            self.telemetry.clone(),
        )
    }
}

impl<S: DocumentStore> DocumentCacheFactory<S> {
    /// Creates the cache `name` with the factory's default TTL.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidConfiguration`] for an invalid name or a
    /// type the encoding cannot store, and [`ErrorKind::ProvisioningFailure`]
    /// if the container cannot be created.
    pub async fn create<T>(&self, name: &str) -> Result<DocumentCache<T, S>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.create_with_ttl(name, self.settings.default_ttl()).await
    }

    /// Creates the cache `name` whose container expires documents after
    /// `default_ttl`, or never when `None`.
    ///
    /// The first creation of a name fixes its container; later requests with
    /// a different TTL reuse that container unchanged.
    ///
    /// # Errors
    ///
    /// Same as [`DocumentCacheFactory::create`].
    pub async fn create_with_ttl<T>(&self, name: &str, default_ttl: Option<Duration>) -> Result<DocumentCache<T, S>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.check::<T>(name)?;
        let container = self.provisioner.resolve(name, default_ttl).await?;
        Ok(self.cache(name, container))
    }

    /// Creates a cache named after `T`, e.g. `Profile` or `Vec<String>`.
    ///
    /// # Errors
    ///
    /// Same as [`DocumentCacheFactory::create`].
    pub async fn create_default<T>(&self) -> Result<DocumentCache<T, S>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.create(&short_type_name::<T>()).await
    }
}

impl<S: BlockingDocumentStore> DocumentCacheFactory<S> {
    /// Blocking form of [`DocumentCacheFactory::create`].
    ///
    /// # Errors
    ///
    /// Same as [`DocumentCacheFactory::create`].
    pub fn create_blocking<T>(&self, name: &str) -> Result<DocumentCache<T, S>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.create_with_ttl_blocking(name, self.settings.default_ttl())
    }

    /// Blocking form of [`DocumentCacheFactory::create_with_ttl`].
    ///
    /// # Errors
    ///
    /// Same as [`DocumentCacheFactory::create`].
    pub fn create_with_ttl_blocking<T>(&self, name: &str, default_ttl: Option<Duration>) -> Result<DocumentCache<T, S>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.check::<T>(name)?;
        let container = self.provisioner.resolve_blocking(name, default_ttl)?;
        Ok(self.cache(name, container))
    }

    /// Blocking form of [`DocumentCacheFactory::create_default`].
    ///
    /// # Errors
    ///
    /// Same as [`DocumentCacheFactory::create`].
    pub fn create_default_blocking<T>(&self) -> Result<DocumentCache<T, S>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.create_blocking(&short_type_name::<T>())
    }
}
