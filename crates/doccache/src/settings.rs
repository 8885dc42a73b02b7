// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Configuration of a [`DocumentCacheFactory`](crate::DocumentCacheFactory).

use std::time::Duration;

use doccache_store::ConnectionPolicy;
use doccache_tier::{Error, ErrorKind, Result};

/// Dedicated throughput requested for new containers unless configured otherwise.
pub const DEFAULT_CONTAINER_THROUGHPUT: u32 = 400;

/// How cached values are laid out in their documents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// The value is serialized into a single `value` field:
    /// `{"id": key, "ttl": n, "value": <value>}`. Any serializable type works.
    #[default]
    Wrapped,
    /// The value's own fields are merged into the document root:
    /// `{"id": key, "ttl": n, ...fields}`. The store can index and query
    /// those fields, but only struct- or map-shaped types can be stored.
    DocumentDirect,
}

/// Which document paths new containers index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Indexing {
    /// The store's default policy: every path, updated consistently.
    #[default]
    Default,
    /// Consistent indexing of exactly the given path patterns.
    Paths {
        /// Paths to index, for example `/name/?`.
        included: Vec<String>,
        /// Paths to leave out of the index, for example `/payload/*`.
        excluded: Vec<String>,
    },
    /// No indexing and no container-level expiry; documents can only be
    /// reached by key and never expire.
    KeyValueStore,
}

/// How throughput is provisioned for new containers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Throughput {
    /// Each container gets its own offer of this many request units per second.
    Dedicated(u32),
    /// Containers share the database's offer. If the database has none, the
    /// store gives each container its default dedicated offer.
    Shared,
}

impl Default for Throughput {
    fn default() -> Self {
        Self::Dedicated(DEFAULT_CONTAINER_THROUGHPUT)
    }
}

/// How new containers are partitioned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Partitioning {
    /// Containers are not partitioned.
    #[default]
    None,
    /// Containers are partitioned by `/id`, so each key is its own partition.
    ByKey,
}

/// Whether the store client reads and writes in multiple regions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MultiRegion {
    /// Writes go to the account's primary region.
    #[default]
    Disabled,
    /// Writes may go to any region, preferring the one this process runs in.
    Enabled {
        /// The region the process runs in, for example `West Europe`.
        current_region: String,
    },
}

/// Settings shared by every cache a factory creates.
///
/// Settings are immutable once handed to the factory. Build them with the
/// chained setters:
///
/// ```
/// use std::time::Duration;
///
/// use doccache::{CacheFactorySettings, Encoding, Partitioning, Throughput};
///
/// let settings = CacheFactorySettings::default()
///     .with_encoding(Encoding::DocumentDirect)
///     .with_default_ttl(Some(Duration::from_secs(3600)))
///     .with_partitioning(Partitioning::ByKey)
///     .with_throughput(Throughput::Shared);
///
/// assert_eq!(settings.encoding(), Encoding::DocumentDirect);
/// assert_eq!(settings.default_ttl(), Some(Duration::from_secs(3600)));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheFactorySettings {
    encoding: Encoding,
    default_ttl: Option<Duration>,
    partitioning: Partitioning,
    indexing: Indexing,
    throughput: Throughput,
    multi_region: MultiRegion,
    request_timeout: Option<Duration>,
    logs: bool,
}

impl CacheFactorySettings {
    /// Sets how values are laid out in documents. Defaults to [`Encoding::Wrapped`].
    #[must_use]
    pub fn with_encoding(self, encoding: Encoding) -> Self {
        Self { encoding, ..self }
    }

    /// Sets the default TTL of new containers; `None` means items never expire
    /// unless written with their own TTL. Defaults to `None`.
    ///
    /// Container TTLs have a resolution of one second; shorter or fractional
    /// durations are rounded up.
    #[must_use]
    pub fn with_default_ttl(self, default_ttl: Option<Duration>) -> Self {
        Self { default_ttl, ..self }
    }

    /// Sets how new containers are partitioned. Defaults to [`Partitioning::None`].
    #[must_use]
    pub fn with_partitioning(self, partitioning: Partitioning) -> Self {
        Self { partitioning, ..self }
    }

    /// Sets which paths new containers index. Defaults to [`Indexing::Default`].
    #[must_use]
    pub fn with_indexing(self, indexing: Indexing) -> Self {
        Self { indexing, ..self }
    }

    /// Sets how throughput is provisioned for new containers.
    /// Defaults to [`Throughput::Dedicated`] with [`DEFAULT_CONTAINER_THROUGHPUT`].
    #[must_use]
    pub fn with_throughput(self, throughput: Throughput) -> Self {
        Self { throughput, ..self }
    }

    /// Enables or disables multi-region reads and writes. Defaults to [`MultiRegion::Disabled`].
    #[must_use]
    pub fn with_multi_region(self, multi_region: MultiRegion) -> Self {
        Self { multi_region, ..self }
    }

    /// Abandons asynchronous store requests that take longer than `timeout`
    /// and reports them as [`ErrorKind::Cancelled`]. Defaults to no timeout.
    #[must_use]
    pub fn with_request_timeout(self, timeout: Option<Duration>) -> Self {
        Self {
            request_timeout: timeout,
            ..self
        }
    }

    /// Enables structured logging of cache operations through `tracing`.
    /// Defaults to disabled.
    #[must_use]
    pub fn with_logs(self, enabled: bool) -> Self {
        Self { logs: enabled, ..self }
    }

    /// Returns the value encoding.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Returns the default TTL of new containers.
    #[must_use]
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Returns the partitioning of new containers.
    #[must_use]
    pub fn partitioning(&self) -> Partitioning {
        self.partitioning
    }

    /// Returns the indexing of new containers.
    #[must_use]
    pub fn indexing(&self) -> &Indexing {
        &self.indexing
    }

    /// Returns the throughput provisioning of new containers.
    #[must_use]
    pub fn throughput(&self) -> Throughput {
        self.throughput
    }

    /// Returns the multi-region configuration.
    #[must_use]
    pub fn multi_region(&self) -> &MultiRegion {
        &self.multi_region
    }

    /// Returns the request timeout for asynchronous operations.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Returns `true` if cache operations are logged.
    #[must_use]
    pub fn logs(&self) -> bool {
        self.logs
    }

    /// Returns the connection policy a store client should use for these settings.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidConfiguration`] if multi-region is enabled
    /// with a malformed region name.
    pub fn connection_policy(&self) -> Result<ConnectionPolicy> {
        match &self.multi_region {
            MultiRegion::Disabled => Ok(ConnectionPolicy::default()),
            MultiRegion::Enabled { current_region } => {
                validate_region(current_region)?;
                Ok(ConnectionPolicy::default()
                    .with_multiple_write_locations(true)
                    .with_endpoint_discovery(true)
                    .with_preferred_locations(vec![current_region.clone()]))
            }
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.connection_policy()?;

        if let Throughput::Dedicated(0) = self.throughput {
            return Err(Error::from_cause(
                ErrorKind::InvalidConfiguration,
                "dedicated throughput must be greater than zero",
            ));
        }

        if self.request_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(Error::from_cause(ErrorKind::InvalidConfiguration, "request timeout must be greater than zero"));
        }

        if let Indexing::Paths { included, excluded } = &self.indexing
            && let Some(path) = included.iter().chain(excluded).find(|path| path.trim().is_empty())
        {
            return Err(Error::from_cause(
                ErrorKind::InvalidConfiguration,
                format!("indexing path {path:?} must not be blank"),
            ));
        }

        Ok(())
    }
}

fn validate_region(region: &str) -> Result<()> {
    let well_formed = !region.is_empty()
        && region.trim() == region
        && region.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ');

    if well_formed {
        Ok(())
    } else {
        Err(Error::from_cause(
            ErrorKind::InvalidConfiguration,
            format!("unable to set current location to {region:?}"),
        ))
    }
}
