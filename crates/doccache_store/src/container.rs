// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Locator of a container inside a database account.
///
/// Displays as `dbs/{database}/colls/{container}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContainerAddress {
    database: String,
    container: String,
}

impl ContainerAddress {
    /// Creates the address of `container` in `database`.
    pub fn new(database: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            container: container.into(),
        }
    }

    /// Returns the database name.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns the container name.
    #[must_use]
    pub fn container(&self) -> &str {
        &self.container
    }
}

impl fmt::Display for ContainerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dbs/{}/colls/{}", self.database, self.container)
    }
}

/// When the store updates the index relative to writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndexingMode {
    /// The index is updated synchronously with every write.
    #[default]
    Consistent,
    /// Nothing is indexed; only point operations by id are possible.
    None,
}

/// Which document paths the store indexes.
///
/// The default indexes every path automatically and consistently.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingPolicy {
    automatic: bool,
    indexing_mode: IndexingMode,
    included_paths: Vec<String>,
    excluded_paths: Vec<String>,
}

impl Default for IndexingPolicy {
    fn default() -> Self {
        Self {
            automatic: true,
            indexing_mode: IndexingMode::Consistent,
            included_paths: vec!["/*".to_string()],
            excluded_paths: Vec::new(),
        }
    }
}

impl IndexingPolicy {
    /// Creates a consistent policy indexing exactly the given paths.
    #[must_use]
    pub fn with_paths(included_paths: Vec<String>, excluded_paths: Vec<String>) -> Self {
        Self {
            automatic: true,
            indexing_mode: IndexingMode::Consistent,
            included_paths,
            excluded_paths,
        }
    }

    /// Creates a policy that indexes nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            automatic: false,
            indexing_mode: IndexingMode::None,
            included_paths: Vec::new(),
            excluded_paths: Vec::new(),
        }
    }

    /// Returns `true` if new documents are indexed automatically.
    #[must_use]
    pub fn automatic(&self) -> bool {
        self.automatic
    }

    /// Returns the indexing mode.
    #[must_use]
    pub fn indexing_mode(&self) -> IndexingMode {
        self.indexing_mode
    }

    /// Returns the included path patterns.
    #[must_use]
    pub fn included_paths(&self) -> &[String] {
        &self.included_paths
    }

    /// Returns the excluded path patterns.
    #[must_use]
    pub fn excluded_paths(&self) -> &[String] {
        &self.excluded_paths
    }
}

/// The document paths whose values partition a container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionKeyDefinition {
    paths: Vec<String>,
}

impl PartitionKeyDefinition {
    /// Partitions by the value at `path`, for example `/id`.
    pub fn new(path: impl Into<String>) -> Self {
        Self { paths: vec![path.into()] }
    }

    /// Returns the partition key paths.
    #[must_use]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}

/// Everything the store needs to create a container.
///
/// # Examples
///
/// ```
/// use doccache_store::{ContainerSpec, PartitionKeyDefinition};
///
/// let spec = ContainerSpec::new("sessions")
///     .with_partition_key(Some(PartitionKeyDefinition::new("/id")))
///     .with_default_ttl(Some(60))
///     .with_throughput(None);
///
/// assert_eq!(spec.name(), "sessions");
/// assert_eq!(spec.default_ttl(), Some(60));
/// assert_eq!(spec.throughput(), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerSpec {
    name: String,
    indexing_policy: IndexingPolicy,
    partition_key: Option<PartitionKeyDefinition>,
    default_ttl: Option<i32>,
    throughput: Option<u32>,
}

impl ContainerSpec {
    /// Creates a spec with default indexing, no partition key, TTL disabled
    /// and no dedicated throughput.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            indexing_policy: IndexingPolicy::default(),
            partition_key: None,
            default_ttl: None,
            throughput: None,
        }
    }

    /// Sets the indexing policy.
    #[must_use]
    pub fn with_indexing_policy(self, indexing_policy: IndexingPolicy) -> Self {
        Self { indexing_policy, ..self }
    }

    /// Sets the partition key definition.
    #[must_use]
    pub fn with_partition_key(self, partition_key: Option<PartitionKeyDefinition>) -> Self {
        Self { partition_key, ..self }
    }

    /// Sets the container default TTL in seconds.
    ///
    /// `None` disables expiry on the container, `-1` enables per-document TTLs
    /// without a default, and a positive value is the default lifetime.
    #[must_use]
    pub fn with_default_ttl(self, default_ttl: Option<i32>) -> Self {
        Self { default_ttl, ..self }
    }

    /// Requests dedicated throughput in request units per second.
    ///
    /// `None` leaves the container on the database's shared throughput.
    #[must_use]
    pub fn with_throughput(self, throughput: Option<u32>) -> Self {
        Self { throughput, ..self }
    }

    /// Returns the container name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the indexing policy.
    #[must_use]
    pub fn indexing_policy(&self) -> &IndexingPolicy {
        &self.indexing_policy
    }

    /// Returns the partition key definition, if the container is partitioned.
    #[must_use]
    pub fn partition_key(&self) -> Option<&PartitionKeyDefinition> {
        self.partition_key.as_ref()
    }

    /// Returns the container default TTL.
    #[must_use]
    pub fn default_ttl(&self) -> Option<i32> {
        self.default_ttl
    }

    /// Returns the requested dedicated throughput.
    #[must_use]
    pub fn throughput(&self) -> Option<u32> {
        self.throughput
    }
}
