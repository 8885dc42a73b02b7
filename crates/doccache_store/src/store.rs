// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The operations a document-backed cache needs from its store.
//!
//! A store is reached either through [`DocumentStore`], whose methods return
//! futures that suspend the calling task, or through [`BlockingDocumentStore`],
//! whose methods block the calling thread. A client library typically offers
//! both; the cache layer never converts one into the other.
//!
//! Partition addressing: when a container is partitioned, `partition_key` must
//! carry the value of the document's partition key path. For unpartitioned
//! containers it must be `None`.

use crate::{ContainerAddress, ContainerSpec, Document, StoreError};

/// Asynchronous access to a document database.
pub trait DocumentStore: Send + Sync {
    /// Creates `database` unless it already exists.
    fn create_database_if_not_exists(&self, database: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Creates the container described by `spec` in `database` unless a
    /// container with that name already exists, and returns its address.
    ///
    /// An existing container is returned as is; its policy is not changed.
    fn create_container_if_not_exists(
        &self,
        database: &str,
        spec: &ContainerSpec,
    ) -> impl Future<Output = Result<ContainerAddress, StoreError>> + Send;

    /// Reads the document with the given id.
    ///
    /// Fails with [`StoreErrorKind::NotFound`](crate::StoreErrorKind::NotFound)
    /// if it does not exist or has expired.
    fn read_document(
        &self,
        container: &ContainerAddress,
        id: &str,
        partition_key: Option<&str>,
    ) -> impl Future<Output = Result<Document, StoreError>> + Send;

    /// Inserts `document`, replacing any existing document with the same id.
    fn upsert_document(
        &self,
        container: &ContainerAddress,
        document: Document,
        partition_key: Option<&str>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Inserts `document`, failing with
    /// [`StoreErrorKind::Conflict`](crate::StoreErrorKind::Conflict) if a live
    /// document with the same id exists.
    fn create_document(
        &self,
        container: &ContainerAddress,
        document: Document,
        partition_key: Option<&str>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes the document with the given id.
    ///
    /// Fails with [`StoreErrorKind::NotFound`](crate::StoreErrorKind::NotFound)
    /// if it does not exist.
    fn delete_document(
        &self,
        container: &ContainerAddress,
        id: &str,
        partition_key: Option<&str>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Blocking access to a document database.
///
/// Every method has the semantics of the [`DocumentStore`] method of the same name.
pub trait BlockingDocumentStore: Send + Sync {
    /// Creates `database` unless it already exists.
    fn create_database_if_not_exists(&self, database: &str) -> Result<(), StoreError>;

    /// Creates a container unless it already exists, and returns its address.
    fn create_container_if_not_exists(&self, database: &str, spec: &ContainerSpec) -> Result<ContainerAddress, StoreError>;

    /// Reads the document with the given id.
    fn read_document(&self, container: &ContainerAddress, id: &str, partition_key: Option<&str>) -> Result<Document, StoreError>;

    /// Inserts or replaces a document.
    fn upsert_document(&self, container: &ContainerAddress, document: Document, partition_key: Option<&str>) -> Result<(), StoreError>;

    /// Inserts a document that must not exist yet.
    fn create_document(&self, container: &ContainerAddress, document: Document, partition_key: Option<&str>) -> Result<(), StoreError>;

    /// Deletes the document with the given id.
    fn delete_document(&self, container: &ContainerAddress, id: &str, partition_key: Option<&str>) -> Result<(), StoreError>;
}
