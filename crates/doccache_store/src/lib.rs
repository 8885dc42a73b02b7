// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! The boundary between document-backed caches and a document database.
//!
//! A document database groups JSON [`Document`]s into containers, which live
//! in databases. This crate describes the few operations a cache needs from
//! such a store:
//!
//! - create a database or container if it does not exist yet, with an
//!   [`IndexingPolicy`], an optional [`PartitionKeyDefinition`], a default TTL
//!   and a throughput request ([`ContainerSpec`]);
//! - read, upsert, create and delete single documents by id, addressed by
//!   [`ContainerAddress`] and, for partitioned containers, a partition key value.
//!
//! Store clients implement [`DocumentStore`] for asynchronous use and
//! [`BlockingDocumentStore`] for blocking use. Failures are reported as
//! [`StoreError`] with a [`StoreErrorKind`] that mirrors the store's status codes.
//!
//! # Testing
//!
//! Enable the `test-util` feature for [`testing::InMemoryDocumentStore`], an
//! emulator that follows the store's expiry, partitioning and throughput rules.

mod connection;
mod container;
mod document;
pub mod error;
mod store;
#[cfg(any(feature = "test-util", test))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub mod testing;

#[doc(inline)]
pub use connection::ConnectionPolicy;
#[doc(inline)]
pub use container::{ContainerAddress, ContainerSpec, IndexingMode, IndexingPolicy, PartitionKeyDefinition};
#[doc(inline)]
pub use document::{Document, ID_FIELD, SYSTEM_FIELDS, TTL_FIELD};
#[doc(inline)]
pub use error::{StoreError, StoreErrorKind};
#[doc(inline)]
pub use store::{BlockingDocumentStore, DocumentStore};
