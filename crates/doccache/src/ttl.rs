// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Conversions between cache TTLs and the store's TTL fields.
//!
//! The store counts TTLs in whole seconds. A container TTL of `None` disables
//! expiry entirely, `-1` enables per-document TTLs without a default, and a
//! positive value is the default lifetime. A document TTL of `-1` never
//! expires and a positive value overrides the container default.

use std::time::Duration;

/// The store's "never expire" TTL value.
pub(crate) const NEVER: i32 = -1;

/// Converts a duration to store seconds: rounded up, at least one second,
/// saturating at `i32::MAX`.
pub(crate) fn to_seconds(duration: Duration) -> i32 {
    let seconds = duration.as_secs().saturating_add(u64::from(duration.subsec_nanos() > 0)).max(1);
    i32::try_from(seconds).unwrap_or(i32::MAX)
}

/// Returns the default TTL a container is created with.
pub(crate) fn container_ttl(default_ttl: Option<Duration>, expiry_enabled: bool) -> Option<i32> {
    expiry_enabled.then(|| default_ttl.map_or(NEVER, to_seconds))
}

/// Returns the TTL written on a document.
///
/// An explicit item TTL always wins over the container default. Without one,
/// the container default is written explicitly. Nothing is written when the
/// container has expiry disabled.
pub(crate) fn document_ttl(item_ttl: Option<Duration>, container_ttl: Option<i32>) -> Option<i32> {
    let container_ttl = container_ttl?;
    Some(item_ttl.map_or(container_ttl, to_seconds))
}
