// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the document field holding the document id.
pub const ID_FIELD: &str = "id";

/// Name of the document field holding the per-document time-to-live.
pub const TTL_FIELD: &str = "ttl";

/// Properties the store adds to every document it returns.
pub const SYSTEM_FIELDS: [&str; 5] = ["_rid", "_self", "_etag", "_attachments", "_ts"];

/// A JSON document as exchanged with the store.
///
/// Every document has an `id` and an optional `ttl` in seconds. All other
/// fields live in the body and are flattened into the document root on the
/// wire, so `{"id": "k", "ttl": 5, "value": 1}` has a body of `{"value": 1}`.
///
/// The `ttl` follows the store's rules: `None` defers to the container default,
/// `-1` never expires, and a positive value expires that many seconds after
/// the last write. A container without a default TTL ignores document TTLs.
///
/// # Examples
///
/// ```
/// use doccache_store::Document;
/// use serde_json::json;
///
/// let document = Document::new("k1", json!({"value": "hello"}).as_object().cloned().unwrap_or_default())
///     .with_ttl(Some(5));
///
/// assert_eq!(
///     serde_json::to_value(&document).unwrap(),
///     json!({"id": "k1", "ttl": 5, "value": "hello"})
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ttl: Option<i32>,
    #[serde(flatten)]
    body: Map<String, Value>,
}

impl Document {
    /// Creates a document without a document-level TTL.
    pub fn new(id: impl Into<String>, body: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            ttl: None,
            body,
        }
    }

    /// Sets the document-level TTL in seconds.
    #[must_use]
    pub fn with_ttl(self, ttl: Option<i32>) -> Self {
        Self { ttl, ..self }
    }

    /// Returns the document id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the document-level TTL in seconds, if any.
    #[must_use]
    pub fn ttl(&self) -> Option<i32> {
        self.ttl
    }

    /// Returns the document fields other than `id` and `ttl`.
    #[must_use]
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Returns a mutable reference to the body.
    pub fn body_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.body
    }

    /// Consumes the document and returns its body.
    #[must_use]
    pub fn into_body(self) -> Map<String, Value> {
        self.body
    }
}
