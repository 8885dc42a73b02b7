// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Translation between cached values and store documents.
//!
//! Operations never look at the document layout themselves; they hand values
//! to [`Encoding::encode`] and documents to [`Encoding::decode`].

use std::time::Duration;

use doccache_store::{Document, ID_FIELD, SYSTEM_FIELDS, TTL_FIELD};
use doccache_tier::{Error, ErrorKind, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::Encoding;
use crate::ttl::document_ttl;

/// Field holding the value under [`Encoding::Wrapped`].
pub(crate) const VALUE_FIELD: &str = "value";

fn serialization_error(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Error {
    Error::from_cause(ErrorKind::Serialization, cause)
}

impl Encoding {
    /// Builds the document stored for `value` under `key`.
    pub(crate) fn encode<T: Serialize>(self, key: &str, value: &T, item_ttl: Option<Duration>, container_ttl: Option<i32>) -> Result<Document> {
        let value = serde_json::to_value(value).map_err(serialization_error)?;

        let body = match self {
            Self::Wrapped => {
                let mut body = Map::new();
                body.insert(VALUE_FIELD.to_string(), value);
                body
            }
            Self::DocumentDirect => match value {
                Value::Object(fields) => {
                    if let Some(reserved) = reserved_field(&fields) {
                        return Err(serialization_error(format!(
                            "field '{reserved}' is reserved and cannot be stored with document-direct encoding"
                        )));
                    }
                    fields
                }
                other => {
                    return Err(serialization_error(format!(
                        "document-direct encoding needs a value that serializes to an object, got {}",
                        json_kind(&other)
                    )));
                }
            },
        };

        Ok(Document::new(key, body).with_ttl(document_ttl(item_ttl, container_ttl)))
    }

    /// Extracts the cached value from a stored document.
    pub(crate) fn decode<T: DeserializeOwned>(self, document: Document) -> Result<T> {
        let id = document.id().to_string();
        let mut body = document.into_body();

        let value = match self {
            Self::Wrapped => body
                .remove(VALUE_FIELD)
                .ok_or_else(|| serialization_error(format!("document '{id}' has no '{VALUE_FIELD}' field")))?,
            Self::DocumentDirect => {
                for field in SYSTEM_FIELDS {
                    body.remove(field);
                }
                Value::Object(body)
            }
        };

        serde_json::from_value(value).map_err(serialization_error)
    }
}

/// Returns the first field of `fields` the store owns.
fn reserved_field(fields: &Map<String, Value>) -> Option<&'static str> {
    [ID_FIELD, TTL_FIELD]
        .into_iter()
        .chain(SYSTEM_FIELDS)
        .find(|field| fields.contains_key(*field))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Foo {
        #[serde(rename = "Foo")]
        foo: String,
    }

    #[derive(Serialize)]
    struct HasId {
        id: u32,
    }

    fn to_json(document: &Document) -> Value {
        serde_json::to_value(document).unwrap()
    }

    #[test]
    fn wrapped_layout() {
        let document = Encoding::Wrapped
            .encode("k1", &"hello", Some(Duration::from_secs(5)), Some(-1))
            .unwrap();
        assert_eq!(to_json(&document), json!({"id": "k1", "ttl": 5, "value": "hello"}));
    }

    #[test]
    fn wrapped_round_trip_ignores_system_fields() {
        let mut document = Encoding::Wrapped.encode("k", &vec![1, 2, 3], None, Some(10)).unwrap();
        document.body_mut().insert("_etag".to_string(), json!("\"1\""));

        let value: Vec<i32> = Encoding::Wrapped.decode(document).unwrap();
        assert_eq!(value, vec![1, 2, 3]);
    }

    #[test]
    fn wrapped_without_value_field_fails() {
        let document = Document::new("k", Map::new());
        let error = Encoding::Wrapped.decode::<String>(document).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn direct_layout_merges_fields() {
        let document = Encoding::DocumentDirect
            .encode("k2", &Foo { foo: "x".to_string() }, None, Some(1))
            .unwrap();
        assert_eq!(to_json(&document), json!({"id": "k2", "ttl": 1, "Foo": "x"}));
    }

    #[test]
    fn direct_decode_strips_system_fields() {
        let mut document = Encoding::DocumentDirect
            .encode("k2", &Foo { foo: "x".to_string() }, None, None)
            .unwrap();
        for field in SYSTEM_FIELDS {
            document.body_mut().insert(field.to_string(), json!("sys"));
        }

        let value: Foo = Encoding::DocumentDirect.decode(document).unwrap();
        assert_eq!(value, Foo { foo: "x".to_string() });
    }

    #[test]
    fn direct_rejects_non_objects() {
        let error = Encoding::DocumentDirect.encode("k", &42, None, None).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Serialization);
        assert!(error.to_string().contains("a number"));

        let none: Option<Foo> = None;
        let error = Encoding::DocumentDirect.encode("k", &none, None, None).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn direct_rejects_reserved_fields() {
        let error = Encoding::DocumentDirect.encode("k", &HasId { id: 1 }, None, None).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Serialization);
        assert!(error.to_string().contains("'id'"));
    }

    #[test]
    fn direct_rejects_system_fields() {
        #[derive(Serialize)]
        struct HasTimestamp {
            #[serde(rename = "_ts")]
            ts: u64,
        }

        let error = Encoding::DocumentDirect
            .encode("k", &HasTimestamp { ts: 1 }, None, None)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Serialization);
        assert!(error.to_string().contains("'_ts'"));

        for field in SYSTEM_FIELDS {
            let mut value = Map::new();
            value.insert(field.to_string(), json!("x"));
            let error = Encoding::DocumentDirect.encode("k", &Value::Object(value), None, None).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Serialization, "{field}");
        }
    }

    #[test]
    fn mismatched_payload_is_a_serialization_error() {
        let document = Encoding::Wrapped.encode("k", &"text", None, None).unwrap();
        let error = Encoding::Wrapped.decode::<u32>(document).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Serialization);
    }
}
