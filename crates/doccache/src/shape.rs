// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Detects from a type alone whether its serde form can be a map.
//!
//! [`is_structured`] runs `T::deserialize` against a deserializer that
//! answers nothing and records the first request it receives. Structs and maps
//! ask for `deserialize_struct`/`deserialize_map`; strings, numbers, sequences
//! and externally tagged enums ask for something narrower and are rejected.
//! Types that ask for `deserialize_any` (tagged and untagged enums,
//! `serde_json::Value`) may still produce an object, so they are accepted and
//! each value is checked when it is encoded. Newtype wrappers and `Option` are
//! looked through.

use std::fmt;

use serde::de::{self, DeserializeOwned, Deserializer, Visitor};

#[derive(Debug)]
enum Shape {
    Structured,
    Other,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured => f.write_str("structured type"),
            Self::Other => f.write_str("non-structured type"),
        }
    }
}

impl std::error::Error for Shape {}

impl de::Error for Shape {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        Self::Other
    }
}

struct ShapeDetector;

macro_rules! reject {
    ($($method:ident($($arg:ident: $ty:ty),*);)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, $($arg: $ty,)* _visitor: V) -> Result<V::Value, Self::Error> {
                $(let _ = $arg;)*
                Err(Shape::Other)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for ShapeDetector {
    type Error = Shape;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(Shape::Structured)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(Shape::Structured)
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(Shape::Structured)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_some(self)
    }

    reject! {
        deserialize_bool();
        deserialize_i8();
        deserialize_i16();
        deserialize_i32();
        deserialize_i64();
        deserialize_i128();
        deserialize_u8();
        deserialize_u16();
        deserialize_u32();
        deserialize_u64();
        deserialize_u128();
        deserialize_f32();
        deserialize_f64();
        deserialize_char();
        deserialize_str();
        deserialize_string();
        deserialize_bytes();
        deserialize_byte_buf();
        deserialize_unit();
        deserialize_unit_struct(name: &'static str);
        deserialize_seq();
        deserialize_tuple(len: usize);
        deserialize_tuple_struct(name: &'static str, len: usize);
        deserialize_enum(name: &'static str, variants: &'static [&'static str]);
        deserialize_identifier();
    }

    serde::forward_to_deserialize_any! {
        ignored_any
    }
}

/// Returns `false` if `T` can never deserialize from a struct or map.
pub(crate) fn is_structured<T: DeserializeOwned>() -> bool {
    matches!(T::deserialize(ShapeDetector), Err(Shape::Structured))
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize)]
    struct Profile {
        _name: String,
    }

    #[derive(Deserialize)]
    struct Wrapper(Profile);

    #[derive(Deserialize)]
    struct Id(String);

    #[derive(Deserialize)]
    enum Color {
        _Red,
    }

    #[derive(Deserialize)]
    #[serde(tag = "kind")]
    enum Event {
        _Login { _user: String },
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Payload {
        _Named { _name: String },
        _Counted { _count: u32 },
    }

    #[test]
    fn structs_and_maps_are_structured() {
        assert!(is_structured::<Profile>());
        assert!(is_structured::<HashMap<String, u32>>());
        assert!(is_structured::<BTreeMap<String, String>>());
    }

    #[test]
    fn wrappers_are_looked_through() {
        assert!(is_structured::<Wrapper>());
        assert!(is_structured::<Option<Profile>>());
        assert!(is_structured::<Box<Profile>>());
        assert!(!is_structured::<Id>());
        assert!(!is_structured::<Option<String>>());
    }

    #[test]
    fn primitives_are_not_structured() {
        assert!(!is_structured::<String>());
        assert!(!is_structured::<u64>());
        assert!(!is_structured::<bool>());
        assert!(!is_structured::<Vec<Profile>>());
        assert!(!is_structured::<(u8, u8)>());
        assert!(!is_structured::<Color>());
        assert!(!is_structured::<()>());
    }

    #[test]
    fn self_describing_types_are_accepted() {
        assert!(is_structured::<Event>());
        assert!(is_structured::<Payload>());
        assert!(is_structured::<Option<Event>>());
        assert!(is_structured::<serde_json::Value>());
    }
}
