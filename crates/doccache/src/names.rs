// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use doccache_tier::{Error, ErrorKind, Result};

/// Characters the store does not accept in resource and document ids.
const FORBIDDEN: [char; 4] = ['/', '\\', '?', '#'];

fn invalid_char(value: &str) -> Option<char> {
    value.chars().find(|c| FORBIDDEN.contains(c) || c.is_control())
}

/// Checks that `key` can be used as a document id.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    doccache_tier::validate_key(key)?;
    match invalid_char(key) {
        Some(c) => Err(Error::from_cause(
            ErrorKind::InvalidKey,
            format!("cache key {key:?} contains the forbidden character {c:?}"),
        )),
        None => Ok(()),
    }
}

/// Checks that `name` can be used as a container or database name.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::from_cause(ErrorKind::InvalidConfiguration, "cache name must not be blank"));
    }
    match invalid_char(name) {
        Some(c) => Err(Error::from_cause(
            ErrorKind::InvalidConfiguration,
            format!("cache name {name:?} contains the forbidden character {c:?}"),
        )),
        None => Ok(()),
    }
}

/// Returns the name of `T` without module paths, e.g. `Vec<String>` for
/// `alloc::vec::Vec<alloc::string::String>`.
pub(crate) fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let mut short = String::with_capacity(full.len());
    let mut segment = String::new();

    for c in full.chars() {
        match c {
            ':' => segment.clear(),
            '<' | '>' | ',' | '(' | ')' | '[' | ']' | ';' | '&' | ' ' => {
                short.push_str(&segment);
                segment.clear();
                short.push(c);
            }
            _ => segment.push(c),
        }
    }
    short.push_str(&segment);
    short
}
