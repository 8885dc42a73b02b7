// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `CacheItem` and `CacheResult`.

use std::time::Duration;

use doccache_tier::{CacheItem, CacheResult, ErrorKind, validate_key};

#[test]
fn new_keeps_key_value_and_ttl() {
    let item = CacheItem::new("k1", "hello".to_string(), Duration::from_secs(5));
    assert_eq!(item.key(), "k1");
    assert_eq!(item.value(), "hello");
    assert_eq!(item.ttl(), Some(Duration::from_secs(5)));
}

#[test]
fn max_duration_means_no_item_ttl() {
    let item = CacheItem::new("k", 1_u8, Duration::MAX);
    assert_eq!(item.ttl(), None);
    assert_eq!(item, CacheItem::without_ttl("k", 1_u8));
}

#[test]
fn zero_ttl_is_kept_as_given() {
    let item = CacheItem::new("k", (), Duration::ZERO);
    assert_eq!(item.ttl(), Some(Duration::ZERO));
}

#[test]
fn empty_keys_are_invalid() {
    validate_key("k").unwrap();
    validate_key(" ").unwrap();

    let error = validate_key("").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidKey);
}

#[test]
fn into_parts_returns_everything() {
    let (key, value, ttl) = CacheItem::new(String::from("owned"), vec![1, 2], Duration::from_millis(1500)).into_parts();
    assert_eq!(key, "owned");
    assert_eq!(value, vec![1, 2]);
    assert_eq!(ttl, Some(Duration::from_millis(1500)));
}

#[test]
fn found_result_exposes_value() {
    let result = CacheResult::found("v".to_string());
    assert!(result.has_value());
    assert_eq!(result.value().map(String::as_str), Some("v"));
    assert_eq!(result.into_value().as_deref(), Some("v"));
}

#[test]
fn missing_result_defaults() {
    let result = CacheResult::<u64>::missing();
    assert!(!result.has_value());
    assert_eq!(result.value(), None);
    assert_eq!(result.value_or_default(), 0);
    assert_eq!(CacheResult::<String>::default().value_or_default(), String::new());
}

#[test]
fn found_default_value_is_still_a_hit() {
    let result = CacheResult::found(0_i32);
    assert!(result.has_value());
    assert_eq!(result.value_or_default(), 0);
}

#[test]
fn converts_to_and_from_option() {
    let result: CacheResult<i32> = Some(3).into();
    assert_eq!(result, CacheResult::found(3));
    let option: Option<i32> = result.into();
    assert_eq!(option, Some(3));

    let result: CacheResult<i32> = None.into();
    assert_eq!(result, CacheResult::missing());
}
