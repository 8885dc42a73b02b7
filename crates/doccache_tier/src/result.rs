// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// The outcome of a cache read that distinguishes "found" from "not found".
///
/// Unlike a plain `Option`, the result makes the lookup outcome explicit at the
/// API surface and offers [`CacheResult::value_or_default`] for callers that
/// want the zero value on a miss without losing the information that it was a
/// miss.
///
/// # Examples
///
/// ```
/// use doccache_tier::CacheResult;
///
/// let hit = CacheResult::found(0);
/// assert!(hit.has_value());
/// assert_eq!(hit.value(), Some(&0));
///
/// let miss = CacheResult::<i32>::missing();
/// assert!(!miss.has_value());
/// assert_eq!(miss.value_or_default(), 0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheResult<V> {
    value: Option<V>,
}

impl<V> CacheResult<V> {
    /// Creates a result for a key that was found.
    pub fn found(value: V) -> Self {
        Self { value: Some(value) }
    }

    /// Creates a result for a key that was not found.
    #[must_use]
    pub fn missing() -> Self {
        Self { value: None }
    }

    /// Returns `true` if the key was found.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Returns the value if the key was found.
    #[must_use]
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Consumes the result and returns the value if the key was found.
    #[must_use]
    pub fn into_value(self) -> Option<V> {
        self.value
    }

    /// Consumes the result and returns the value, or `V::default()` on a miss.
    #[must_use]
    pub fn value_or_default(self) -> V
    where
        V: Default,
    {
        self.value.unwrap_or_default()
    }
}

impl<V> Default for CacheResult<V> {
    fn default() -> Self {
        Self::missing()
    }
}

impl<V> From<Option<V>> for CacheResult<V> {
    fn from(value: Option<V>) -> Self {
        Self { value }
    }
}

impl<V> From<CacheResult<V>> for Option<V> {
    fn from(result: CacheResult<V>) -> Self {
        result.value
    }
}
