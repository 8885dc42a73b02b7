// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types returned by document stores.

use std::fmt;

use recoverable::{Recovery, RecoveryInfo};

/// The class of a store failure, mirroring the store's status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum StoreErrorKind {
    /// The addressed document, container or database does not exist (404).
    NotFound,
    /// A create found an existing resource with the same id (409).
    Conflict,
    /// The request rate exceeded the provisioned throughput (429).
    Throttled,
    /// The credentials were rejected (401/403).
    Unauthorized,
    /// The request was malformed, for example a partition key mismatch (400).
    BadRequest,
    /// The service could not be reached or is unavailable (503).
    Unavailable,
    /// The request did not complete in time (408).
    Timeout,
    /// The request was cancelled before completion.
    Cancelled,
    /// Any other failure.
    Other,
}

impl StoreErrorKind {
    /// Returns a short, stable name for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::Throttled => "throttled",
            Self::Unauthorized => "unauthorized",
            Self::BadRequest => "bad request",
            Self::Unavailable => "unavailable",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error returned by a [`DocumentStore`](crate::DocumentStore) or
/// [`BlockingDocumentStore`](crate::BlockingDocumentStore).
#[ohno::error]
#[display("document store request failed: {kind}")]
pub struct StoreError {
    kind: StoreErrorKind,
}

impl StoreError {
    /// Creates an error of the given kind without an underlying cause.
    #[must_use]
    pub fn from_kind(kind: StoreErrorKind) -> Self {
        Self::new(kind)
    }

    /// Creates an error of the given kind caused by another error or message.
    pub fn from_cause(kind: StoreErrorKind, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(kind, cause)
    }

    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    /// Returns `true` if the addressed resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == StoreErrorKind::NotFound
    }
}

impl Recovery for StoreError {
    fn recovery(&self) -> RecoveryInfo {
        match self.kind {
            StoreErrorKind::Throttled | StoreErrorKind::Timeout | StoreErrorKind::Cancelled => RecoveryInfo::retry(),
            StoreErrorKind::Unavailable => RecoveryInfo::unavailable(),
            _ => RecoveryInfo::never(),
        }
    }
}

#[cfg(test)]
mod tests {
    use recoverable::RecoveryKind;

    use super::*;

    #[test]
    fn display_includes_kind() {
        let error = StoreError::from_cause(StoreErrorKind::BadRequest, "partition key mismatch");
        let display = error.to_string();
        assert!(display.contains("bad request"), "got: {display}");
        assert!(display.contains("partition key mismatch"), "got: {display}");
    }

    #[test]
    fn not_found_is_detectable() {
        assert!(StoreError::from_kind(StoreErrorKind::NotFound).is_not_found());
        assert!(!StoreError::from_kind(StoreErrorKind::Conflict).is_not_found());
    }

    #[test]
    fn recovery_classification() {
        assert_eq!(StoreError::from_kind(StoreErrorKind::Throttled).recovery().kind(), RecoveryKind::Retry);
        assert_eq!(StoreError::from_kind(StoreErrorKind::Timeout).recovery().kind(), RecoveryKind::Retry);
        assert_eq!(
            StoreError::from_kind(StoreErrorKind::Unavailable).recovery().kind(),
            RecoveryKind::Unavailable
        );
        assert_eq!(StoreError::from_kind(StoreErrorKind::Unauthorized).recovery().kind(), RecoveryKind::Never);
    }
}
