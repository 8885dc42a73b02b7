// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache operations.

use std::fmt;

use recoverable::{Recovery, RecoveryInfo};

/// Classifies why a cache operation failed.
///
/// A missing key is never an error: reads report absence through
/// [`CacheResult`](crate::CacheResult) or `None` instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The cache cannot be created with the requested configuration, for
    /// example a primitive value type under document-direct encoding or a
    /// malformed region hint.
    InvalidConfiguration,
    /// The key is empty or contains characters the backend cannot address.
    InvalidKey,
    /// The backing database or container could not be created.
    ProvisioningFailure,
    /// The backend rejected the request due to rate limiting.
    Throttled,
    /// An insert-only write found an existing entry for the key.
    Conflict,
    /// The backend failed for any other reason (authorization, outage, malformed request).
    StoreUnavailable,
    /// A value could not be encoded into, or decoded from, its stored form.
    Serialization,
    /// The operation has no implementation on this backend.
    Unsupported,
    /// The request was cancelled or timed out before the backend answered.
    Cancelled,
}

impl ErrorKind {
    /// Returns a short, stable name for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidConfiguration => "invalid configuration",
            Self::InvalidKey => "invalid key",
            Self::ProvisioningFailure => "provisioning failure",
            Self::Throttled => "throttled",
            Self::Conflict => "conflict",
            Self::StoreUnavailable => "store unavailable",
            Self::Serialization => "serialization error",
            Self::Unsupported => "unsupported",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error from a cache operation.
///
/// Every error carries an [`ErrorKind`] so callers can branch on the failure
/// class (for example, treat [`ErrorKind::Conflict`] from `add` as "already
/// present"). The underlying cause, if any, is available through
/// [`std::error::Error::source()`] and is shown in the display output.
///
/// # Example
///
/// ```
/// use doccache_tier::{Error, ErrorKind};
///
/// let error = Error::from_cause(ErrorKind::Throttled, "request rate too large");
/// assert_eq!(error.kind(), ErrorKind::Throttled);
/// assert!(error.to_string().contains("request rate too large"));
/// ```
#[ohno::error]
#[display("cache operation failed: {kind}")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Creates an error of the given kind without an underlying cause.
    #[must_use]
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self::new(kind)
    }

    /// Creates an error of the given kind caused by another error or message.
    pub fn from_cause(kind: ErrorKind, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(kind, cause)
    }

    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns `true` if this error reports an operation the backend does not support.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        self.kind == ErrorKind::Unsupported
    }
}

impl Recovery for Error {
    fn recovery(&self) -> RecoveryInfo {
        match self.kind {
            ErrorKind::Throttled | ErrorKind::Cancelled => RecoveryInfo::retry(),
            ErrorKind::StoreUnavailable => RecoveryInfo::unavailable(),
            _ => RecoveryInfo::never(),
        }
    }
}

/// A specialized [`Result`] type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use recoverable::RecoveryKind;

    use super::*;

    #[test]
    fn display_contains_kind_and_cause() {
        let error = Error::from_cause(ErrorKind::Conflict, "entity with the specified id already exists");
        let display = error.to_string();
        assert!(display.contains("conflict"), "got: {display}");
        assert!(display.contains("already exists"), "got: {display}");
    }

    #[test]
    fn kind_is_preserved() {
        assert_eq!(Error::from_kind(ErrorKind::Unsupported).kind(), ErrorKind::Unsupported);
        assert!(Error::from_kind(ErrorKind::Unsupported).is_unsupported());
        assert!(!Error::from_kind(ErrorKind::Cancelled).is_unsupported());
    }

    #[test]
    fn throttling_is_retryable() {
        assert_eq!(Error::from_kind(ErrorKind::Throttled).recovery().kind(), RecoveryKind::Retry);
        assert_eq!(Error::from_kind(ErrorKind::Cancelled).recovery().kind(), RecoveryKind::Retry);
    }

    #[test]
    fn outage_is_unavailable() {
        assert_eq!(
            Error::from_kind(ErrorKind::StoreUnavailable).recovery().kind(),
            RecoveryKind::Unavailable
        );
    }

    #[test]
    fn configuration_errors_are_permanent() {
        for kind in [
            ErrorKind::InvalidConfiguration,
            ErrorKind::InvalidKey,
            ErrorKind::ProvisioningFailure,
            ErrorKind::Conflict,
            ErrorKind::Serialization,
            ErrorKind::Unsupported,
        ] {
            assert_eq!(Error::from_kind(kind).recovery().kind(), RecoveryKind::Never, "{kind}");
        }
    }
}
