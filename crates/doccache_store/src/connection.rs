// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// How a store client routes requests across the regions of an account.
///
/// The default sends writes to the primary region only and lets the client
/// discover the account's regions.
///
/// # Examples
///
/// ```
/// use doccache_store::ConnectionPolicy;
///
/// let policy = ConnectionPolicy::default()
///     .with_multiple_write_locations(true)
///     .with_preferred_locations(vec!["West Europe".to_string()]);
///
/// assert!(policy.use_multiple_write_locations());
/// assert_eq!(policy.preferred_locations(), ["West Europe".to_string()]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionPolicy {
    use_multiple_write_locations: bool,
    enable_endpoint_discovery: bool,
    preferred_locations: Vec<String>,
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        Self {
            use_multiple_write_locations: false,
            enable_endpoint_discovery: true,
            preferred_locations: Vec::new(),
        }
    }
}

impl ConnectionPolicy {
    /// Allows writes to be served by any region of the account.
    #[must_use]
    pub fn with_multiple_write_locations(self, enabled: bool) -> Self {
        Self {
            use_multiple_write_locations: enabled,
            ..self
        }
    }

    /// Enables or disables discovery of the account's regional endpoints.
    #[must_use]
    pub fn with_endpoint_discovery(self, enabled: bool) -> Self {
        Self {
            enable_endpoint_discovery: enabled,
            ..self
        }
    }

    /// Sets the regions to prefer, most preferred first.
    #[must_use]
    pub fn with_preferred_locations(self, preferred_locations: Vec<String>) -> Self {
        Self {
            preferred_locations,
            ..self
        }
    }

    /// Returns `true` if writes may go to any region.
    #[must_use]
    pub fn use_multiple_write_locations(&self) -> bool {
        self.use_multiple_write_locations
    }

    /// Returns `true` if regional endpoints are discovered automatically.
    #[must_use]
    pub fn enable_endpoint_discovery(&self) -> bool {
        self.enable_endpoint_discovery
    }

    /// Returns the preferred regions.
    #[must_use]
    pub fn preferred_locations(&self) -> &[String] {
        &self.preferred_locations
    }
}
