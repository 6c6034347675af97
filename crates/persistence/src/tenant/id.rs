//! Tenant identifier type.
//!
//! This module defines the [`TenantId`] type, an opaque identifier for tenants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An opaque tenant identifier.
///
/// `TenantId` performs no normalization of its own; identifiers arriving from
/// credentials are canonicalized by the tenant resolver before they get here,
/// and backends validate them against the shared-schema rules before binding
/// them to a database session.
///
/// # Examples
///
/// ```
/// use workforce_persistence::tenant::TenantId;
///
/// let tenant = TenantId::new("corp-x-io");
/// assert_eq!(tenant.as_str(), "corp-x-io");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new tenant ID from the given string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the tenant ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the ID and returns the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenantId({})", self.0)
    }
}

impl FromStr for TenantId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TenantId::new(s))
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        TenantId::new(s)
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        TenantId::new(s)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
