//! Where a tenant identifier was obtained from.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The credential claim (or fallback) that produced a tenant identifier.
///
/// Variants are ordered by resolution priority: the resolver consults them
/// from first to last and stops at the first one that yields a usable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TenantSource {
    /// The namespaced tenant claim, e.g. `https://workforce.example/tenant`.
    NamespacedTenantClaim,
    /// The plain `tenant` claim.
    TenantClaim,
    /// The domain part of an email-like claim.
    EmailDomain,
    /// No usable claim; the configured default tenant was used.
    Default,
}

impl TenantSource {
    /// Returns the resolution priority (lower wins).
    pub fn priority(&self) -> u8 {
        match self {
            TenantSource::NamespacedTenantClaim => 0,
            TenantSource::TenantClaim => 1,
            TenantSource::EmailDomain => 2,
            TenantSource::Default => 3,
        }
    }

    /// Returns `true` if the tenant came from the credential itself.
    pub fn is_from_credential(&self) -> bool {
        !matches!(self, TenantSource::Default)
    }
}

impl fmt::Display for TenantSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenantSource::NamespacedTenantClaim => write!(f, "namespaced-tenant-claim"),
            TenantSource::TenantClaim => write!(f, "tenant-claim"),
            TenantSource::EmailDomain => write!(f, "email-domain"),
            TenantSource::Default => write!(f, "default"),
        }
    }
}
