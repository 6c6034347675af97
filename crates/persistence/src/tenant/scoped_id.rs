//! Composite record identity.
//!
//! Every tenant-owned record is keyed by the pair `(local_id, tenant_id)`.
//! The local part alone is never an identity: `e1` owned by `acme` and `e1`
//! owned by `globex` are different records.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::context::TenantContext;
use super::id::TenantId;

/// Primary key of a tenant-owned record.
///
/// Equality, ordering and hashing cover both fields. The type has no setters;
/// once constructed it is never re-pointed at another tenant.
///
/// # Examples
///
/// ```
/// use workforce_persistence::tenant::{TenantId, TenantScopedId};
///
/// let a = TenantScopedId::new("e1", TenantId::new("acme"));
/// let b = TenantScopedId::new("e1", TenantId::new("globex"));
/// assert_ne!(a, b);
/// assert_eq!(a.local_id(), b.local_id());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantScopedId {
    local_id: String,
    tenant_id: TenantId,
}

impl TenantScopedId {
    /// Creates an identity from its two parts.
    pub fn new(local_id: impl Into<String>, tenant_id: TenantId) -> Self {
        Self {
            local_id: local_id.into(),
            tenant_id,
        }
    }

    /// Generates a fresh identity for a new record owned by the context's tenant.
    pub fn generate(tenant: &TenantContext) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), tenant.tenant_id().clone())
    }

    /// Creates an identity for a caller-chosen local id within the context's tenant.
    pub fn within(tenant: &TenantContext, local_id: impl Into<String>) -> Self {
        Self::new(local_id, tenant.tenant_id().clone())
    }

    /// Returns the tenant-local part of the identity.
    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    /// Returns the owning tenant.
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// Returns `true` if this record is owned by the given tenant.
    pub fn is_owned_by(&self, tenant_id: &TenantId) -> bool {
        &self.tenant_id == tenant_id
    }
}

impl fmt::Display for TenantScopedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tenant_id, self.local_id)
    }
}

impl fmt::Debug for TenantScopedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenantScopedId({}:{})", self.tenant_id, self.local_id)
    }
}
