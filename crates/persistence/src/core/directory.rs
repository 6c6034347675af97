//! Tenant directory trait.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::tenant::{Provisioned, TenantId, TenantRecord, TenantStatus};

/// Registry of known tenants.
///
/// The tenant table is global, not tenant-owned, so these operations take a
/// bare [`TenantId`] instead of a context.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Creates the tenant with provisioning defaults if it does not exist.
    ///
    /// Idempotent under concurrency: when several callers race on the same
    /// unseen id, exactly one record is written and exactly one caller sees
    /// `created == true`.
    async fn ensure_tenant(&self, tenant_id: &TenantId) -> StorageResult<Provisioned>;

    /// Looks up a tenant.
    async fn get_tenant(&self, tenant_id: &TenantId) -> StorageResult<Option<TenantRecord>>;

    /// Changes a tenant's lifecycle status.
    ///
    /// # Errors
    ///
    /// * `StorageError::Tenant(NotFound)` - If the tenant doesn't exist
    async fn set_status(
        &self,
        tenant_id: &TenantId,
        status: TenantStatus,
    ) -> StorageResult<TenantRecord>;
}
