//! Core record storage trait.
//!
//! This module defines the [`RecordStorage`] trait, which provides the CRUD
//! operations for tenant-owned records. All storage operations require a
//! [`TenantContext`]; implementations run every statement on a connection
//! bound to that tenant.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageResult;
use crate::tenant::TenantContext;
use crate::types::{Page, Pagination, RecordKind, StoredRecord};

/// Storage for tenant-owned HR records.
///
/// Every operation takes a `TenantContext` as its first parameter. Record ids
/// passed in are local ids; the storage combines them with the context's
/// tenant into a [`TenantScopedId`](crate::tenant::TenantScopedId), so a
/// caller can never name another tenant's record.
///
/// # Example
///
/// ```ignore
/// use workforce_persistence::core::RecordStorage;
/// use workforce_persistence::tenant::{TenantContext, TenantId};
/// use workforce_persistence::types::RecordKind;
///
/// async fn example<S: RecordStorage>(storage: &S) -> StorageResult<()> {
///     let tenant = TenantContext::new(TenantId::new("acme"));
///
///     let stored = storage
///         .create(&tenant, RecordKind::Employee, serde_json::json!({"id": "e1", "name": "Ada"}))
///         .await?;
///     assert_eq!(stored.local_id(), "e1");
///
///     let updated = storage
///         .update(&tenant, RecordKind::Employee, "e1", serde_json::json!({"name": "Ada L."}), Some(1))
///         .await?;
///     assert_eq!(updated.version(), 2);
///
///     storage.delete(&tenant, RecordKind::Employee, "e1").await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// Returns a human-readable name for this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Creates a new record.
    ///
    /// If `data` carries a string `"id"` it becomes the local id; otherwise a
    /// UUID is generated. The stored content always carries the final `"id"`.
    ///
    /// # Errors
    ///
    /// * `StorageError::Validation` - If the body is not a JSON object or has a malformed id
    /// * `StorageError::Resource(AlreadyExists)` - If the tenant already has a record with that id
    /// * `StorageError::Isolation` - If the connection could not be bound to the tenant
    async fn create(
        &self,
        tenant: &TenantContext,
        kind: RecordKind,
        data: Value,
    ) -> StorageResult<StoredRecord>;

    /// Reads a record by local id.
    ///
    /// Returns `None` if the tenant has no such record, including when another
    /// tenant owns a record with the same local id.
    async fn read(
        &self,
        tenant: &TenantContext,
        kind: RecordKind,
        id: &str,
    ) -> StorageResult<Option<StoredRecord>>;

    /// Replaces the content of an existing record.
    ///
    /// When `expected_version` is given the update only succeeds if the stored
    /// version matches.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(NotFound)` - If the record doesn't exist
    /// * `StorageError::Concurrency(VersionConflict)` - If the version does not match
    async fn update(
        &self,
        tenant: &TenantContext,
        kind: RecordKind,
        id: &str,
        data: Value,
        expected_version: Option<u64>,
    ) -> StorageResult<StoredRecord>;

    /// Permanently deletes a record.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(NotFound)` - If the record doesn't exist
    async fn delete(&self, tenant: &TenantContext, kind: RecordKind, id: &str)
    -> StorageResult<()>;

    /// Lists records of a kind, ordered by creation time then id.
    async fn list(
        &self,
        tenant: &TenantContext,
        kind: RecordKind,
        pagination: &Pagination,
    ) -> StorageResult<Page<StoredRecord>>;

    /// Counts the tenant's records of a kind, or of all kinds.
    async fn count(&self, tenant: &TenantContext, kind: Option<RecordKind>) -> StorageResult<u64>;

    /// Checks if a record exists.
    async fn exists(
        &self,
        tenant: &TenantContext,
        kind: RecordKind,
        id: &str,
    ) -> StorageResult<bool> {
        Ok(self.read(tenant, kind, id).await?.is_some())
    }
}
