//! RecordStorage implementation for SQLite.
//!
//! Every statement here runs on a [`TenantConnection`] and targets the
//! tenant-filtered `records` view. None of the queries carry a tenant
//! predicate of their own; visibility comes from the session binding.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{OptionalExtension, TransactionBehavior, params};
use serde_json::Value;

use crate::core::RecordStorage;
use crate::error::{
    BackendError, ConcurrencyError, ResourceError, StorageError, StorageResult,
};
use crate::tenant::{TenantContext, TenantId, TenantScopedId};
use crate::types::{
    Page, Pagination, RecordKind, StoredRecord, ensure_object, requested_local_id,
};

use super::SqliteBackend;

const RECORD_COLUMNS: &str = "tenant_id, kind, local_id, version, data, created_at, updated_at";

fn serialization_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::SerializationError { message })
}

fn timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| serialization_error(format!("Invalid timestamp '{}': {}", value, e)))
}

/// A `records` row as read from SQLite.
struct RecordRow {
    tenant_id: String,
    kind: String,
    local_id: String,
    version: i64,
    data: Vec<u8>,
    created_at: String,
    updated_at: String,
}

impl RecordRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            tenant_id: row.get(0)?,
            kind: row.get(1)?,
            local_id: row.get(2)?,
            version: row.get(3)?,
            data: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_record(self) -> StorageResult<StoredRecord> {
        let kind: RecordKind = self.kind.parse()?;
        let data: Value = serde_json::from_slice(&self.data)
            .map_err(|e| serialization_error(format!("Failed to deserialize record: {}", e)))?;

        Ok(StoredRecord::from_parts(
            TenantScopedId::new(self.local_id, TenantId::new(self.tenant_id)),
            kind,
            u64::try_from(self.version).unwrap_or_default(),
            data,
            parse_timestamp(&self.created_at)?,
            parse_timestamp(&self.updated_at)?,
        ))
    }
}

fn select_one(
    conn: &rusqlite::Connection,
    kind: RecordKind,
    id: &str,
) -> StorageResult<Option<StoredRecord>> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {} FROM records WHERE kind = ?1 AND local_id = ?2",
                RECORD_COLUMNS
            ),
            params![kind.as_path(), id],
            RecordRow::from_row,
        )
        .optional()?;

    row.map(RecordRow::into_record).transpose()
}

/// Sets the body's `"id"` to the record's local id.
fn with_local_id(mut data: Value, local_id: &str) -> Value {
    if let Some(obj) = data.as_object_mut() {
        obj.insert("id".to_string(), Value::String(local_id.to_string()));
    }
    data
}

#[async_trait]
impl RecordStorage for SqliteBackend {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn create(
        &self,
        tenant: &TenantContext,
        kind: RecordKind,
        data: Value,
    ) -> StorageResult<StoredRecord> {
        let id = match requested_local_id(&data)? {
            Some(local_id) => TenantScopedId::within(tenant, local_id),
            None => TenantScopedId::generate(tenant),
        };
        let record = StoredRecord::new(id.clone(), kind, with_local_id(data, id.local_id()));

        let bytes = serde_json::to_vec(record.data())
            .map_err(|e| serialization_error(format!("Failed to serialize record: {}", e)))?;

        let mut conn = self.tenant_connection(tenant)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if select_one(&tx, kind, id.local_id())?.is_some() {
            return Err(StorageError::Resource(ResourceError::AlreadyExists {
                kind: kind.to_string(),
                id: id.local_id().to_string(),
            }));
        }

        tx.execute(
            &format!(
                "INSERT INTO records ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                RECORD_COLUMNS
            ),
            params![
                id.tenant_id().as_str(),
                kind.as_path(),
                id.local_id(),
                record.version() as i64,
                bytes,
                timestamp(record.created_at()),
                timestamp(record.updated_at()),
            ],
        )?;
        tx.commit()?;

        tracing::debug!(
            tenant_id = %id.tenant_id(),
            kind = %kind,
            id = %id.local_id(),
            "Created record"
        );

        Ok(record)
    }

    async fn read(
        &self,
        tenant: &TenantContext,
        kind: RecordKind,
        id: &str,
    ) -> StorageResult<Option<StoredRecord>> {
        let conn = self.tenant_connection(tenant)?;
        select_one(&conn, kind, id)
    }

    async fn update(
        &self,
        tenant: &TenantContext,
        kind: RecordKind,
        id: &str,
        data: Value,
        expected_version: Option<u64>,
    ) -> StorageResult<StoredRecord> {
        ensure_object(&data)?;

        let mut conn = self.tenant_connection(tenant)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = select_one(&tx, kind, id)?.ok_or_else(|| {
            StorageError::Resource(ResourceError::NotFound {
                kind: kind.to_string(),
                id: id.to_string(),
            })
        })?;

        if let Some(expected) = expected_version {
            if expected != current.version() {
                return Err(StorageError::Concurrency(ConcurrencyError::VersionConflict {
                    kind: kind.to_string(),
                    id: id.to_string(),
                    expected_version: expected,
                    actual_version: current.version(),
                }));
            }
        }

        let updated = current.next_version(with_local_id(data, id));
        let bytes = serde_json::to_vec(updated.data())
            .map_err(|e| serialization_error(format!("Failed to serialize record: {}", e)))?;

        tx.execute(
            "UPDATE records SET version = ?1, data = ?2, updated_at = ?3
             WHERE kind = ?4 AND local_id = ?5",
            params![
                updated.version() as i64,
                bytes,
                timestamp(updated.updated_at()),
                kind.as_path(),
                id,
            ],
        )?;
        tx.commit()?;

        tracing::debug!(
            tenant_id = %tenant.tenant_id(),
            kind = %kind,
            id = %id,
            version = updated.version(),
            "Updated record"
        );

        Ok(updated)
    }

    async fn delete(
        &self,
        tenant: &TenantContext,
        kind: RecordKind,
        id: &str,
    ) -> StorageResult<()> {
        let mut conn = self.tenant_connection(tenant)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // INSTEAD OF triggers do not report changed rows, so check first.
        if select_one(&tx, kind, id)?.is_none() {
            return Err(StorageError::Resource(ResourceError::NotFound {
                kind: kind.to_string(),
                id: id.to_string(),
            }));
        }

        tx.execute(
            "DELETE FROM records WHERE kind = ?1 AND local_id = ?2",
            params![kind.as_path(), id],
        )?;
        tx.commit()?;

        tracing::debug!(tenant_id = %tenant.tenant_id(), kind = %kind, id = %id, "Deleted record");

        Ok(())
    }

    async fn list(
        &self,
        tenant: &TenantContext,
        kind: RecordKind,
        pagination: &Pagination,
    ) -> StorageResult<Page<StoredRecord>> {
        let conn = self.tenant_connection(tenant)?;

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE kind = ?1",
            params![kind.as_path()],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM records WHERE kind = ?1
             ORDER BY created_at, local_id
             LIMIT ?2 OFFSET ?3",
            RECORD_COLUMNS
        ))?;

        let rows = stmt
            .query_map(
                params![
                    kind.as_path(),
                    i64::from(pagination.limit()),
                    pagination.offset() as i64
                ],
                RecordRow::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        let items = rows
            .into_iter()
            .map(RecordRow::into_record)
            .collect::<StorageResult<Vec<_>>>()?;

        Ok(Page::new(items, pagination, total.max(0) as u64))
    }

    async fn count(&self, tenant: &TenantContext, kind: Option<RecordKind>) -> StorageResult<u64> {
        let conn = self.tenant_connection(tenant)?;

        let count: i64 = match kind {
            Some(kind) => conn.query_row(
                "SELECT COUNT(*) FROM records WHERE kind = ?1",
                params![kind.as_path()],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?,
        };

        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::backends::sqlite::{SqliteBackendConfig, session};
    use crate::error::{IsolationError, ValidationError};

    fn ctx(tenant: &str) -> TenantContext {
        TenantContext::new(TenantId::new(tenant))
    }

    fn backend() -> SqliteBackend {
        SqliteBackend::in_memory().unwrap()
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let backend = backend();
        let a = ctx("tenant-a");

        let created = backend
            .create(&a, RecordKind::Employee, json!({"id": "e1", "name": "Ada"}))
            .await
            .unwrap();
        assert_eq!(created.local_id(), "e1");
        assert_eq!(created.tenant_id().as_str(), "tenant-a");
        assert_eq!(created.version(), 1);

        let read = backend
            .read(&a, RecordKind::Employee, "e1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.id(), created.id());
        assert_eq!(read.data()["name"], "Ada");
    }

    #[tokio::test]
    async fn test_create_generates_id() {
        let backend = backend();
        let created = backend
            .create(&ctx("tenant-a"), RecordKind::Position, json!({"title": "Engineer"}))
            .await
            .unwrap();

        assert!(uuid::Uuid::parse_str(created.local_id()).is_ok());
        assert_eq!(created.data()["id"], created.local_id());
    }

    #[tokio::test]
    async fn test_create_rejects_non_object() {
        let backend = backend();
        let err = backend
            .create(&ctx("tenant-a"), RecordKind::Employee, json!([1, 2]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Validation(ValidationError::InvalidRecord { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_duplicate() {
        let backend = backend();
        let a = ctx("tenant-a");
        backend
            .create(&a, RecordKind::Employee, json!({"id": "e1"}))
            .await
            .unwrap();

        let err = backend
            .create(&a, RecordKind::Employee, json!({"id": "e1"}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Resource(ResourceError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_same_local_id_in_two_tenants() {
        let backend = backend();
        let (a, b) = (ctx("tenant-a"), ctx("tenant-b"));

        backend
            .create(&a, RecordKind::Employee, json!({"id": "e1", "name": "A's"}))
            .await
            .unwrap();
        assert!(backend.read(&b, RecordKind::Employee, "e1").await.unwrap().is_none());

        backend
            .create(&b, RecordKind::Employee, json!({"id": "e1", "name": "B's"}))
            .await
            .unwrap();

        backend.delete(&a, RecordKind::Employee, "e1").await.unwrap();

        assert!(backend.read(&a, RecordKind::Employee, "e1").await.unwrap().is_none());
        let b_record = backend
            .read(&b, RecordKind::Employee, "e1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(b_record.data()["name"], "B's");
    }

    #[tokio::test]
    async fn test_cross_tenant_update_and_delete_are_not_found() {
        let backend = backend();
        let (a, b) = (ctx("tenant-a"), ctx("tenant-b"));
        backend
            .create(&a, RecordKind::Employee, json!({"id": "e1"}))
            .await
            .unwrap();

        let err = backend
            .update(&b, RecordKind::Employee, "e1", json!({"name": "x"}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Resource(ResourceError::NotFound { .. })));

        let err = backend.delete(&b, RecordKind::Employee, "e1").await.unwrap_err();
        assert!(matches!(err, StorageError::Resource(ResourceError::NotFound { .. })));

        assert!(backend.exists(&a, RecordKind::Employee, "e1").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_with_version() {
        let backend = backend();
        let a = ctx("tenant-a");
        backend
            .create(&a, RecordKind::Employee, json!({"id": "e1", "name": "Ada"}))
            .await
            .unwrap();

        let updated = backend
            .update(&a, RecordKind::Employee, "e1", json!({"name": "Ada L."}), Some(1))
            .await
            .unwrap();
        assert_eq!(updated.version(), 2);
        assert_eq!(updated.data()["id"], "e1");

        let err = backend
            .update(&a, RecordKind::Employee, "e1", json!({"name": "stale"}), Some(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Concurrency(ConcurrencyError::VersionConflict {
                expected_version: 1,
                actual_version: 2,
                ..
            })
        ));

        let read = backend
            .read(&a, RecordKind::Employee, "e1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.version(), 2);
        assert_eq!(read.data()["name"], "Ada L.");
    }

    #[tokio::test]
    async fn test_list_and_count_are_isolated() {
        let backend = backend();
        let (a, b) = (ctx("tenant-a"), ctx("tenant-b"));

        for i in 0..5 {
            backend
                .create(&a, RecordKind::Employee, json!({"id": format!("a{i}")}))
                .await
                .unwrap();
        }
        backend
            .create(&b, RecordKind::Employee, json!({"id": "b0"}))
            .await
            .unwrap();
        backend
            .create(&b, RecordKind::Position, json!({"id": "p0"}))
            .await
            .unwrap();

        let page = backend
            .list(&a, RecordKind::Employee, &Pagination::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert!(page.has_next());
        assert!(page.items.iter().all(|r| r.tenant_id().as_str() == "tenant-a"));

        let b_page = backend
            .list(&b, RecordKind::Employee, &Pagination::default())
            .await
            .unwrap();
        assert_eq!(b_page.total, 1);
        assert_eq!(b_page.items[0].local_id(), "b0");

        assert_eq!(backend.count(&a, None).await.unwrap(), 5);
        assert_eq!(backend.count(&b, None).await.unwrap(), 2);
        assert_eq!(backend.count(&b, Some(RecordKind::Position)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rebind_on_borrow_with_single_connection() {
        let backend = backend();
        let (a, b) = (ctx("tenant-a"), ctx("tenant-b"));
        backend
            .create(&a, RecordKind::Employee, json!({"id": "a1"}))
            .await
            .unwrap();
        backend
            .create(&b, RecordKind::Employee, json!({"id": "b1"}))
            .await
            .unwrap();

        // Leave the only pooled connection bound to tenant-a.
        {
            let raw = backend.get_connection().unwrap();
            session::bind(&raw, a.tenant_id()).unwrap();
        }

        let page = backend
            .list(&b, RecordKind::Employee, &Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].local_id(), "b1");
    }

    #[tokio::test]
    async fn test_unbound_connection_sees_nothing_and_cannot_write() {
        let backend = backend();
        backend
            .create(&ctx("tenant-a"), RecordKind::Employee, json!({"id": "a1"}))
            .await
            .unwrap();

        let raw = backend.get_connection().unwrap();
        let visible: i64 = raw
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .unwrap();
        assert_eq!(visible, 0);

        let err: StorageError = raw
            .execute(
                "INSERT INTO records (tenant_id, kind, local_id, version, data, created_at, updated_at)
                 VALUES ('tenant-a', 'employees', 'x', 1, '{}', '', '')",
                [],
            )
            .unwrap_err()
            .into();
        assert!(matches!(
            err,
            StorageError::Isolation(IsolationError::PolicyViolation { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_tenants_on_shared_pool() {
        let dir = tempfile::tempdir().unwrap();
        let config = SqliteBackendConfig {
            max_connections: 3,
            ..Default::default()
        };
        let backend = Arc::new(
            SqliteBackend::with_config(dir.path().join("records.db"), config).unwrap(),
        );

        let mut handles = Vec::new();
        for i in 0..24 {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                let tenant = ctx(if i % 2 == 0 { "tenant-a" } else { "tenant-b" });
                backend
                    .create(&tenant, RecordKind::Employee, json!({"id": format!("e{i}")}))
                    .await
                    .unwrap();
                let page = backend
                    .list(&tenant, RecordKind::Employee, &Pagination::new(0, 100))
                    .await
                    .unwrap();
                assert!(
                    page.items
                        .iter()
                        .all(|r| r.tenant_id() == tenant.tenant_id())
                );
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(backend.count(&ctx("tenant-a"), None).await.unwrap(), 12);
        assert_eq!(backend.count(&ctx("tenant-b"), None).await.unwrap(), 12);
    }
}
