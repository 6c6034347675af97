//! RecordStorage implementation for PostgreSQL.
//!
//! Statements run on a [`TenantClient`](super::session::TenantClient) and
//! query `tenant_records` without a tenant predicate. The `tenant_isolation`
//! policy supplies the filter for reads and the check for writes.

use async_trait::async_trait;
use serde_json::Value;
use tokio_postgres::Row;

use crate::core::RecordStorage;
use crate::error::{ConcurrencyError, ResourceError, StorageError, StorageResult};
use crate::tenant::{TenantContext, TenantId, TenantScopedId};
use crate::types::{
    Page, Pagination, RecordKind, StoredRecord, ensure_object, requested_local_id,
};

use super::PostgresBackend;

const RECORD_COLUMNS: &str = "tenant_id, kind, local_id, version, data, created_at, updated_at";

fn record_from_row(row: &Row) -> StorageResult<StoredRecord> {
    let tenant_id: String = row.try_get(0)?;
    let kind: String = row.try_get(1)?;
    let local_id: String = row.try_get(2)?;
    let version: i64 = row.try_get(3)?;

    Ok(StoredRecord::from_parts(
        TenantScopedId::new(local_id, TenantId::new(tenant_id)),
        kind.parse::<RecordKind>()?,
        u64::try_from(version).unwrap_or_default(),
        row.try_get::<_, Value>(4)?,
        row.try_get(5)?,
        row.try_get(6)?,
    ))
}

fn not_found(kind: RecordKind, id: &str) -> StorageError {
    StorageError::Resource(ResourceError::NotFound {
        kind: kind.to_string(),
        id: id.to_string(),
    })
}

fn with_local_id(mut data: Value, local_id: &str) -> Value {
    if let Some(obj) = data.as_object_mut() {
        obj.insert("id".to_string(), Value::String(local_id.to_string()));
    }
    data
}

#[async_trait]
impl RecordStorage for PostgresBackend {
    fn backend_name(&self) -> &'static str {
        "postgres"
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

        let client = self.tenant_client(tenant).await?;
        let version = record.version() as i64;
        let inserted = client
            .execute(
                &format!(
                    "INSERT INTO tenant_records ({})
                     VALUES ($1, $2, $3, $4, $5, $6, $7)
                     ON CONFLICT (tenant_id, kind, local_id) DO NOTHING",
                    RECORD_COLUMNS
                ),
                &[
                    &id.tenant_id().as_str(),
                    &kind.as_path(),
                    &id.local_id(),
                    &version,
                    record.data(),
                    &record.created_at(),
                    &record.updated_at(),
                ],
            )
            .await?;

        if inserted == 0 {
            return Err(StorageError::Resource(ResourceError::AlreadyExists {
                kind: kind.to_string(),
                id: id.local_id().to_string(),
            }));
        }

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
        let client = self.tenant_client(tenant).await?;
        let row = client
            .query_opt(
                &format!(
                    "SELECT {} FROM tenant_records WHERE kind = $1 AND local_id = $2",
                    RECORD_COLUMNS
                ),
                &[&kind.as_path(), &id],
            )
            .await?;

        row.as_ref().map(record_from_row).transpose()
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

        let mut client = self.tenant_client(tenant).await?;
        let tx = client.transaction().await?;

        let row = tx
            .query_opt(
                &format!(
                    "SELECT {} FROM tenant_records
                     WHERE kind = $1 AND local_id = $2
                     FOR UPDATE",
                    RECORD_COLUMNS
                ),
                &[&kind.as_path(), &id],
            )
            .await?;
        let current = match row {
            Some(row) => record_from_row(&row)?,
            None => return Err(not_found(kind, id)),
        };

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
        let version = updated.version() as i64;
        tx.execute(
            "UPDATE tenant_records SET version = $1, data = $2, updated_at = $3
             WHERE kind = $4 AND local_id = $5",
            &[
                &version,
                updated.data(),
                &updated.updated_at(),
                &kind.as_path(),
                &id,
            ],
        )
        .await?;
        tx.commit().await?;

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
        let client = self.tenant_client(tenant).await?;
        let deleted = client
            .execute(
                "DELETE FROM tenant_records WHERE kind = $1 AND local_id = $2",
                &[&kind.as_path(), &id],
            )
            .await?;

        if deleted == 0 {
            return Err(not_found(kind, id));
        }

        tracing::debug!(tenant_id = %tenant.tenant_id(), kind = %kind, id = %id, "Deleted record");

        Ok(())
    }

    async fn list(
        &self,
        tenant: &TenantContext,
        kind: RecordKind,
        pagination: &Pagination,
    ) -> StorageResult<Page<StoredRecord>> {
        let client = self.tenant_client(tenant).await?;

        let total: i64 = client
            .query_one(
                "SELECT COUNT(*) FROM tenant_records WHERE kind = $1",
                &[&kind.as_path()],
            )
            .await?
            .try_get(0)?;

        let limit = i64::from(pagination.limit());
        let offset = pagination.offset() as i64;
        let rows = client
            .query(
                &format!(
                    "SELECT {} FROM tenant_records WHERE kind = $1
                     ORDER BY created_at, local_id
                     LIMIT $2 OFFSET $3",
                    RECORD_COLUMNS
                ),
                &[&kind.as_path(), &limit, &offset],
            )
            .await?;

        let items = rows
            .iter()
            .map(record_from_row)
            .collect::<StorageResult<Vec<_>>>()?;

        Ok(Page::new(items, pagination, total.max(0) as u64))
    }

    async fn count(&self, tenant: &TenantContext, kind: Option<RecordKind>) -> StorageResult<u64> {
        let client = self.tenant_client(tenant).await?;

        let row = match kind {
            Some(kind) => {
                client
                    .query_one(
                        "SELECT COUNT(*) FROM tenant_records WHERE kind = $1",
                        &[&kind.as_path()],
                    )
                    .await?
            }
            None => {
                client
                    .query_one("SELECT COUNT(*) FROM tenant_records", &[])
                    .await?
            }
        };
        let count: i64 = row.try_get(0)?;

        Ok(count.max(0) as u64)
    }
}
