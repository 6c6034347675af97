//! TenantDirectory implementation for PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::Row;

use crate::core::TenantDirectory;
use crate::error::{BackendError, StorageError, StorageResult, TenantError};
use crate::tenant::{Provisioned, TenantId, TenantRecord, TenantStatus};

use super::PostgresBackend;

const TENANT_COLUMNS: &str = "id, status, plan, max_users, created_at";

fn tenant_from_row(row: &Row) -> StorageResult<TenantRecord> {
    let id: String = row.try_get(0)?;
    let status: String = row.try_get(1)?;
    let max_users: i32 = row.try_get(3)?;
    let created_at: DateTime<Utc> = row.try_get(4)?;

    Ok(TenantRecord {
        id: TenantId::new(id),
        status: status
            .parse()
            .map_err(|message| StorageError::Backend(BackendError::SerializationError { message }))?,
        plan: row.try_get(2)?,
        max_users: u32::try_from(max_users).unwrap_or_default(),
        created_at,
    })
}

fn missing_tenant(tenant_id: &TenantId) -> StorageError {
    StorageError::Tenant(TenantError::NotFound {
        tenant_id: tenant_id.clone(),
    })
}

#[async_trait]
impl TenantDirectory for PostgresBackend {
    async fn ensure_tenant(&self, tenant_id: &TenantId) -> StorageResult<Provisioned> {
        self.strategy().validate(tenant_id)?;
        let client = self.get_client().await?;
        let defaults = &self.config().provisioning;
        let max_users = i32::try_from(defaults.max_users).unwrap_or(i32::MAX);

        let inserted = client
            .query_opt(
                &format!(
                    "INSERT INTO tenants (id, status, plan, max_users, created_at)
                     VALUES ($1, $2, $3, $4, $5)
                     ON CONFLICT (id) DO NOTHING
                     RETURNING {}",
                    TENANT_COLUMNS
                ),
                &[
                    &tenant_id.as_str(),
                    &TenantStatus::Active.as_str(),
                    &defaults.plan,
                    &max_users,
                    &Utc::now(),
                ],
            )
            .await?;
        drop(client);

        if let Some(row) = inserted {
            tracing::info!(tenant_id = %tenant_id, plan = %defaults.plan, "Provisioned new tenant");
            return Ok(Provisioned {
                tenant: tenant_from_row(&row)?,
                created: true,
            });
        }

        let tenant = self
            .get_tenant(tenant_id)
            .await?
            .ok_or_else(|| missing_tenant(tenant_id))?;
        Ok(Provisioned {
            tenant,
            created: false,
        })
    }

    async fn get_tenant(&self, tenant_id: &TenantId) -> StorageResult<Option<TenantRecord>> {
        let client = self.get_client().await?;
        let row = client
            .query_opt(
                &format!("SELECT {} FROM tenants WHERE id = $1", TENANT_COLUMNS),
                &[&tenant_id.as_str()],
            )
            .await?;
        row.as_ref().map(tenant_from_row).transpose()
    }

    async fn set_status(
        &self,
        tenant_id: &TenantId,
        status: TenantStatus,
    ) -> StorageResult<TenantRecord> {
        let client = self.get_client().await?;
        let row = client
            .query_opt(
                &format!(
                    "UPDATE tenants SET status = $1 WHERE id = $2 RETURNING {}",
                    TENANT_COLUMNS
                ),
                &[&status.as_str(), &tenant_id.as_str()],
            )
            .await?
            .ok_or_else(|| missing_tenant(tenant_id))?;

        tracing::info!(tenant_id = %tenant_id, status = %status, "Changed tenant status");

        tenant_from_row(&row)
    }
}
