//! TenantDirectory implementation for SQLite.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::core::TenantDirectory;
use crate::error::{BackendError, StorageError, StorageResult, TenantError};
use crate::tenant::{Provisioned, TenantId, TenantRecord, TenantStatus};

use super::SqliteBackend;

fn corrupt_row(message: String) -> StorageError {
    StorageError::Backend(BackendError::SerializationError { message })
}

fn select_tenant(conn: &Connection, tenant_id: &TenantId) -> StorageResult<Option<TenantRecord>> {
    let row = conn
        .query_row(
            "SELECT id, status, plan, max_users, created_at FROM tenants WHERE id = ?1",
            [tenant_id.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;

    let Some((id, status, plan, max_users, created_at)) = row else {
        return Ok(None);
    };

    let status: TenantStatus = status.parse().map_err(corrupt_row)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| corrupt_row(format!("Invalid tenant timestamp: {}", e)))?
        .with_timezone(&Utc);

    Ok(Some(TenantRecord {
        id: TenantId::new(id),
        status,
        plan,
        max_users: u32::try_from(max_users).unwrap_or_default(),
        created_at,
    }))
}

fn missing_tenant(tenant_id: &TenantId) -> StorageError {
    StorageError::Tenant(TenantError::NotFound {
        tenant_id: tenant_id.clone(),
    })
}

#[async_trait]
impl TenantDirectory for SqliteBackend {
    async fn ensure_tenant(&self, tenant_id: &TenantId) -> StorageResult<Provisioned> {
        self.strategy().validate(tenant_id)?;
        let conn = self.get_connection()?;

        if let Some(tenant) = select_tenant(&conn, tenant_id)? {
            return Ok(Provisioned {
                tenant,
                created: false,
            });
        }

        let defaults = &self.config().provisioning;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO tenants (id, status, plan, max_users, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                tenant_id.as_str(),
                TenantStatus::Active.as_str(),
                defaults.plan,
                i64::from(defaults.max_users),
                Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;
        let created = inserted == 1;

        if created {
            tracing::info!(tenant_id = %tenant_id, plan = %defaults.plan, "Provisioned new tenant");
        }

        let tenant = select_tenant(&conn, tenant_id)?.ok_or_else(|| missing_tenant(tenant_id))?;
        Ok(Provisioned { tenant, created })
    }

    async fn get_tenant(&self, tenant_id: &TenantId) -> StorageResult<Option<TenantRecord>> {
        let conn = self.get_connection()?;
        select_tenant(&conn, tenant_id)
    }

    async fn set_status(
        &self,
        tenant_id: &TenantId,
        status: TenantStatus,
    ) -> StorageResult<TenantRecord> {
        let conn = self.get_connection()?;
        let changed = conn.execute(
            "UPDATE tenants SET status = ?1 WHERE id = ?2",
            params![status.as_str(), tenant_id.as_str()],
        )?;
        if changed == 0 {
            return Err(missing_tenant(tenant_id));
        }

        tracing::info!(tenant_id = %tenant_id, status = %status, "Changed tenant status");

        select_tenant(&conn, tenant_id)?.ok_or_else(|| missing_tenant(tenant_id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backends::sqlite::SqliteBackendConfig;
    use crate::error::IsolationError;
    use crate::tenant::ProvisioningDefaults;

    #[tokio::test]
    async fn test_ensure_tenant_is_idempotent() {
        let backend = SqliteBackend::in_memory().unwrap();
        let id = TenantId::new("acme");

        let first = backend.ensure_tenant(&id).await.unwrap();
        assert!(first.created);
        assert_eq!(first.tenant.plan, "trial");
        assert_eq!(first.tenant.max_users, 25);
        assert!(first.tenant.is_active());

        let second = backend.ensure_tenant(&id).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.tenant, first.tenant);
    }

    #[tokio::test]
    async fn test_provisioning_defaults_from_config() {
        let config = SqliteBackendConfig {
            provisioning: ProvisioningDefaults {
                plan: "enterprise".to_string(),
                max_users: 500,
            },
            ..Default::default()
        };
        let backend = SqliteBackend::with_config(":memory:", config).unwrap();

        let provisioned = backend.ensure_tenant(&TenantId::new("globex")).await.unwrap();
        assert_eq!(provisioned.tenant.plan, "enterprise");
        assert_eq!(provisioned.tenant.max_users, 500);
    }

    #[tokio::test]
    async fn test_ensure_tenant_rejects_invalid_id() {
        let backend = SqliteBackend::in_memory().unwrap();
        let err = backend.ensure_tenant(&TenantId::new("bad id")).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Isolation(IsolationError::InvalidTenantId { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_provisioning_creates_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = SqliteBackendConfig {
            max_connections: 4,
            ..Default::default()
        };
        let backend = Arc::new(
            SqliteBackend::with_config(dir.path().join("tenants.db"), config).unwrap(),
        );

        let mut handles = Vec::new();
        for _ in 0..16 {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                backend.ensure_tenant(&TenantId::new("newco")).await.unwrap()
            }));
        }

        let mut created = 0;
        for handle in handles {
            let provisioned = handle.await.unwrap();
            assert_eq!(provisioned.tenant.id.as_str(), "newco");
            if provisioned.created {
                created += 1;
            }
        }
        assert_eq!(created, 1);

        let conn = backend.get_connection().unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM tenants WHERE id = 'newco'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_set_status() {
        let backend = SqliteBackend::in_memory().unwrap();
        let id = TenantId::new("acme");
        backend.ensure_tenant(&id).await.unwrap();

        let suspended = backend.set_status(&id, TenantStatus::Suspended).await.unwrap();
        assert_eq!(suspended.status, TenantStatus::Suspended);
        assert!(!backend.ensure_tenant(&id).await.unwrap().tenant.is_active());

        let err = backend
            .set_status(&TenantId::new("ghost"), TenantStatus::Active)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Tenant(TenantError::NotFound { .. })));
        assert!(backend.get_tenant(&TenantId::new("ghost")).await.unwrap().is_none());
    }
}
