//! Per-connection tenant binding for PostgreSQL.
//!
//! Binding runs `SELECT set_config('app.current_tenant', $1, false)` on the
//! borrowed client before any other statement. The setting is session-scoped,
//! so it outlives the borrow; every borrower overwrites it, which is what
//! keeps a reused connection from carrying the previous tenant.

use std::ops::{Deref, DerefMut};

use crate::error::{IsolationError, StorageResult};
use crate::strategy::SharedSchemaStrategy;
use crate::tenant::TenantId;

/// Reads the session tenant bound on `client`, if any.
pub async fn current_binding(
    client: &tokio_postgres::Client,
    strategy: &SharedSchemaStrategy,
) -> Result<Option<String>, tokio_postgres::Error> {
    let row = client.query_one(&strategy.current_binding_sql(), &[]).await?;
    let value: Option<String> = row.get(0);
    Ok(value.filter(|v| !v.is_empty()))
}

/// A pooled client bound to one tenant.
///
/// Dereferences to [`deadpool_postgres::Client`]. Row-level security limits
/// every statement run through it to the bound tenant's rows.
pub struct TenantClient {
    client: deadpool_postgres::Client,
    tenant_id: TenantId,
}

impl TenantClient {
    /// Binds `tenant_id` on `client` and checks the value the server reports.
    pub(crate) async fn bind(
        client: deadpool_postgres::Client,
        strategy: &SharedSchemaStrategy,
        tenant_id: &TenantId,
    ) -> StorageResult<Self> {
        let row = client
            .query_one(&strategy.bind_sql(), &[&tenant_id.as_str()])
            .await
            .map_err(|e| IsolationError::BindFailed {
                tenant_id: tenant_id.clone(),
                backend_name: "postgres".to_string(),
                message: e.to_string(),
            })?;

        let actual: Option<String> = row.get(0);
        if actual.as_deref() != Some(tenant_id.as_str()) {
            return Err(IsolationError::BindingMismatch {
                expected: tenant_id.clone(),
                actual,
            }
            .into());
        }

        tracing::trace!(tenant_id = %tenant_id, "Bound tenant to postgres session");

        Ok(Self {
            client,
            tenant_id: tenant_id.clone(),
        })
    }

    /// Returns the tenant this client is bound to.
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}

impl Deref for TenantClient {
    type Target = deadpool_postgres::Client;

    fn deref(&self) -> &deadpool_postgres::Client {
        &self.client
    }
}

impl DerefMut for TenantClient {
    fn deref_mut(&mut self) -> &mut deadpool_postgres::Client {
        &mut self.client
    }
}

impl std::fmt::Debug for TenantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantClient")
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}
