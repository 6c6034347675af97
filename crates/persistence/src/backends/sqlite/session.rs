//! Per-connection tenant binding for SQLite.
//!
//! [`TenantConnection`] is the only way storage code obtains a connection for
//! tenant work. It is created by binding the tenant on a freshly borrowed
//! pooled connection and verifying the binding took effect; it clears the
//! binding again when it goes back to the pool.

use std::ops::{Deref, DerefMut};

use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension};

use crate::error::{IsolationError, StorageResult};
use crate::strategy::SESSION_VARIABLE;
use crate::tenant::TenantId;

/// Sets the session tenant on `conn`.
pub fn bind(conn: &Connection, tenant_id: &TenantId) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO session_settings (name, value) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET value = excluded.value",
        [SESSION_VARIABLE, tenant_id.as_str()],
    )?;
    Ok(())
}

/// Reads the session tenant bound on `conn`, if any.
pub fn current_binding(conn: &Connection) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM session_settings WHERE name = ?1",
        [SESSION_VARIABLE],
        |row| row.get::<_, Option<String>>(0),
    )
    .optional()
    .map(Option::flatten)
}

/// Removes the session tenant from `conn`.
pub fn reset(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "DELETE FROM session_settings WHERE name = ?1",
        [SESSION_VARIABLE],
    )?;
    Ok(())
}

/// A pooled connection bound to one tenant.
///
/// Dereferences to [`rusqlite::Connection`]. Every statement run through it
/// sees only the bound tenant's rows.
pub struct TenantConnection {
    conn: PooledConnection<SqliteConnectionManager>,
    tenant_id: TenantId,
}

impl TenantConnection {
    /// Binds `tenant_id` on `conn` and checks the binding reads back.
    ///
    /// Whatever the connection was bound to before is overwritten.
    pub(crate) fn bind(
        conn: PooledConnection<SqliteConnectionManager>,
        tenant_id: &TenantId,
    ) -> StorageResult<Self> {
        bind(&conn, tenant_id).map_err(|e| IsolationError::BindFailed {
            tenant_id: tenant_id.clone(),
            backend_name: "sqlite".to_string(),
            message: e.to_string(),
        })?;

        let actual = current_binding(&conn).map_err(|e| IsolationError::BindFailed {
            tenant_id: tenant_id.clone(),
            backend_name: "sqlite".to_string(),
            message: e.to_string(),
        })?;

        if actual.as_deref() != Some(tenant_id.as_str()) {
            return Err(IsolationError::BindingMismatch {
                expected: tenant_id.clone(),
                actual,
            }
            .into());
        }

        tracing::trace!(tenant_id = %tenant_id, "Bound tenant to sqlite session");

        Ok(Self {
            conn,
            tenant_id: tenant_id.clone(),
        })
    }

    /// Returns the tenant this connection is bound to.
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}

impl Deref for TenantConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl DerefMut for TenantConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl Drop for TenantConnection {
    fn drop(&mut self) {
        // Borrowers always rebind, so a failed reset is logged but not fatal.
        if let Err(e) = reset(&self.conn) {
            tracing::warn!(
                tenant_id = %self.tenant_id,
                error = %e,
                "Failed to clear tenant binding before returning connection to pool"
            );
        }
    }
}

impl std::fmt::Debug for TenantConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantConnection")
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}
