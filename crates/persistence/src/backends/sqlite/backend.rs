//! SQLite backend implementation.

use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::core::{Backend, BackendKind};
use crate::error::{BackendError, StorageError, StorageResult};
use crate::strategy::{SharedSchemaConfig, SharedSchemaStrategy};
use crate::tenant::{ProvisioningDefaults, TenantContext};

use super::schema;
use super::session::TenantConnection;

/// SQLite backend for tenant-isolated record storage.
pub struct SqliteBackend {
    pool: Pool<SqliteConnectionManager>,
    config: SqliteBackendConfig,
    strategy: SharedSchemaStrategy,
    is_memory: bool,
}

impl Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("config", &self.config)
            .field("is_memory", &self.is_memory)
            .finish_non_exhaustive()
    }
}

/// Configuration for the SQLite backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteBackendConfig {
    /// Maximum number of connections in the pool.
    ///
    /// In-memory databases always use a single connection, since each
    /// connection to `:memory:` is a separate database.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of idle connections.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,

    /// Enable WAL mode for better concurrency.
    #[serde(default = "default_true")]
    pub enable_wal: bool,

    /// Tenant identifier rules.
    #[serde(default)]
    pub tenancy: SharedSchemaConfig,

    /// Attributes for auto-provisioned tenants.
    #[serde(default)]
    pub provisioning: ProvisioningDefaults,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout_ms() -> u64 {
    30000
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for SqliteBackendConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            enable_wal: true,
            tenancy: SharedSchemaConfig::default(),
            provisioning: ProvisioningDefaults::default(),
        }
    }
}

/// Prepares a new pooled connection: pragmas, tables, isolation objects.
fn init_connection(conn: &mut Connection, busy_timeout_ms: u32, enable_wal: bool) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_millis(u64::from(busy_timeout_ms)))?;
    if enable_wal {
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    }
    schema::initialize_schema(conn)?;
    schema::install_session_objects(conn)
}

impl SqliteBackend {
    /// Creates a new in-memory SQLite backend.
    pub fn in_memory() -> StorageResult<Self> {
        Self::with_config(":memory:", SqliteBackendConfig::default())
    }

    /// Opens or creates a file-based SQLite database.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        Self::with_config(path, SqliteBackendConfig::default())
    }

    /// Creates a backend with custom configuration.
    pub fn with_config<P: AsRef<Path>>(
        path: P,
        config: SqliteBackendConfig,
    ) -> StorageResult<Self> {
        let path_str = path.as_ref().to_string_lossy();
        let is_memory = path_str == ":memory:";

        let strategy = SharedSchemaStrategy::new(config.tenancy.clone()).map_err(|e| {
            StorageError::Backend(BackendError::Internal {
                backend_name: "sqlite".to_string(),
                message: format!("Invalid tenant id pattern: {}", e),
                source: Some(Box::new(e)),
            })
        })?;

        let busy_timeout_ms = config.busy_timeout_ms;
        let enable_wal = config.enable_wal && !is_memory;
        let manager = if is_memory {
            SqliteConnectionManager::memory()
        } else {
            SqliteConnectionManager::file(path.as_ref())
        }
        .with_init(move |conn| init_connection(conn, busy_timeout_ms, enable_wal));

        let builder = Pool::builder().connection_timeout(Duration::from_millis(
            config.connection_timeout_ms,
        ));

        // The database lives only as long as its single connection, so the
        // pool must never retire it.
        let builder = if is_memory {
            builder
                .max_size(1)
                .min_idle(Some(1))
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            builder
                .max_size(config.max_connections)
                .min_idle(Some(config.min_connections.min(config.max_connections)))
        };

        let pool = builder.build(manager).map_err(|e| {
            StorageError::Backend(BackendError::ConnectionFailed {
                backend_name: "sqlite".to_string(),
                message: e.to_string(),
            })
        })?;

        tracing::debug!(
            path = %path_str,
            max_connections = pool.max_size(),
            "Opened sqlite backend"
        );

        Ok(Self {
            pool,
            config,
            strategy,
            is_memory,
        })
    }

    /// Initialize the database schema.
    pub fn init_schema(&self) -> StorageResult<()> {
        let conn = self.get_connection()?;
        schema::initialize_schema(&conn).map_err(|e| {
            StorageError::Backend(BackendError::MigrationError {
                message: e.to_string(),
            })
        })
    }

    /// Get an unbound connection from the pool.
    ///
    /// Only for the global `tenants` table and lifecycle checks; it sees no
    /// tenant-owned rows.
    pub(super) fn get_connection(
        &self,
    ) -> StorageResult<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| {
            StorageError::Backend(BackendError::ConnectionFailed {
                backend_name: "sqlite".to_string(),
                message: e.to_string(),
            })
        })
    }

    /// Borrows a connection bound to the context's tenant.
    ///
    /// The tenant id is validated first, then bound on the borrowed
    /// connection regardless of any binding left by a previous borrower.
    ///
    /// # Errors
    ///
    /// * `StorageError::Isolation(InvalidTenantId)` - If the id fails validation
    /// * `StorageError::Isolation(BindFailed)` - If the session could not be bound
    pub(crate) fn tenant_connection(&self, tenant: &TenantContext) -> StorageResult<TenantConnection> {
        self.strategy.validate(tenant.tenant_id())?;
        let conn = self.get_connection()?;
        TenantConnection::bind(conn, tenant.tenant_id()).inspect_err(|e| {
            tracing::error!(
                tenant_id = %tenant.tenant_id(),
                error = %e,
                "Refusing unit of work: tenant binding failed"
            );
        })
    }

    /// Returns whether this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        self.is_memory
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &SqliteBackendConfig {
        &self.config
    }

    /// Returns the tenancy strategy.
    pub fn strategy(&self) -> &SharedSchemaStrategy {
        &self.strategy
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        let conn = self
            .get_connection()
            .map_err(|_| BackendError::Unavailable {
                backend_name: "sqlite".to_string(),
                message: "Failed to get connection".to_string(),
            })?;
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|e| BackendError::Internal {
                backend_name: "sqlite".to_string(),
                message: format!("Health check failed: {}", e),
                source: None,
            })?;
        Ok(())
    }

    async fn initialize(&self) -> Result<(), BackendError> {
        self.init_schema().map_err(|e| BackendError::MigrationError {
            message: format!("Failed to initialize schema: {}", e),
        })
    }
}
