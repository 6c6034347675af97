//! SQLite backend implementation.
//!
//! Implements [`RecordStorage`](crate::core::RecordStorage) and
//! [`TenantDirectory`](crate::core::TenantDirectory) on an r2d2 pool of
//! SQLite connections. It supports in-memory databases (tests, demos) and
//! file-based databases (development, small deployments).
//!
//! # Tenant isolation
//!
//! SQLite has no row-level security, so each pooled connection gets TEMP
//! objects that emulate it (see [`schema`]): a session settings table, a
//! `records` view filtered by the bound tenant, and INSTEAD OF triggers that
//! reject writes for any other tenant. Storage borrows connections only
//! through [`TenantConnection`], which binds the tenant first.
//!
//! # Example
//!
//! ```no_run
//! use workforce_persistence::backends::sqlite::SqliteBackend;
//! use workforce_persistence::core::RecordStorage;
//! use workforce_persistence::tenant::{TenantContext, TenantId};
//! use workforce_persistence::types::RecordKind;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::open("./data/workforce.db")?;
//! let tenant = TenantContext::new(TenantId::new("acme"));
//!
//! backend
//!     .create(&tenant, RecordKind::Employee, serde_json::json!({"name": "Ada"}))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE tenant_records (
//!     tenant_id TEXT NOT NULL,
//!     kind TEXT NOT NULL,
//!     local_id TEXT NOT NULL,
//!     version INTEGER NOT NULL,
//!     data BLOB NOT NULL,  -- JSON data
//!     created_at TEXT NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     PRIMARY KEY (tenant_id, kind, local_id)
//! );
//!
//! CREATE TABLE tenants (
//!     id TEXT PRIMARY KEY,
//!     status TEXT NOT NULL,
//!     plan TEXT NOT NULL,
//!     max_users INTEGER NOT NULL,
//!     created_at TEXT NOT NULL
//! );
//! ```

mod backend;
mod directory;
pub mod schema;
pub mod session;
mod storage;

pub use backend::{SqliteBackend, SqliteBackendConfig};
pub use session::TenantConnection;
