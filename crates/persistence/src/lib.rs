//! Workforce Platform Persistence Layer
//!
//! Tenant-isolated storage for HR records (employees, positions,
//! organizational units, assignments, salary history) in a shared-schema
//! multi-tenant database.
//!
//! # Features
//!
//! - **Mandatory tenant context**: every storage operation takes a
//!   [`TenantContext`](tenant::TenantContext)
//! - **Composite identity**: records are addressed by
//!   [`TenantScopedId`](tenant::TenantScopedId), so equal local ids in two
//!   tenants never collide
//! - **Database-enforced isolation**: each borrowed connection is bound to
//!   the request's tenant before use, and the database filters rows by it
//! - **Request scope**: [`tenant::scope`] carries the context through an
//!   async call chain without threading it by hand
//! - **Auto-provisioning**: [`TenantDirectory`](core::TenantDirectory)
//!   registers unknown tenants idempotently
//!
//! # Backend Features
//!
//! - `sqlite` (default) - SQLite with in-memory and file modes
//! - `postgres` - PostgreSQL with forced row-level security
//!
//! # Architecture
//!
//! - [`tenant`] - Tenant identity, context, request scope, directory records
//! - [`types`] - Stored records and pagination
//! - [`error`] - Error types for all operations
//! - [`core`] - Storage traits
//! - [`strategy`] - The shared-schema isolation strategy
//! - [`backends`] - Backend implementations
//!
//! # Quick Start
//!
//! ```no_run
//! use workforce_persistence::backends::sqlite::SqliteBackend;
//! use workforce_persistence::core::{RecordStorage, TenantDirectory};
//! use workforce_persistence::tenant::{self, TenantContext, TenantId};
//! use workforce_persistence::types::RecordKind;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::in_memory()?;
//! let ctx = TenantContext::new(TenantId::new("acme"));
//! backend.ensure_tenant(ctx.tenant_id()).await?;
//!
//! let employee = tenant::scope(ctx, async {
//!     let ctx = tenant::require_current()?;
//!     backend
//!         .create(&ctx, RecordKind::Employee, json!({"name": "Ada Lovelace"}))
//!         .await
//!         .map_err(Box::<dyn std::error::Error>::from)
//! })
//! .await?;
//!
//! assert_eq!(employee.tenant_id().as_str(), "acme");
//! assert_eq!(employee.version(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod strategy;
pub mod tenant;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use tenant::{TenantContext, TenantId, TenantScopedId, TenantSource};
pub use types::{Page, Pagination, RecordKind, StoredRecord};

// Re-export core traits
pub use core::{Backend, BackendKind, RecordStorage, TenantDirectory};

// Re-export tenancy strategy
pub use strategy::{SharedSchemaConfig, SharedSchemaStrategy};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
