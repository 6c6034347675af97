//! Core storage traits and abstractions.
//!
//! - [`Backend`] - Database lifecycle (health, schema initialization)
//! - [`RecordStorage`] - Tenant-scoped CRUD for HR records
//! - [`TenantDirectory`] - The global registry of tenants
//!
//! Backends implement all three. Only `RecordStorage` touches tenant-owned
//! rows, and every one of its operations takes a
//! [`TenantContext`](crate::tenant::TenantContext).

mod backend;
mod directory;
mod storage;

pub use backend::{Backend, BackendKind};
pub use directory::TenantDirectory;
pub use storage::RecordStorage;
