//! HTTP request handlers.
//!
//! - [`records`] - CRUD over tenant-owned records
//! - [`tenant`] - The calling tenant
//! - [`health`] - Liveness

pub mod health;
pub mod records;
pub mod tenant;

pub use health::health_handler;
pub use records::{create_handler, delete_handler, list_handler, read_handler, update_handler};
pub use tenant::current_tenant_handler;
