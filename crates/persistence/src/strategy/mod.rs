//! Multitenancy strategy.
//!
//! The platform uses a single strategy: all tenants share one schema and a
//! `tenant_id` column, with the database enforcing row visibility per
//! connection (see [`SharedSchemaStrategy`]).
//!
//! # Example
//!
//! ```
//! use workforce_persistence::strategy::{SharedSchemaConfig, SharedSchemaStrategy};
//! use workforce_persistence::tenant::TenantId;
//!
//! let strategy = SharedSchemaStrategy::new(SharedSchemaConfig::default()).unwrap();
//! assert!(strategy.validate(&TenantId::new("acme")).is_ok());
//! assert!(strategy.validate(&TenantId::new("acme'; --")).is_err());
//! ```

mod shared_schema;

pub use shared_schema::{
    SESSION_VARIABLE, SharedSchemaConfig, SharedSchemaStrategy, TENANT_COLUMN,
    TenantAwareTableBuilder,
};
