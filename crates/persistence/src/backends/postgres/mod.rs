//! PostgreSQL backend implementation.
//!
//! Tenant isolation is enforced by the database. `tenant_records` has row
//! level security enabled and forced, with a `tenant_isolation` policy that
//! compares each row's `tenant_id` against the `app.current_tenant` session
//! setting. Storage borrows clients only through
//! [`TenantClient`](session::TenantClient), which sets that value first.
//!
//! The connecting role must not be a superuser or hold `BYPASSRLS`.

mod backend;
mod directory;
pub mod schema;
pub mod session;
mod storage;

pub use backend::{PostgresBackend, PostgresConfig, PostgresSslMode};
pub use session::TenantClient;
