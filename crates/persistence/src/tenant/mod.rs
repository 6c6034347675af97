//! Tenant identity and propagation.
//!
//! Every storage operation requires a [`TenantContext`]. The context is built
//! once per request, passed explicitly to storage, and additionally installed
//! in a task-scoped slot (see [`scope`]) for code that cannot take it as an
//! argument.
//!
//! # Core Types
//!
//! - [`TenantId`] - Opaque tenant identifier
//! - [`TenantScopedId`] - Composite `(local_id, tenant_id)` record key
//! - [`TenantContext`] - The tenant a unit of work runs for
//! - [`TenantSource`] - Which claim produced the tenant
//! - [`TenantRecord`] - The tenant entity kept in the directory
//!
//! # Examples
//!
//! ```
//! use workforce_persistence::tenant::{self, TenantContext, TenantId, TenantScopedId};
//!
//! # tokio_test_block(async {
//! let ctx = TenantContext::new(TenantId::new("acme"));
//! let id = tenant::scope(ctx, async {
//!     let ctx = tenant::require_current().unwrap();
//!     TenantScopedId::generate(&ctx)
//! })
//! .await;
//! assert_eq!(id.tenant_id().as_str(), "acme");
//! # });
//! # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod context;
mod directory;
mod id;
pub mod scope;
mod scoped_id;
mod source;

pub use context::{TenantContext, TenantContextBuilder};
pub use directory::{Provisioned, ProvisioningDefaults, TenantRecord, TenantStatus};
pub use id::TenantId;
pub use scope::{current, inherit, require_current, scope, sync_scope};
pub use scoped_id::TenantScopedId;
pub use source::TenantSource;
