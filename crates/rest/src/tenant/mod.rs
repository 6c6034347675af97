//! Credential-based tenant resolution.
//!
//! The calling tenant is derived from the request's bearer token:
//!
//! - [`credential`] verifies the token and yields its [`Claims`]
//! - [`resolver`] maps claims to a canonical tenant identifier
//!
//! # Resolution Priority
//!
//! 1. Namespaced tenant claim (`<namespace>tenant`)
//! 2. Plain `tenant` claim
//! 3. Domain of an email-like claim
//! 4. Default tenant from configuration
//!
//! Only the last is not backed by the credential. The gate in
//! [`middleware::tenant`](crate::middleware::tenant) logs it and applies the
//! configured [`TenantFallbackPolicy`](crate::config::TenantFallbackPolicy).
//!
//! # Example
//!
//! ```rust
//! use workforce_rest::tenant::{Claims, TenantResolver, TenantSource};
//!
//! let resolver = TenantResolver::with_namespace("https://workforce.app/", "demo-tenant");
//! let claims: Claims = serde_json::from_value(serde_json::json!({
//!     "email": "ada@Corp-X.io"
//! })).unwrap();
//!
//! let resolved = resolver.resolve(&claims);
//! assert_eq!(resolved.tenant_id_str(), "corp-x-io");
//! assert_eq!(resolved.source, TenantSource::EmailDomain);
//! ```

mod claims;
pub mod credential;
pub mod resolver;

pub use claims::Claims;
pub use credential::{AuthError, JwtVerifier};
pub use resolver::{ResolvedTenant, TenantResolver, normalize_tenant};
pub use workforce_persistence::tenant::TenantSource;
