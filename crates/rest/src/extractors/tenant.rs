//! Tenant context extractor.
//!
//! Reads the [`TenantContext`] installed by the tenant gate.

use axum::{extract::FromRequestParts, http::request::Parts};
use workforce_persistence::error::{StorageError, TenantError};
use workforce_persistence::tenant::TenantContext;

use crate::error::RestError;

/// Axum extractor for the calling tenant's context.
///
/// Only routes behind [`tenant_gate`](crate::middleware::tenant_gate) have a
/// context; anywhere else extraction fails with 500 rather than guessing a
/// tenant.
///
/// # Example
///
/// ```rust,ignore
/// use workforce_rest::extractors::TenantExtractor;
///
/// async fn handler(tenant: TenantExtractor) {
///     println!("Tenant ID: {}", tenant.tenant_id());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TenantExtractor {
    context: TenantContext,
}

impl TenantExtractor {
    /// Returns a reference to the tenant context.
    pub fn context(&self) -> &TenantContext {
        &self.context
    }

    /// Returns the tenant ID as a string.
    pub fn tenant_id(&self) -> &str {
        self.context.tenant_id().as_str()
    }

    /// Consumes the extractor and returns the tenant context.
    pub fn into_context(self) -> TenantContext {
        self.context
    }
}

impl std::fmt::Display for TenantExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tenant_id())
    }
}

impl<S> FromRequestParts<S> for TenantExtractor
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .map(|context| TenantExtractor { context })
            .ok_or_else(|| StorageError::Tenant(TenantError::MissingContext).into())
    }
}
