//! Tenant context for storage operations.
//!
//! This module defines [`TenantContext`], the validated tenant information
//! required by every storage operation. Storage traits take it as an explicit
//! argument, so an operation without a tenant does not type-check.

use std::sync::Arc;

use super::id::TenantId;
use super::source::TenantSource;
use crate::error::ValidationError;

/// The tenant a unit of work runs on behalf of.
///
/// A context is built once per request by the tenant gate and never mutated
/// afterwards. Cloning is cheap; the optional request metadata is shared.
///
/// ```
/// use workforce_persistence::tenant::{TenantContext, TenantId};
///
/// let ctx = TenantContext::new(TenantId::new("acme"))
///     .with_correlation_id("req-1")
///     .with_user_id("user-7");
///
/// assert_eq!(ctx.tenant_id().as_str(), "acme");
/// assert_eq!(ctx.correlation_id(), Some("req-1"));
/// ```
#[derive(Debug, Clone)]
pub struct TenantContext {
    tenant_id: TenantId,
    source: TenantSource,
    meta: Arc<RequestMeta>,
}

#[derive(Debug, Default)]
struct RequestMeta {
    correlation_id: Option<String>,
    user_id: Option<String>,
}

impl TenantContext {
    /// Creates a context for the given tenant.
    ///
    /// The source defaults to [`TenantSource::TenantClaim`]; use
    /// [`TenantContext::with_source`] when the tenant was derived differently.
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            source: TenantSource::TenantClaim,
            meta: Arc::new(RequestMeta::default()),
        }
    }

    /// Sets where the tenant identifier was resolved from.
    pub fn with_source(mut self, source: TenantSource) -> Self {
        self.source = source;
        self
    }

    /// Creates a context with the specified correlation ID for tracing.
    pub fn with_correlation_id(self, correlation_id: impl Into<String>) -> Self {
        let user_id = self.meta.user_id.clone();
        Self {
            meta: Arc::new(RequestMeta {
                correlation_id: Some(correlation_id.into()),
                user_id,
            }),
            ..self
        }
    }

    /// Creates a context with the specified user ID.
    pub fn with_user_id(self, user_id: impl Into<String>) -> Self {
        let correlation_id = self.meta.correlation_id.clone();
        Self {
            meta: Arc::new(RequestMeta {
                correlation_id,
                user_id: Some(user_id.into()),
            }),
            ..self
        }
    }

    /// Returns the tenant ID.
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// Returns where the tenant identifier came from.
    pub fn source(&self) -> TenantSource {
        self.source
    }

    /// Returns the correlation ID, if set.
    pub fn correlation_id(&self) -> Option<&str> {
        self.meta.correlation_id.as_deref()
    }

    /// Returns the user ID, if set.
    pub fn user_id(&self) -> Option<&str> {
        self.meta.user_id.as_deref()
    }

    /// Returns `true` if the tenant was not derived from the credential.
    pub fn is_default_tenant(&self) -> bool {
        self.source == TenantSource::Default
    }
}

/// Builder for tenant contexts assembled from external input.
///
/// Used by the tenant gate, which collects the pieces from the verified
/// credential and request headers before it knows whether a tenant exists.
#[derive(Debug, Default)]
pub struct TenantContextBuilder {
    tenant_id: Option<TenantId>,
    source: Option<TenantSource>,
    correlation_id: Option<String>,
    user_id: Option<String>,
}

impl TenantContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tenant ID.
    pub fn tenant_id(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// Sets the tenant ID from a string.
    pub fn tenant_id_str(mut self, tenant_id: &str) -> Self {
        self.tenant_id = Some(TenantId::new(tenant_id));
        self
    }

    /// Sets the tenant source.
    pub fn source(mut self, source: TenantSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the correlation ID.
    pub fn correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Sets the user ID, if one is known.
    pub fn user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Builds the tenant context, returning an error if the tenant is missing.
    pub fn build(self) -> Result<TenantContext, ValidationError> {
        let tenant_id = self
            .tenant_id
            .ok_or_else(|| ValidationError::MissingRequiredField {
                field: "tenant_id".to_string(),
            })?;

        Ok(TenantContext {
            tenant_id,
            source: self.source.unwrap_or(TenantSource::TenantClaim),
            meta: Arc::new(RequestMeta {
                correlation_id: self.correlation_id,
                user_id: self.user_id,
            }),
        })
    }
}
