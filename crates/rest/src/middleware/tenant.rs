//! The tenant gate.
//!
//! Every tenant-scoped route runs behind [`tenant_gate`]. Per request it
//!
//! 1. verifies the bearer credential,
//! 2. resolves the tenant from its claims and applies the fallback policy,
//! 3. admits the tenant (auto-provisioning it if configured, refusing
//!    suspended tenants),
//! 4. installs a [`TenantContext`] into the request extensions and into the
//!    task-scoped carrier for the rest of the request.
//!
//! The context is removed when the downstream future finishes, fails, panics
//! or is dropped, because it lives only inside [`tenant::scope`].

use axum::{
    extract::{Request, State},
    http::header::HeaderName,
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, debug, info_span, warn};
use workforce_persistence::core::{RecordStorage, TenantDirectory};
use workforce_persistence::error::{StorageError, TenantError};
use workforce_persistence::tenant::{self, TenantContext, TenantId, TenantRecord};

use crate::config::TenantFallbackPolicy;
use crate::error::{RestError, RestResult};
use crate::state::AppState;
use crate::tenant::AuthError;

/// Header carrying the request's correlation id.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Logs the end of a tenant scope on every exit path.
struct ScopeTeardown {
    tenant_id: TenantId,
}

impl Drop for ScopeTeardown {
    fn drop(&mut self) {
        debug!(tenant_id = %self.tenant_id, "Released tenant context");
    }
}

/// Resolves, admits and installs the calling tenant.
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn tenant_gate<S>(
    State(state): State<AppState<S>>,
    mut request: Request,
    next: Next,
) -> RestResult<Response>
where
    S: RecordStorage + TenantDirectory + Send + Sync + 'static,
{
    let claims = state
        .verifier()
        .verify_headers(request.headers())
        .inspect_err(|e| warn!(error = %e, "Rejected credential"))?;

    let resolved = state.resolver().resolve(&claims);
    if resolved.is_default() {
        let policy = state.config().tenancy.fallback;
        warn!(
            default_tenant = %resolved.tenant_id,
            policy = %policy,
            "Credential carries no usable tenant claim"
        );
        if policy == TenantFallbackPolicy::Reject {
            return Err(AuthError::MissingTenant.into());
        }
    }

    admit(&state, &resolved.tenant_id).await?;

    let correlation_id = request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let mut ctx = TenantContext::new(resolved.tenant_id.clone())
        .with_source(resolved.source)
        .with_correlation_id(correlation_id.clone());
    if let Some(sub) = claims.subject() {
        ctx = ctx.with_user_id(sub);
    }

    request.extensions_mut().insert(ctx.clone());

    let span = info_span!(
        "tenant_request",
        tenant_id = %resolved.tenant_id,
        source = %resolved.source,
        correlation_id = %correlation_id,
    );
    let _teardown = ScopeTeardown {
        tenant_id: resolved.tenant_id,
    };

    Ok(tenant::scope(ctx, next.run(request)).instrument(span).await)
}

/// Looks up (or provisions) the tenant and refuses inactive ones.
async fn admit<S>(state: &AppState<S>, tenant_id: &TenantId) -> RestResult<TenantRecord>
where
    S: RecordStorage + TenantDirectory + Send + Sync,
{
    let lookup = if state.config().tenancy.auto_provision {
        state
            .storage()
            .ensure_tenant(tenant_id)
            .await
            .map(|provisioned| provisioned.tenant)
    } else {
        state
            .storage()
            .get_tenant(tenant_id)
            .await
            .and_then(|found| {
                found.ok_or_else(|| {
                    StorageError::Tenant(TenantError::NotFound {
                        tenant_id: tenant_id.clone(),
                    })
                })
            })
    };

    let tenant = lookup.map_err(|e| match e {
        StorageError::Backend(err) => RestError::ServiceUnavailable {
            message: format!("Tenant directory unavailable: {}", err),
        },
        other => other.into(),
    })?;

    if !tenant.is_active() {
        return Err(StorageError::Tenant(TenantError::TenantSuspended {
            tenant_id: tenant_id.clone(),
        })
        .into());
    }

    Ok(tenant)
}
