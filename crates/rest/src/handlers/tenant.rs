//! Calling-tenant handler.

use axum::{Json, extract::State};
use serde::Serialize;
use workforce_persistence::core::{RecordStorage, TenantDirectory};
use workforce_persistence::error::{StorageError, TenantError};
use workforce_persistence::tenant::{self, TenantRecord, TenantSource};

use crate::error::RestResult;
use crate::state::AppState;

/// The calling tenant and how it was resolved.
#[derive(Debug, Serialize)]
pub struct CurrentTenant {
    /// The tenant's directory record.
    #[serde(flatten)]
    pub tenant: TenantRecord,
    /// Where the tenant id came from.
    pub resolved_from: TenantSource,
    /// The credential subject, if any.
    pub user_id: Option<String>,
    /// The request's correlation id.
    pub correlation_id: Option<String>,
}

/// Handler returning the calling tenant's record.
///
/// `GET [base]/api/v1/tenant`
///
/// Reads the context from the request scope rather than the extensions.
pub async fn current_tenant_handler<S>(
    State(state): State<AppState<S>>,
) -> RestResult<Json<CurrentTenant>>
where
    S: RecordStorage + TenantDirectory + Send + Sync,
{
    let ctx = tenant::require_current().map_err(StorageError::from)?;

    let record = state
        .storage()
        .get_tenant(ctx.tenant_id())
        .await?
        .ok_or_else(|| {
            StorageError::Tenant(TenantError::NotFound {
                tenant_id: ctx.tenant_id().clone(),
            })
        })?;

    Ok(Json(CurrentTenant {
        tenant: record,
        resolved_from: ctx.source(),
        user_id: ctx.user_id().map(str::to_string),
        correlation_id: ctx.correlation_id().map(str::to_string),
    }))
}
