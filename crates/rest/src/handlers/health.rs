//! Health check endpoint handler.
//!
//! Not behind the tenant gate.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};
use workforce_persistence::core::{Backend, RecordStorage, TenantDirectory};

use crate::state::AppState;

/// Handler for the health check endpoint.
///
/// # HTTP Request
///
/// `GET [base]/health`
///
/// # Response
///
/// - `200 OK` - Backend reachable
/// - `503 Service Unavailable` - Backend health check failed
pub async fn health_handler<S>(State(state): State<AppState<S>>) -> Response
where
    S: RecordStorage + TenantDirectory + Backend + Send + Sync,
{
    debug!("Processing health check request");

    let backend_name = state.storage().name();
    let (status, label) = match state.storage().health_check().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            warn!(backend = backend_name, error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    let body = serde_json::json!({
        "status": label,
        "backend": backend_name,
        "timestamp": chrono::Utc::now().to_rfc3339()
    });

    (status, Json(body)).into_response()
}
