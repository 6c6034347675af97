//! Workforce route configuration.

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::get,
};
use workforce_persistence::core::{Backend, RecordStorage, TenantDirectory};

use crate::handlers;
use crate::middleware::tenant_gate;
use crate::state::AppState;

/// Creates all Workforce API routes.
///
/// # Routes
///
/// ## Ungated
/// - `GET /health` - Health check
///
/// ## Behind the tenant gate
/// - `GET /api/v1/tenant` - The calling tenant
/// - `GET /api/v1/{kind}` - List
/// - `POST /api/v1/{kind}` - Create
/// - `GET /api/v1/{kind}/{id}` - Read
/// - `PUT /api/v1/{kind}/{id}` - Update
/// - `DELETE /api/v1/{kind}/{id}` - Delete
pub fn create_routes<S>(state: AppState<S>) -> Router
where
    S: RecordStorage + TenantDirectory + Backend + Send + Sync + 'static,
{
    let api = Router::new()
        .route("/tenant", get(handlers::current_tenant_handler::<S>))
        .route(
            "/{kind}",
            get(handlers::list_handler::<S>).post(handlers::create_handler::<S>),
        )
        .route(
            "/{kind}/{id}",
            get(handlers::read_handler::<S>)
                .put(handlers::update_handler::<S>)
                .delete(handlers::delete_handler::<S>),
        )
        .route_layer(from_fn_with_state(state.clone(), tenant_gate::<S>));

    Router::new()
        .route("/health", get(handlers::health_handler::<S>))
        .nest("/api/v1", api)
        .with_state(state)
}
