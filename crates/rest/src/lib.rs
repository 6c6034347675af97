//! # workforce-rest - Tenant-isolated HTTP API
//!
//! This crate is the HTTP edge of the Workforce platform. Every request under
//! `/api/v1` passes the tenant gate, which verifies the bearer credential,
//! resolves the tenant from its claims and runs the rest of the request inside
//! a tenant scope. Handlers hand that context to storage, which binds it to
//! the database connection before any statement runs.
//!
//! ## Request Flow
//!
//! 1. `Authorization: Bearer <jwt>` is verified (see [`tenant::JwtVerifier`]).
//! 2. The tenant is resolved from the claims (see [`tenant::TenantResolver`]):
//!    namespaced tenant claim, plain `tenant` claim, email domain, then the
//!    configured default.
//! 3. The default tenant is refused unless the fallback policy allows it.
//! 4. The tenant is provisioned on first sight (or must already exist).
//! 5. The handler runs inside [`workforce_persistence::tenant::scope`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use workforce_rest::{create_app_with_config, ServerConfig};
//! use workforce_persistence::backends::sqlite::SqliteBackend;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SqliteBackend::open("workforce.db")?;
//!     backend.init_schema()?;
//!
//!     let config = ServerConfig::default();
//!     let app = create_app_with_config(backend, config);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Interaction | HTTP Method | URL Pattern |
//! |------------|-------------|-------------|
//! | health | GET | `/health` |
//! | current tenant | GET | `/api/v1/tenant` |
//! | list | GET | `/api/v1/{kind}?page=&page_size=` |
//! | create | POST | `/api/v1/{kind}` |
//! | read | GET | `/api/v1/{kind}/{id}` |
//! | update | PUT | `/api/v1/{kind}/{id}` |
//! | delete | DELETE | `/api/v1/{kind}/{id}` |
//!
//! ## Error Handling
//!
//! Errors are returned as `{"error": {"code": ..., "message": ...}}`:
//!
//! | HTTP Status | Code | Description |
//! |-------------|------|-------------|
//! | 400 | invalid | Validation error, invalid tenant id |
//! | 401 | unauthorized | Bad credential, or no tenant under the reject policy |
//! | 403 | forbidden | Tenant suspended or unknown |
//! | 404 | not-found | Record absent in the calling tenant |
//! | 409 | conflict | Local id already taken |
//! | 412 | precondition-failed | `If-Match` version mismatch |
//! | 500 | internal | Missing context, isolation policy violation |
//! | 503 | unavailable | Tenant binding failed, backend unreachable |
//!
//! ## Architecture
//!
//! - [`config`] - Server and tenancy configuration
//! - [`error`] - Error types and responses
//! - [`state`] - Application state
//! - [`tenant`] - Credential verification and tenant resolution
//! - [`middleware`] - The tenant gate
//! - [`extractors`] - Axum extractors
//! - [`handlers`] - HTTP request handlers
//! - [`routing`] - Route configuration

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routing;
pub mod state;
pub mod tenant;

pub use config::{ServerConfig, StorageBackendMode, TenancyConfig, TenantFallbackPolicy};
pub use error::{RestError, RestResult};
pub use state::AppState;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use workforce_persistence::core::{Backend, RecordStorage, TenantDirectory};

use crate::middleware::X_REQUEST_ID;

/// Creates the Axum application with default configuration.
///
/// For more control, use [`create_app_with_config`].
pub fn create_app<S>(storage: S) -> Router
where
    S: RecordStorage + TenantDirectory + Backend + Send + Sync + 'static,
{
    create_app_with_config(storage, ServerConfig::default())
}

/// Creates the Axum application with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use workforce_rest::{create_app_with_config, ServerConfig};
/// use workforce_persistence::backends::sqlite::SqliteBackend;
///
/// let backend = SqliteBackend::in_memory()?;
/// let app = create_app_with_config(backend, ServerConfig::for_testing());
/// ```
pub fn create_app_with_config<S>(storage: S, config: ServerConfig) -> Router
where
    S: RecordStorage + TenantDirectory + Backend + Send + Sync + 'static,
{
    info!(
        backend = storage.name(),
        fallback = ?config.tenancy.fallback,
        "Creating REST API server"
    );

    let state = AppState::new(Arc::new(storage), config.clone());
    let router = routing::create_routes(state);

    // Request ids are set before tracing so the gate and the trace span see
    // the same value, and echoed back on the response.
    let service_builder = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout),
        ))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()));

    let router = if config.enable_cors {
        router.layer(build_cors_layer(&config))
    } else {
        router
    };

    router.layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_origins == "*" {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup. `RUST_LOG` overrides
/// `level` when set.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "workforce_rest={level},workforce_persistence={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
