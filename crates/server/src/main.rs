//! Workforce API server.
//!
//! Serves the tenant-isolated HR API over SQLite or PostgreSQL.

use clap::Parser;
use tracing::info;
use workforce_rest::{ServerConfig, StorageBackendMode, create_app_with_config, init_logging};

/// Starts the Axum HTTP server.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        port = config.port,
        host = %config.host,
        storage_backend = %config.storage_backend,
        fallback = %config.tenancy.fallback,
        auto_provision = config.tenancy.auto_provision,
        "Starting Workforce server"
    );

    match config.storage_backend {
        StorageBackendMode::Sqlite => start_sqlite(config).await,
        StorageBackendMode::Postgres => start_postgres(config).await,
    }
}

/// Starts the server with the SQLite backend.
#[cfg(feature = "sqlite")]
async fn start_sqlite(config: ServerConfig) -> anyhow::Result<()> {
    use workforce_persistence::backends::sqlite::{SqliteBackend, SqliteBackendConfig};

    let db_path = config.database_url.as_deref().unwrap_or("workforce.db");
    info!(database = %db_path, "Initializing SQLite backend");

    let backend_config = SqliteBackendConfig {
        max_connections: config.max_connections,
        provisioning: config.tenancy.provisioning_defaults(),
        ..Default::default()
    };
    let backend = SqliteBackend::with_config(db_path, backend_config)?;
    backend.init_schema()?;

    let app = create_app_with_config(backend, config.clone());
    serve(app, &config).await
}

/// Fallback when sqlite feature is not enabled.
#[cfg(not(feature = "sqlite"))]
async fn start_sqlite(_config: ServerConfig) -> anyhow::Result<()> {
    anyhow::bail!(
        "The sqlite backend requires the 'sqlite' feature. \
         Build with: cargo build -p workforce-server --features sqlite"
    )
}

/// Starts the server with the PostgreSQL backend.
#[cfg(feature = "postgres")]
async fn start_postgres(config: ServerConfig) -> anyhow::Result<()> {
    use workforce_persistence::backends::postgres::{PostgresBackend, PostgresConfig};

    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("The postgres backend requires --database-url"))?;
    info!("Initializing PostgreSQL backend from connection string");

    let backend_config = PostgresConfig {
        max_connections: config.max_connections as usize,
        provisioning: config.tenancy.provisioning_defaults(),
        ..PostgresConfig::from_url(url)
    };
    let backend = PostgresBackend::new(backend_config).await?;
    backend.init_schema().await?;

    let app = create_app_with_config(backend, config.clone());
    serve(app, &config).await
}

/// Fallback when postgres feature is not enabled.
#[cfg(not(feature = "postgres"))]
async fn start_postgres(_config: ServerConfig) -> anyhow::Result<()> {
    anyhow::bail!(
        "The postgres backend requires the 'postgres' feature. \
         Build with: cargo build -p workforce-server --features postgres"
    )
}

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("At least one database backend feature must be enabled");
