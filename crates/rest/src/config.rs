//! Server configuration for the Workforce HTTP API.
//!
//! This module provides configuration types for the server, supporting
//! both programmatic configuration and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `WORKFORCE_SERVER_PORT` | 8080 | Server port |
//! | `WORKFORCE_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `WORKFORCE_LOG_LEVEL` | info | Log level |
//! | `WORKFORCE_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `WORKFORCE_ENABLE_CORS` | true | Enable CORS |
//! | `WORKFORCE_CORS_ORIGINS` | * | Allowed origins |
//! | `WORKFORCE_STORAGE_BACKEND` | sqlite | `sqlite` or `postgres` |
//! | `WORKFORCE_DATABASE_URL` | | SQLite path or PostgreSQL URL |
//! | `WORKFORCE_MAX_CONNECTIONS` | 10 | Connection pool size |
//! | `WORKFORCE_DEFAULT_PAGE_SIZE` | 50 | Page size when none is requested |
//! | `WORKFORCE_MAX_PAGE_SIZE` | 500 | Upper bound on requested page size |
//!
//! Tenancy settings are listed on [`TenancyConfig`].
//!
//! # Example
//!
//! ```rust
//! use workforce_rest::ServerConfig;
//! use workforce_rest::config::TenantFallbackPolicy;
//!
//! let config = ServerConfig {
//!     port: 3000,
//!     host: "0.0.0.0".to_string(),
//!     ..Default::default()
//! };
//! assert_eq!(config.tenancy.fallback, TenantFallbackPolicy::Reject);
//! ```

use std::fmt;
use std::str::FromStr;

use clap::{Args, Parser, ValueEnum};
use workforce_persistence::tenant::ProvisioningDefaults;

use crate::tenant::normalize_tenant;

/// Server configuration for the Workforce HTTP API.
#[derive(Debug, Clone, Parser)]
#[command(name = "workforce-server")]
#[command(about = "Tenant-isolated HR records API")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "WORKFORCE_SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "WORKFORCE_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "WORKFORCE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Request timeout in seconds.
    #[arg(long, env = "WORKFORCE_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "WORKFORCE_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "WORKFORCE_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Storage backend.
    #[arg(long, env = "WORKFORCE_STORAGE_BACKEND", value_enum, default_value = "sqlite")]
    pub storage_backend: StorageBackendMode,

    /// Database connection string (SQLite path or PostgreSQL URL).
    #[arg(long, env = "WORKFORCE_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum number of pooled database connections.
    #[arg(long, env = "WORKFORCE_MAX_CONNECTIONS", default_value = "10")]
    pub max_connections: u32,

    /// Default page size for listings.
    #[arg(long, env = "WORKFORCE_DEFAULT_PAGE_SIZE", default_value = "50")]
    pub default_page_size: u32,

    /// Maximum page size for listings.
    #[arg(long, env = "WORKFORCE_MAX_PAGE_SIZE", default_value = "500")]
    pub max_page_size: u32,

    /// Tenant resolution and credential settings.
    #[command(flatten)]
    pub tenancy: TenancyConfig,
}

/// Tenant resolution, credential verification and provisioning settings.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `WORKFORCE_TENANT_CLAIM_NAMESPACE` | `https://workforce.app/` | Prefix of namespaced claims |
/// | `WORKFORCE_DEFAULT_TENANT` | demo-tenant | Tenant used when no claim resolves |
/// | `WORKFORCE_TENANT_FALLBACK` | reject | `reject` or `default-tenant` |
/// | `WORKFORCE_AUTO_PROVISION_TENANTS` | true | Register unseen tenants |
/// | `WORKFORCE_DEFAULT_TENANT_PLAN` | trial | Plan of provisioned tenants |
/// | `WORKFORCE_DEFAULT_MAX_USERS` | 25 | Seat limit of provisioned tenants |
/// | `WORKFORCE_JWT_SECRET` | | HS256 secret; unset trusts an upstream verifier |
/// | `WORKFORCE_JWT_ISSUER` | | Required `iss` |
/// | `WORKFORCE_JWT_AUDIENCE` | | Required `aud` |
#[derive(Debug, Clone, Args)]
pub struct TenancyConfig {
    /// Prefix for namespaced claims (`<namespace>tenant`, `<namespace>email`).
    #[arg(
        long,
        env = "WORKFORCE_TENANT_CLAIM_NAMESPACE",
        default_value = "https://workforce.app/"
    )]
    pub claim_namespace: String,

    /// Tenant used when no claim yields one.
    #[arg(long, env = "WORKFORCE_DEFAULT_TENANT", default_value = "demo-tenant")]
    pub default_tenant: String,

    /// What to do when a request resolves to the default tenant.
    #[arg(long, env = "WORKFORCE_TENANT_FALLBACK", value_enum, default_value = "reject")]
    pub fallback: TenantFallbackPolicy,

    /// Register tenants the first time they are seen.
    #[arg(long, env = "WORKFORCE_AUTO_PROVISION_TENANTS", default_value = "true")]
    pub auto_provision: bool,

    /// Plan assigned to auto-provisioned tenants.
    #[arg(long, env = "WORKFORCE_DEFAULT_TENANT_PLAN", default_value = "trial")]
    pub default_plan: String,

    /// Seat limit assigned to auto-provisioned tenants.
    #[arg(long, env = "WORKFORCE_DEFAULT_MAX_USERS", default_value = "25")]
    pub default_max_users: u32,

    /// HS256 secret for bearer tokens. When unset, signatures are assumed to
    /// be checked by an upstream gateway and only expiry is enforced.
    #[arg(long, env = "WORKFORCE_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Required token issuer.
    #[arg(long, env = "WORKFORCE_JWT_ISSUER")]
    pub jwt_issuer: Option<String>,

    /// Required token audience.
    #[arg(long, env = "WORKFORCE_JWT_AUDIENCE")]
    pub jwt_audience: Option<String>,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            claim_namespace: "https://workforce.app/".to_string(),
            default_tenant: "demo-tenant".to_string(),
            fallback: TenantFallbackPolicy::default(),
            auto_provision: true,
            default_plan: "trial".to_string(),
            default_max_users: 25,
            jwt_secret: None,
            jwt_issuer: None,
            jwt_audience: None,
        }
    }
}

impl TenancyConfig {
    /// Attributes for auto-provisioned tenants.
    pub fn provisioning_defaults(&self) -> ProvisioningDefaults {
        ProvisioningDefaults {
            plan: self.default_plan.clone(),
            max_users: self.default_max_users,
        }
    }
}

/// Policy for requests whose credential carries no usable tenant claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TenantFallbackPolicy {
    /// Reject the request with 401.
    #[default]
    Reject,
    /// Serve the request as the configured default tenant.
    DefaultTenant,
}

impl fmt::Display for TenantFallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenantFallbackPolicy::Reject => write!(f, "reject"),
            TenantFallbackPolicy::DefaultTenant => write!(f, "default-tenant"),
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StorageBackendMode {
    /// SQLite (in-memory or file).
    #[default]
    Sqlite,
    /// PostgreSQL with row-level security.
    Postgres,
}

impl fmt::Display for StorageBackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackendMode::Sqlite => write!(f, "sqlite"),
            StorageBackendMode::Postgres => write!(f, "postgres"),
        }
    }
}

impl FromStr for StorageBackendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackendMode::Sqlite),
            "postgres" | "postgresql" => Ok(StorageBackendMode::Postgres),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            request_timeout: 30,
            enable_cors: true,
            cors_origins: "*".to_string(),
            storage_backend: StorageBackendMode::default(),
            database_url: None,
            max_connections: 10,
            default_page_size: 50,
            max_page_size: 500,
            tenancy: TenancyConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.max_connections == 0 {
            errors.push("Max connections cannot be 0".to_string());
        }

        if self.default_page_size == 0 {
            errors.push("Default page size cannot be 0".to_string());
        }

        if self.default_page_size > self.max_page_size {
            errors.push("Default page size cannot exceed max page size".to_string());
        }

        if normalize_tenant(&self.tenancy.default_tenant).is_none() {
            errors.push("Default tenant must contain at least one letter or digit".to_string());
        }

        if self
            .tenancy
            .jwt_secret
            .as_deref()
            .is_some_and(|secret| secret.len() < 32)
        {
            errors.push("JWT secret must be at least 32 characters".to_string());
        }

        if self.storage_backend == StorageBackendMode::Postgres && self.database_url.is_none() {
            errors.push("Postgres backend requires a database URL".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    pub fn for_testing() -> Self {
        Self {
            port: 0,
            host: "127.0.0.1".to_string(),
            log_level: "debug".to_string(),
            request_timeout: 5,
            enable_cors: false,
            cors_origins: "*".to_string(),
            storage_backend: StorageBackendMode::Sqlite,
            database_url: None,
            max_connections: 4,
            default_page_size: 10,
            max_page_size: 100,
            tenancy: TenancyConfig {
                jwt_secret: Some("test-secret-that-is-at-least-32-bytes".to_string()),
                ..Default::default()
            },
        }
    }
}
