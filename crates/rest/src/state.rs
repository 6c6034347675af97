//! Application state for the Workforce HTTP API.
//!
//! This module defines the shared application state available to the tenant
//! gate and all request handlers.

use std::sync::Arc;

use workforce_persistence::core::{RecordStorage, TenantDirectory};

use crate::config::ServerConfig;
use crate::tenant::{JwtVerifier, TenantResolver};

/// Shared application state for the HTTP API.
///
/// # Type Parameters
///
/// * `S` - The storage backend type (must implement [`RecordStorage`] and
///   [`TenantDirectory`])
///
/// # Example
///
/// ```rust,ignore
/// use workforce_rest::{AppState, ServerConfig};
/// use workforce_persistence::backends::sqlite::SqliteBackend;
/// use std::sync::Arc;
///
/// let backend = SqliteBackend::in_memory()?;
/// let state = AppState::new(Arc::new(backend), ServerConfig::default());
/// ```
pub struct AppState<S> {
    /// The storage backend.
    storage: Arc<S>,

    /// Server configuration.
    config: Arc<ServerConfig>,

    /// Claims to tenant resolution.
    resolver: Arc<TenantResolver>,

    /// Bearer token verification.
    verifier: Arc<JwtVerifier>,
}

// Manually implement Clone since S is wrapped in Arc and doesn't need to be Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            config: Arc::clone(&self.config),
            resolver: Arc::clone(&self.resolver),
            verifier: Arc::clone(&self.verifier),
        }
    }
}

impl<S: RecordStorage + TenantDirectory> AppState<S> {
    /// Creates a new AppState with the given storage and configuration.
    pub fn new(storage: Arc<S>, config: ServerConfig) -> Self {
        let resolver = TenantResolver::new(&config.tenancy);
        let verifier = JwtVerifier::new(&config.tenancy);
        Self {
            storage,
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            verifier: Arc::new(verifier),
        }
    }

    /// Returns a reference to the storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns a clone of the storage Arc.
    pub fn storage_arc(&self) -> Arc<S> {
        Arc::clone(&self.storage)
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the tenant resolver.
    pub fn resolver(&self) -> &TenantResolver {
        &self.resolver
    }

    /// Returns the credential verifier.
    pub fn verifier(&self) -> &JwtVerifier {
        &self.verifier
    }

    /// Returns the default page size for listings.
    pub fn default_page_size(&self) -> u32 {
        self.config.default_page_size
    }

    /// Returns the maximum page size for listings.
    pub fn max_page_size(&self) -> u32 {
        self.config.max_page_size
    }
}
