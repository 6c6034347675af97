//! Backend abstraction for database drivers.
//!
//! A [`Backend`] owns a connection pool and the isolation schema. It exposes
//! lifecycle operations only; connections for tenant work are handed out by
//! each backend's session guard, never through this trait.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::BackendError;

/// Identifies the type of database backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// SQLite database (file-based or in-memory).
    Sqlite,
    /// PostgreSQL database.
    Postgres,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::Postgres => write!(f, "postgres"),
        }
    }
}

/// Lifecycle operations shared by all database backends.
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Returns the backend kind.
    fn kind(&self) -> BackendKind;

    /// Returns the backend name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Checks that the database is reachable.
    async fn health_check(&self) -> Result<(), BackendError>;

    /// Creates tables, indexes and isolation policies if they are missing.
    async fn initialize(&self) -> Result<(), BackendError>;
}
