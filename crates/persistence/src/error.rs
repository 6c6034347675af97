//! Error types for the persistence layer.
//!
//! This module defines all error types used throughout the persistence layer,
//! following a hierarchy that separates record errors, tenant errors,
//! isolation (session binding) errors and backend errors.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::tenant::TenantId;

/// The primary error type for all storage operations.
///
/// This enum encompasses all possible errors that can occur during persistence
/// operations, organized by category.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Record state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Concurrency and versioning errors
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    /// Tenant lifecycle errors
    #[error(transparent)]
    Tenant(#[from] TenantError),

    /// Tenant isolation enforcement errors
    #[error(transparent)]
    Isolation(#[from] IsolationError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl StorageError {
    /// Returns `true` if this error means tenant isolation could not be
    /// established for the unit of work.
    pub fn is_isolation_failure(&self) -> bool {
        matches!(self, StorageError::Isolation(_))
    }
}

/// Errors related to record state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The requested record was not found.
    #[error("record not found: {kind}/{id}")]
    NotFound { kind: String, id: String },

    /// A record with the given ID already exists.
    #[error("record already exists: {kind}/{id}")]
    AlreadyExists { kind: String, id: String },
}

/// Errors related to concurrency control.
#[derive(Error, Debug)]
pub enum ConcurrencyError {
    /// Version conflict detected during optimistic locking.
    #[error("version conflict on {kind}/{id}: expected {expected_version}, found {actual_version}")]
    VersionConflict {
        kind: String,
        id: String,
        expected_version: u64,
        actual_version: u64,
    },
}

/// Errors related to the tenant lifecycle.
#[derive(Error, Debug)]
pub enum TenantError {
    /// The specified tenant does not exist.
    #[error("tenant not found: {tenant_id}")]
    NotFound { tenant_id: TenantId },

    /// Tenant is suspended and cannot perform operations.
    #[error("tenant suspended: {tenant_id}")]
    TenantSuspended { tenant_id: TenantId },

    /// No tenant context is installed for the current call chain.
    #[error("no tenant context installed for the current request")]
    MissingContext,
}

/// Errors raised while stamping a database session with the current tenant.
///
/// None of these are recoverable by falling back to another tenant; the unit
/// of work must be aborted.
#[derive(Error, Debug)]
pub enum IsolationError {
    /// The session variable could not be set on the borrowed connection.
    #[error("failed to bind tenant {tenant_id} to {backend_name} session: {message}")]
    BindFailed {
        tenant_id: TenantId,
        backend_name: String,
        message: String,
    },

    /// The tenant identifier is not acceptable as a session binding.
    #[error("invalid tenant id '{tenant_id}': {reason}")]
    InvalidTenantId { tenant_id: String, reason: String },

    /// The session reports a different binding than the one just requested.
    #[error("session bound to {actual:?} after binding {expected}")]
    BindingMismatch {
        expected: TenantId,
        actual: Option<String>,
    },

    /// A write was rejected by the row-level isolation policy.
    #[error("row violates tenant isolation policy: {message}")]
    PolicyViolation { message: String },
}

/// Errors related to record validation.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The record body failed validation.
    #[error("invalid record: {message}")]
    InvalidRecord { message: String },

    /// The record kind is not supported.
    #[error("unsupported record kind: {kind}")]
    UnsupportedKind { kind: String },

    /// Missing required field.
    #[error("missing required field: {field}")]
    MissingRequiredField { field: String },
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connection pool exhausted.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// Schema migration error.
    #[error("schema migration failed: {message}")]
    MigrationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

/// Marker text raised by the SQLite isolation triggers.
#[cfg(feature = "sqlite")]
pub(crate) const POLICY_VIOLATION_MARKER: &str = "tenant isolation policy";

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        let message = err.to_string();
        if message.contains(POLICY_VIOLATION_MARKER) {
            return StorageError::Isolation(IsolationError::PolicyViolation { message });
        }
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message,
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(_err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
        })
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for StorageError {
    fn from(err: tokio_postgres::Error) -> Self {
        // 42501 = insufficient_privilege, raised when a row fails the RLS WITH CHECK
        if err.code() == Some(&tokio_postgres::error::SqlState::INSUFFICIENT_PRIVILEGE) {
            return StorageError::Isolation(IsolationError::PolicyViolation {
                message: err.to_string(),
            });
        }
        StorageError::Backend(BackendError::Internal {
            backend_name: "postgres".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Resource(ResourceError::NotFound {
            kind: "employees".to_string(),
            id: "e1".to_string(),
        });
        assert_eq!(err.to_string(), "record not found: employees/e1");
    }

    #[test]
    fn test_concurrency_error_display() {
        let err = ConcurrencyError::VersionConflict {
            kind: "positions".to_string(),
            id: "p1".to_string(),
            expected_version: 1,
            actual_version: 2,
        };
        assert_eq!(
            err.to_string(),
            "version conflict on positions/p1: expected 1, found 2"
        );
    }

    #[test]
    fn test_isolation_error_is_flagged() {
        let err: StorageError = IsolationError::BindFailed {
            tenant_id: TenantId::new("acme"),
            backend_name: "sqlite".to_string(),
            message: "disk I/O error".to_string(),
        }
        .into();
        assert!(err.is_isolation_failure());
        assert!(err.to_string().contains("acme"));

        let err: StorageError = TenantError::MissingContext.into();
        assert!(!err.is_isolation_failure());
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_policy_violation_is_recognized() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
            Some("new row violates tenant isolation policy".to_string()),
        );
        let storage: StorageError = err.into();
        assert!(matches!(
            storage,
            StorageError::Isolation(IsolationError::PolicyViolation { .. })
        ));
    }
}
