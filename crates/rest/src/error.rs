//! Error types for the Workforce HTTP API.
//!
//! Every error is returned as `{"error": {"code": "...", "message": "..."}}`.
//!
//! # Error Mapping
//!
//! | Source | HTTP Status | Code |
//! |--------|-------------|------|
//! | Credential rejected, no tenant claim | 401 | unauthorized |
//! | Tenant suspended | 403 | forbidden |
//! | Record not found (including other tenants' records) | 404 | not-found |
//! | Record already exists | 409 | conflict |
//! | `If-Match` version mismatch | 412 | precondition-failed |
//! | Invalid record, kind or tenant id | 400 | invalid |
//! | Tenant binding failed, backend unavailable | 503 | unavailable |
//! | Missing tenant context, isolation policy rejected a write | 500 | internal |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use workforce_persistence::error::{
    BackendError, ConcurrencyError, IsolationError, ResourceError, StorageError, TenantError,
};

use crate::tenant::AuthError;

/// The primary error type for HTTP API operations.
#[derive(Debug)]
pub enum RestError {
    /// Credential missing, malformed, expired or carrying no tenant (HTTP 401).
    Unauthorized {
        /// Error message.
        message: String,
    },

    /// Access denied (HTTP 403).
    Forbidden {
        /// Error message.
        message: String,
    },

    /// Record not found (HTTP 404).
    NotFound {
        /// The record kind (e.g., "employees").
        kind: String,
        /// The record's local id.
        id: String,
    },

    /// Record already exists (HTTP 409).
    Conflict {
        /// Message describing the conflict.
        message: String,
    },

    /// Precondition failed - If-Match (HTTP 412).
    PreconditionFailed {
        /// Message describing why the precondition failed.
        message: String,
    },

    /// Bad request - validation error (HTTP 400).
    BadRequest {
        /// Error message.
        message: String,
    },

    /// Tenant isolation could not be established (HTTP 503).
    ServiceUnavailable {
        /// Error message.
        message: String,
    },

    /// Internal server error (HTTP 500).
    InternalError {
        /// Error message.
        message: String,
    },
}

impl RestError {
    /// Returns the HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            RestError::Forbidden { .. } => StatusCode::FORBIDDEN,
            RestError::NotFound { .. } => StatusCode::NOT_FOUND,
            RestError::Conflict { .. } => StatusCode::CONFLICT,
            RestError::PreconditionFailed { .. } => StatusCode::PRECONDITION_FAILED,
            RestError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            RestError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            RestError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            RestError::Unauthorized { .. } => "unauthorized",
            RestError::Forbidden { .. } => "forbidden",
            RestError::NotFound { .. } => "not-found",
            RestError::Conflict { .. } => "conflict",
            RestError::PreconditionFailed { .. } => "precondition-failed",
            RestError::BadRequest { .. } => "invalid",
            RestError::ServiceUnavailable { .. } => "unavailable",
            RestError::InternalError { .. } => "internal",
        }
    }
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestError::Unauthorized { message } => write!(f, "Unauthorized: {}", message),
            RestError::Forbidden { message } => write!(f, "Forbidden: {}", message),
            RestError::NotFound { kind, id } => write!(f, "Record not found: {}/{}", kind, id),
            RestError::Conflict { message } => write!(f, "Conflict: {}", message),
            RestError::PreconditionFailed { message } => {
                write!(f, "Precondition failed: {}", message)
            }
            RestError::BadRequest { message } => write!(f, "Bad request: {}", message),
            RestError::ServiceUnavailable { message } => {
                write!(f, "Service unavailable: {}", message)
            }
            RestError::InternalError { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for RestError {}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            RestError::NotFound { kind, id } => format!("Record {}/{} not found", kind, id),
            RestError::Unauthorized { message }
            | RestError::Forbidden { message }
            | RestError::Conflict { message }
            | RestError::PreconditionFailed { message }
            | RestError::BadRequest { message }
            | RestError::ServiceUnavailable { message }
            | RestError::InternalError { message } => message.clone(),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }

        let body = json!({
            "error": {
                "code": self.code(),
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for RestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Resource(ResourceError::NotFound { kind, id }) => {
                RestError::NotFound { kind, id }
            }
            StorageError::Resource(ResourceError::AlreadyExists { kind, id }) => {
                RestError::Conflict {
                    message: format!("Record {}/{} already exists", kind, id),
                }
            }
            StorageError::Concurrency(ConcurrencyError::VersionConflict {
                expected_version,
                actual_version,
                ..
            }) => RestError::PreconditionFailed {
                message: format!(
                    "If-Match version {} does not match current version {}",
                    expected_version, actual_version
                ),
            },
            StorageError::Tenant(TenantError::TenantSuspended { tenant_id }) => {
                RestError::Forbidden {
                    message: format!("Tenant {} is suspended", tenant_id),
                }
            }
            StorageError::Tenant(TenantError::NotFound { tenant_id }) => RestError::Forbidden {
                message: format!("Tenant {} is not registered", tenant_id),
            },
            StorageError::Tenant(TenantError::MissingContext) => RestError::InternalError {
                message: "No tenant context for this request".to_string(),
            },
            StorageError::Isolation(IsolationError::InvalidTenantId { tenant_id, reason }) => {
                RestError::BadRequest {
                    message: format!("Invalid tenant id '{}': {}", tenant_id, reason),
                }
            }
            StorageError::Isolation(err @ IsolationError::PolicyViolation { .. }) => {
                RestError::InternalError {
                    message: err.to_string(),
                }
            }
            StorageError::Isolation(err) => RestError::ServiceUnavailable {
                message: err.to_string(),
            },
            StorageError::Validation(err) => RestError::BadRequest {
                message: err.to_string(),
            },
            StorageError::Backend(
                err @ (BackendError::Unavailable { .. }
                | BackendError::ConnectionFailed { .. }
                | BackendError::PoolExhausted { .. }),
            ) => RestError::ServiceUnavailable {
                message: err.to_string(),
            },
            StorageError::Backend(err) => RestError::InternalError {
                message: err.to_string(),
            },
        }
    }
}

impl From<AuthError> for RestError {
    fn from(err: AuthError) -> Self {
        RestError::Unauthorized {
            message: err.to_string(),
        }
    }
}

/// Result type for HTTP API operations.
pub type RestResult<T> = Result<T, RestError>;

#[cfg(test)]
mod tests {
    use super::*;
    use workforce_persistence::tenant::TenantId;

    #[test]
    fn test_storage_error_mapping() {
        let cases: Vec<(StorageError, StatusCode)> = vec![
            (
                ResourceError::NotFound {
                    kind: "employees".into(),
                    id: "e1".into(),
                }
                .into(),
                StatusCode::NOT_FOUND,
            ),
            (
                ResourceError::AlreadyExists {
                    kind: "employees".into(),
                    id: "e1".into(),
                }
                .into(),
                StatusCode::CONFLICT,
            ),
            (
                ConcurrencyError::VersionConflict {
                    kind: "employees".into(),
                    id: "e1".into(),
                    expected_version: 1,
                    actual_version: 2,
                }
                .into(),
                StatusCode::PRECONDITION_FAILED,
            ),
            (
                TenantError::TenantSuspended {
                    tenant_id: TenantId::new("acme"),
                }
                .into(),
                StatusCode::FORBIDDEN,
            ),
            (
                TenantError::MissingContext.into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                IsolationError::BindFailed {
                    tenant_id: TenantId::new("acme"),
                    backend_name: "sqlite".into(),
                    message: "no such table".into(),
                }
                .into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                IsolationError::PolicyViolation {
                    message: "new row violates tenant isolation policy".into(),
                }
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                BackendError::ConnectionFailed {
                    backend_name: "postgres".into(),
                    message: "refused".into(),
                }
                .into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, expected) in cases {
            let rest: RestError = err.into();
            assert_eq!(rest.status(), expected, "{}", rest);
        }
    }

    #[test]
    fn test_auth_error_is_unauthorized() {
        let err: RestError = AuthError::Expired.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "unauthorized");
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = RestError::NotFound {
            kind: "employees".into(),
            id: "e1".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "not-found");
        assert_eq!(body["error"]["message"], "Record employees/e1 not found");
    }
}
