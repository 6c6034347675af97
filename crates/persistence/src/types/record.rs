//! Tenant-owned record types.
//!
//! The platform stores HR entities as opaque JSON documents. This module
//! defines the record kinds the storage layer accepts and the
//! [`StoredRecord`] envelope that carries persistence metadata around them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::tenant::{TenantId, TenantScopedId};

/// The kinds of tenant-owned record the platform stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    /// An employee.
    Employee,
    /// A position within the organization.
    Position,
    /// A department, team or other organizational unit.
    OrganizationalUnit,
    /// An employee's assignment to a position.
    Assignment,
    /// One entry of an employee's salary history.
    SalaryHistory,
}

impl RecordKind {
    /// All record kinds, in a stable order.
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Employee,
        RecordKind::Position,
        RecordKind::OrganizationalUnit,
        RecordKind::Assignment,
        RecordKind::SalaryHistory,
    ];

    /// Returns the URL path segment (and stored discriminator) for this kind.
    pub fn as_path(&self) -> &'static str {
        match self {
            RecordKind::Employee => "employees",
            RecordKind::Position => "positions",
            RecordKind::OrganizationalUnit => "org-units",
            RecordKind::Assignment => "assignments",
            RecordKind::SalaryHistory => "salary-history",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

impl FromStr for RecordKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.as_path() == s)
            .ok_or_else(|| ValidationError::UnsupportedKind {
                kind: s.to_string(),
            })
    }
}

/// A tenant-owned record with persistence metadata.
///
/// ```
/// use workforce_persistence::tenant::{TenantId, TenantScopedId};
/// use workforce_persistence::types::{RecordKind, StoredRecord};
/// use serde_json::json;
///
/// let record = StoredRecord::new(
///     TenantScopedId::new("e1", TenantId::new("acme")),
///     RecordKind::Employee,
///     json!({"name": "Ada"}),
/// );
///
/// assert_eq!(record.version(), 1);
/// assert_eq!(record.etag(), "\"1\"");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    id: TenantScopedId,
    kind: RecordKind,
    version: u64,
    data: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoredRecord {
    /// Creates a first-version record stamped with the current time.
    pub fn new(id: TenantScopedId, kind: RecordKind, data: Value) -> Self {
        let now = Utc::now();
        Self {
            id,
            kind,
            version: 1,
            data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reassembles a record loaded from a backend.
    pub fn from_parts(
        id: TenantScopedId,
        kind: RecordKind,
        version: u64,
        data: Value,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            version,
            data,
            created_at,
            updated_at,
        }
    }

    /// Returns a copy with new content, the next version and a fresh timestamp.
    pub fn next_version(&self, data: Value) -> Self {
        Self {
            id: self.id.clone(),
            kind: self.kind,
            version: self.version + 1,
            data,
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }

    /// Returns the composite identity.
    pub fn id(&self) -> &TenantScopedId {
        &self.id
    }

    /// Returns the local part of the identity.
    pub fn local_id(&self) -> &str {
        self.id.local_id()
    }

    /// Returns the owning tenant.
    pub fn tenant_id(&self) -> &TenantId {
        self.id.tenant_id()
    }

    /// Returns the record kind.
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Returns the version number.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the version as a strong HTTP entity tag.
    pub fn etag(&self) -> String {
        format!("\"{}\"", self.version)
    }

    /// Returns the record content.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Consumes the record and returns its content.
    pub fn into_data(self) -> Value {
        self.data
    }

    /// Returns when the record was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the record was last updated.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Checks that a record body is a JSON object.
pub fn ensure_object(data: &Value) -> Result<(), ValidationError> {
    if data.is_object() {
        Ok(())
    } else {
        Err(ValidationError::InvalidRecord {
            message: "record body must be a JSON object".to_string(),
        })
    }
}

/// Extracts the caller-chosen local id from a record body, if any.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidRecord`] if the body is not an object or
/// carries an `id` that is not a non-empty string.
pub fn requested_local_id(data: &Value) -> Result<Option<String>, ValidationError> {
    ensure_object(data)?;
    let Some(object) = data.as_object() else {
        return Ok(None);
    };

    match object.get("id") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(Some(id.clone())),
        Some(_) => Err(ValidationError::InvalidRecord {
            message: "\"id\" must be a non-empty string".to_string(),
        }),
    }
}
