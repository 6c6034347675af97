//! Tenant entity types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::TenantId;

/// Lifecycle state of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    /// The tenant may use the platform.
    Active,
    /// Requests for the tenant are refused.
    Suspended,
}

impl TenantStatus {
    /// Returns the stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Active => "active",
            TenantStatus::Suspended => "suspended",
        }
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TenantStatus::Active),
            "suspended" => Ok(TenantStatus::Suspended),
            other => Err(format!("unknown tenant status: {other}")),
        }
    }
}

/// A tenant as stored in the tenant directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecord {
    /// Tenant identifier.
    pub id: TenantId,
    /// Lifecycle state.
    pub status: TenantStatus,
    /// Subscription plan name.
    pub plan: String,
    /// Seat limit for the plan.
    pub max_users: u32,
    /// When the tenant was first seen.
    pub created_at: DateTime<Utc>,
}

impl TenantRecord {
    /// Returns `true` if the tenant may serve requests.
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }
}

/// Outcome of [`ensure_tenant`](crate::core::TenantDirectory::ensure_tenant).
#[derive(Debug, Clone)]
pub struct Provisioned {
    /// The tenant record, whether just created or pre-existing.
    pub tenant: TenantRecord,
    /// `true` only for the caller whose insert created the record.
    pub created: bool,
}

/// Attributes given to tenants created by auto-provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningDefaults {
    /// Plan assigned to new tenants.
    #[serde(default = "default_plan")]
    pub plan: String,
    /// Seat limit assigned to new tenants.
    #[serde(default = "default_max_users")]
    pub max_users: u32,
}

fn default_plan() -> String {
    "trial".to_string()
}

fn default_max_users() -> u32 {
    25
}

impl Default for ProvisioningDefaults {
    fn default() -> Self {
        Self {
            plan: default_plan(),
            max_users: default_max_users(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        assert_eq!("active".parse::<TenantStatus>(), Ok(TenantStatus::Active));
        assert_eq!(TenantStatus::Suspended.to_string(), "suspended");
        assert!("deleted".parse::<TenantStatus>().is_err());
    }

    #[test]
    fn test_provisioning_defaults() {
        let defaults = ProvisioningDefaults::default();
        assert_eq!(defaults.plan, "trial");
        assert_eq!(defaults.max_users, 25);

        let parsed: ProvisioningDefaults = serde_json::from_str(r#"{"plan":"pro"}"#).unwrap();
        assert_eq!(parsed.plan, "pro");
        assert_eq!(parsed.max_users, 25);
    }
}
