//! Tenant resolution from credential claims.
//!
//! Provides the [`TenantResolver`], which maps a verified claim set to a
//! canonical tenant identifier using an ordered list of sources.

use workforce_persistence::tenant::{TenantId, TenantSource};

use crate::config::TenancyConfig;

use super::claims::Claims;

/// Claims that may carry an email-like value, after the namespaced email
/// claim, in the order they are consulted.
pub const EMAIL_CLAIMS: &[&str] = &["email", "preferred_username", "upn", "mail", "unique_name"];

/// Result of resolving a tenant from a claim set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTenant {
    /// The resolved, normalized tenant ID.
    pub tenant_id: TenantId,
    /// The source from which the tenant was resolved.
    pub source: TenantSource,
}

impl ResolvedTenant {
    /// Returns true if the tenant was the default fallback.
    pub fn is_default(&self) -> bool {
        self.source == TenantSource::Default
    }

    /// Returns the tenant ID as a string reference.
    pub fn tenant_id_str(&self) -> &str {
        self.tenant_id.as_str()
    }
}

/// Resolves the calling tenant from credential claims.
///
/// The first source that yields a non-empty value after normalization wins:
///
/// 1. `<namespace>tenant`
/// 2. `tenant`
/// 3. the domain of the first email-like claim: `<namespace>email`, then
///    [`EMAIL_CLAIMS`]
/// 4. the configured default tenant
///
/// Resolution never fails. Whether a default resolution is acceptable is
/// decided by the caller.
#[derive(Debug, Clone)]
pub struct TenantResolver {
    namespace: String,
    default_tenant: TenantId,
}

impl TenantResolver {
    /// Creates a resolver from the tenancy settings.
    pub fn new(config: &TenancyConfig) -> Self {
        Self::with_namespace(&config.claim_namespace, &config.default_tenant)
    }

    /// Creates a resolver with an explicit namespace and default tenant.
    ///
    /// The default tenant is normalized like any claim value. A default that
    /// normalizes to nothing is kept verbatim and refused when bound;
    /// `ServerConfig::validate` reports it at startup.
    pub fn with_namespace(namespace: &str, default_tenant: &str) -> Self {
        let default_tenant =
            normalize_tenant(default_tenant).unwrap_or_else(|| default_tenant.to_string());
        Self {
            namespace: namespace.to_string(),
            default_tenant: TenantId::new(default_tenant),
        }
    }

    /// Returns the configured default tenant.
    pub fn default_tenant(&self) -> &TenantId {
        &self.default_tenant
    }

    /// Resolves the tenant for `claims`.
    pub fn resolve(&self, claims: &Claims) -> ResolvedTenant {
        let namespaced_tenant = format!("{}tenant", self.namespace);
        let tenant_claims = [
            (namespaced_tenant.as_str(), TenantSource::NamespacedTenantClaim),
            ("tenant", TenantSource::TenantClaim),
        ];

        for (claim, source) in tenant_claims {
            if let Some(tenant) = claims.get_str(claim).and_then(normalize_tenant) {
                return ResolvedTenant {
                    tenant_id: TenantId::new(tenant),
                    source,
                };
            }
        }

        let namespaced_email = format!("{}email", self.namespace);
        let email_domain = std::iter::once(namespaced_email.as_str())
            .chain(EMAIL_CLAIMS.iter().copied())
            .filter_map(|claim| claims.get_str(claim))
            .filter_map(email_domain)
            .find_map(normalize_tenant);

        if let Some(tenant) = email_domain {
            return ResolvedTenant {
                tenant_id: TenantId::new(tenant),
                source: TenantSource::EmailDomain,
            };
        }

        ResolvedTenant {
            tenant_id: self.default_tenant.clone(),
            source: TenantSource::Default,
        }
    }
}

/// Returns the part after the last `@`, if the value looks like an email.
fn email_domain(value: &str) -> Option<&str> {
    value
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
}

/// Canonicalizes a raw tenant value.
///
/// Lower-cases, collapses every run of non-alphanumeric characters into one
/// `-`, and trims leading and trailing `-`. Returns `None` if nothing is
/// left.
pub fn normalize_tenant(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut pending_dash = false;

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if out.is_empty() { None } else { Some(out) }
}
