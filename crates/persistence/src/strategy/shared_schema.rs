//! Shared schema tenancy strategy.
//!
//! All tenants share the same tables with a `tenant_id` column. Isolation is
//! enforced by the database, not by query text: each borrowed connection is
//! bound to one tenant through the `app.current_tenant` session variable and
//! a row-level policy filters every read and checks every write against it.

use serde::{Deserialize, Serialize};

use crate::error::IsolationError;
use crate::tenant::TenantId;

/// Session variable holding the tenant bound to a connection.
pub const SESSION_VARIABLE: &str = "app.current_tenant";

/// Column carrying the owning tenant on every tenant-owned table.
pub const TENANT_COLUMN: &str = "tenant_id";

/// Configuration for shared schema tenancy.
///
/// # Example
///
/// ```
/// use workforce_persistence::strategy::SharedSchemaConfig;
///
/// let config = SharedSchemaConfig {
///     max_tenant_id_length: 32,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedSchemaConfig {
    /// Maximum length for tenant IDs.
    #[serde(default = "default_max_tenant_id_length")]
    pub max_tenant_id_length: usize,

    /// Allowed characters in tenant IDs (regex pattern).
    #[serde(default = "default_tenant_id_pattern")]
    pub tenant_id_pattern: String,
}

fn default_max_tenant_id_length() -> usize {
    64
}

fn default_tenant_id_pattern() -> String {
    r"^[A-Za-z0-9][A-Za-z0-9_\-]*$".to_string()
}

impl Default for SharedSchemaConfig {
    fn default() -> Self {
        Self {
            max_tenant_id_length: default_max_tenant_id_length(),
            tenant_id_pattern: default_tenant_id_pattern(),
        }
    }
}

/// Shared schema tenancy strategy implementation.
///
/// Validates tenant identifiers before they are bound to a session and
/// produces the statements the backends use to bind and inspect it.
///
/// # Row-Level Security (PostgreSQL)
///
/// ```sql
/// ALTER TABLE tenant_records ENABLE ROW LEVEL SECURITY;
/// ALTER TABLE tenant_records FORCE ROW LEVEL SECURITY;
/// CREATE POLICY tenant_isolation ON tenant_records
///     USING (tenant_id = current_setting('app.current_tenant', true))
///     WITH CHECK (tenant_id = current_setting('app.current_tenant', true));
/// ```
///
/// Each borrowed connection runs
/// `SELECT set_config('app.current_tenant', $1, false)` before its first
/// statement.
#[derive(Debug, Clone)]
pub struct SharedSchemaStrategy {
    config: SharedSchemaConfig,
    tenant_pattern: regex::Regex,
}

impl SharedSchemaStrategy {
    /// Creates a new shared schema strategy with the given configuration.
    pub fn new(config: SharedSchemaConfig) -> Result<Self, regex::Error> {
        let tenant_pattern = regex::Regex::new(&config.tenant_id_pattern)?;
        Ok(Self {
            config,
            tenant_pattern,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SharedSchemaConfig {
        &self.config
    }

    /// Checks that a tenant ID may be bound to a session.
    pub fn validate(&self, tenant_id: &TenantId) -> Result<(), IsolationError> {
        let id = tenant_id.as_str();

        if id.is_empty() {
            return Err(IsolationError::InvalidTenantId {
                tenant_id: id.to_string(),
                reason: "tenant ID is empty".to_string(),
            });
        }

        if id.len() > self.config.max_tenant_id_length {
            return Err(IsolationError::InvalidTenantId {
                tenant_id: id.to_string(),
                reason: format!(
                    "tenant ID exceeds maximum length of {} characters",
                    self.config.max_tenant_id_length
                ),
            });
        }

        if !self.tenant_pattern.is_match(id) {
            return Err(IsolationError::InvalidTenantId {
                tenant_id: id.to_string(),
                reason: format!(
                    "tenant ID does not match required pattern: {}",
                    self.config.tenant_id_pattern
                ),
            });
        }

        Ok(())
    }

    /// Parameterized PostgreSQL statement binding `$1` as the session tenant.
    pub fn bind_sql(&self) -> String {
        format!("SELECT set_config('{}', $1, false)", SESSION_VARIABLE)
    }

    /// PostgreSQL statement reading the session tenant back.
    pub fn current_binding_sql(&self) -> String {
        format!("SELECT current_setting('{}', true)", SESSION_VARIABLE)
    }
}

/// Builder for creating PostgreSQL table DDL with tenant support.
#[derive(Debug)]
pub struct TenantAwareTableBuilder {
    table_name: String,
    columns: Vec<ColumnDef>,
    primary_key: Vec<String>,
    indexes: Vec<IndexDef>,
}

#[derive(Debug)]
struct ColumnDef {
    name: String,
    data_type: String,
    nullable: bool,
}

#[derive(Debug)]
struct IndexDef {
    name: String,
    columns: Vec<String>,
    unique: bool,
}

impl TenantAwareTableBuilder {
    /// Creates a new table builder.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Adds a column to the table.
    pub fn column(
        mut self,
        name: impl Into<String>,
        data_type: impl Into<String>,
        nullable: bool,
    ) -> Self {
        self.columns.push(ColumnDef {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
        });
        self
    }

    /// Sets the primary key (tenant_id will be prepended automatically).
    pub fn primary_key(mut self, columns: Vec<&str>) -> Self {
        self.primary_key = columns.into_iter().map(String::from).collect();
        self
    }

    /// Adds an index (tenant_id will be prepended automatically).
    pub fn index(mut self, name: impl Into<String>, columns: Vec<&str>, unique: bool) -> Self {
        self.indexes.push(IndexDef {
            name: name.into(),
            columns: columns.into_iter().map(String::from).collect(),
            unique,
        });
        self
    }

    fn tenant_first(columns: &[String]) -> String {
        std::iter::once(TENANT_COLUMN)
            .chain(columns.iter().map(|s| s.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Generates PostgreSQL DDL for the table, its indexes and its policy.
    ///
    /// The output is idempotent so it can run on every startup.
    pub fn to_postgres_ddl(&self) -> String {
        let mut ddl = String::new();

        ddl.push_str(&format!(
            "CREATE TABLE IF NOT EXISTS {} (\n",
            self.table_name
        ));
        ddl.push_str(&format!("    {} VARCHAR(64) NOT NULL,\n", TENANT_COLUMN));

        for col in &self.columns {
            let null_str = if col.nullable { "" } else { " NOT NULL" };
            ddl.push_str(&format!("    {} {}{},\n", col.name, col.data_type, null_str));
        }

        if self.primary_key.is_empty() {
            // Remove trailing comma
            ddl.truncate(ddl.len() - 2);
            ddl.push('\n');
        } else {
            ddl.push_str(&format!(
                "    PRIMARY KEY ({})\n",
                Self::tenant_first(&self.primary_key)
            ));
        }
        ddl.push_str(");\n\n");

        for idx in &self.indexes {
            let unique_str = if idx.unique { "UNIQUE " } else { "" };
            ddl.push_str(&format!(
                "CREATE {}INDEX IF NOT EXISTS {} ON {} ({});\n",
                unique_str,
                idx.name,
                self.table_name,
                Self::tenant_first(&idx.columns)
            ));
        }

        // FORCE applies the policy to the table owner as well
        ddl.push_str(&format!(
            "\nALTER TABLE {} ENABLE ROW LEVEL SECURITY;\n",
            self.table_name
        ));
        ddl.push_str(&format!(
            "ALTER TABLE {} FORCE ROW LEVEL SECURITY;\n",
            self.table_name
        ));
        ddl.push_str(&format!(
            "DROP POLICY IF EXISTS tenant_isolation ON {};\n",
            self.table_name
        ));
        ddl.push_str(&format!(
            "CREATE POLICY tenant_isolation ON {table} \
             USING ({col} = current_setting('{var}', true)) \
             WITH CHECK ({col} = current_setting('{var}', true));\n",
            table = self.table_name,
            col = TENANT_COLUMN,
            var = SESSION_VARIABLE,
        ));

        ddl
    }
}
