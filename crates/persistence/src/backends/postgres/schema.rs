//! PostgreSQL schema definitions.

use crate::error::{BackendError, StorageError, StorageResult};
use crate::strategy::TenantAwareTableBuilder;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

fn pg_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::MigrationError { message })
}

/// DDL for the global tenant registry. Not tenant-owned, so no policy.
const TENANTS_DDL: &str = "
    CREATE TABLE IF NOT EXISTS tenants (
        id VARCHAR(64) PRIMARY KEY,
        status TEXT NOT NULL DEFAULT 'active',
        plan TEXT NOT NULL,
        max_users INTEGER NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    );
";

/// Returns the full schema script.
pub fn schema_sql() -> String {
    let records = TenantAwareTableBuilder::new("tenant_records")
        .column("kind", "TEXT", false)
        .column("local_id", "TEXT", false)
        .column("version", "BIGINT", false)
        .column("data", "JSONB", false)
        .column("created_at", "TIMESTAMPTZ", false)
        .column("updated_at", "TIMESTAMPTZ", false)
        .primary_key(vec!["kind", "local_id"])
        .index(
            "idx_tenant_records_created",
            vec!["kind", "created_at", "local_id"],
            false,
        )
        .to_postgres_ddl();

    format!(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);\n{}\n{}",
        TENANTS_DDL, records
    )
}

/// Initialize the database schema. Idempotent.
pub async fn initialize_schema(client: &deadpool_postgres::Client) -> StorageResult<()> {
    client
        .batch_execute(&schema_sql())
        .await
        .map_err(|e| pg_error(format!("Failed to create schema: {}", e)))?;

    let row = client
        .query_opt("SELECT version FROM schema_version LIMIT 1", &[])
        .await
        .map_err(|e| pg_error(format!("Failed to query schema version: {}", e)))?;

    if row.is_none() {
        client
            .execute(
                "INSERT INTO schema_version (version) VALUES ($1)",
                &[&SCHEMA_VERSION],
            )
            .await
            .map_err(|e| pg_error(format!("Failed to set schema_version: {}", e)))?;
    }

    Ok(())
}
