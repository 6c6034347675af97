//! SQLite schema definitions.
//!
//! SQLite has neither session variables nor row-level security, so both are
//! emulated with per-connection TEMP objects:
//!
//! - `temp.session_settings` holds `app.current_tenant` for this connection.
//! - `temp.records` is a view over `main.tenant_records` restricted to the
//!   bound tenant. An unbound connection sees no rows.
//! - INSTEAD OF triggers on the view route writes to `tenant_records` and
//!   abort any row whose tenant differs from the bound one.
//!
//! Record storage only ever queries `records`, never `tenant_records`.

use rusqlite::Connection;

use crate::error::POLICY_VIOLATION_MARKER;

/// Current schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i32 = 1;

/// Name of the tenant-filtered view that storage queries.
pub const RECORDS_VIEW: &str = "records";

const MAIN_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tenants (
        id TEXT PRIMARY KEY,
        status TEXT NOT NULL DEFAULT 'active',
        plan TEXT NOT NULL,
        max_users INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tenant_records (
        tenant_id TEXT NOT NULL,
        kind TEXT NOT NULL,
        local_id TEXT NOT NULL,
        version INTEGER NOT NULL,
        data BLOB NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (tenant_id, kind, local_id)
    );

    CREATE INDEX IF NOT EXISTS idx_tenant_records_created
        ON tenant_records (tenant_id, kind, created_at, local_id);
";

/// Creates the persistent tables if they are missing. Idempotent.
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(MAIN_SCHEMA)?;

    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version < SCHEMA_VERSION {
        conn.execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))?;
    }

    Ok(())
}

/// Creates the per-connection isolation objects. Idempotent.
pub fn install_session_objects(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(&session_objects_sql())
}

fn session_objects_sql() -> String {
    let bound = "(SELECT value FROM session_settings WHERE name = 'app.current_tenant')";
    let violation = format!("RAISE(ABORT, 'new row violates {}')", POLICY_VIOLATION_MARKER);

    format!(
        "
        CREATE TEMP TABLE IF NOT EXISTS session_settings (
            name TEXT PRIMARY KEY,
            value TEXT
        );

        CREATE TEMP VIEW IF NOT EXISTS {view} AS
            SELECT tenant_id, kind, local_id, version, data, created_at, updated_at
            FROM main.tenant_records
            WHERE tenant_id = {bound};

        CREATE TEMP TRIGGER IF NOT EXISTS records_insert
        INSTEAD OF INSERT ON {view}
        BEGIN
            SELECT {violation} WHERE NEW.tenant_id IS NOT {bound};
            INSERT INTO tenant_records
                (tenant_id, kind, local_id, version, data, created_at, updated_at)
            VALUES
                (NEW.tenant_id, NEW.kind, NEW.local_id, NEW.version, NEW.data,
                 NEW.created_at, NEW.updated_at);
        END;

        CREATE TEMP TRIGGER IF NOT EXISTS records_update
        INSTEAD OF UPDATE ON {view}
        BEGIN
            SELECT {violation} WHERE NEW.tenant_id IS NOT OLD.tenant_id
                OR NEW.tenant_id IS NOT {bound};
            UPDATE tenant_records
            SET version = NEW.version, data = NEW.data, updated_at = NEW.updated_at
            WHERE tenant_id = OLD.tenant_id AND kind = OLD.kind AND local_id = OLD.local_id;
        END;

        CREATE TEMP TRIGGER IF NOT EXISTS records_delete
        INSTEAD OF DELETE ON {view}
        BEGIN
            DELETE FROM tenant_records
            WHERE tenant_id = OLD.tenant_id AND kind = OLD.kind AND local_id = OLD.local_id;
        END;
        ",
        view = RECORDS_VIEW,
        bound = bound,
        violation = violation,
    )
}
