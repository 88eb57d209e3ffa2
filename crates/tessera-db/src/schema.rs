//! Schema definitions and migration runner for SurrealDB.
//!
//! Tables are SCHEMAFULL. UUIDs and enums are stored as strings; enum
//! columns carry ASSERT constraints. Ledger uniqueness is enforced twice:
//! by deterministic record ids (so writes upsert) and by UNIQUE indexes.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenants (global scope)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD subdomain ON TABLE tenant TYPE string;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD status ON TABLE tenant TYPE string \
    ASSERT $value IN ['active', 'blocked', 'suspended', 'trial'];
DEFINE FIELD owner_id ON TABLE tenant TYPE option<string>;
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_subdomain ON TABLE tenant \
    COLUMNS subdomain UNIQUE;

-- =======================================================================
-- Principals (internal employees, product owner, tenant members)
-- =======================================================================
DEFINE TABLE principal SCHEMAFULL;
DEFINE FIELD role ON TABLE principal TYPE string \
    ASSERT $value IN ['super_admin', 'admin', 'user'];
DEFINE FIELD is_internal_employee ON TABLE principal TYPE bool \
    DEFAULT false;
DEFINE FIELD tenant_subdomain ON TABLE principal TYPE option<string>;
DEFINE FIELD company_name ON TABLE principal TYPE option<string>;
DEFINE FIELD status ON TABLE principal TYPE string \
    ASSERT $value IN ['active', 'suspended', 'blocked'];
DEFINE FIELD created_at ON TABLE principal TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE principal TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_principal_tenant ON TABLE principal \
    COLUMNS tenant_subdomain;

-- =======================================================================
-- Projects (tenant scope; tenant_id NONE for internal-only projects)
-- =======================================================================
DEFINE TABLE project SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE project TYPE option<string>;
DEFINE FIELD name ON TABLE project TYPE string;
DEFINE FIELD created_by ON TABLE project TYPE string;
DEFINE FIELD created_at ON TABLE project TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_project_tenant ON TABLE project \
    COLUMNS tenant_id;

-- =======================================================================
-- Project access ledger: one row per (project, user)
-- =======================================================================
DEFINE TABLE project_access SCHEMAFULL;
DEFINE FIELD project_id ON TABLE project_access TYPE string;
DEFINE FIELD user_id ON TABLE project_access TYPE string;
DEFINE FIELD access_level ON TABLE project_access TYPE string \
    ASSERT $value IN ['viewer', 'editor', 'admin'];
DEFINE FIELD granted_by ON TABLE project_access TYPE string;
DEFINE FIELD granted_at ON TABLE project_access TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_project_access_key ON TABLE project_access \
    COLUMNS project_id, user_id UNIQUE;
DEFINE INDEX idx_project_access_user ON TABLE project_access \
    COLUMNS user_id;

-- =======================================================================
-- Work items
-- =======================================================================
DEFINE TABLE task SCHEMAFULL;
DEFINE FIELD project_id ON TABLE task TYPE string;
DEFINE FIELD title ON TABLE task TYPE string;
DEFINE FIELD is_internal_only ON TABLE task TYPE bool DEFAULT false;
DEFINE FIELD created_by ON TABLE task TYPE string;
DEFINE FIELD created_at ON TABLE task TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE task TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_task_project ON TABLE task COLUMNS project_id;

DEFINE TABLE task_comment SCHEMAFULL;
DEFINE FIELD task_id ON TABLE task_comment TYPE string;
DEFINE FIELD parent_id ON TABLE task_comment TYPE option<string>;
DEFINE FIELD body ON TABLE task_comment TYPE string;
DEFINE FIELD is_internal_only ON TABLE task_comment TYPE bool \
    DEFAULT false;
DEFINE FIELD author_id ON TABLE task_comment TYPE string;
DEFINE FIELD created_at ON TABLE task_comment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_comment_task ON TABLE task_comment COLUMNS task_id;

DEFINE TABLE project_file SCHEMAFULL;
DEFINE FIELD project_id ON TABLE project_file TYPE string;
DEFINE FIELD name ON TABLE project_file TYPE string;
DEFINE FIELD created_by ON TABLE project_file TYPE string;
DEFINE FIELD created_at ON TABLE project_file TYPE datetime \
    DEFAULT time::now();

DEFINE TABLE milestone SCHEMAFULL;
DEFINE FIELD project_id ON TABLE milestone TYPE string;
DEFINE FIELD name ON TABLE milestone TYPE string;
DEFINE FIELD created_by ON TABLE milestone TYPE string;
DEFINE FIELD created_at ON TABLE milestone TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Resource share ledger: one row per (resource_type, resource_id, user)
-- =======================================================================
DEFINE TABLE resource_share SCHEMAFULL;
DEFINE FIELD project_id ON TABLE resource_share TYPE string;
DEFINE FIELD resource_type ON TABLE resource_share TYPE string \
    ASSERT $value IN ['task', 'comment', 'file', 'milestone'];
DEFINE FIELD resource_id ON TABLE resource_share TYPE string;
DEFINE FIELD user_id ON TABLE resource_share TYPE string;
DEFINE FIELD permission ON TABLE resource_share TYPE string \
    ASSERT $value IN ['view', 'comment', 'edit'];
DEFINE FIELD notes ON TABLE resource_share TYPE option<string>;
DEFINE FIELD expires_at ON TABLE resource_share TYPE option<datetime>;
DEFINE FIELD shared_by ON TABLE resource_share TYPE string;
DEFINE FIELD shared_at ON TABLE resource_share TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_resource_share_key ON TABLE resource_share \
    COLUMNS resource_type, resource_id, user_id UNIQUE;

-- =======================================================================
-- Audit Log (append-only)
-- =======================================================================
DEFINE TABLE audit_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD actor_id ON TABLE audit_log TYPE string;
DEFINE FIELD tenant_subdomain ON TABLE audit_log TYPE option<string>;
DEFINE FIELD action ON TABLE audit_log TYPE string;
DEFINE FIELD target ON TABLE audit_log TYPE option<string>;
DEFINE FIELD outcome ON TABLE audit_log TYPE string \
    ASSERT $value IN ['success', 'denied'];
DEFINE FIELD reason ON TABLE audit_log TYPE option<string>;
DEFINE FIELD timestamp ON TABLE audit_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_audit_actor_time ON TABLE audit_log \
    COLUMNS actor_id, timestamp;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Apply every migration newer than the recorded schema version.
///
/// The `_migration` tracking table is created on first use. Each applied
/// migration is recorded, so calling this on an up-to-date database is a
/// no-op.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current = current_version(db).await?;
    let pending = MIGRATIONS.iter().filter(|m| m.version > current);

    for migration in pending {
        apply(db, migration).await?;
    }

    Ok(())
}

async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map(|m| m.version).unwrap_or(0))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    info!(
        version = migration.version,
        name = migration.name,
        "Applying migration"
    );

    db.query(migration.sql).await?.check().map_err(|e| {
        DbError::Migration(format!(
            "v{} '{}': {e}",
            migration.version, migration.name
        ))
    })?;

    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!("recording v{}: {e}", migration.version))
        })?;

    info!(version = migration.version, "Migration applied");
    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn schema_v1_declares_ledger_uniqueness() {
        assert!(SCHEMA_V1.contains("COLUMNS project_id, user_id UNIQUE"));
        assert!(SCHEMA_V1.contains("COLUMNS resource_type, resource_id, user_id UNIQUE"));
        assert!(SCHEMA_V1.contains("COLUMNS subdomain UNIQUE"));
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
