//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings and double as record keys. Enums are
//! stored as strings with ASSERT constraints for validation.

use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;
use crate::repository::check;

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

#[derive(Debug, Deserialize)]
struct MigrationRecord {
    version: u32,
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
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Accounts
-- =======================================================================
DEFINE TABLE account SCHEMAFULL;
DEFINE FIELD full_name ON TABLE account TYPE string;
DEFINE FIELD email ON TABLE account TYPE string;
DEFINE FIELD department ON TABLE account TYPE option<string>;
DEFINE FIELD is_approved ON TABLE account TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE account TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_account_email ON TABLE account COLUMNS email UNIQUE;

-- =======================================================================
-- Role assignments (record key = account id, so one row per account)
-- =======================================================================
DEFINE TABLE account_role SCHEMAFULL;
DEFINE FIELD account_id ON TABLE account_role TYPE string;
DEFINE FIELD role ON TABLE account_role TYPE string \
    ASSERT $value IN ['admin', 'staff', 'student'];
DEFINE FIELD assigned_at ON TABLE account_role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_account_role_account ON TABLE account_role \
    COLUMNS account_id UNIQUE;

-- =======================================================================
-- Credentials (record key = account id; Argon2id PHC strings only)
-- =======================================================================
DEFINE TABLE credential SCHEMAFULL;
DEFINE FIELD account_id ON TABLE credential TYPE string;
DEFINE FIELD secret_hash ON TABLE credential TYPE string;
DEFINE FIELD updated_at ON TABLE credential TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Resources (venues and equipment)
-- =======================================================================
DEFINE TABLE resource SCHEMAFULL;
DEFINE FIELD name ON TABLE resource TYPE string;
DEFINE FIELD kind ON TABLE resource TYPE string \
    ASSERT $value IN ['venue', 'music_instruments', 'projector', \
    'chairs', 'tables', 'microphone', 'speakers', 'other'];
DEFINE FIELD description ON TABLE resource TYPE option<string>;
DEFINE FIELD location ON TABLE resource TYPE option<string>;
DEFINE FIELD capacity ON TABLE resource TYPE option<int>;
DEFINE FIELD is_available ON TABLE resource TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE resource TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE resource TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Events
-- =======================================================================
DEFINE TABLE event SCHEMAFULL;
DEFINE FIELD title ON TABLE event TYPE string;
DEFINE FIELD description ON TABLE event TYPE string;
DEFINE FIELD category ON TABLE event TYPE option<string>;
DEFINE FIELD venue_id ON TABLE event TYPE option<string>;
DEFINE FIELD resources_needed ON TABLE event TYPE option<string>;
DEFINE FIELD organizer_id ON TABLE event TYPE string;
DEFINE FIELD start_time ON TABLE event TYPE datetime;
DEFINE FIELD end_time ON TABLE event TYPE datetime;
DEFINE FIELD max_participants ON TABLE event TYPE option<int>;
DEFINE FIELD status ON TABLE event TYPE string \
    ASSERT $value IN ['pending', 'approved', 'rejected'];
DEFINE FIELD registration_count ON TABLE event TYPE int DEFAULT 0;
DEFINE FIELD created_at ON TABLE event TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE event TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_event_status ON TABLE event COLUMNS status;
DEFINE INDEX idx_event_organizer ON TABLE event COLUMNS organizer_id;

-- =======================================================================
-- Registrations
-- =======================================================================
DEFINE TABLE registration SCHEMAFULL;
DEFINE FIELD event_id ON TABLE registration TYPE string;
DEFINE FIELD student_id ON TABLE registration TYPE string;
DEFINE FIELD registered_at ON TABLE registration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_registration_pair ON TABLE registration \
    COLUMNS event_id, student_id UNIQUE;
DEFINE INDEX idx_registration_student ON TABLE registration \
    COLUMNS student_id;
";

/// Run all pending migrations.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    check(db.query(MIGRATION_TABLE_DDL).await?)
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            check(db.query(migration.sql).await?).map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            check(
                db.query("CREATE _migration SET version = $version, name = $name")
                    .bind(("version", migration.version))
                    .bind(("name", migration.name))
                    .await?,
            )
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
