/// Database migration management
///
/// This module creates and upgrades the SQLite schema: one table per entity
/// type plus the session draft table.

use rusqlite::Connection;

use crate::storage::StorageError;

/// Current database schema version
///
/// Increment this when you add new migrations
const CURRENT_VERSION: i32 = 1;

/// Entity tables created by the first migration
pub const ENTITY_TABLES: [&str; 7] = [
    "dhikr",
    "dhikr_log",
    "dhikr_schedule",
    "goal",
    "islamic_content",
    "user_settings",
    "crescent_sighting",
];

/// Initialize the database schema
///
/// Safe to call on every start; migrations only run when the stored version
/// is behind.
pub fn initialize_database(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let current_version = get_current_version(conn)?;

    if current_version < CURRENT_VERSION {
        run_migrations(conn, current_version)?;
        set_version(conn, CURRENT_VERSION)?;
    }

    Ok(())
}

fn get_current_version(conn: &Connection) -> Result<i32, StorageError> {
    let version = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0)
        })?
        .unwrap_or(0);

    Ok(version)
}

fn set_version(conn: &Connection, version: i32) -> Result<(), StorageError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

fn run_migrations(conn: &Connection, from_version: i32) -> Result<(), StorageError> {
    if from_version < 1 {
        migration_v1(conn)?;
    }

    Ok(())
}

/// Migration to version 1: entity tables and session drafts
fn migration_v1(conn: &Connection) -> Result<(), StorageError> {
    for table in ENTITY_TABLES {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY,
                created_date TEXT NOT NULL,
                updated_date TEXT,
                body TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_{table}_created_date ON {table} (created_date);"
        ))
        .map_err(|e| StorageError::Migration(format!("creating table {}: {}", table, e)))?;
    }

    conn.execute(
        "CREATE TABLE IF NOT EXISTS session_draft (
            dhikr_id TEXT PRIMARY KEY,
            count INTEGER NOT NULL,
            saved_at TEXT NOT NULL
        )",
        [],
    )?;

    tracing::info!("Applied migration v1: Created initial database schema");
    Ok(())
}
