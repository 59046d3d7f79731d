/// SQLite implementation of the record store
///
/// This module owns the connection and all SQL. Entity bodies are opaque JSON
/// text here; decoding happens in the entity store.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{timestamp, DhikrId, SessionDraft};
use crate::storage::{migrations, RecordStore, StorageError, StoredRow};

/// SQLite-based storage implementation
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open (or create) the database file and bring its schema up to date
    pub fn new(db_path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        migrations::initialize_database(&conn)?;

        tracing::info!("SQLite storage initialized at: {:?}", db_path);

        Ok(Self { conn })
    }

    /// A private database that disappears when dropped
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open in-memory database: {}", e)))?;

        migrations::initialize_database(&conn)?;

        Ok(Self { conn })
    }

    fn row_from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredRow> {
        Ok(StoredRow {
            id: row.get(0)?,
            created_date: row.get(1)?,
            updated_date: row.get(2)?,
            body: row.get(3)?,
        })
    }
}

impl RecordStore for SqliteStorage {
    fn insert_row(&self, table: &str, row: &StoredRow) -> Result<(), StorageError> {
        self.conn.execute(
            &format!(
                "INSERT INTO {} (id, created_date, updated_date, body) VALUES (?1, ?2, ?3, ?4)",
                table
            ),
            params![row.id, row.created_date, row.updated_date, row.body],
        )?;

        tracing::debug!("Inserted {} row {}", table, row.id);
        Ok(())
    }

    fn replace_row(&self, table: &str, row: &StoredRow) -> Result<bool, StorageError> {
        let rows_affected = self.conn.execute(
            &format!(
                "UPDATE {} SET created_date = ?2, updated_date = ?3, body = ?4 WHERE id = ?1",
                table
            ),
            params![row.id, row.created_date, row.updated_date, row.body],
        )?;

        tracing::debug!("Updated {} row {}", table, row.id);
        Ok(rows_affected > 0)
    }

    fn fetch_row(&self, table: &str, id: &str) -> Result<Option<StoredRow>, StorageError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT id, created_date, updated_date, body FROM {} WHERE id = ?1", table),
                params![id],
                Self::row_from_sql,
            )
            .optional()?;

        Ok(row)
    }

    fn fetch_rows(&self, table: &str) -> Result<Vec<StoredRow>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, created_date, updated_date, body FROM {} ORDER BY rowid",
            table
        ))?;

        let rows = stmt
            .query_map([], Self::row_from_sql)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn remove_row(&self, table: &str, id: &str) -> Result<bool, StorageError> {
        let rows_affected = self
            .conn
            .execute(&format!("DELETE FROM {} WHERE id = ?1", table), params![id])?;

        tracing::debug!("Deleted {} row {} (existed: {})", table, id, rows_affected > 0);
        Ok(rows_affected > 0)
    }

    fn save_draft(&self, draft: &SessionDraft) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO session_draft (dhikr_id, count, saved_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(dhikr_id) DO UPDATE SET count = excluded.count, saved_at = excluded.saved_at",
            params![
                draft.dhikr_id.to_string(),
                draft.count,
                timestamp::format(&draft.saved_at)
            ],
        )?;
        Ok(())
    }

    fn load_draft(&self, dhikr_id: DhikrId) -> Result<Option<SessionDraft>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT count, saved_at FROM session_draft WHERE dhikr_id = ?1",
                params![dhikr_id.to_string()],
                |row| Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((count, saved_at)) = row else {
            return Ok(None);
        };

        let saved_at = DateTime::parse_from_rfc3339(&saved_at)
            .map_err(|e| StorageError::InvalidRecord {
                entity: "SessionDraft",
                reason: format!("bad saved_at '{}': {}", saved_at, e),
            })?
            .with_timezone(&Utc);

        Ok(Some(SessionDraft { dhikr_id, count, saved_at }))
    }

    fn clear_draft(&self, dhikr_id: DhikrId) -> Result<(), StorageError> {
        self.conn.execute(
            "DELETE FROM session_draft WHERE dhikr_id = ?1",
            params![dhikr_id.to_string()],
        )?;
        Ok(())
    }

    fn atomically<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&Self) -> Result<R, E>,
        E: From<StorageError>,
    {
        self.conn
            .execute_batch("SAVEPOINT batch")
            .map_err(StorageError::from)?;

        match f(self) {
            Ok(value) => {
                self.conn
                    .execute_batch("RELEASE batch")
                    .map_err(StorageError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK TO batch; RELEASE batch") {
                    tracing::error!("Failed to roll back batch: {}", rollback);
                }
                Err(err)
            }
        }
    }
}
