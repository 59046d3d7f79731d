/// Storage layer for persisting dhikr tracker data
///
/// Every entity type lives in its own SQLite table as a JSON body keyed by id.
/// [`EntityStore`] provides the generic list/filter/get/create/update/delete
/// primitive over those tables, and the repository traits in [`repository`]
/// give each entity its typed queries.

pub mod entity_store;
pub mod migrations;
pub mod repository;
pub mod seed;
pub mod sqlite;

// Re-export the main storage types
pub use entity_store::*;
pub use repository::*;
pub use sqlite::*;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::domain::{DhikrId, DomainError, SessionDraft};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid {entity} record: {reason}")]
    InvalidRecord { entity: &'static str, reason: String },

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Rejected invalid input: {0}")]
    Validation(#[from] DomainError),
}

/// A record type stored in its own table
pub trait Entity: Serialize + DeserializeOwned {
    type Id: fmt::Display + Copy;

    /// Table holding this entity's rows
    const TABLE: &'static str;
    /// Human-readable name used in errors and logs
    const NAME: &'static str;
    /// Whether `updated_date` is stamped on create and update
    const TRACKS_UPDATED: bool = true;

    fn id(&self) -> Self::Id;

    /// Field values merged under caller data on create
    fn defaults() -> Map<String, Value> {
        Map::new()
    }
}

/// One row of an entity table
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub id: String,
    pub created_date: String,
    pub updated_date: Option<String>,
    /// JSON body of the entity, including the id and timestamps
    pub body: String,
}

/// Row-level persistence underneath the entity stores
///
/// This trait allows us to swap SQLite for another local store while keeping
/// the entity and repository layers unchanged.
pub trait RecordStore {
    fn insert_row(&self, table: &str, row: &StoredRow) -> Result<(), StorageError>;

    /// Overwrite an existing row; returns false when no row has that id
    fn replace_row(&self, table: &str, row: &StoredRow) -> Result<bool, StorageError>;

    fn fetch_row(&self, table: &str, id: &str) -> Result<Option<StoredRow>, StorageError>;

    /// All rows of a table in insertion order
    fn fetch_rows(&self, table: &str) -> Result<Vec<StoredRow>, StorageError>;

    /// Remove a row; returns whether one existed
    fn remove_row(&self, table: &str, id: &str) -> Result<bool, StorageError>;

    /// Keep the in-progress counter value of a session, replacing any earlier draft
    fn save_draft(&self, draft: &SessionDraft) -> Result<(), StorageError>;

    fn load_draft(&self, dhikr_id: DhikrId) -> Result<Option<SessionDraft>, StorageError>;

    fn clear_draft(&self, dhikr_id: DhikrId) -> Result<(), StorageError>;

    /// Typed store over the table of `T`
    fn entities<T: Entity>(&self) -> EntityStore<'_, Self, T>
    where
        Self: Sized,
    {
        EntityStore::new(self)
    }

    /// Run `f` as one atomic batch: every write inside it lands, or none does
    fn atomically<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&Self) -> Result<R, E>,
        E: From<StorageError>;
}
