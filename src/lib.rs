/// Public library interface for the Dhikr Tracker MCP server
///
/// Exposes the domain model, the SQLite-backed storage, the tool workflows
/// and the server that serves them over MCP.

use std::path::PathBuf;
use thiserror::Error;

pub mod analytics;
pub mod domain;
pub mod mcp;
pub mod storage;
pub mod tools;

pub use domain::*;
pub use storage::{RecordStore, SqliteStorage, StorageError};
pub use tools::ToolError;

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] storage::StorageError),

    #[error("Domain validation error: {0}")]
    Domain(#[from] domain::DomainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The dhikr tracker: one SQLite database served over MCP
pub struct DhikrTrackerServer {
    storage: SqliteStorage,
}

impl DhikrTrackerServer {
    /// Open (or create) the database at `db_path`.
    ///
    /// With `seed` set, an empty library is filled with the starter dhikr.
    pub async fn new(db_path: PathBuf, seed: bool) -> Result<Self, ServerError> {
        tracing::info!("Initializing Dhikr Tracker server with database: {:?}", db_path);

        let storage = SqliteStorage::new(db_path)?;
        if seed && storage::seed::seed_if_empty(&storage)? {
            tracing::info!("Seeded the library with starter dhikr");
        }

        Ok(Self::with_storage(storage))
    }

    /// Wrap an already opened store
    pub fn with_storage(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    /// Run the MCP server until stdin closes
    pub async fn run(self) -> Result<(), ServerError> {
        let dhikr = storage::DhikrRepository::list_active_dhikr(&self.storage)?;
        tracing::info!("Server started successfully, found {} active dhikr", dhikr.len());

        let mut mcp_server = mcp::McpServer::new(self);
        mcp_server.run().await?;

        Ok(())
    }

    /// The underlying store
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }
}
