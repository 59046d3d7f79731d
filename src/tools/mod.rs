/// Workflows exposed as MCP tools
///
/// Each submodule holds the parameter/response types of a group of tools and
/// the functions that run them against any [`RecordStore`].
///
/// [`RecordStore`]: crate::storage::RecordStore

pub mod activity;
pub mod complete;
pub mod content;
pub mod goals;
pub mod library;
pub mod reminders;
pub mod settings;
pub mod today;

// Re-export tool functions for easy access
pub use activity::*;
pub use complete::*;
pub use content::*;
pub use goals::*;
pub use library::*;
pub use reminders::*;
pub use settings::*;
pub use today::*;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{parse_date, today_utc, DomainError};
use crate::storage::StorageError;

/// Errors returned by tool workflows
#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

impl ToolError {
    /// Whether the caller supplied bad input, as opposed to a storage failure
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            ToolError::Domain(_) | ToolError::Storage(StorageError::Validation(_))
        )
    }
}

/// The date named by a tool argument, or today's UTC date when absent
pub fn resolve_date(date: Option<&str>) -> Result<NaiveDate, DomainError> {
    match date {
        Some(text) if !text.trim().is_empty() => parse_date(text),
        _ => Ok(today_utc()),
    }
}

/// Parse an optional enum-like argument with its `FromStr` impl
pub(crate) fn parse_opt<T>(value: Option<&str>) -> Result<Option<T>, DomainError>
where
    T: std::str::FromStr<Err = DomainError>,
{
    value.map(str::parse).transpose()
}
