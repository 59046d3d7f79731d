/// Domain module containing core business logic and data types
///
/// This module defines the entities of the dhikr tracker (Dhikr, DhikrLog,
/// DhikrSchedule, Goal, UserSettings, IslamicContent, CrescentSighting), their
/// validation rules, and the pure goal progress engine.

pub mod content;
pub mod dhikr;
pub mod goal;
pub mod log;
pub mod progress;
pub mod schedule;
pub mod settings;
pub mod types;

// Re-export public types for easy access
pub use content::*;
pub use dhikr::*;
pub use goal::*;
pub use log::*;
pub use progress::*;
pub use schedule::*;
pub use settings::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid text: {0}")]
    InvalidText(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Goal type '{goal_type}' requires at least one dhikr to be selected")]
    MissingDhikrSelection { goal_type: String },
}
